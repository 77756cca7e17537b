//! People API v1: contact groups, batch person lookup, connection changes.

use serde::Deserialize;

use rollcall_core::{
    ConnectionChanges, ContactGroup, DirectoryService, GroupId, Person, ResourceName,
    ServiceError, SyncToken,
};

use crate::client::{GoogleClient, PEOPLE};

/// Fields requested when listing connections; only the count matters.
const CONNECTION_FIELDS: &str = "names,metadata";
const PAGE_SIZE: &str = "1000";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    responses: Vec<PersonResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonResponse {
    #[serde(default)]
    requested_resource_name: Option<String>,
    #[serde(default)]
    person: Option<Person>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListConnectionsResponse {
    #[serde(default)]
    connections: Vec<serde_json::Value>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    next_sync_token: Option<String>,
    #[serde(default)]
    total_people: Option<u64>,
}

impl DirectoryService for GoogleClient {
    fn contact_group(
        &self,
        id: &GroupId,
        max_members: u32,
        quota_user: &str,
    ) -> Result<ContactGroup, ServiceError> {
        let url = format!("{}/v1/{}", self.endpoints.people, id);
        let req = self
            .request("GET", &url, quota_user)
            .query("maxMembers", &max_members.to_string());
        self.decode(PEOPLE, id.as_str(), req.call())
    }

    fn batch_get_people(
        &self,
        resource_names: &[ResourceName],
        fields: &[&str],
        quota_user: &str,
    ) -> Result<Vec<Person>, ServiceError> {
        if resource_names.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/v1/people:batchGet", self.endpoints.people);
        let mut req = self
            .request("GET", &url, quota_user)
            .query("personFields", &fields.join(","));
        for name in resource_names {
            req = req.query("resourceNames", name.as_str());
        }
        let body: BatchGetResponse = self.decode(PEOPLE, "people:batchGet", req.call())?;

        Ok(body
            .responses
            .into_iter()
            .filter_map(|r| match r.person {
                Some(person) => Some(person),
                None => {
                    tracing::warn!(
                        "directory returned no record for {}",
                        r.requested_resource_name.as_deref().unwrap_or("?")
                    );
                    None
                }
            })
            .collect())
    }

    fn list_connection_changes(
        &self,
        token: Option<&SyncToken>,
        quota_user: &str,
    ) -> Result<ConnectionChanges, ServiceError> {
        let url = format!("{}/v1/people/me/connections", self.endpoints.people);
        let mut page_token: Option<String> = None;
        let mut counted = 0u64;
        let mut total_people = 0u64;

        loop {
            let mut req = self
                .request("GET", &url, quota_user)
                .query("personFields", CONNECTION_FIELDS)
                .query("requestSyncToken", "true")
                .query("pageSize", PAGE_SIZE);
            if let Some(token) = token {
                req = req.query("syncToken", token.as_str());
            }
            if let Some(page) = &page_token {
                req = req.query("pageToken", page);
            }

            let page: ListConnectionsResponse =
                self.decode(PEOPLE, "people/me/connections", req.call())?;
            counted += page.connections.len() as u64;
            total_people = total_people.max(page.total_people.unwrap_or(0));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => {
                    return Ok(ConnectionChanges {
                        changed: counted.max(total_people),
                        next_token: page
                            .next_sync_token
                            .filter(|t| !t.is_empty())
                            .map(SyncToken::from),
                    })
                }
            }
        }
    }
}
