//! Shared HTTP plumbing: agent, auth header, status mapping.

use std::time::Duration;

use serde::de::DeserializeOwned;

use rollcall_core::ServiceError;

pub(crate) const PEOPLE: &str = "people";
pub(crate) const SHEETS: &str = "sheets";
pub(crate) const DRIVE: &str = "drive";

const TIMEOUT: Duration = Duration::from_secs(30);

/// Base URLs of the three APIs; overridable for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub people: String,
    pub sheets: String,
    pub drive: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            people: "https://people.googleapis.com".to_string(),
            sheets: "https://sheets.googleapis.com".to_string(),
            drive: "https://www.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Every API served from one base URL.
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            people: base.clone(),
            sheets: base.clone(),
            drive: base,
        }
    }
}

/// Authenticated client for the People, Sheets and Drive APIs.
pub struct GoogleClient {
    agent: ureq::Agent,
    access_token: String,
    pub(crate) endpoints: Endpoints,
}

impl GoogleClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_endpoints(access_token, Endpoints::default())
    }

    pub fn with_endpoints(access_token: impl Into<String>, endpoints: Endpoints) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(TIMEOUT).build();
        Self {
            agent,
            access_token: access_token.into(),
            endpoints,
        }
    }

    /// Request with the bearer header and, when non-empty, `quotaUser`.
    pub(crate) fn request(&self, method: &str, url: &str, quota_user: &str) -> ureq::Request {
        tracing::debug!("{method} {url}");
        let req = self
            .agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.access_token));
        if quota_user.is_empty() {
            req
        } else {
            req.query("quotaUser", quota_user)
        }
    }

    /// Decode the JSON reply of a sent request.
    pub(crate) fn decode<T: DeserializeOwned>(
        &self,
        service: &'static str,
        resource: &str,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<T, ServiceError> {
        let response = result.map_err(|e| map_error(service, resource, e))?;
        response.into_json::<T>().map_err(|e| ServiceError::Decode {
            service,
            message: format!("{resource}: {e}"),
        })
    }
}

/// Map a ureq failure onto the shared service error taxonomy.
pub(crate) fn map_error(service: &'static str, resource: &str, err: ureq::Error) -> ServiceError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            map_status(service, resource, status, &body)
        }
        ureq::Error::Transport(transport) => ServiceError::Transport {
            service,
            message: transport.to_string(),
        },
    }
}

pub(crate) fn map_status(
    service: &'static str,
    resource: &str,
    status: u16,
    body: &str,
) -> ServiceError {
    let message = error_message(body);
    match status {
        404 => ServiceError::NotFound {
            service,
            resource: resource.to_string(),
        },
        410 => ServiceError::ExpiredSyncToken { service },
        400 if body.contains("EXPIRED_SYNC_TOKEN") => ServiceError::ExpiredSyncToken { service },
        429 => ServiceError::QuotaExceeded { service, message },
        403 if body.contains("RATE_LIMIT_EXCEEDED") || body.contains("rateLimitExceeded") => {
            ServiceError::QuotaExceeded { service, message }
        }
        _ => ServiceError::Status {
            service,
            status,
            message,
        },
    }
}

/// `error.message` of a Google error payload, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
