//! Directory reader: resolves each configured group and batch-fetches its
//! members.
//!
//! One failing group never aborts its siblings: any service error while
//! reading a group is logged and recorded as [`GroupMembers::Absent`].

use rollcall_core::{
    config::GroupIds, DirectoryService, GroupId, GroupLabel, GroupMembers, Person, ServiceError,
};

/// Person fields requested for every member.
pub const PERSON_FIELDS: &[&str] = &[
    "addresses",
    "emailAddresses",
    "metadata",
    "names",
    "organizations",
    "phoneNumbers",
];

/// Maximum resource names per batch call accepted by the directory.
pub const BATCH_LIMIT: usize = 200;

/// Every configured group's read outcome, in sheet write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    groups: Vec<(GroupLabel, GroupMembers)>,
}

impl GroupSnapshot {
    pub fn new(mut groups: Vec<(GroupLabel, GroupMembers)>) -> Self {
        groups.sort_by_key(|(label, _)| *label);
        Self { groups }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(GroupLabel, GroupMembers)> {
        self.groups.iter()
    }

    pub fn get(&self, label: GroupLabel) -> Option<&GroupMembers> {
        self.groups
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, members)| members)
    }

    /// People of `label`; empty for absent or unconfigured groups.
    pub fn people(&self, label: GroupLabel) -> &[Person] {
        self.get(label).map(GroupMembers::people).unwrap_or(&[])
    }

    /// Every fetched person across all groups.
    pub fn all_people(&self) -> impl Iterator<Item = &Person> {
        self.groups.iter().flat_map(|(_, members)| members.people())
    }
}

/// Read every group in `ids`.
pub fn read_groups(
    directory: &dyn DirectoryService,
    ids: &GroupIds,
    max_members: u32,
    quota_user: &str,
) -> GroupSnapshot {
    let groups = ids
        .iter()
        .map(|(label, id)| {
            let members = match read_group(directory, id, max_members, quota_user) {
                Ok(members) => members,
                Err(err) => {
                    tracing::warn!("group {label} ({id}) unavailable: {err}");
                    GroupMembers::Absent {
                        reason: err.to_string(),
                    }
                }
            };
            (*label, members)
        })
        .collect();
    GroupSnapshot::new(groups)
}

fn read_group(
    directory: &dyn DirectoryService,
    id: &GroupId,
    max_members: u32,
    quota_user: &str,
) -> Result<GroupMembers, ServiceError> {
    let group = directory.contact_group(id, max_members, quota_user)?;
    let members = &group.member_resource_names;

    if (group.member_count as usize) > members.len() {
        tracing::warn!(
            "group {id} has {} members but only {} were returned (max {max_members})",
            group.member_count,
            members.len()
        );
    }

    let mut people = Vec::with_capacity(members.len());
    for chunk in members.chunks(BATCH_LIMIT) {
        people.extend(directory.batch_get_people(chunk, PERSON_FIELDS, quota_user)?);
    }
    tracing::debug!("group {id}: {} people fetched", people.len());

    Ok(GroupMembers::Fetched { group, people })
}
