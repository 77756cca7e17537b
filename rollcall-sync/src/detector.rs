//! Change detector: decides whether the destination sheet is stale.
//!
//! Two checks, first positive wins:
//!
//! 1. **Membership**: the connection-changes feed reports at least one
//!    added, removed or edited connection since the stored token.
//! 2. **Records**: some fetched person was edited strictly after the sheet
//!    was last modified.
//!
//! The feed query always runs, even in forced mode, because it advances the
//! stored token.

use chrono::{DateTime, Utc};
use serde::Serialize;

use rollcall_core::{
    config::keys, ConfigStore, DirectoryService, ResourceName, ServiceError, SyncToken,
};

use crate::error::SyncError;
use crate::reader::GroupSnapshot;

/// Literal invocation flag selecting [`RunMode::Forced`].
pub const FORCE_FLAG: &str = "forceUpdate";

// ---------------------------------------------------------------------------
// Mode and signal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Write only when a check reports a change.
    #[default]
    Conditional,
    /// Skip both checks and always rewrite.
    Forced,
}

impl RunMode {
    /// `forceUpdate` selects forced mode; anything else is conditional.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(FORCE_FLAG) => RunMode::Forced,
            _ => RunMode::Conditional,
        }
    }
}

/// Why (or why not) an update is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeSignal {
    Forced,
    MembershipChanged {
        changed: u64,
    },
    RecordsEdited {
        #[serde(skip_serializing_if = "Option::is_none")]
        person: Option<ResourceName>,
        newest: DateTime<Utc>,
    },
    Current,
}

impl ChangeSignal {
    pub fn update_needed(&self) -> bool {
        !matches!(self, ChangeSignal::Current)
    }
}

/// Detector result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    pub signal: ChangeSignal,
    /// Token returned by the feed, if any.
    pub next_token: Option<SyncToken>,
    /// Whether `next_token` was written to the property store.
    pub token_persisted: bool,
}

impl ChangeReport {
    pub fn update_needed(&self) -> bool {
        self.signal.update_needed()
    }
}

// ---------------------------------------------------------------------------
// detect
// ---------------------------------------------------------------------------

/// Evaluate the change gate.
///
/// The stored token is read from `config`; the feed's next token is written
/// back whenever one is returned and `persist_token` is set, regardless of
/// the outcome.
pub fn detect(
    directory: &dyn DirectoryService,
    config: &mut dyn ConfigStore,
    snapshot: &GroupSnapshot,
    sheet_last_modified: DateTime<Utc>,
    mode: RunMode,
    persist_token: bool,
    quota_user: &str,
) -> Result<ChangeReport, SyncError> {
    let stored = config.get(keys::CONNECTIONS_SYNC_TOKEN).map(SyncToken::from);
    let changes = match directory.list_connection_changes(stored.as_ref(), quota_user) {
        Err(ServiceError::ExpiredSyncToken { service }) if stored.is_some() => {
            tracing::warn!("{service} rejected the stored sync token, requesting a full listing");
            directory.list_connection_changes(None, quota_user)?
        }
        other => other?,
    };

    let mut token_persisted = false;
    if let Some(token) = &changes.next_token {
        if persist_token {
            config.set(keys::CONNECTIONS_SYNC_TOKEN, token.as_str())?;
            token_persisted = true;
        } else {
            tracing::debug!("not persisting sync token {token}");
        }
    }

    let signal = if mode == RunMode::Forced {
        ChangeSignal::Forced
    } else if changes.changed > 0 {
        ChangeSignal::MembershipChanged {
            changed: changes.changed,
        }
    } else {
        newest_edit_after(snapshot, sheet_last_modified)
    };
    tracing::debug!("change signal: {signal:?}");

    Ok(ChangeReport {
        signal,
        next_token: changes.next_token,
        token_persisted,
    })
}

/// The most recently edited person newer than `since`, if any.
fn newest_edit_after(snapshot: &GroupSnapshot, since: DateTime<Utc>) -> ChangeSignal {
    snapshot
        .all_people()
        .filter(|p| p.last_updated() > since)
        .max_by_key(|p| p.last_updated())
        .map(|p| ChangeSignal::RecordsEdited {
            person: p.resource_name.clone(),
            newest: p.last_updated(),
        })
        .unwrap_or(ChangeSignal::Current)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use chrono::TimeZone;
    use rollcall_core::{
        types::{PersonMetadata, Source},
        ConnectionChanges, ContactGroup, GroupId, GroupLabel, GroupMembers, MemoryConfigStore,
        Person,
    };

    /// Feed stub returning a fixed change count; optionally expires tokens.
    struct Feed {
        changed: u64,
        expire_tokens: bool,
        seen: RefCell<Vec<Option<String>>>,
    }

    impl Feed {
        fn new(changed: u64) -> Self {
            Self {
                changed,
                expire_tokens: false,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl DirectoryService for Feed {
        fn contact_group(&self, _: &GroupId, _: u32, _: &str) -> Result<ContactGroup, ServiceError> {
            unreachable!()
        }

        fn batch_get_people(
            &self,
            _: &[ResourceName],
            _: &[&str],
            _: &str,
        ) -> Result<Vec<Person>, ServiceError> {
            unreachable!()
        }

        fn list_connection_changes(
            &self,
            token: Option<&SyncToken>,
            _: &str,
        ) -> Result<ConnectionChanges, ServiceError> {
            self.seen.borrow_mut().push(token.map(|t| t.to_string()));
            if self.expire_tokens && token.is_some() {
                return Err(ServiceError::ExpiredSyncToken { service: "feed" });
            }
            Ok(ConnectionChanges {
                changed: self.changed,
                next_token: Some(SyncToken::from("next")),
            })
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).single().expect("date")
    }

    fn edited(name: &str, when: Option<DateTime<Utc>>) -> Person {
        Person {
            resource_name: Some(ResourceName::from(name)),
            metadata: Some(PersonMetadata {
                sources: vec![Source {
                    source_type: Some("CONTACT".to_string()),
                    update_time: when,
                }],
            }),
            ..Person::default()
        }
    }

    fn snapshot(people: Vec<Person>) -> GroupSnapshot {
        GroupSnapshot::new(vec![
            (
                GroupLabel::Active,
                GroupMembers::Fetched {
                    group: ContactGroup {
                        resource_name: GroupLabel::Active.default_resource(),
                        name: None,
                        member_count: people.len() as u32,
                        member_resource_names: Vec::new(),
                        metadata: None,
                    },
                    people,
                },
            ),
            (
                GroupLabel::Guest,
                GroupMembers::Absent {
                    reason: "not found".to_string(),
                },
            ),
        ])
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(RunMode::from_flag(Some("forceUpdate")), RunMode::Forced);
        assert_eq!(RunMode::from_flag(Some("force")), RunMode::Conditional);
        assert_eq!(RunMode::from_flag(None), RunMode::Conditional);
    }

    #[test]
    fn quiet_feed_and_old_records_are_current_but_token_advances() {
        let feed = Feed::new(0);
        let mut config = MemoryConfigStore::new().with(keys::CONNECTIONS_SYNC_TOKEN, "prev");
        let snap = snapshot(vec![edited("people/a", Some(at(1))), edited("people/b", None)]);

        let report =
            detect(&feed, &mut config, &snap, at(5), RunMode::Conditional, true, "me").expect("detect");
        assert_eq!(report.signal, ChangeSignal::Current);
        assert!(!report.update_needed());
        assert!(report.token_persisted);
        assert_eq!(config.get(keys::CONNECTIONS_SYNC_TOKEN).as_deref(), Some("next"));
        assert_eq!(*feed.seen.borrow(), vec![Some("prev".to_string())]);
    }

    #[test]
    fn membership_change_wins() {
        let feed = Feed::new(3);
        let mut config = MemoryConfigStore::new();
        let report = detect(&feed, &mut config, &snapshot(vec![]), at(5), RunMode::Conditional, true, "me")
            .expect("detect");
        assert_eq!(report.signal, ChangeSignal::MembershipChanged { changed: 3 });
    }

    #[test]
    fn strictly_newer_record_triggers_update() {
        let feed = Feed::new(0);
        let mut config = MemoryConfigStore::new();

        let same = snapshot(vec![edited("people/a", Some(at(5)))]);
        let report =
            detect(&feed, &mut config, &same, at(5), RunMode::Conditional, true, "me").expect("detect");
        assert_eq!(report.signal, ChangeSignal::Current, "equal timestamps are not newer");

        let newer = snapshot(vec![
            edited("people/a", Some(at(6))),
            edited("people/b", Some(at(7))),
        ]);
        let report =
            detect(&feed, &mut config, &newer, at(5), RunMode::Conditional, true, "me").expect("detect");
        assert_eq!(
            report.signal,
            ChangeSignal::RecordsEdited {
                person: Some(ResourceName::from("people/b")),
                newest: at(7),
            }
        );
    }

    #[test]
    fn forced_mode_still_queries_feed() {
        let feed = Feed::new(0);
        let mut config = MemoryConfigStore::new();
        let report = detect(&feed, &mut config, &snapshot(vec![]), at(5), RunMode::Forced, true, "me")
            .expect("detect");
        assert_eq!(report.signal, ChangeSignal::Forced);
        assert_eq!(feed.seen.borrow().len(), 1);
        assert!(report.token_persisted);
    }

    #[test]
    fn dry_detection_leaves_token_alone() {
        let feed = Feed::new(0);
        let mut config = MemoryConfigStore::new().with(keys::CONNECTIONS_SYNC_TOKEN, "prev");
        let report = detect(&feed, &mut config, &snapshot(vec![]), at(5), RunMode::Conditional, false, "me")
            .expect("detect");
        assert!(!report.token_persisted);
        assert_eq!(report.next_token, Some(SyncToken::from("next")));
        assert_eq!(config.get(keys::CONNECTIONS_SYNC_TOKEN).as_deref(), Some("prev"));
    }

    #[test]
    fn expired_token_retries_with_full_listing() {
        let mut feed = Feed::new(4);
        feed.expire_tokens = true;
        let mut config = MemoryConfigStore::new().with(keys::CONNECTIONS_SYNC_TOKEN, "stale");
        let report = detect(&feed, &mut config, &snapshot(vec![]), at(5), RunMode::Conditional, true, "me")
            .expect("detect");
        assert_eq!(*feed.seen.borrow(), vec![Some("stale".to_string()), None]);
        assert_eq!(report.signal, ChangeSignal::MembershipChanged { changed: 4 });
    }
}
