//! Property store load errors, persistence, and default resolution.
//! Storage: ~/.rollcall/properties.yaml

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use rollcall_core::{
    config::{keys, properties_path_at, DEFAULT_MAX_MEMBERS},
    ConfigError, ConfigStore, FileConfigStore, GroupId, GroupLabel, SyncSettings,
};
use rstest::rstest;
use std::fs;

// ---------------------------------------------------------------------------
// 1. Load errors
// ---------------------------------------------------------------------------

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child(".rollcall/properties.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = FileConfigStore::open_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(
        err.to_string().contains("properties.yaml"),
        "must contain file path, got: {err}"
    );
}

#[test]
fn nested_value_is_rejected() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".rollcall/properties.yaml")
        .write_str("SHEET_NAME:\n  nested: true\n")
        .expect("write");

    let err = FileConfigStore::open_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn bare_scalars_are_read_as_text() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".rollcall/properties.yaml")
        .write_str("MAX_MEMBERS: 250\nCONTACTS_SPREADSHEET_ID: abc123\n")
        .expect("write");

    let store = FileConfigStore::open_at(home.path()).expect("open");
    assert_eq!(store.get(keys::MAX_MEMBERS).as_deref(), Some("250"));
    assert_eq!(SyncSettings::load(&store).max_members, 250);
}

// ---------------------------------------------------------------------------
// 2. Persistence
// ---------------------------------------------------------------------------

#[test]
fn token_survives_reopen() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut store = FileConfigStore::open_at(home.path()).expect("open");
    store
        .set(keys::CONNECTIONS_SYNC_TOKEN, "EgYI-token")
        .expect("set");

    home.child(".rollcall/properties.yaml")
        .assert(predicate::str::contains("CONNECTIONS_SYNC_TOKEN"));

    let reopened = FileConfigStore::open_at(home.path()).expect("reopen");
    assert_eq!(
        reopened.get(keys::CONNECTIONS_SYNC_TOKEN).as_deref(),
        Some("EgYI-token")
    );
}

#[test]
fn remove_rewrites_file() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut store = FileConfigStore::open_at(home.path()).expect("open");
    store.set(keys::QUOTA_USER, "ops@example.org").expect("set");
    store.set(keys::SHEET_NAME, "Roster").expect("set");
    assert!(store.remove(keys::QUOTA_USER).expect("remove"));

    let contents = fs::read_to_string(properties_path_at(home.path())).expect("read");
    assert!(!contents.contains("QUOTA_USER"));
    assert!(contents.contains("Roster"));
}

// ---------------------------------------------------------------------------
// 3. Defaults
// ---------------------------------------------------------------------------

#[rstest]
#[case(GroupLabel::Active, "contactGroups/1cf9f5348e22c8b7")]
#[case(GroupLabel::Guest, "contactGroups/3c82995f899da957")]
#[case(GroupLabel::Student, "contactGroups/5d7c7a9d8e0c906d")]
#[case(GroupLabel::Inactive, "contactGroups/3a3fa8fc0d6be183")]
fn unset_group_uses_builtin_identifier(#[case] label: GroupLabel, #[case] expected: &str) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let store = FileConfigStore::open_at(home.path()).expect("open");
    let settings = SyncSettings::load(&store);
    assert_eq!(settings.groups.get(label), Some(&GroupId::from(expected)));
    assert_eq!(settings.max_members, DEFAULT_MAX_MEMBERS);
}

#[test]
fn group_order_is_fixed_regardless_of_file_order() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".rollcall/properties.yaml")
        .write_str("RESOURCE_NAME_INACTIVE: contactGroups/i\nRESOURCE_NAME_ACTIVE: contactGroups/a\n")
        .expect("write");

    let store = FileConfigStore::open_at(home.path()).expect("open");
    let settings = SyncSettings::load(&store);
    let labels: Vec<GroupLabel> = settings.groups.iter().map(|(l, _)| *l).collect();
    assert_eq!(labels, GroupLabel::ordered().to_vec());
    assert_eq!(
        settings.groups.get(GroupLabel::Inactive),
        Some(&GroupId::from("contactGroups/i"))
    );
}
