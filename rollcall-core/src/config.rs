//! String key/value property store and the settings resolved from it.
//!
//! # Storage layout
//!
//! ```text
//! ~/.rollcall/
//!   properties.yaml   (flat string map: mode 0600)
//! ```
//!
//! # API pattern
//!
//! Path-taking functions have two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! A missing key is never an error: [`SyncSettings::load`] falls back to the
//! built-in default for every recognized key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{config_io_err, ConfigError};
use crate::types::{DestinationId, GroupId, GroupLabel};

/// Recognized property keys.
pub mod keys {
    pub const CONTACTS_SPREADSHEET_ID: &str = "CONTACTS_SPREADSHEET_ID";
    pub const CONNECTIONS_SYNC_TOKEN: &str = "CONNECTIONS_SYNC_TOKEN";
    pub const SHEET_NAME: &str = "SHEET_NAME";
    pub const TITLE_TEMPLATE: &str = "TITLE_TEMPLATE";
    pub const MAX_MEMBERS: &str = "MAX_MEMBERS";
    pub const QUOTA_USER: &str = "QUOTA_USER";
}

pub const DEFAULT_SHEET_NAME: &str = "Contact List";
pub const DEFAULT_TITLE_TEMPLATE: &str = "Sutherland Contacts {{ year }}";
pub const DEFAULT_MAX_MEMBERS: u32 = 1000;

// ---------------------------------------------------------------------------
// 1. Store trait
// ---------------------------------------------------------------------------

/// Persistent string properties.
pub trait ConfigStore {
    /// Value for `key`; empty values read as absent.
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;

    /// Remove `key`, returning whether it was present.
    fn remove(&mut self, key: &str) -> Result<bool, ConfigError>;

    /// All properties, sorted by key.
    fn entries(&self) -> Vec<(String, String)>;
}

/// In-process store, used by tests and throwaway runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryConfigStore {
    props: BTreeMap<String, String>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.props.insert(key.to_string(), value.to_string());
        self
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.props.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.props.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, ConfigError> {
        Ok(self.props.remove(key).is_some())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.props
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// 2. File-backed store
// ---------------------------------------------------------------------------

/// `<home>/.rollcall/properties.yaml`: pure, no I/O.
pub fn properties_path_at(home: &Path) -> PathBuf {
    home.join(".rollcall").join("properties.yaml")
}

/// Properties persisted as a flat YAML mapping; every mutation is saved.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
    props: BTreeMap<String, String>,
}

impl FileConfigStore {
    /// Open the store under `home`. A missing file is an empty store.
    ///
    /// Returns `ConfigError::Parse` (with path + line context) if malformed YAML.
    pub fn open_at(home: &Path) -> Result<Self, ConfigError> {
        Self::open_file(properties_path_at(home))
    }

    /// `open_at` convenience wrapper.
    pub fn open() -> Result<Self, ConfigError> {
        Self::open_at(&home()?)
    }

    /// Open a store persisted at an explicit file path.
    pub fn open_file(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self {
                path,
                props: BTreeMap::new(),
            });
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| config_io_err(&path, e))?;
        let props = if contents.trim().is_empty() {
            BTreeMap::new()
        } else {
            parse_properties(&contents)
                .map_err(|e| ConfigError::Parse { path: path.clone(), source: e })?
        };
        Ok(Self { path, props })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomic save: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
    fn save(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| config_io_err(dir, e))?;
                set_dir_permissions(dir)?;
            }
        }
        let yaml = serde_yaml::to_string(&self.props)?;
        let tmp = self.path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml).map_err(|e| config_io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| config_io_err(&self.path, e))?;
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.props.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.props.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<bool, ConfigError> {
        let removed = self.props.remove(key).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.props
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// 3. Resolved settings
// ---------------------------------------------------------------------------

/// Group identifiers in sheet write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIds(Vec<(GroupLabel, GroupId)>);

impl GroupIds {
    /// The built-in identifiers for every label.
    pub fn defaults() -> Self {
        Self(
            GroupLabel::ordered()
                .iter()
                .map(|label| (*label, label.default_resource()))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &(GroupLabel, GroupId)> {
        self.0.iter()
    }

    pub fn get(&self, label: GroupLabel) -> Option<&GroupId> {
        self.0.iter().find(|(l, _)| *l == label).map(|(_, id)| id)
    }
}

/// Every property a run needs, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub destination: Option<DestinationId>,
    pub groups: GroupIds,
    pub sheet_name: String,
    pub title_template: String,
    pub max_members: u32,
    pub quota_user: Option<String>,
}

impl SyncSettings {
    pub fn load(store: &dyn ConfigStore) -> Self {
        let groups = GroupIds(
            GroupLabel::ordered()
                .iter()
                .map(|label| {
                    let id = store
                        .get(label.config_key())
                        .map(GroupId::from)
                        .unwrap_or_else(|| label.default_resource());
                    (*label, id)
                })
                .collect(),
        );

        let max_members = match store.get(keys::MAX_MEMBERS) {
            None => DEFAULT_MAX_MEMBERS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(
                        "ignoring invalid {} value '{raw}', using {DEFAULT_MAX_MEMBERS}",
                        keys::MAX_MEMBERS
                    );
                    DEFAULT_MAX_MEMBERS
                }
            },
        };

        Self {
            destination: store.get(keys::CONTACTS_SPREADSHEET_ID).map(DestinationId::from),
            groups,
            sheet_name: store
                .get(keys::SHEET_NAME)
                .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            title_template: store
                .get(keys::TITLE_TEMPLATE)
                .unwrap_or_else(|| DEFAULT_TITLE_TEMPLATE.to_string()),
            max_members,
            quota_user: store.get(keys::QUOTA_USER),
        }
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Hand-edited files may hold bare numbers or booleans; store them as text.
fn parse_properties(contents: &str) -> Result<BTreeMap<String, String>, serde_yaml::Error> {
    use serde::de::Error as _;
    use serde_yaml::Value;

    let raw: BTreeMap<String, Value> = serde_yaml::from_str(contents)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                _ => {
                    return Err(serde_yaml::Error::custom(format!(
                        "property '{key}' must be a scalar value"
                    )))
                }
            };
            Ok((key, text))
        })
        .collect()
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| config_io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| config_io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn properties_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        let path = properties_path_at(home.path());
        assert!(path.ends_with(".rollcall/properties.yaml"));
    }

    #[test]
    fn missing_file_is_empty_store() {
        let home = TempDir::new().expect("tempdir");
        let store = FileConfigStore::open_at(home.path()).expect("open");
        assert!(store.entries().is_empty());
        assert!(!store.path().exists(), "open must not create the file");
    }

    #[test]
    fn set_persists_and_cleans_tmp() {
        let home = TempDir::new().expect("tempdir");
        let mut store = FileConfigStore::open_at(home.path()).expect("open");
        store
            .set(keys::CONNECTIONS_SYNC_TOKEN, "tok-1")
            .expect("set");

        let tmp = properties_path_at(home.path()).with_extension("yaml.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");

        let reopened = FileConfigStore::open_at(home.path()).expect("reopen");
        assert_eq!(
            reopened.get(keys::CONNECTIONS_SYNC_TOKEN).as_deref(),
            Some("tok-1")
        );
    }

    #[test]
    #[cfg(unix)]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let home = TempDir::new().expect("tempdir");
        let mut store = FileConfigStore::open_at(home.path()).expect("open");
        store.set(keys::SHEET_NAME, "Roster").expect("set");
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn empty_value_reads_as_absent() {
        let store = MemoryConfigStore::new().with(keys::CONTACTS_SPREADSHEET_ID, "");
        assert_eq!(store.get(keys::CONTACTS_SPREADSHEET_ID), None);
    }

    #[test]
    fn remove_reports_presence() {
        let mut store = MemoryConfigStore::new().with(keys::QUOTA_USER, "me@x.com");
        assert!(store.remove(keys::QUOTA_USER).expect("remove"));
        assert!(!store.remove(keys::QUOTA_USER).expect("remove again"));
    }

    #[test]
    fn settings_fall_back_to_defaults() {
        let settings = SyncSettings::load(&MemoryConfigStore::new());
        assert_eq!(settings.destination, None);
        assert_eq!(settings.sheet_name, DEFAULT_SHEET_NAME);
        assert_eq!(settings.title_template, DEFAULT_TITLE_TEMPLATE);
        assert_eq!(settings.max_members, DEFAULT_MAX_MEMBERS);
        assert_eq!(settings.groups, GroupIds::defaults());
    }

    #[test]
    fn settings_apply_overrides() {
        let store = MemoryConfigStore::new()
            .with(keys::CONTACTS_SPREADSHEET_ID, "sheet-1")
            .with("RESOURCE_NAME_GUEST", "contactGroups/guests")
            .with(keys::MAX_MEMBERS, "250");
        let settings = SyncSettings::load(&store);
        assert_eq!(settings.destination, Some(DestinationId::from("sheet-1")));
        assert_eq!(
            settings.groups.get(GroupLabel::Guest),
            Some(&GroupId::from("contactGroups/guests"))
        );
        assert_eq!(
            settings.groups.get(GroupLabel::Active),
            Some(&GroupLabel::Active.default_resource())
        );
        assert_eq!(settings.max_members, 250);
    }

    #[test]
    fn invalid_max_members_uses_default() {
        let store = MemoryConfigStore::new().with(keys::MAX_MEMBERS, "lots");
        assert_eq!(SyncSettings::load(&store).max_members, DEFAULT_MAX_MEMBERS);
    }
}
