use std::fs;
use std::io;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::warn;

/// Relative location of the settings file under the platform config dir.
pub const SETTINGS_FILE: &str = "promptdrive/settings.json";

/// Read side of the host's key/value configuration.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore: Send + Sync {
    /// Returns the boolean stored under the dotted `key`, or `default` when
    /// the key is absent or not a boolean.
    fn get_bool(&self, key: &str, default: bool) -> bool;
}

/// Notification that one or more configuration keys changed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigChangeEvent {
    pub keys: Vec<String>,
}

impl ConfigChangeEvent {
    /// Creates an event for the given changed keys.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns whether any changed key is `section` or nested below it.
    pub fn affects_configuration(&self, section: &str) -> bool {
        self.keys.iter().any(|key| {
            key == section
                || key
                    .strip_prefix(section)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

/// Returns the default settings file path (`<config dir>/promptdrive/settings.json`).
pub fn default_settings_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join(SETTINGS_FILE);
    }

    PathBuf::from(SETTINGS_FILE)
}

/// [`ConfigStore`] reading a JSON settings file on every lookup.
///
/// Keys are looked up flat first (`"promptDrive.enableUserPromptDrive":
/// false`, the editor settings style) and then as nested objects
/// (`{"promptDrive": {"enableUserPromptDrive": false}}`). A missing or
/// malformed file behaves like an empty one.
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// Creates a store backed by the settings file at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the top-level JSON object, treating every failure as empty.
    fn load(&self) -> Map<String, Value> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Map::new(),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to read settings file");

                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(values)) => values,
            Ok(_) => {
                warn!(path = %self.path.display(), "settings file is not a JSON object");

                Map::new()
            }
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to parse settings file");

                Map::new()
            }
        }
    }
}

impl ConfigStore for JsonConfigStore {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        lookup_bool(&self.load(), key).unwrap_or(default)
    }
}

/// Finds a boolean under a dotted `key`, flat or nested.
fn lookup_bool(values: &Map<String, Value>, key: &str) -> Option<bool> {
    if let Some(value) = values.get(key) {
        return value.as_bool();
    }

    let mut segments = key.split('.');
    let first = segments.next()?;
    let mut current = values.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    current.as_bool()
}
