use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::domain::settings::{SETTINGS_NAMESPACE, SettingName, Settings};
use crate::infra::config::{ConfigChangeEvent, ConfigStore};

/// Holds the latest drive flags read from a [`ConfigStore`].
///
/// Constructed once by the host and shared by reference. Readers always get
/// a whole [`Settings`] snapshot, and `subscribe` hands out receivers that
/// observe every change applied through
/// [`SettingsStore::handle_configuration_change`].
pub struct SettingsStore {
    config: Arc<dyn ConfigStore>,
    sender: watch::Sender<Settings>,
}

impl SettingsStore {
    /// Creates a store and performs the initial read from `config`.
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        let settings = read_settings(config.as_ref());
        let (sender, _receiver) = watch::channel(settings);

        Self { config, sender }
    }

    /// Returns the last synchronized settings snapshot.
    pub fn settings(&self) -> Settings {
        *self.sender.borrow()
    }

    /// Returns whether the per-user drive is enabled.
    pub fn enable_user_prompt_drive(&self) -> bool {
        self.settings().enable_user_drive
    }

    /// Returns whether the repository drive should be shown.
    pub fn use_repository_prompt_drive(&self) -> bool {
        self.settings().use_repository_drive
    }

    /// Subscribes to settings snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.sender.subscribe()
    }

    /// Re-reads both flags when `event` touches the drive namespace.
    ///
    /// Returns whether the stored snapshot changed. The re-read finishes
    /// before this returns, so no later accessor call sees stale values.
    pub fn handle_configuration_change(&self, event: &ConfigChangeEvent) -> bool {
        if !event.affects_configuration(SETTINGS_NAMESPACE) {
            return false;
        }

        let latest = read_settings(self.config.as_ref());
        let changed = self.sender.send_if_modified(|current| {
            if *current == latest {
                return false;
            }

            *current = latest;

            true
        });
        debug!(?latest, changed, "settings re-read after configuration change");

        changed
    }
}

/// Reads every drive flag from `config`, applying per-setting defaults.
fn read_settings(config: &dyn ConfigStore) -> Settings {
    let read = |setting: SettingName| {
        config.get_bool(&setting.qualified_key(), setting.default_value())
    };

    Settings {
        enable_user_drive: read(SettingName::EnableUserPromptDrive),
        use_repository_drive: read(SettingName::UseRepositoryPromptDrive),
    }
}
