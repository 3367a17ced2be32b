/// Configuration namespace that scopes every Prompt Drive key.
pub const SETTINGS_NAMESPACE: &str = "promptDrive";

/// Names of configurable drive settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SettingName {
    EnableUserPromptDrive,
    UseRepositoryPromptDrive,
}

impl SettingName {
    /// Returns the key name inside [`SETTINGS_NAMESPACE`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnableUserPromptDrive => "enableUserPromptDrive",
            Self::UseRepositoryPromptDrive => "useRepositoryPromptDrive",
        }
    }

    /// Returns the fully qualified key, e.g. `promptDrive.enableUserPromptDrive`.
    pub fn qualified_key(self) -> String {
        format!("{SETTINGS_NAMESPACE}.{}", self.as_str())
    }

    /// Returns the value used when the configuration store has none.
    pub fn default_value(self) -> bool {
        match self {
            Self::EnableUserPromptDrive | Self::UseRepositoryPromptDrive => true,
        }
    }
}

/// Snapshot of the drive flags as last read from configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Settings {
    pub enable_user_drive: bool,
    pub use_repository_drive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_user_drive: SettingName::EnableUserPromptDrive.default_value(),
            use_repository_drive: SettingName::UseRepositoryPromptDrive.default_value(),
        }
    }
}
