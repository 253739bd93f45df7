//! Settings management for CLI set/unset commands.
//!
//! Each key of the defaults file has a [`SettingHandler`] that validates
//! input the same way a live session does before it touches the file.

pub mod error;
pub mod handlers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::data::Config;

/// Trait for handling a configuration setting.
///
/// Handlers edit an in-memory [`Config`]; loading and saving the file is
/// the caller's job.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the configuration value from the words after the key.
    ///
    /// Returns a success message to display.
    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError>;

    /// Unset (clear) the configuration value. `arg` narrows the removal for
    /// keyed settings such as `safety`.
    fn unset(&self, arg: Option<&str>, config: &mut Config) -> Result<String, SettingError>;
}

pub(crate) fn success_set(key: &str, value: &str) -> String {
    format!("✅ Set {key} to: {value}")
}

pub(crate) fn success_unset(key: &str) -> String {
    format!("✅ Unset {key}")
}

/// Apply `gemichat set <key> <value…>` to the file at the default location.
pub fn apply_setting(key: &str, args: &[String]) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    let mut config = Config::load().map_err(|err| SettingError::ConfigError(err.to_string()))?;
    let message = handler.set(args, &mut config)?;
    config
        .save()
        .map_err(|err| SettingError::ConfigError(err.to_string()))?;
    Ok(message)
}

/// Apply `gemichat unset <key> [arg]` to the file at the default location.
pub fn unset_setting(key: &str, arg: Option<&str>) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    let mut config = Config::load().map_err(|err| SettingError::ConfigError(err.to_string()))?;
    let message = handler.unset(arg, &mut config)?;
    config
        .save()
        .map_err(|err| SettingError::ConfigError(err.to_string()))?;
    Ok(message)
}
