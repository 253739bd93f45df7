use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::chat_config::{parse_safety_setting, ChatConfig, ConfigPatch};
use crate::core::error::ChatError;

/// Defaults persisted between runs. Every field is optional; unset fields
/// fall back to the built-in [`ChatConfig`] defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Model id or display name (e.g., "gemini-1.5-pro-latest")
    pub default_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    /// Override for the Generative Language API endpoint
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Per-category block level, keyed by short category name
    /// (e.g., `harassment = "none"`). Kept last so it serializes as a
    /// trailing TOML table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub safety: BTreeMap<String, String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    /// The stored defaults as an unvalidated patch; validation happens when
    /// the patch is applied to a [`ChatConfig`].
    pub fn to_patch(&self) -> Result<ConfigPatch, ChatError> {
        let mut patch = ConfigPatch {
            model_id: self.default_model.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            system_prompt: self.system_prompt.clone().map(Some),
            ..ConfigPatch::default()
        };
        for (category, threshold) in &self.safety {
            let (category, threshold) = parse_safety_setting(category, threshold)?;
            patch.safety_thresholds.insert(category, threshold);
        }
        Ok(patch)
    }

    /// Build the starting session settings: built-in defaults, then this
    /// file, then `overrides` (typically command-line flags).
    pub fn chat_config(&self, overrides: &ConfigPatch) -> Result<ChatConfig, ChatError> {
        let mut config = ChatConfig::default();
        config.apply(&self.to_patch()?)?;
        config.apply(overrides)?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
