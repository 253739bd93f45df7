//! API key and endpoint resolution.
//!
//! The key comes from the `--api-key` flag when given, otherwise from the
//! environment. It is never written to the defaults file.

use std::fmt;

use crate::core::config::Config;
use crate::core::gemini::DEFAULT_BASE_URL;

/// Checked in order; the first non-blank value wins.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];
pub const BASE_URL_ENV_VAR: &str = "GEMINI_BASE_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Flag,
    Env(&'static str),
    Command,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Flag => write!(f, "--api-key"),
            CredentialSource::Env(name) => write!(f, "${name}"),
            CredentialSource::Command => write!(f, "/key"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub api_key: String,
    pub source: CredentialSource,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn resolve_api_key(
    flag: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<Credential> {
    if let Some(api_key) = non_blank(flag.map(str::to_string)) {
        return Some(Credential {
            api_key,
            source: CredentialSource::Flag,
        });
    }

    API_KEY_ENV_VARS.iter().find_map(|&name| {
        non_blank(lookup(name)).map(|api_key| Credential {
            api_key,
            source: CredentialSource::Env(name),
        })
    })
}

/// Environment beats the defaults file, which beats the public endpoint.
pub fn resolve_base_url(config: &Config, lookup: impl Fn(&str) -> Option<String>) -> String {
    non_blank(lookup(BASE_URL_ENV_VAR))
        .or_else(|| non_blank(config.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
