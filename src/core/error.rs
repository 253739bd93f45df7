use crate::core::chat_config::HarmCategory;

/// Failures surfaced by a chat session. Each variant is reported to the user
/// as a readable line; none of them end the session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    #[error("Invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Blocked by safety filters{}: {reason}", category_suffix(.category))]
    SafetyBlock {
        category: Option<HarmCategory>,
        reason: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    /// Any other provider failure, carrying a formatted summary of the body.
    #[error("{0}")]
    Provider(String),

    #[error("Cannot send an empty conversation")]
    EmptyHistory,

    #[error("A reply is still pending; wait for it before sending another message")]
    SessionBusy,
}

fn category_suffix(category: &Option<HarmCategory>) -> String {
    category
        .map(|category| format!(" ({category})"))
        .unwrap_or_default()
}

impl ChatError {
    /// Short follow-up suggestion printed under the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ChatError::Authentication(_) => {
                Some("Set GOOGLE_API_KEY, pass --api-key, or use /key <value>.")
            }
            ChatError::RateLimit(_) => Some("Wait a moment, then send your message again."),
            ChatError::UnsupportedModel(_) => Some("Run /model to list supported models."),
            ChatError::SafetyBlock { .. } => {
                Some("Rephrase the message or relax the threshold with /safety.")
            }
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::InvalidConfig { .. } => "invalid_config",
            ChatError::UnsupportedModel(_) => "unsupported_model",
            ChatError::Authentication(_) => "authentication",
            ChatError::RateLimit(_) => "rate_limit",
            ChatError::SafetyBlock { .. } => "safety_block",
            ChatError::Network(_) => "network",
            ChatError::Provider(_) => "provider",
            ChatError::EmptyHistory => "empty_history",
            ChatError::SessionBusy => "session_busy",
        }
    }
}
