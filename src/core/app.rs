use std::collections::VecDeque;
use std::sync::Arc;

use crate::api::models::display_name_for;
use crate::core::chat_config::{ChatConfig, ConfigPatch};
use crate::core::config::Config;
use crate::core::credentials::{resolve_api_key, resolve_base_url, CredentialSource};
use crate::core::error::ChatError;
use crate::core::gateway::InferenceGateway;
use crate::core::gemini::GeminiGateway;
use crate::core::session::ChatSession;

/// Per-run overrides, typically from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub api_key: Option<String>,
}

impl SessionOptions {
    pub fn to_patch(&self) -> ConfigPatch {
        ConfigPatch {
            model_id: self.model.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            system_prompt: self.system_prompt.clone().map(Some),
            ..ConfigPatch::default()
        }
    }
}

/// Severity for app-authored lines shown to the user but never sent to the
/// model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMessageKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: AppMessageKind,
    pub text: String,
}

/// One interactive chat: the session plus the surface-level state the chat
/// loop and slash commands share.
pub struct App {
    pub session: ChatSession,
    gemini: Option<GeminiGateway>,
    credential_source: Option<CredentialSource>,
    notices: VecDeque<Notice>,
}

impl App {
    /// Build an app talking to Gemini. Flag overrides beat the defaults
    /// file, which beats the built-in defaults.
    pub fn bootstrap(
        options: &SessionOptions,
        config: &Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<App, ChatError> {
        let chat_config = config.chat_config(&options.to_patch())?;
        let credential = resolve_api_key(options.api_key.as_deref(), &lookup);
        let base_url = resolve_base_url(config, &lookup);
        let client = GeminiGateway::build_client(config.request_timeout())?;

        let credential_source = credential.as_ref().map(|credential| credential.source);
        let gemini = GeminiGateway::new(
            client,
            base_url,
            credential.map(|credential| credential.api_key),
        );

        let mut app = App {
            session: ChatSession::new(Arc::new(gemini.clone()), chat_config),
            gemini: Some(gemini),
            credential_source,
            notices: VecDeque::new(),
        };
        if credential_source.is_none() {
            app.add_warning(
                "No API key found. Set GOOGLE_API_KEY or enter /key <value> before chatting.",
            );
        }
        Ok(app)
    }

    /// An app over an arbitrary gateway. `/key` is unavailable.
    pub fn with_gateway(gateway: Arc<dyn InferenceGateway>, config: ChatConfig) -> App {
        App {
            session: ChatSession::new(gateway, config),
            gemini: None,
            credential_source: None,
            notices: VecDeque::new(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.gemini
            .as_ref()
            .map(GeminiGateway::has_api_key)
            .unwrap_or(true)
    }

    pub fn credential_source(&self) -> Option<CredentialSource> {
        self.credential_source
    }

    /// Swap the credential used for the rest of this session.
    pub fn set_api_key(&mut self, api_key: &str) -> Result<(), ChatError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ChatError::InvalidConfig {
                field: "api_key",
                reason: "must not be blank".to_string(),
            });
        }
        let Some(current) = self.gemini.as_ref() else {
            return Err(ChatError::InvalidConfig {
                field: "api_key",
                reason: "this session does not use an API key".to_string(),
            });
        };

        let gemini = current.with_api_key(Some(api_key.to_string()));
        self.session.set_gateway(Arc::new(gemini.clone()));
        self.gemini = Some(gemini);
        self.credential_source = Some(CredentialSource::Command);
        Ok(())
    }

    pub fn add_notice(&mut self, kind: AppMessageKind, text: impl Into<String>) {
        self.notices.push_back(Notice {
            kind,
            text: text.into(),
        });
    }

    pub fn add_info(&mut self, text: impl Into<String>) {
        self.add_notice(AppMessageKind::Info, text);
    }

    pub fn add_warning(&mut self, text: impl Into<String>) {
        self.add_notice(AppMessageKind::Warning, text);
    }

    /// Record `error` with its follow-up suggestion, if any.
    pub fn add_error(&mut self, error: &ChatError) {
        let text = match error.hint() {
            Some(hint) => format!("{error}\n{hint}"),
            None => error.to_string(),
        };
        self.add_notice(AppMessageKind::Error, text);
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn banner(&self) -> String {
        let config = self.session.config();
        format!(
            "Gemini chat with {} ({}). Type /help for commands, /quit to leave.",
            display_name_for(config.model_id()),
            config.model_id()
        )
    }

    pub fn describe_config(&self) -> String {
        let config = self.session.config();
        let mut out = String::from("Session settings:\n");
        out.push_str(&format!(
            "  model: {} ({})\n",
            display_name_for(config.model_id()),
            config.model_id()
        ));
        out.push_str(&format!("  temperature: {}\n", config.temperature()));
        out.push_str(&format!(
            "  max-output-tokens: {}\n",
            config.max_output_tokens()
        ));
        out.push_str(&format!(
            "  system-prompt: {}\n",
            config.system_prompt().unwrap_or("(none)")
        ));
        out.push_str("  safety:\n");
        for (category, threshold) in config.safety_thresholds() {
            out.push_str(&format!("    {}: {}\n", category.key(), threshold.key()));
        }
        out.push_str(&format!("  turns: {}\n", self.session.turn_count()));
        let key = match self.credential_source {
            Some(source) => format!("from {source}"),
            None if self.gemini.is_some() => "(missing)".to_string(),
            None => "(not used)".to_string(),
        };
        out.push_str(&format!("  api-key: {key}"));
        out
    }
}
