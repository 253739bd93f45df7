//! The boundary between a chat session and the model-inference service.
//!
//! Sessions depend only on [`InferenceGateway`]; the production implementation
//! lives in [`crate::core::gemini`] and tests substitute a stub.

use async_trait::async_trait;

use crate::api::models::is_supported_model;
use crate::api::{Content, GenerateContentRequest, GenerationConfig, Part, SafetySetting};
use crate::core::chat_config::ChatConfig;
use crate::core::error::ChatError;
use crate::core::message::{Role, Turn};

/// Receives streamed text fragments as they arrive.
pub type ChunkSink<'a> = &'a mut (dyn FnMut(&str) + Send);

#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Send the full history and return the assistant's reply.
    async fn send(&self, history: &[Turn], config: &ChatConfig) -> Result<Turn, ChatError>;

    /// Like [`InferenceGateway::send`], but reports text through `on_chunk`
    /// while the reply is still being generated.
    async fn send_streaming(
        &self,
        history: &[Turn],
        config: &ChatConfig,
        on_chunk: ChunkSink<'_>,
    ) -> Result<Turn, ChatError> {
        let reply = self.send(history, config).await?;
        on_chunk(reply.text());
        Ok(reply)
    }
}

/// Check the preconditions every gateway call shares.
pub fn validate_input(history: &[Turn], config: &ChatConfig) -> Result<(), ChatError> {
    if history.is_empty() {
        return Err(ChatError::EmptyHistory);
    }
    if !is_supported_model(config.model_id()) {
        return Err(ChatError::UnsupportedModel(config.model_id().to_string()));
    }
    Ok(())
}

/// Build the provider request for `history` under `config`.
///
/// The configured system prompt, followed by any system turns in the history,
/// becomes the `systemInstruction`; user and assistant turns keep their order
/// in `contents`. Adjacent turns with the same role share one `Content`, since
/// some models only accept strictly alternating roles.
pub fn build_request(history: &[Turn], config: &ChatConfig) -> GenerateContentRequest {
    let mut instructions: Vec<&str> = config.system_prompt().into_iter().collect();
    let mut contents: Vec<Content> = Vec::with_capacity(history.len());

    for turn in history {
        match turn.role().to_api_role() {
            Some(api_role) => match contents.last_mut() {
                Some(previous) if previous.role.as_deref() == Some(api_role) => {
                    previous.parts.push(Part::text(turn.text()))
                }
                _ => contents.push(Content::text(Some(api_role), turn.text())),
            },
            None => {
                debug_assert_eq!(turn.role(), Role::System);
                instructions.push(turn.text());
            }
        }
    }

    let system_instruction =
        (!instructions.is_empty()).then(|| Content::text(None, instructions.join("\n\n")));

    let safety_settings = config
        .safety_thresholds()
        .iter()
        .map(|(category, threshold)| SafetySetting {
            category: *category,
            threshold: *threshold,
        })
        .collect();

    GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: GenerationConfig {
            temperature: config.temperature(),
            max_output_tokens: config.max_output_tokens(),
        },
        safety_settings,
    }
}
