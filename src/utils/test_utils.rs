#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use tokio::sync::Notify;

#[cfg(test)]
use crate::core::app::App;
#[cfg(test)]
use crate::core::chat_config::ChatConfig;
#[cfg(test)]
use crate::core::error::ChatError;
#[cfg(test)]
use crate::core::gateway::{validate_input, InferenceGateway};
#[cfg(test)]
use crate::core::message::Turn;

/// What a [`StubGateway`] was asked to do.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub history: Vec<Turn>,
    pub config: ChatConfig,
}

/// Scripted inference boundary: answers calls from a queue of canned
/// results and records every request it receives.
#[cfg(test)]
#[derive(Default)]
pub struct StubGateway {
    responses: Mutex<VecDeque<Result<Turn, ChatError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

#[cfg(test)]
impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(Turn::assistant(text)))
    }

    pub fn fail(self, error: ChatError) -> Self {
        self.push(Err(error))
    }

    /// Signal `entered` when a call starts, then hold it until `release`.
    pub fn with_gate(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some((entered, release));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn push(self, response: Result<Turn, ChatError>) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(response);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl InferenceGateway for StubGateway {
    async fn send(&self, history: &[Turn], config: &ChatConfig) -> Result<Turn, ChatError> {
        validate_input(history, config)?;
        self.requests
            .lock()
            .expect("requests lock")
            .push(RecordedRequest {
                history: history.to_vec(),
                config: config.clone(),
            });

        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }

        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::Provider("stub has no response queued".into())))
    }
}

#[cfg(test)]
pub fn create_test_history() -> Vec<Turn> {
    vec![
        Turn::user("Hello"),
        Turn::assistant("Hi there!"),
        Turn::user("How are you?"),
        Turn::assistant("I'm doing well, thank you for asking!"),
    ]
}

/// An [`App`] over a stub gateway with default settings.
#[cfg(test)]
pub fn create_test_app() -> App {
    create_test_app_with(StubGateway::new())
}

#[cfg(test)]
pub fn create_test_app_with(gateway: StubGateway) -> App {
    App::with_gateway(Arc::new(gateway), ChatConfig::default())
}
