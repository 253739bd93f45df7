//! Per-session chat state: the transcript, the active settings and the
//! Idle/AwaitingReply state machine around the inference gateway.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::core::chat_config::{ChatConfig, ConfigPatch};
use crate::core::conversation::Conversation;
use crate::core::error::ChatError;
use crate::core::gateway::{ChunkSink, InferenceGateway};
use crate::core::message::{Role, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
}

/// Holds the busy flag for the duration of one gateway call. Dropping the
/// guard returns the session to `Idle`, including when the call future is
/// dropped early.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ChatError> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| ChatError::SessionBusy)?;
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct ChatSession {
    conversation: Mutex<Conversation>,
    config: Mutex<ChatConfig>,
    gateway: Arc<dyn InferenceGateway>,
    busy: AtomicBool,
    /// Bumped by `reset` so a reply that lands after a reset is discarded.
    epoch: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatSession {
    pub fn new(gateway: Arc<dyn InferenceGateway>, config: ChatConfig) -> Self {
        Self {
            conversation: Mutex::new(Conversation::new()),
            config: Mutex::new(config),
            gateway,
            busy: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.busy.load(Ordering::Acquire) {
            SessionState::AwaitingReply
        } else {
            SessionState::Idle
        }
    }

    pub fn append_turn(&self, role: Role, text: impl Into<String>) {
        lock(&self.conversation).append_turn(role, text);
    }

    /// Snapshot of the transcript in insertion order.
    pub fn history(&self) -> Vec<Turn> {
        lock(&self.conversation).history().to_vec()
    }

    pub fn turn_count(&self) -> usize {
        lock(&self.conversation).len()
    }

    pub fn reset(&self) {
        lock(&self.conversation).reset();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        debug!("conversation reset");
    }

    pub fn config(&self) -> ChatConfig {
        lock(&self.config).clone()
    }

    /// Merge `patch` into the active settings. On error nothing changes.
    /// Changes apply from the next gateway call on.
    pub fn set_config(&self, patch: &ConfigPatch) -> Result<(), ChatError> {
        lock(&self.config).apply(patch)
    }

    pub fn set_gateway(&mut self, gateway: Arc<dyn InferenceGateway>) {
        self.gateway = gateway;
    }

    /// Append `text` as a user turn, ask the gateway for a reply and append
    /// it. On failure the user turn stays in history without a reply.
    pub async fn submit(&self, text: impl Into<String>) -> Result<Turn, ChatError> {
        let mut ignore = |_: &str| {};
        self.dispatch(text.into(), false, &mut ignore).await
    }

    /// [`ChatSession::submit`] with incremental delivery of the reply text.
    pub async fn submit_streaming(
        &self,
        text: impl Into<String>,
        on_chunk: ChunkSink<'_>,
    ) -> Result<Turn, ChatError> {
        self.dispatch(text.into(), true, on_chunk).await
    }

    async fn dispatch(
        &self,
        text: String,
        streaming: bool,
        on_chunk: ChunkSink<'_>,
    ) -> Result<Turn, ChatError> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let (history, config, epoch) = {
            let mut conversation = lock(&self.conversation);
            conversation.append_turn(Role::User, text);
            (
                conversation.history().to_vec(),
                self.config(),
                self.epoch.load(Ordering::Acquire),
            )
        };

        let result = if streaming {
            self.gateway
                .send_streaming(&history, &config, on_chunk)
                .await
        } else {
            self.gateway.send(&history, &config).await
        };

        match result {
            Ok(reply) => {
                if self.epoch.load(Ordering::Acquire) == epoch {
                    lock(&self.conversation).push(reply.clone());
                } else {
                    debug!("discarding reply that arrived after a reset");
                }
                info!(
                    model = config.model_id(),
                    turns = history.len() + 1,
                    "reply received"
                );
                Ok(reply)
            }
            Err(err) => {
                info!(model = config.model_id(), kind = err.kind(), "request failed");
                Err(err)
            }
        }
    }
}
