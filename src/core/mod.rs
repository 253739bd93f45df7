pub mod app;
pub mod chat_config;
pub mod config;
pub mod conversation;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod gemini;
pub mod message;
pub mod session;
