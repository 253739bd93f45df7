//! Model listing functionality
//!
//! Lists the models the client can address, marking the configured default.

use crate::api::models::{supported_models, DEFAULT_MODEL_ID};
use crate::core::chat_config::validate_model_id;
use crate::core::config::Config;
use std::error::Error;

/// One line per model; the default is marked with `*`.
pub fn format_model_list(default_model: &str) -> Vec<String> {
    supported_models()
        .iter()
        .map(|model| {
            let marker = if model.id == default_model { "*" } else { " " };
            format!("{marker} {:<24} {}", model.id, model.display_name)
        })
        .collect()
}

pub fn list_models() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let default_model = match config.default_model.as_deref() {
        Some(model) => validate_model_id(model)?,
        None => DEFAULT_MODEL_ID.to_string(),
    };

    println!("🤖 Available Gemini models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for line in format_model_list(&default_model) {
        println!("{line}");
    }
    println!();
    println!("💡 Pick one for a run with -m <id>, or persist it with 'gemichat set default-model <id>'");
    Ok(())
}
