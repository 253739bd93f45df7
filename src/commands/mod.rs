mod registry;

pub use registry::{all_commands, matching_commands, CommandInvocation};

use crate::api::models::{display_name_for, supported_models};
use crate::core::app::App;
use crate::core::chat_config::{
    parse_max_output_tokens, parse_safety_setting, parse_temperature, ConfigPatch,
};
use crate::core::error::ChatError;

#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(app, CommandInvocation { args })
    } else {
        let suggestions: Vec<String> = matching_commands(command_name)
            .iter()
            .map(|command| format!("/{}", command.name))
            .collect();
        let message = if suggestions.is_empty() {
            format!("Unknown command: /{command_name}. Type /help for a list.")
        } else {
            format!(
                "Unknown command: /{command_name}. Did you mean {}?",
                suggestions.join(" or ")
            )
        };
        app.add_warning(message);
        CommandResult::Continue
    }
}

fn apply_patch(app: &mut App, patch: ConfigPatch, confirmation: impl FnOnce(&App) -> String) {
    match app.session.set_config(&patch) {
        Ok(()) => {
            let message = confirmation(app);
            app.add_info(message);
        }
        Err(err) => app.add_error(&err),
    }
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help = String::from("Commands:");
    for command in all_commands() {
        for usage in command.usages {
            help.push_str(&format!("\n  {:<44} {}", usage.syntax, usage.description));
        }
    }
    help.push_str("\nAnything else is sent to the model.");
    app.add_info(help);
    CommandResult::Continue
}

pub(super) fn handle_reset(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.session.reset();
    app.add_info("Conversation cleared.");
    CommandResult::Continue
}

pub(super) fn handle_model(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let current = app.session.config().model_id().to_string();
        let mut listing = String::from("Supported models:");
        for model in supported_models() {
            let marker = if model.id == current { "*" } else { " " };
            listing.push_str(&format!(
                "\n {marker} {} ({})",
                model.id, model.display_name
            ));
        }
        app.add_info(listing);
        return CommandResult::Continue;
    }

    apply_patch(app, ConfigPatch::new().model_id(invocation.args), |app| {
        let config = app.session.config();
        format!(
            "Model set to {} ({}).",
            display_name_for(config.model_id()),
            config.model_id()
        )
    });
    CommandResult::Continue
}

pub(super) fn handle_temperature(
    app: &mut App,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        let message = format!("Temperature: {}", app.session.config().temperature());
        app.add_info(message);
        return CommandResult::Continue;
    }

    match parse_temperature(invocation.args) {
        Ok(temperature) => apply_patch(app, ConfigPatch::new().temperature(temperature), |app| {
            format!("Temperature set to {}.", app.session.config().temperature())
        }),
        Err(err) => app.add_error(&err),
    }
    CommandResult::Continue
}

pub(super) fn handle_max_tokens(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let message = format!(
            "Max output tokens: {}",
            app.session.config().max_output_tokens()
        );
        app.add_info(message);
        return CommandResult::Continue;
    }

    match parse_max_output_tokens(invocation.args) {
        Ok(limit) => apply_patch(app, ConfigPatch::new().max_output_tokens(limit), |app| {
            format!(
                "Max output tokens set to {}.",
                app.session.config().max_output_tokens()
            )
        }),
        Err(err) => app.add_error(&err),
    }
    CommandResult::Continue
}

pub(super) fn handle_system(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let prompt = (!invocation.args.is_empty()).then(|| invocation.args.to_string());
    apply_patch(app, ConfigPatch::new().system_prompt(prompt), |app| {
        match app.session.config().system_prompt() {
            Some(_) => "System prompt set.".to_string(),
            None => "System prompt cleared.".to_string(),
        }
    });
    CommandResult::Continue
}

pub(super) fn handle_safety(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let parts: Vec<&str> = invocation.args.split_whitespace().collect();
    let [category, threshold] = parts.as_slice() else {
        app.add_error(&ChatError::InvalidConfig {
            field: "safety_thresholds",
            reason: "usage: /safety <category> <none|high|medium|low>".to_string(),
        });
        return CommandResult::Continue;
    };

    match parse_safety_setting(category, threshold) {
        Ok((category, threshold)) => apply_patch(
            app,
            ConfigPatch::new().safety_threshold(category, threshold),
            |_| format!("Safety for {} set to {}.", category.key(), threshold.key()),
        ),
        Err(err) => app.add_error(&err),
    }
    CommandResult::Continue
}

pub(super) fn handle_config(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let description = app.describe_config();
    app.add_info(description);
    CommandResult::Continue
}

pub(super) fn handle_key(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    match app.set_api_key(invocation.args) {
        Ok(()) => app.add_info("API key updated for this session."),
        Err(err) => app.add_error(&err),
    }
    CommandResult::Continue
}

pub(super) fn handle_quit(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
