use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct CommandUsage {
    pub syntax: &'static str,
    pub description: &'static str,
}

pub struct Command {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usages: &'static [CommandUsage],
    pub handler: CommandHandler,
}

impl Command {
    fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands().iter().find(|command| command.answers_to(name))
}

/// Commands whose name starts with `prefix`, for completion hints.
pub fn matching_commands(prefix: &str) -> Vec<&'static Command> {
    let prefix = prefix.to_ascii_lowercase();
    all_commands()
        .iter()
        .filter(|command| command.name.starts_with(&prefix))
        .collect()
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        aliases: &[],
        usages: &[CommandUsage {
            syntax: "/help",
            description: "Show available commands.",
        }],
        handler: super::handle_help,
    },
    Command {
        name: "reset",
        aliases: &["clear"],
        usages: &[CommandUsage {
            syntax: "/reset",
            description: "Start a new conversation; settings are kept. Alias: /clear.",
        }],
        handler: super::handle_reset,
    },
    Command {
        name: "model",
        aliases: &[],
        usages: &[
            CommandUsage {
                syntax: "/model",
                description: "List supported models.",
            },
            CommandUsage {
                syntax: "/model <id>",
                description: "Use another model from the next message on.",
            },
        ],
        handler: super::handle_model,
    },
    Command {
        name: "temperature",
        aliases: &["temp"],
        usages: &[CommandUsage {
            syntax: "/temperature <0.0-1.0>",
            description: "Set sampling temperature.",
        }],
        handler: super::handle_temperature,
    },
    Command {
        name: "max-tokens",
        aliases: &[],
        usages: &[CommandUsage {
            syntax: "/max-tokens <1-8192>",
            description: "Set the reply length limit.",
        }],
        handler: super::handle_max_tokens,
    },
    Command {
        name: "system",
        aliases: &[],
        usages: &[
            CommandUsage {
                syntax: "/system <text>",
                description: "Set the system prompt.",
            },
            CommandUsage {
                syntax: "/system",
                description: "Clear the system prompt.",
            },
        ],
        handler: super::handle_system,
    },
    Command {
        name: "safety",
        aliases: &[],
        usages: &[CommandUsage {
            syntax: "/safety <category> <none|high|medium|low>",
            description: "Set the block threshold for one harm category.",
        }],
        handler: super::handle_safety,
    },
    Command {
        name: "config",
        aliases: &[],
        usages: &[CommandUsage {
            syntax: "/config",
            description: "Show the current session settings.",
        }],
        handler: super::handle_config,
    },
    Command {
        name: "key",
        aliases: &[],
        usages: &[CommandUsage {
            syntax: "/key <api-key>",
            description: "Use this API key for the rest of the session.",
        }],
        handler: super::handle_key,
    },
    Command {
        name: "quit",
        aliases: &["exit"],
        usages: &[CommandUsage {
            syntax: "/quit",
            description: "Leave the chat. Alias: /exit.",
        }],
        handler: super::handle_quit,
    },
];
