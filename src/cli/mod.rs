//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod model_list;
pub mod say;
pub mod settings;

use std::error::Error;

use clap::{Parser, Subcommand};

use crate::cli::chat::run_chat;
use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::cli::settings::{apply_setting, unset_setting, SettingRegistry};
use crate::core::app::SessionOptions;
use crate::core::config::data::path_display;
use crate::core::config::Config;
use crate::logging::init_tracing;

#[derive(Parser)]
#[command(name = "gemichat")]
#[command(version)]
#[command(about = "A terminal chat client for Google's Gemini models")]
#[command(
    long_about = "Gemichat is a line-oriented terminal chat client for the Gemini API. \
Replies stream in as they are generated; the conversation lives for the session only.\n\n\
Environment Variables:\n\
  GOOGLE_API_KEY    Your Gemini API key (GEMINI_API_KEY is also accepted)\n\
  GEMINI_BASE_URL   Custom API base URL (optional)\n\
  GEMICHAT_CONFIG   Path of the defaults file (optional)\n\
  GEMICHAT_LOG      Log filter, e.g. 'gemichat=debug' (optional)\n\n\
Chat Commands:\n\
  /help             List every command\n\
  /model <id>       Switch models\n\
  /reset            Start over with the same settings\n\
  /quit             Leave"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model id or display name for this run
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature between 0.0 and 1.0
    #[arg(short = 't', long, global = true, value_name = "TEMP")]
    pub temperature: Option<f32>,

    /// Reply length limit in tokens (1-8192)
    #[arg(long = "max-tokens", global = true, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// System prompt for this run
    #[arg(short = 's', long = "system", global = true, value_name = "PROMPT")]
    pub system: Option<String>,

    /// API key; overrides GOOGLE_API_KEY and GEMINI_API_KEY
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Log debug diagnostics to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Send a single prompt and print the streamed reply
    Say {
        /// Prompt text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List supported models
    Models,
    /// Show the defaults file and its values
    Config,
    /// Set a value in the defaults file
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a value in the defaults file
    Unset {
        /// Configuration key to unset
        key: String,
        /// Narrows the removal, e.g. a safety category
        value: Option<String>,
    },
}

impl Args {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_tokens,
            system_prompt: self.system.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

fn print_config() -> Result<(), Box<dyn Error>> {
    let path = Config::get_config_path()?;
    let config = Config::load_from_path(&path)?;
    println!("📄 {}", path_display(&path));
    config.print_all();
    println!();
    println!(
        "Keys: {}",
        SettingRegistry::new().keys_display_order().join(", ")
    );
    Ok(())
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let options = args.session_options();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(options).await,
        Commands::Say { prompt } => run_say(prompt, options).await,
        Commands::Models => list_models(),
        Commands::Config => print_config(),
        Commands::Set { key, value } => {
            if value.is_empty() {
                return print_config();
            }
            match apply_setting(&key, &value) {
                Ok(message) => {
                    println!("{message}");
                    Ok(())
                }
                Err(err) => {
                    err.print();
                    std::process::exit(err.exit_code());
                }
            }
        }
        Commands::Unset { key, value } => match unset_setting(&key, value.as_deref()) {
            Ok(message) => {
                println!("{message}");
                Ok(())
            }
            Err(err) => {
                err.print();
                std::process::exit(err.exit_code());
            }
        },
    }
}
