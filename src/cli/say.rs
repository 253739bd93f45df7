//! Non-interactive "say" command: one prompt, one streamed reply.

use std::error::Error;
use std::io::{self, Write};

use crate::core::app::{App, SessionOptions};
use crate::core::config::Config;

pub async fn run_say(prompt: Vec<String>, options: SessionOptions) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: gemichat say <prompt>");
        std::process::exit(2);
    }

    let config = Config::load()?;
    let mut app = App::bootstrap(&options, &config, |name| std::env::var(name).ok())?;
    if !app.has_api_key() {
        eprintln!("❌ No API key found");
        eprintln!("   Set GOOGLE_API_KEY or pass --api-key <KEY>");
        std::process::exit(1);
    }
    app.drain_notices();

    let mut on_chunk = |chunk: &str| {
        print!("{chunk}");
        let _ = io::stdout().flush();
    };
    match app.session.submit_streaming(prompt, &mut on_chunk).await {
        Ok(_) => {
            println!();
            Ok(())
        }
        Err(err) => {
            eprintln!("\n❌ {err}");
            if let Some(hint) = err.hint() {
                eprintln!("   {hint}");
            }
            std::process::exit(1);
        }
    }
}
