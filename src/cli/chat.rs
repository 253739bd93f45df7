//! Line-oriented interactive chat loop.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

use crate::commands::{process_input, CommandResult};
use crate::core::app::{App, AppMessageKind, SessionOptions};
use crate::core::config::Config;

const USER_PROMPT: &str = "You: ";
const ASSISTANT_PREFIX: &str = "Gemini: ";

fn print_notices(app: &mut App) {
    for notice in app.drain_notices() {
        match notice.kind {
            AppMessageKind::Info => println!("{}", notice.text),
            AppMessageKind::Warning => eprintln!("⚠️  {}", notice.text),
            AppMessageKind::Error => eprintln!("❌ {}", notice.text),
        }
    }
}

fn print_chunk(chunk: &str) {
    print!("{chunk}");
    let _ = io::stdout().flush();
}

/// Send one message and stream the reply to stdout. Failures become error
/// notices; the loop keeps going.
async fn send_message(app: &mut App, text: String) -> Result<(), Box<dyn Error>> {
    print!("{ASSISTANT_PREFIX}");
    io::stdout().flush()?;

    let mut on_chunk = |chunk: &str| print_chunk(chunk);
    let result = app.session.submit_streaming(text, &mut on_chunk).await;
    println!();

    if let Err(err) = result {
        debug!(kind = err.kind(), "chat turn failed");
        app.add_error(&err);
    }
    Ok(())
}

enum InputLine {
    Text(String),
    Skipped,
    Closed,
}

/// Read the next line of user input. Undecodable lines become a warning
/// instead of ending the session.
async fn next_input<R>(lines: &mut Lines<R>, app: &mut App) -> io::Result<InputLine>
where
    R: AsyncBufRead + Unpin,
{
    match lines.next_line().await {
        Ok(Some(line)) => Ok(InputLine::Text(line)),
        Ok(None) => Ok(InputLine::Closed),
        Err(err) if err.kind() == io::ErrorKind::InvalidData => {
            debug!(%err, "discarding undecodable input line");
            app.add_warning("Input was not valid UTF-8 and was ignored.");
            Ok(InputLine::Skipped)
        }
        Err(err) => Err(err),
    }
}

pub async fn run_chat(options: SessionOptions) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let mut app = App::bootstrap(&options, &config, |name| std::env::var(name).ok())?;

    println!("{}", app.banner());
    print_notices(&mut app);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{USER_PROMPT}");
        io::stdout().flush()?;

        let line = match next_input(&mut lines, &mut app).await? {
            InputLine::Text(line) => line,
            InputLine::Skipped => {
                print_notices(&mut app);
                continue;
            }
            InputLine::Closed => {
                println!();
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match process_input(&mut app, &line) {
            CommandResult::Continue => {}
            CommandResult::Quit => break,
            CommandResult::ProcessAsMessage(text) => send_message(&mut app, text).await?,
        }
        print_notices(&mut app);
    }

    Ok(())
}
