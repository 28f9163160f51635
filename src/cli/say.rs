//! One-shot "say" command

use std::error::Error;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use crate::core::message::{DisplayMessage, Role};
use crate::core::session::{ChatSession, SessionHandle, SessionUpdate};
use crate::ui::chat_loop::{stop_session, ChatOptions};
use crate::ui::renderer::{action_lines, settled_messages};
use crate::utils::logging::LoggingState;

/// How long to wait for the first connection verdict before sending anyway.
const CONNECT_GRACE: Duration = Duration::from_secs(5);
const REPLY_TIMEOUT: Duration = Duration::from_secs(120);

pub async fn run_say(prompt: Vec<String>, options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: crystal say <prompt>");
        std::process::exit(1);
    }

    let session = ChatSession::for_origin(
        &options.server,
        options.retry_delay,
        Some(options.assistant.clone()),
        reqwest::Client::new(),
    )?;
    let logging = LoggingState::new(options.log_file.clone())?;
    let mut handle = session.start();

    // Sending before the first open attempt settles would always take the
    // fallback path.
    let _ = timeout(CONNECT_GRACE, wait_for_status(&mut handle)).await;

    handle.send(prompt)?;
    let reply = timeout(REPLY_TIMEOUT, first_reply(&mut handle, &logging)).await;
    stop_session(handle).await;

    match reply {
        Ok(Some(message)) if message.is_error() => {
            eprintln!("❌ Error: {}", message.content);
            std::process::exit(1);
        }
        Ok(Some(message)) => {
            println!("{}", message.content);
            if options.verbose {
                for line in action_lines(&message) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        Ok(None) => {
            eprintln!("❌ Session ended before a reply arrived");
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("❌ No reply within {} seconds", REPLY_TIMEOUT.as_secs());
            std::process::exit(1);
        }
    }
}

async fn wait_for_status(handle: &mut SessionHandle) {
    while let Some(update) = handle.next_update().await {
        if let SessionUpdate::Status(_) = update {
            return;
        }
    }
}

async fn first_reply(
    handle: &mut SessionHandle,
    logging: &LoggingState,
) -> Option<DisplayMessage> {
    while let Some(update) = handle.next_update().await {
        let SessionUpdate::Display(ops) = update else {
            continue;
        };
        for message in settled_messages(&ops) {
            if let Err(err) = logging.log_display(message) {
                warn!(error = %err, "failed to write transcript");
            }
            if message.role == Role::Assistant {
                return Some(message.clone());
            }
        }
    }
    None
}
