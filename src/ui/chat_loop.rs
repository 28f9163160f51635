//! Interactive line-oriented chat.
//!
//! Reads stdin one line at a time and prints the transcript as the session
//! reports it. Lines starting with `/` are local commands and never reach the
//! backend.

use std::error::Error;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::core::session::{ChatSession, SessionHandle, SessionUpdate};
use crate::ui::renderer::{settled_messages, Renderer};
use crate::utils::logging::LoggingState;

/// Everything needed to start a session, already resolved from config and
/// flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOptions {
    pub server: String,
    pub assistant: String,
    pub retry_delay: Duration,
    pub log_file: Option<String>,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Quit,
    Log(Option<String>),
    Status,
    Help,
    Message(String),
}

pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    match parts.next() {
        Some("/quit") | Some("/exit") => ChatInput::Quit,
        Some("/status") => ChatInput::Status,
        Some("/help") => ChatInput::Help,
        Some("/log") => {
            let file = parts
                .next()
                .map(str::trim)
                .filter(|rest| !rest.is_empty())
                .map(str::to_string);
            ChatInput::Log(file)
        }
        _ => ChatInput::Message(line.to_string()),
    }
}

const HELP_TEXT: &str = "Commands:\n  \
/status           Show connection and logging status\n  \
/log <filename>   Enable logging to specified file\n  \
/log              Toggle logging pause/resume\n  \
/quit             Leave the chat";

pub async fn run_chat(options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let session = ChatSession::for_origin(
        &options.server,
        options.retry_delay,
        Some(options.assistant.clone()),
        reqwest::Client::new(),
    )?;
    let mut logging = LoggingState::new(options.log_file.clone())?;
    let mut renderer = Renderer::new(options.assistant.clone()).with_verbose(options.verbose);
    let mut handle = session.start();

    eprintln!("💬 Chatting with {} at {}", options.assistant, options.server);
    eprintln!("💡 Type /help for commands, /quit to leave");

    let input = BufReader::new(tokio::io::stdin());
    let result = chat_loop(input, &mut handle, &mut renderer, &mut logging).await;
    stop_session(handle).await;
    result
}

/// Runs until the input ends, the user leaves or the session goes away. The
/// caller keeps the handle and is responsible for stopping the session.
pub async fn chat_loop<R>(
    input: R,
    handle: &mut SessionHandle,
    renderer: &mut Renderer,
    logging: &mut LoggingState,
) -> Result<(), Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !handle_input(&line, handle, renderer, logging)? {
                        return Ok(());
                    }
                }
                None => return Ok(()),
            },
            update = handle.next_update() => match update {
                Some(update) => show_update(&update, renderer, logging),
                None => return Ok(()),
            },
        }
    }
}

// Returns false when the user asked to leave.
fn handle_input(
    line: &str,
    handle: &SessionHandle,
    renderer: &Renderer,
    logging: &mut LoggingState,
) -> Result<bool, Box<dyn Error>> {
    match parse_input(line) {
        ChatInput::Quit => return Ok(false),
        ChatInput::Help => println!("{HELP_TEXT}"),
        ChatInput::Status => {
            let status = renderer
                .last_status()
                .map(|status| status.label())
                .unwrap_or("connecting");
            println!("## connection: {status}");
            println!("## logging: {}", logging.get_status_string());
        }
        ChatInput::Log(file) => {
            let outcome = match file {
                Some(path) => logging.set_log_file(path),
                None => logging.toggle_logging(),
            };
            match outcome {
                Ok(message) => println!("## {message}"),
                Err(err) => eprintln!("❌ {err}"),
            }
        }
        ChatInput::Message(text) => handle.send(text)?,
    }
    Ok(true)
}

fn show_update(update: &SessionUpdate, renderer: &mut Renderer, logging: &LoggingState) {
    for line in renderer.render(update) {
        println!("{line}");
    }
    if let SessionUpdate::Display(ops) = update {
        for message in settled_messages(ops) {
            if let Err(err) = logging.log_display(message) {
                warn!(error = %err, "failed to write transcript");
            }
        }
    }
}

pub(crate) async fn stop_session(handle: SessionHandle) {
    if let Err(err) = handle.stop().await {
        warn!(error = %err, "chat session task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_session() -> SessionHandle {
        ChatSession::for_origin(
            "http://127.0.0.1:9",
            Duration::from_secs(3600),
            Some("ruby".to_string()),
            reqwest::Client::new(),
        )
        .unwrap()
        .start()
    }

    #[tokio::test]
    async fn unreadable_input_returns_the_error_and_leaves_the_session_stoppable() {
        let mut handle = idle_session();
        let mut renderer = Renderer::new("ruby");
        let mut logging = LoggingState::new(None).unwrap();

        let result = chat_loop(&b"\xff\xfe\n"[..], &mut handle, &mut renderer, &mut logging).await;
        assert!(result.is_err());

        let session = handle.stop().await.unwrap();
        assert!(session.tracker().messages().is_empty());
    }

    #[tokio::test]
    async fn quit_stops_before_later_lines_are_sent() {
        let mut handle = idle_session();
        let mut renderer = Renderer::new("ruby");
        let mut logging = LoggingState::new(None).unwrap();

        let input: &[u8] = b"/quit\nhello\n";
        chat_loop(input, &mut handle, &mut renderer, &mut logging)
            .await
            .unwrap();

        let session = handle.stop().await.unwrap();
        assert!(session.tracker().messages().is_empty());
    }

    #[test]
    fn slash_commands_are_recognised() {
        assert_eq!(parse_input("/quit"), ChatInput::Quit);
        assert_eq!(parse_input("  /exit  "), ChatInput::Quit);
        assert_eq!(parse_input("/status"), ChatInput::Status);
        assert_eq!(parse_input("/log"), ChatInput::Log(None));
        assert_eq!(
            parse_input("/log  chat.log "),
            ChatInput::Log(Some("chat.log".to_string()))
        );
    }

    #[test]
    fn everything_else_is_a_message() {
        assert_eq!(
            parse_input("hello there"),
            ChatInput::Message("hello there".to_string())
        );
        assert_eq!(
            parse_input("/unknown thing"),
            ChatInput::Message("/unknown thing".to_string())
        );
        assert_eq!(parse_input(""), ChatInput::Message(String::new()));
    }
}
