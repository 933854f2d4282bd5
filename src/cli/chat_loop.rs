//! Interactive chat session against the AI event assistant.
//!
//! A plain line-based loop: each line of input is either a slash command or a
//! prompt forwarded to the backend. Replies that carry events are rendered as
//! a table under the assistant's message.

use std::error::Error;
use std::io::{self, BufRead, Write};

use crate::api::client::ApiClient;
use crate::cli::events::render_events_table;
use crate::core::chat::{ChatController, ChatMessage};
use crate::core::session::SessionStore;
use crate::utils::logging::LoggingState;

const PROMPT: &str = "you> ";

pub async fn run_chat(
    client: &ApiClient,
    session: &SessionStore,
    log_file: Option<String>,
) -> Result<(), Box<dyn Error>> {
    if !session.is_authenticated() {
        return Err("Not logged in. Run `eventline login` first.".into());
    }

    let mut chat = ChatController::new();
    let mut logging = LoggingState::new(log_file)?;

    print_banner(session);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{PROMPT}");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            // EOF: end of session.
            println!();
            break;
        };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if handle_slash_command(command, &mut chat, &mut logging)? {
                break;
            }
            continue;
        }

        logging.log_message(&format!("{PROMPT}{input}"))?;
        let reply = chat.send_message(client, input).await;
        print_reply(&reply);
        logging.log_message(&reply_transcript(&reply))?;
    }

    Ok(())
}

/// Returns true when the session should end.
fn handle_slash_command(
    command: &str,
    chat: &mut ChatController,
    logging: &mut LoggingState,
) -> Result<bool, Box<dyn Error>> {
    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match (name, argument) {
        ("quit", _) | ("exit", _) => return Ok(true),
        ("clear", _) => {
            chat.clear();
            println!("Transcript cleared.");
        }
        ("recent", _) => {
            if chat.recent_prompts().is_empty() {
                println!("No prompts yet.");
            } else {
                for (index, prompt) in chat.recent_prompts().iter().enumerate() {
                    println!("{:2}. {prompt}", index + 1);
                }
            }
        }
        ("log", Some(path)) => match logging.set_log_file(path.to_string()) {
            Ok(status) => println!("{status}"),
            Err(err) => println!("❌ {err}"),
        },
        ("log", None) => match logging.toggle_logging() {
            Ok(status) => println!("{status}"),
            Err(err) => println!("❌ {err}"),
        },
        ("help", _) => print_help(logging),
        _ => println!("Unknown command: /{name}. Try /help."),
    }
    Ok(false)
}

fn print_banner(session: &SessionStore) {
    if let Some(user) = session.user() {
        eprintln!("💬 Eventline — chatting as {} {}", user.name, user.surname);
    } else {
        eprintln!("💬 Eventline");
    }
    eprintln!("Ask about events in plain language. /help for commands, /quit to leave.");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

fn print_help(logging: &LoggingState) {
    println!("Commands:");
    println!("  /recent           Show your last 10 prompts");
    println!("  /clear            Clear the transcript");
    println!("  /log <filename>   Log the transcript to a file");
    println!("  /log              Pause or resume logging");
    println!("  /quit             Leave the chat");
    println!("Logging: {}", logging.get_status_string());
}

fn print_reply(reply: &ChatMessage) {
    println!("{}", reply.content);
    if !reply.events.is_empty() {
        println!();
        print!("{}", render_events_table(&reply.events));
    }
    println!();
}

fn reply_transcript(reply: &ChatMessage) -> String {
    if reply.events.is_empty() {
        reply.content.clone()
    } else {
        format!("{}\n\n{}", reply.content, render_events_table(&reply.events))
    }
}
