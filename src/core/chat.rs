//! Conversation state for the interactive chat session.
//!
//! The controller owns the transcript and the recent-prompt history, and
//! turns raw AI responses into displayable turns. The transcript is
//! append-only: a user turn is recorded before the request goes out, and an
//! assistant turn always follows, also when the request fails.

use crate::api::client::{ApiClient, ApiError};
use crate::api::Event;
use chrono::{DateTime, Local};
use serde_json::Value;

/// Upper bound on the recent-prompt history.
pub const RECENT_PROMPT_CAP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub events: Vec<Event>,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct ChatController {
    messages: Vec<ChatMessage>,
    recent_prompts: Vec<String>,
    next_id: u64,
}

impl ChatController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Most recent first.
    pub fn recent_prompts(&self) -> &[String] {
        &self.recent_prompts
    }

    /// Send a free-text prompt and return the assistant turn. Appends exactly
    /// one user turn and one assistant turn, whatever the outcome.
    pub async fn send_message(&mut self, client: &ApiClient, prompt: &str) -> ChatMessage {
        self.push(Role::User, prompt.to_string(), Vec::new());
        self.remember_prompt(prompt);

        let (content, events) = match client.query_prompt(prompt).await {
            Ok(response) => interpret_response(&response),
            Err(ApiError::AuthRequired) => (
                "Your session has expired. Run `eventline login` to sign in again.".to_string(),
                Vec::new(),
            ),
            Err(err) => (
                format!("Sorry, I encountered an error: {err}"),
                Vec::new(),
            ),
        };

        self.push(Role::Assistant, content, events)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn push(&mut self, role: Role, content: String, events: Vec<Event>) -> ChatMessage {
        let turn = ChatMessage {
            id: self.next_id,
            role,
            content,
            events,
            timestamp: Local::now(),
        };
        self.next_id += 1;
        self.messages.push(turn.clone());
        turn
    }

    /// Move the prompt to the front without duplication, dropping the oldest
    /// entry past the cap.
    fn remember_prompt(&mut self, prompt: &str) {
        self.recent_prompts.retain(|p| p != prompt);
        self.recent_prompts.insert(0, prompt.to_string());
        self.recent_prompts.truncate(RECENT_PROMPT_CAP);
    }
}

/// Interpret an AI response into display content plus attached events.
///
/// Policy, applied in order: a non-empty `events` array (filtered to entries
/// with both a title and a datetime) wins; otherwise a `message` field is
/// used verbatim; otherwise the whole response is pretty-printed.
pub fn interpret_response(response: &Value) -> (String, Vec<Event>) {
    if let Some(entries) = response.get("events").and_then(Value::as_array) {
        let valid: Vec<Event> = entries
            .iter()
            .filter(|entry| has_nonempty_str(entry, "title") && has_nonempty_str(entry, "datetime"))
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect();

        if !valid.is_empty() {
            let content = response
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Found {} event(s)", valid.len()));
            return (content, valid);
        }
    }

    if let Some(message) = response.get("message").and_then(Value::as_str) {
        return (message.to_string(), Vec::new());
    }

    let content =
        serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_string());
    (content, Vec::new())
}

fn has_nonempty_str(entry: &Value, key: &str) -> bool {
    entry
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}
