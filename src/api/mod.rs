use serde::{Deserialize, Serialize};

/// A registered account on the event service, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub surname: String,
    pub email: String,
}

/// Partial user record the backend attaches to an event's guest list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
}

/// An event as returned by the backend. Titles act as the stable identifier
/// across endpoints; uniqueness is a service-side guarantee, not enforced
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub datetime: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests: Option<Vec<Guest>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateEventPayload {
    pub title: String,
    pub description: String,
    /// "YYYY-MM-DD HH:MM:SS", the format the backend expects.
    pub datetime: String,
    pub location: String,
    pub category: String,
    pub organizer_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateUserPayload {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub mod client;
