//! Eventline is a terminal-first client for the AI Event Finder service.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the request/response payloads and the HTTP client that is
//!   the single point of contact with the backend.
//! - [`core`] owns client-side state: the persisted login session, the client
//!   configuration, and the chat conversation.
//! - [`auth`] implements the login/logout lifecycle on top of the session
//!   store and the API client.
//! - [`cli`] parses command-line arguments and runs the subcommands,
//!   including the interactive chat loop.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod utils;
