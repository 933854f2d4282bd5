//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the
//! appropriate commands.

pub mod chat_loop;
pub mod events;
pub mod participants;
pub mod users;

use std::error::Error;
use std::io::{self, Write};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::api::client::{ApiClient, ApiError};
use crate::auth::{AuthManager, LoginOutcome};
use crate::core::config::Config;
use crate::core::session::SessionStore;

#[derive(Parser)]
#[command(name = "eventline")]
#[command(about = "A terminal client for the AI Event Finder service")]
#[command(
    long_about = "Eventline is a terminal client for the AI Event Finder service. \
Ask the event assistant questions in plain language, browse and filter events, \
and manage the events you organize and their participants.\n\n\
Authentication:\n\
  Use 'eventline login' to sign in; the session is stored locally and reused\n\
  until you log out or the server rejects it.\n\n\
Environment Variables:\n\
  EVENTLINE_BASE_URL   Backend base URL (overrides the config file)\n\
  EVENTLINE_LOG        Diagnostic log filter (e.g. eventline=debug)\n\n\
Chat commands:\n\
  /recent           Show your last 10 prompts\n\
  /clear            Clear the transcript\n\
  /log [filename]   Enable or pause transcript logging\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL (overrides config and EVENTLINE_BASE_URL)
    #[arg(short = 'u', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Append the chat transcript to the given file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in to the event service
    Login {
        /// Account email; prompted for when omitted
        email: Option<String>,
    },
    /// Log out and clear the stored session
    Logout,
    /// Show the currently stored profile
    Whoami,
    /// Start the interactive chat (default)
    Chat,
    /// Browse and manage events
    Events {
        #[command(subcommand)]
        command: events::EventCommands,
    },
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        command: users::UserCommands,
    },
    /// Manage event participants
    Participants {
        #[command(subcommand)]
        command: participants::ParticipantCommands,
    },
    /// Show or edit client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Set the backend base URL in the config file
    SetBaseUrl { url: String },
    /// Remove the backend base URL from the config file
    UnsetBaseUrl,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();

    let config = Config::load()?;
    let base_url = config.resolve_base_url(args.base_url.as_deref());
    let session = SessionStore::open();
    let client = ApiClient::new(&base_url, session.clone());

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Login { email } => login_command(&client, session, email).await,
        Commands::Logout => {
            AuthManager::new(session).logout()?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => whoami_command(&session),
        Commands::Chat => chat_loop::run_chat(&client, &session, args.log).await,
        Commands::Events { command } => events::run(&client, &session, command).await,
        Commands::Users { command } => users::run(&client, command).await,
        Commands::Participants { command } => participants::run(&client, command).await,
        Commands::Config { command } => config_command(config, command),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EVENTLINE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("eventline=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn login_command(
    client: &ApiClient,
    session: SessionStore,
    email: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let email = match email {
        Some(email) => email,
        None => prompt_line("Email: ")?,
    };
    // No terminal raw mode in this client, so the password echoes.
    let password = prompt_line("Password: ")?;

    let auth = AuthManager::new(session);
    match auth.login(client, email.trim(), &password).await {
        LoginOutcome::Success { user } => {
            println!("✅ Logged in as {} {} <{}>", user.name, user.surname, user.email);
            Ok(())
        }
        LoginOutcome::Failure { message } => Err(message.into()),
    }
}

fn whoami_command(session: &SessionStore) -> Result<(), Box<dyn Error>> {
    match session.user() {
        Some(user) => {
            println!("{} {} <{}>", user.name, user.surname, user.email);
            Ok(())
        }
        None => Err("Not logged in. Run `eventline login` first.".into()),
    }
}

fn config_command(mut config: Config, command: ConfigCommands) -> Result<(), Box<dyn Error>> {
    match command {
        ConfigCommands::Show => {
            println!("base_url: {}", config.resolve_base_url(None));
            Ok(())
        }
        ConfigCommands::SetBaseUrl { url } => {
            config.base_url = Some(url.clone());
            config.save()?;
            println!("Base URL set to {url}");
            Ok(())
        }
        ConfigCommands::UnsetBaseUrl => {
            config.base_url = None;
            config.save()?;
            println!("Base URL unset.");
            Ok(())
        }
    }
}

/// Translate an API failure into a user-facing CLI error. Auth failures have
/// already cleared the session by the time they surface here.
pub(crate) fn describe_api_error(err: ApiError) -> Box<dyn Error> {
    match err {
        ApiError::AuthRequired => {
            "Your session has expired. Run `eventline login` to sign in again.".into()
        }
        other => other.to_string().into(),
    }
}

pub(crate) fn require_user(session: &SessionStore) -> Result<crate::api::User, Box<dyn Error>> {
    session
        .user()
        .ok_or_else(|| "Not logged in. Run `eventline login` first.".into())
}

pub(crate) fn prompt_line(prompt: &str) -> Result<String, Box<dyn Error>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
