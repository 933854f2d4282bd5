//! Participant subcommands, keyed by event title.

use std::error::Error;

use clap::Subcommand;

use crate::api::client::ApiClient;
use crate::cli::describe_api_error;

#[derive(Subcommand)]
pub enum ParticipantCommands {
    /// List the participants of an event
    List { event: String },
    /// Register a user as attending an event
    Add { event: String, email: String },
    /// Remove a user from an event's participant list
    Remove { event: String, email: String },
}

pub async fn run(client: &ApiClient, command: ParticipantCommands) -> Result<(), Box<dyn Error>> {
    match command {
        ParticipantCommands::List { event } => {
            let participants = client
                .list_participants(&event)
                .await
                .map_err(describe_api_error)?;
            if participants.is_empty() {
                println!("No participants yet.");
                return Ok(());
            }
            for user in participants {
                println!("{} {} <{}>", user.name, user.surname, user.email);
            }
            Ok(())
        }
        ParticipantCommands::Add { event, email } => {
            let response = client
                .add_participant(&event, &email)
                .await
                .map_err(describe_api_error)?;
            println!("{}", response.message);
            Ok(())
        }
        ParticipantCommands::Remove { event, email } => {
            let response = client
                .remove_participant(&event, &email)
                .await
                .map_err(describe_api_error)?;
            println!("{}", response.message);
            Ok(())
        }
    }
}
