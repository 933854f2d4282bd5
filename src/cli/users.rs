//! User account subcommands.

use std::error::Error;

use clap::Subcommand;

use crate::api::client::ApiClient;
use crate::api::CreateUserPayload;
use crate::cli::{describe_api_error, prompt_line};

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new account
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        email: String,
    },
    /// List all registered users
    List,
    /// Look up one user by email
    Show { email: String },
}

pub async fn run(client: &ApiClient, command: UserCommands) -> Result<(), Box<dyn Error>> {
    match command {
        UserCommands::Create {
            name,
            surname,
            email,
        } => {
            let password = prompt_line("Password: ")?;
            if password.is_empty() {
                return Err("Password must not be empty.".into());
            }
            let payload = CreateUserPayload {
                name,
                surname,
                email,
                password,
            };
            let user = client
                .create_user(&payload)
                .await
                .map_err(describe_api_error)?;
            println!("✅ Created account for {} {} <{}>", user.name, user.surname, user.email);
            Ok(())
        }
        UserCommands::List => {
            let users = client.get_users().await.map_err(describe_api_error)?;
            if users.is_empty() {
                println!("No users registered.");
                return Ok(());
            }
            for user in users {
                println!("{} {} <{}>", user.name, user.surname, user.email);
            }
            Ok(())
        }
        UserCommands::Show { email } => {
            let user = client
                .get_user_by_email(&email)
                .await
                .map_err(describe_api_error)?;
            println!("{} {} <{}>", user.name, user.surname, user.email);
            Ok(())
        }
    }
}
