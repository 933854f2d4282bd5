//! Event subcommands: listing with filters, detail view, and the
//! create/update/delete operations available to organizers.

use std::error::Error;

use clap::Subcommand;

use crate::api::client::ApiClient;
use crate::api::{CreateEventPayload, Event};
use crate::cli::{describe_api_error, prompt_line, require_user};
use crate::core::session::SessionStore;
use crate::utils::format::{format_event_datetime, normalize_datetime_arg, parse_date_arg};

#[derive(Subcommand)]
pub enum EventCommands {
    /// List events, optionally filtered
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Only events on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Only events you organize
        #[arg(long)]
        mine: bool,
    },
    /// Show one event by title
    Show { title: String },
    /// Create a new event (you become the organizer)
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// When the event takes place (YYYY-MM-DD HH:MM[:SS])
        #[arg(long)]
        datetime: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        category: String,
    },
    /// Update an event you organize
    Update {
        title: String,
        #[arg(long, value_name = "TITLE")]
        rename: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        datetime: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete an event you organize
    Delete {
        title: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List the categories present across all events
    Categories,
    /// List the locations present across all events
    Locations,
}

pub async fn run(
    client: &ApiClient,
    session: &SessionStore,
    command: EventCommands,
) -> Result<(), Box<dyn Error>> {
    match command {
        EventCommands::List {
            category,
            location,
            date,
            mine,
        } => {
            let mut events = if let Some(date) = date {
                let date = parse_date_arg(&date)?;
                client.get_events_by_date(date).await
            } else if mine {
                let user = require_user(session)?;
                client.get_events_by_organizer(&user.email).await
            } else {
                client.get_events().await
            }
            .map_err(describe_api_error)?;

            if let Some(category) = category {
                let needle = category.trim().to_lowercase();
                events.retain(|e| e.category.trim().to_lowercase() == needle);
            }
            if let Some(location) = location {
                let needle = location.trim().to_lowercase();
                events.retain(|e| e.location.trim().to_lowercase() == needle);
            }

            if events.is_empty() {
                println!("No events found.");
            } else {
                print!("{}", render_events_table(&events));
            }
            Ok(())
        }
        EventCommands::Show { title } => {
            let event = client
                .get_event_by_title(&title)
                .await
                .map_err(describe_api_error)?;
            print_event_details(&event);
            Ok(())
        }
        EventCommands::Create {
            title,
            description,
            datetime,
            location,
            category,
        } => {
            let user = require_user(session)?;
            let payload = CreateEventPayload {
                title,
                description,
                datetime: normalize_datetime_arg(&datetime)?,
                location,
                category,
                organizer_email: user.email,
            };
            let event = client
                .create_event(&payload)
                .await
                .map_err(describe_api_error)?;
            println!("✅ Created \"{}\"", event.title);
            Ok(())
        }
        EventCommands::Update {
            title,
            rename,
            description,
            datetime,
            location,
            category,
        } => {
            let user = require_user(session)?;
            let existing = client
                .get_event_by_title(&title)
                .await
                .map_err(describe_api_error)?;

            let datetime = match datetime {
                Some(raw) => normalize_datetime_arg(&raw)?,
                None => existing.datetime,
            };
            let organizer_email = existing
                .organizer
                .map(|o| o.email)
                .unwrap_or(user.email);
            let payload = CreateEventPayload {
                title: rename.unwrap_or_else(|| existing.title.clone()),
                description: description.unwrap_or(existing.description),
                datetime,
                location: location.unwrap_or(existing.location),
                category: category.unwrap_or(existing.category),
                organizer_email,
            };

            let updated = client
                .update_event(&title, &payload)
                .await
                .map_err(describe_api_error)?;
            println!("✅ Updated \"{}\"", updated.title);
            Ok(())
        }
        EventCommands::Delete { title, yes } => {
            if !yes {
                let answer = prompt_line(&format!("Delete \"{title}\"? [y/N] "))?;
                if !answer.trim().eq_ignore_ascii_case("y") {
                    println!("Aborted.");
                    return Ok(());
                }
            }
            let response = client
                .delete_event(&title)
                .await
                .map_err(describe_api_error)?;
            println!("{}", response.message);
            Ok(())
        }
        EventCommands::Categories => {
            let categories = client.get_categories().await.map_err(describe_api_error)?;
            print_string_list(&categories, "No categories yet.");
            Ok(())
        }
        EventCommands::Locations => {
            let locations = client.get_locations().await.map_err(describe_api_error)?;
            print_string_list(&locations, "No locations yet.");
            Ok(())
        }
    }
}

fn print_string_list(values: &[String], empty_message: &str) {
    if values.is_empty() {
        println!("{empty_message}");
        return;
    }
    for value in values {
        println!("{value}");
    }
}

fn print_event_details(event: &Event) {
    println!("{}", event.title);
    println!("  When:      {}", format_event_datetime(&event.datetime));
    println!("  Where:     {}", event.location);
    println!("  Category:  {}", event.category);
    if let Some(organizer) = &event.organizer {
        println!(
            "  Organizer: {} {} <{}>",
            organizer.name, organizer.surname, organizer.email
        );
    }
    if !event.description.is_empty() {
        println!("  {}", event.description);
    }
    if let Some(guests) = &event.guests {
        if !guests.is_empty() {
            println!("  Guests:");
            for guest in guests {
                println!("    - {} {}", guest.name, guest.surname);
            }
        }
    }
}

/// Render events as a markdown-style table.
pub fn render_events_table(events: &[Event]) -> String {
    let mut table = String::new();
    table.push_str("| Title | When | Location | Category | Organizer |\n");
    table.push_str("|---|---|---|---|---|\n");

    for event in events {
        let organizer = event
            .organizer
            .as_ref()
            .map(|o| format!("{} {}", o.name, o.surname))
            .unwrap_or_default();
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            event.title,
            format_event_datetime(&event.datetime),
            event.location,
            event.category,
            organizer
        ));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::User;

    fn event(title: &str) -> Event {
        Event {
            title: title.to_string(),
            description: String::new(),
            datetime: "2024-05-01 18:00:00".to_string(),
            location: "Seattle".to_string(),
            category: "tech".to_string(),
            organizer: Some(User {
                name: "Ada".to_string(),
                surname: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            }),
            guests: None,
        }
    }

    #[test]
    fn table_has_a_row_per_event() {
        let table = render_events_table(&[event("Demo Day"), event("Hack Night")]);
        let rows: Vec<&str> = table.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[2].contains("Demo Day"));
        assert!(rows[2].contains("Wed, 01 May 2024 · 18:00"));
        assert!(rows[3].contains("Hack Night"));
        assert!(rows[2].contains("Ada Lovelace"));
    }
}
