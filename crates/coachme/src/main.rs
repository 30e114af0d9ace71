use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coachme::config::Config;
use coachme::seed::{apply_seed, load_seed};
use coachme::storage::{build_store, open_backend, AppStore};
use coachme_core::messaging::chat_id_for_personal_chats;
use coachme_core::schedule::upcoming_group_events;
use coachme_core::storage::{ChatStore, GroupEventStore, SessionStore, UserStore};
use coachme_core::user::Event;

/// CoachMe - Find a sports coach near you and chat with them
#[derive(Parser, Debug)]
#[command(name = "coachme")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON file with users and chats to load into the backend first
    #[arg(long, global = true, env = "COACHME_SEED")]
    seed: Option<PathBuf>,

    /// Email of the user this session acts as
    #[arg(long, global = true, env = "COACHME_CURRENT_EMAIL")]
    current: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up, list and rate users
    #[command(subcommand)]
    Users(UsersCommand),

    /// Inspect chats
    #[command(subcommand)]
    Chat(ChatCommand),

    /// Browse and join group events
    #[command(subcommand)]
    Events(EventsCommand),

    /// Show and extend the current user's schedule
    #[command(subcommand)]
    Schedule(ScheduleCommand),
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// List every user, optionally nearest to a point first
    List {
        /// Sort by distance from this latitude and longitude
        #[arg(long, num_args = 2, value_names = ["LAT", "LON"], allow_negative_numbers = true)]
        near: Option<Vec<f64>>,
    },

    /// Show one user
    Get { email: String },

    /// Show the average rating of a coach
    Rating { email: String },

    /// Rate a coach as the current user
    Rate { coach_email: String, rating: u8 },
}

#[derive(Subcommand, Debug)]
enum ChatCommand {
    /// Print the id of the personal chat between two users
    Id { email_a: String, email_b: String },

    /// Show a chat with its messages
    Show { chat_id: String },

    /// Mark a chat's messages as read by a viewer and show the result
    Read { chat_id: String, viewer: String },

    /// Show a user's contact list, most recent chat first
    Contacts { email: String },
}

#[derive(Subcommand, Debug)]
enum EventsCommand {
    /// List group events by start time
    List {
        /// Only events that have not started yet
        #[arg(long)]
        upcoming: bool,

        /// Only events this user organizes or joined
        #[arg(long, value_name = "EMAIL")]
        of: Option<String>,
    },

    /// Show one group event
    Show { id: String },

    /// Register the current user for a group event
    Register { id: String },
}

#[derive(Subcommand, Debug)]
enum ScheduleCommand {
    /// Show the schedule around a week (default: this week)
    Show {
        /// Any day of the week to show, as YYYY-MM-DD
        #[arg(long)]
        week: Option<NaiveDate>,
    },

    /// Add an event to the schedule
    Add {
        name: String,
        /// Start time, as YYYY-MM-DDTHH:MM:SS
        start: NaiveDateTime,
        /// End time, as YYYY-MM-DDTHH:MM:SS
        end: NaiveDateTime,
        #[arg(long, default_value = "#3366ff")]
        color: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coachme=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    tracing::debug!(?config, "Configuration loaded");

    let backend = Arc::new(
        open_backend(&config)
            .await
            .context("Failed to open storage backend")?,
    );

    if let Some(path) = &cli.seed {
        let seed = load_seed(path)?;
        apply_seed(&backend, &seed).await?;
    }

    let store = build_store(backend, &config);

    if let Some(email) = &cli.current {
        store.set_current_email(email).await?;
    }

    let result = run(&store, cli.command).await;

    // End of session
    store.clear_cache().await;
    result
}

async fn run(store: &AppStore, command: Command) -> Result<()> {
    match command {
        Command::Users(UsersCommand::List { near }) => {
            let users = match near.as_deref() {
                Some([latitude, longitude]) => {
                    store.get_all_users_by_nearest(*latitude, *longitude).await?
                }
                _ => store.get_all_users().await?,
            };
            print_json(&users)
        }
        Command::Users(UsersCommand::Get { email }) => {
            let user = store
                .get_user(&email)
                .await
                .with_context(|| format!("Cannot load user {email}"))?;
            print_json(&user)
        }
        Command::Users(UsersCommand::Rating { email }) => {
            let average = store.get_coach_average_rating(&email).await?;
            print_json(&serde_json::json!({ "email": email, "average_rating": average }))
        }
        Command::Users(UsersCommand::Rate {
            coach_email,
            rating,
        }) => {
            let coach = store
                .add_rating_to_coach(&coach_email, rating)
                .await
                .with_context(|| format!("Cannot rate {coach_email}"))?;
            print_json(&coach)
        }
        Command::Chat(ChatCommand::Id { email_a, email_b }) => {
            print_json(&chat_id_for_personal_chats(&email_a, &email_b))
        }
        Command::Chat(ChatCommand::Show { chat_id }) => {
            let chat = store
                .get_chat(&chat_id)
                .await
                .with_context(|| format!("Cannot load chat {chat_id}"))?;
            print_json(&chat)
        }
        Command::Chat(ChatCommand::Read { chat_id, viewer }) => {
            // Load first so the cached copy is reconciled and published too
            store.get_chat(&chat_id).await?;
            store.mark_messages_as_read(&chat_id, &viewer).await?;
            print_json(&store.get_chat(&chat_id).await?)
        }
        Command::Chat(ChatCommand::Contacts { email }) => {
            print_json(&store.get_contact_row_infos(&email).await?)
        }
        Command::Events(EventsCommand::List { upcoming, of }) => {
            let group_events = match (upcoming, of) {
                (false, None) => store.get_all_group_events_by_date().await?,
                (true, None) => store.get_upcoming_group_events_by_date().await?,
                (false, Some(email)) => store.get_group_events_of_user_by_date(&email).await?,
                (true, Some(email)) => upcoming_group_events(
                    store.get_group_events_of_user_by_date(&email).await?,
                    Local::now().naive_local(),
                ),
            };
            print_json(&group_events)
        }
        Command::Events(EventsCommand::Show { id }) => {
            let group_event = store
                .get_group_event(&id)
                .await
                .with_context(|| format!("Cannot load group event {id}"))?;
            print_json(&group_event)
        }
        Command::Events(EventsCommand::Register { id }) => {
            let group_event = store
                .register_for_group_event(&id)
                .await
                .with_context(|| format!("Cannot register for {id}"))?;
            print_json(&group_event)
        }
        Command::Schedule(ScheduleCommand::Show { week }) => {
            let week = week.unwrap_or_else(|| Local::now().date_naive());
            print_json(&store.get_schedule(week).await?)
        }
        Command::Schedule(ScheduleCommand::Add {
            name,
            start,
            end,
            color,
        }) => {
            if end < start {
                anyhow::bail!("Event ends before it starts");
            }
            let schedule = store
                .add_event_to_schedule(&Event::new(name, color, start, end))
                .await?;
            print_json(&schedule)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
