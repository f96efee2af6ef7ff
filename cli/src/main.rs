// Terminal front end for the ticketing service

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ticketing_core::{ClientConfig, ClientError, Role};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "ticketing", version)]
#[command(about = "Browse events, buy tickets and manage your own events", long_about = None)]
struct Cli {
    /// Base URL of the ticketing API
    #[arg(long, global = true, env = "TICKETING_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "TICKETING_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// Where the signed-in session is kept
    #[arg(long, global = true, env = "TICKETING_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// organizer or buyer
        #[arg(short, long)]
        role: Role,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in and which tabs are available
    Whoami,

    /// Organizer events and upcoming events
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },

    /// Buyer tickets
    Tickets {
        #[command(subcommand)]
        command: TicketsCommand,
    },

    /// Account details
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[derive(Subcommand, Debug)]
enum EventsCommand {
    /// Your own events (organizer)
    List,
    /// Events that have not happened yet (buyer)
    Future,
    /// One event by id
    Show { id: Uuid },
    /// Create an event (organizer)
    Create {
        #[command(flatten)]
        fields: EventFields,
    },
    /// Replace an event's fields (organizer)
    Update {
        id: Uuid,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Delete an event (organizer)
    Delete { id: Uuid },
}

#[derive(clap::Args, Debug)]
struct EventFields {
    #[arg(short, long)]
    name: String,
    /// RFC 3339, e.g. 2025-03-01T12:00:00Z
    #[arg(short, long)]
    date: chrono::DateTime<chrono::Utc>,
    #[arg(short, long)]
    location: String,
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Subcommand, Debug)]
enum TicketsCommand {
    /// Tickets you hold
    List,
    /// Buy a ticket for an event
    Buy { event_id: Uuid },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    Update {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
    },
    Password {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
}

impl Cli {
    /// Environment config with command-line overrides applied.
    fn config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &self.api_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = self.timeout {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        config.session_file = match self.session_file.clone().or(config.session_file) {
            Some(path) => Some(path),
            None => Some(
                dirs::home_dir()
                    .context("cannot locate a home directory; pass --session-file")?
                    .join(".ticketing")
                    .join("session.json"),
            ),
        };
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "ticketing_core=debug,ticketing=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = cli.config().and_then(|config| commands::run(cli.command, &config));
    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            // Client errors get the same short text a screen alert would show.
            match err.downcast_ref::<ClientError>() {
                Some(client_err) => {
                    tracing::debug!(error = %client_err, "command failed");
                    eprintln!("error: {}", client_err.user_message());
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_event_create() {
        let cli = Cli::try_parse_from([
            "ticketing",
            "events",
            "create",
            "--name",
            "A",
            "--date",
            "2025-03-01T12:00:00Z",
            "--location",
            "X",
        ])
        .unwrap();
        match cli.command {
            Command::Events {
                command: EventsCommand::Create { fields },
            } => {
                assert_eq!(fields.name, "A");
                assert_eq!(fields.description, "");
                assert_eq!(fields.date.to_rfc3339(), "2025-03-01T12:00:00+00:00");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_role() {
        let err = Cli::try_parse_from([
            "ticketing", "register", "-n", "A", "-e", "a@x.io", "-p", "pw", "-r", "admin",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("admin"));
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::try_parse_from([
            "ticketing",
            "--api-url",
            "http://example.test/",
            "--session-file",
            "/tmp/s.json",
            "logout",
        ])
        .unwrap();
        let config = cli.config().unwrap();
        assert_eq!(config.base_url, "http://example.test");
        assert_eq!(config.session_file, Some(PathBuf::from("/tmp/s.json")));
    }
}
