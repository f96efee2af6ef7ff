//! Command execution and plain-text rendering.
//!
//! Each invocation is one pass through the screens: the router is rebuilt
//! from the stored session, and commands that belong to a tab the current
//! home screen does not show are refused before any request is made.

use std::fmt::Write as _;

use anyhow::{bail, Context};
use ticketing_core::{
    Api, ClientConfig, Event, EventDraft, FileSessionStore, NavigationError, ProfileUpdate,
    RegisterUser, Router, Screen, Tab, Ticket, TicketStatus, UserProfile, UreqTransport,
};
use tracing::debug;

use crate::{Command, EventsCommand, ProfileCommand, TicketsCommand};

type CliApi = Api<UreqTransport, FileSessionStore>;

pub(crate) fn run(command: Command, config: &ClientConfig) -> anyhow::Result<String> {
    let path = config
        .session_file
        .clone()
        .context("no session file configured")?;
    debug!(base_url = %config.base_url, session_file = %path.display(), "starting");
    let api = Api::from_config(config, FileSessionStore::new(path));

    match command {
        Command::Login { email, password } => login(&api, &email, &password),
        Command::Register {
            name,
            email,
            password,
            role,
        } => {
            let user = api.auth().register(&RegisterUser {
                name,
                email,
                password,
                role,
            })?;
            Ok(format!("Registered {} as {}. You can now log in.", user.email, user.role))
        }
        Command::Logout => {
            api.auth().logout()?;
            Ok("Signed out.".to_string())
        }
        Command::Whoami => {
            let (router, session) = signed_in_router(&api)?;
            Ok(format!(
                "{} ({})\n{}",
                session.user_id,
                session.role,
                render_home(router.screen())
            ))
        }
        Command::Events { command } => events(&api, command),
        Command::Tickets { command } => tickets(&api, command),
        Command::Profile { command } => profile(&api, command),
    }
}

fn login(api: &CliApi, email: &str, password: &str) -> anyhow::Result<String> {
    let mut router = Router::new();
    api.auth().login(email, password)?;
    match router.complete_login(api.store()) {
        Ok(session) => Ok(format!(
            "Signed in as {}.\n{}",
            session.role,
            render_home(router.screen())
        )),
        Err(NavigationError::Client(err)) => Err(err.into()),
        Err(err) => {
            let alert = router.dismiss_alert().unwrap_or_else(|| err.to_string());
            bail!(alert)
        }
    }
}

/// A router on the home screen for the stored session.
fn signed_in_router(api: &CliApi) -> anyhow::Result<(Router, ticketing_core::Session)> {
    let mut router = Router::new();
    match router.complete_login(api.store()) {
        Ok(session) => Ok((router, session)),
        Err(NavigationError::Client(err)) => Err(err.into()),
        Err(NavigationError::MissingRole) => bail!("not signed in; run `ticketing login` first"),
        Err(err) => Err(err.into()),
    }
}

/// Refuse commands whose tab the signed-in role does not see.
fn require_tab(api: &CliApi, tab: Tab) -> anyhow::Result<()> {
    let (router, session) = signed_in_router(api)?;
    if !router.screen().tabs().contains(&tab) {
        bail!("{} is not available to a {} account", tab_title(tab), session.role);
    }
    Ok(())
}

fn events(api: &CliApi, command: EventsCommand) -> anyhow::Result<String> {
    match command {
        EventsCommand::List => {
            require_tab(api, Tab::Events)?;
            Ok(render_events(&api.events().list()?))
        }
        EventsCommand::Future => {
            require_tab(api, Tab::BrowseEvents)?;
            Ok(render_events(&api.events().list_future()?))
        }
        EventsCommand::Show { id } => Ok(render_event(&api.events().get(id)?)),
        EventsCommand::Create { fields } => {
            require_tab(api, Tab::Events)?;
            let event = api.events().create(&fields.into_draft())?;
            Ok(format!("Created event {}.", event.id))
        }
        EventsCommand::Update { id, fields } => {
            require_tab(api, Tab::Events)?;
            let event = api.events().update(id, &fields.into_draft())?;
            Ok(format!("Updated event {}.\n{}", event.id, render_event(&event)))
        }
        EventsCommand::Delete { id } => {
            require_tab(api, Tab::Events)?;
            api.events().delete(id)?;
            Ok(format!("Deleted event {id}."))
        }
    }
}

fn tickets(api: &CliApi, command: TicketsCommand) -> anyhow::Result<String> {
    require_tab(api, Tab::MyTickets)?;
    match command {
        TicketsCommand::List => Ok(render_tickets(&api.tickets().list()?)),
        TicketsCommand::Buy { event_id } => {
            let ticket = api.tickets().purchase(event_id)?;
            Ok(format!("Ticket purchased.\n{}", render_tickets(&[ticket])))
        }
    }
}

fn profile(api: &CliApi, command: ProfileCommand) -> anyhow::Result<String> {
    require_tab(api, Tab::Profile)?;
    match command {
        ProfileCommand::Show => Ok(render_profile(&api.users().profile()?)),
        ProfileCommand::Update { name, email } => {
            let profile = api.users().update_profile(&ProfileUpdate { name, email })?;
            Ok(format!("Profile updated.\n{}", render_profile(&profile)))
        }
        ProfileCommand::Password { old, new } => {
            api.users().change_password(&old, &new)?;
            Ok("Password changed.".to_string())
        }
    }
}

impl crate::EventFields {
    fn into_draft(self) -> EventDraft {
        EventDraft {
            name: self.name,
            date: self.date,
            location: self.location,
            description: self.description,
        }
    }
}

// --- rendering --------------------------------------------------------------

fn tab_title(tab: Tab) -> &'static str {
    match tab {
        Tab::Events => "My events",
        Tab::BrowseEvents => "Upcoming events",
        Tab::MyTickets => "My tickets",
        Tab::Profile => "Profile",
    }
}

fn render_home(screen: Screen) -> String {
    let titles: Vec<&str> = screen.tabs().iter().map(|t| tab_title(*t)).collect();
    format!("Tabs: {}", titles.join(" | "))
}

fn render_event(event: &Event) -> String {
    let mut out = format!(
        "{}  {}\n  when:  {}\n  where: {}",
        event.id,
        event.name,
        event.date.format("%Y-%m-%d %H:%M UTC"),
        event.location
    );
    if !event.description.is_empty() {
        let _ = write!(out, "\n  {}", event.description);
    }
    out
}

fn render_events(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events.".to_string();
    }
    events.iter().map(render_event).collect::<Vec<_>>().join("\n")
}

fn status_label(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Valid => "valid",
        TicketStatus::Used => "used",
        TicketStatus::Cancelled => "cancelled",
    }
}

fn render_tickets(tickets: &[Ticket]) -> String {
    if tickets.is_empty() {
        return "No tickets.".to_string();
    }
    tickets
        .iter()
        .map(|t| {
            let event = match &t.event {
                Some(e) => format!("{} on {}", e.name, e.date.format("%Y-%m-%d %H:%M UTC")),
                None => format!("event {}", t.event_id),
            };
            format!(
                "{}  {}  [{}]\n  code: {}",
                t.id,
                event,
                status_label(t.status),
                t.token
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_profile(profile: &UserProfile) -> String {
    format!("{} <{}>", profile.name, profile.email)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn event(description: &str) -> Event {
        Event {
            id: Uuid::nil(),
            name: "Concert".to_string(),
            date: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            location: "Hall".to_string(),
            description: description.to_string(),
            organizer_id: Uuid::nil(),
        }
    }

    #[test]
    fn empty_lists_say_so() {
        assert_eq!(render_events(&[]), "No events.");
        assert_eq!(render_tickets(&[]), "No tickets.");
    }

    #[test]
    fn event_rendering_skips_empty_description() {
        let plain = render_event(&event(""));
        assert!(plain.contains("2025-03-01 12:00 UTC"));
        assert_eq!(plain.lines().count(), 3);
        assert_eq!(render_event(&event("Live")).lines().count(), 4);
    }

    #[test]
    fn home_lists_role_tabs() {
        assert_eq!(render_home(Screen::OrganizerHome), "Tabs: My events | Profile");
        assert_eq!(
            render_home(Screen::BuyerHome),
            "Tabs: Upcoming events | My tickets | Profile"
        );
    }

    #[test]
    fn ticket_rendering_shows_status_and_code() {
        let ticket = Ticket {
            id: Uuid::nil(),
            event_id: Uuid::nil(),
            owner_id: Uuid::nil(),
            token: "qr-1".to_string(),
            status: TicketStatus::Used,
            event: None,
        };
        let out = render_tickets(&[ticket]);
        assert!(out.contains("[used]"));
        assert!(out.contains("code: qr-1"));
        assert!(out.contains("event 00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn ticket_rendering_names_loaded_event() {
        let ticket = Ticket {
            id: Uuid::nil(),
            event_id: Uuid::nil(),
            owner_id: Uuid::nil(),
            token: "qr-2".to_string(),
            status: TicketStatus::Valid,
            event: Some(event("")),
        };
        let out = render_tickets(&[ticket]);
        assert!(out.contains("Concert on 2025-03-01 12:00 UTC"));
        assert!(!out.contains("event 0000"));
    }
}
