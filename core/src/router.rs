//! Role-based navigation state machine.
//!
//! # Design
//! Four screens, one explicit transition table. After a successful login
//! the home screen is chosen from the role read back from the session store,
//! never from the login response directly; a missing role keeps the user on
//! `Login` with an alert. Every transition bumps a generation counter so a
//! screen can tell whether it is still showing when a slow call returns.

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::session::{clear_session, load_session, SessionStore};
use crate::types::{Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    OrganizerHome,
    BuyerHome,
}

/// Tabs shown inside a home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Organizer's own events with create/edit/delete.
    Events,
    /// Upcoming events with purchase.
    BrowseEvents,
    MyTickets,
    Profile,
}

impl Screen {
    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Organizer => Screen::OrganizerHome,
            Role::Buyer => Screen::BuyerHome,
        }
    }

    pub fn is_home(self) -> bool {
        matches!(self, Screen::OrganizerHome | Screen::BuyerHome)
    }

    pub fn tabs(self) -> &'static [Tab] {
        match self {
            Screen::OrganizerHome => &[Tab::Events, Tab::Profile],
            Screen::BuyerHome => &[Tab::BrowseEvents, Tab::MyTickets, Tab::Profile],
            Screen::Login | Screen::Register => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// "Create account" link on the login screen.
    OpenRegister,
    Registered,
    /// Login succeeded and the session was persisted.
    LoggedIn,
    LogOut,
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("cannot {event:?} from {from:?}")]
    InvalidTransition { from: Screen, event: Navigation },
    #[error("signed in but no usable role is stored")]
    MissingRole,
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Captured by a screen before a call; see `Router::is_current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewToken {
    screen: Screen,
    generation: u64,
}

#[derive(Debug)]
pub struct Router {
    screen: Screen,
    generation: u64,
    alert: Option<String>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            generation: 0,
            alert: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Take the pending alert, leaving none.
    pub fn dismiss_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    /// Show a user-facing message for `error`. The screen does not change.
    pub fn present_error(&mut self, error: &ClientError) {
        warn!(screen = ?self.screen, %error, "presenting error");
        self.alert = Some(error.user_message());
    }

    pub fn view_token(&self) -> ViewToken {
        ViewToken {
            screen: self.screen,
            generation: self.generation,
        }
    }

    /// Whether the screen that captured `token` is still the one showing.
    pub fn is_current(&self, token: ViewToken) -> bool {
        token == self.view_token()
    }

    /// Apply a transition that needs no session lookup.
    pub fn navigate(&mut self, event: Navigation) -> Result<Screen, NavigationError> {
        let next = match (self.screen, event) {
            (Screen::Login, Navigation::OpenRegister) => Screen::Register,
            (Screen::Register, Navigation::Registered) => Screen::Login,
            (from, event) => return Err(NavigationError::InvalidTransition { from, event }),
        };
        Ok(self.enter(next))
    }

    /// Leave `Login` for the home screen matching the stored role.
    ///
    /// Call after `AuthService::login` succeeded. When the store holds no
    /// complete session the router stays on `Login` and raises an alert.
    pub fn complete_login<S: SessionStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Session, NavigationError> {
        if self.screen != Screen::Login {
            return Err(NavigationError::InvalidTransition {
                from: self.screen,
                event: Navigation::LoggedIn,
            });
        }
        match load_session(store) {
            Ok(Some(session)) => {
                self.enter(Screen::home_for(session.role));
                Ok(session)
            }
            Ok(None) => {
                self.alert =
                    Some("Login failed: your account role could not be determined.".to_string());
                warn!("login completed without a usable stored role");
                Err(NavigationError::MissingRole)
            }
            Err(err) => {
                self.present_error(&err);
                Err(err.into())
            }
        }
    }

    /// Clear the session and return to `Login`. Only valid from a home
    /// screen.
    pub fn logout<S: SessionStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Screen, NavigationError> {
        if !self.screen.is_home() {
            return Err(NavigationError::InvalidTransition {
                from: self.screen,
                event: Navigation::LogOut,
            });
        }
        clear_session(store)?;
        Ok(self.enter(Screen::Login))
    }

    fn enter(&mut self, next: Screen) -> Screen {
        debug!(from = ?self.screen, to = ?next, "navigating");
        self.screen = next;
        self.generation += 1;
        self.alert = None;
        next
    }
}
