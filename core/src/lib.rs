//! Client core for the event ticketing service.
//!
//! # Overview
//! Everything the mobile screens need below the rendering layer: a session
//! store, an HTTP API client, typed services per resource and a role-based
//! navigation state machine.
//!
//! # Design
//! - `TicketingClient` is sans-IO: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. Native hosts going through FFI
//!   use it directly and execute requests themselves.
//! - `Api` pairs the client with a `Transport` and a `SessionStore` for
//!   callers that want blocking calls; services hang off it.
//! - The session is an explicit value (`Session`) loaded from the store on
//!   every authenticated call; a partial session reads as signed out.
//! - `Router` decides the home screen from the stored role.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod router;
pub mod services;
pub mod session;
pub mod testing;
pub mod transport;
pub mod types;

pub use api::Api;
pub use client::TicketingClient;
pub use config::ClientConfig;
pub use error::{AuthFailure, ClientError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use router::{Navigation, NavigationError, Router, Screen, Tab, ViewToken};
pub use session::{
    clear_session, load_session, save_session, FileSessionStore, MemorySessionStore, SessionKey,
    SessionStore,
};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    ChangePassword, Event, EventDraft, LoginRequest, LoginResponse, ProfileUpdate, PurchaseTicket,
    RegisterUser, Role, Session, Ticket, TicketStatus, User, UserProfile,
};
