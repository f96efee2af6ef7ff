//! Typed operations per resource, layered on `Api`.
//!
//! Each service validates its input, then delegates to the client.
//! Nothing is sent when validation fails.

mod auth;
mod events;
mod tickets;
mod users;

pub use auth::AuthService;
pub use events::EventService;
pub use tickets::TicketService;
pub use users::UserService;
