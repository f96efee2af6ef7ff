//! Domain DTOs for the ticketing API.
//!
//! # Design
//! Response types use the backend's Pascal-case field names (`ID`, `Name`,
//! `OrganizerID`, ...); request payloads use lower-snake keys. Unknown
//! response fields are ignored, so nested relations the backend may embed
//! (`Organizer`, `Event`, a password hash) do not break parsing.
//!
//! Types carrying a password or token do not derive `Debug`, or redact it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClientError;

/// Fail with `Validation` when `value` is empty or whitespace.
fn require(field: &str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), ClientError> {
    require("email", value)?;
    if !value.contains('@') {
        return Err(ClientError::Validation("email must contain '@'".to_string()));
    }
    Ok(())
}

/// Account role. Decides which home screen is shown and which endpoints the
/// backend allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Organizer,
    Buyer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Organizer => "organizer",
            Role::Buyer => "buyer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored or received role string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role {:?}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "organizer" => Ok(Role::Organizer),
            "buyer" => Ok(Role::Buyer),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// The signed-in user's credentials as kept on the device.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub user_id: Uuid,
}

impl Session {
    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// A user account as returned by `/register`, `/login` and `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Role")]
    pub role: Role,
}

/// Editable part of the signed-in user's account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
}

/// Payload for `PUT /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ClientError> {
        require("name", &self.name)?;
        require_email(&self.email)
    }
}

/// Payload for `PUT /user/password`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePassword {
    pub fn validate(&self) -> Result<(), ClientError> {
        require("current password", &self.old_password)?;
        require("new password", &self.new_password)
    }
}

/// Payload for `POST /login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ClientError> {
        require("email", &self.email)?;
        require("password", &self.password)
    }
}

/// Response of `POST /login`.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

impl LoginResponse {
    pub fn session(&self) -> Session {
        Session {
            token: self.token.clone(),
            role: self.user.role,
            user_id: self.user.id,
        }
    }
}

/// Payload for `POST /register`.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegisterUser {
    pub fn validate(&self) -> Result<(), ClientError> {
        require("name", &self.name)?;
        require_email(&self.email)?;
        require("password", &self.password)
    }
}

/// An event owned by an organizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Date")]
    pub date: DateTime<Utc>,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "OrganizerID")]
    pub organizer_id: Uuid,
}

/// Fields an organizer supplies when creating or replacing an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub date: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub description: String,
}

impl EventDraft {
    /// Name and location are required; description may be empty.
    pub fn validate(&self) -> Result<(), ClientError> {
        require("event name", &self.name)?;
        require("event location", &self.location)
    }
}

/// Payload for `POST /tickets`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseTicket {
    pub event_id: Uuid,
}

impl PurchaseTicket {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.event_id.is_nil() {
            return Err(ClientError::Validation("an event must be selected".to_string()));
        }
        Ok(())
    }
}

/// Lifecycle state of a ticket. Wire values are the backend's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    #[default]
    #[serde(rename = "valido")]
    Valid,
    #[serde(rename = "usado")]
    Used,
    #[serde(rename = "cancelado")]
    Cancelled,
}

/// A ticket held by a buyer. `token` is the QR payload shown at the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "EventID")]
    pub event_id: Uuid,
    #[serde(rename = "UserID")]
    pub owner_id: Uuid,
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "Status", default)]
    pub status: TicketStatus,
    /// Present when the backend loaded the event alongside the ticket.
    #[serde(
        rename = "Event",
        default,
        deserialize_with = "loaded_event",
        skip_serializing_if = "Option::is_none"
    )]
    pub event: Option<Event>,
}

// An event that was not loaded arrives zero-valued, with a nil ID.
fn loaded_event<'de, D>(deserializer: D) -> Result<Option<Event>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let event = Option::<Event>::deserialize(deserializer)?;
    Ok(event.filter(|e| !e.id.is_nil()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Organizer".parse::<Role>(), Ok(Role::Organizer));
        assert_eq!(" buyer ".parse::<Role>(), Ok(Role::Buyer));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn session_debug_redacts_token() {
        let session = Session {
            token: "secret-token".to_string(),
            role: Role::Buyer,
            user_id: Uuid::nil(),
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-token"));
        assert_eq!(session.bearer(), "Bearer secret-token");
    }

    #[test]
    fn login_response_debug_redacts_token() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"token":"secret-token","user":{"ID":"00000000-0000-0000-0000-000000000001","Name":"Ana","Email":"ana@example.com","Role":"buyer"}}"#,
        )
        .unwrap();
        let debug = format!("{response:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("ana@example.com"));
    }

    #[test]
    fn user_ignores_extra_backend_fields() {
        let user: User = serde_json::from_str(
            r#"{"ID":"00000000-0000-0000-0000-000000000001","Name":"Ana","Email":"ana@example.com","Password":"$2a$10$hash","Role":"organizer"}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Organizer);
        assert_eq!(user.name, "Ana");
    }

    #[test]
    fn event_date_serializes_as_utc_iso8601() {
        let event: Event = serde_json::from_str(
            r#"{"ID":"00000000-0000-0000-0000-000000000001","Name":"A","Date":"2025-03-01T12:00:00Z","Location":"X","Description":"Y","OrganizerID":"00000000-0000-0000-0000-000000000002"}"#,
        )
        .unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["Date"], "2025-03-01T12:00:00Z");
    }

    #[test]
    fn blank_fields_fail_validation() {
        let update = ProfileUpdate {
            name: "  ".to_string(),
            email: "a@b.io".to_string(),
        };
        assert!(matches!(update.validate(), Err(ClientError::Validation(_))));

        let update = ProfileUpdate {
            name: "Ana".to_string(),
            email: "nobody".to_string(),
        };
        assert!(matches!(update.validate(), Err(ClientError::Validation(_))));

        let login = LoginRequest {
            email: "a@b.io".to_string(),
            password: String::new(),
        };
        assert!(login.validate().is_err());
    }

    #[test]
    fn ticket_status_defaults_to_valid() {
        let ticket: Ticket = serde_json::from_str(
            r#"{"ID":"00000000-0000-0000-0000-000000000001","EventID":"00000000-0000-0000-0000-000000000002","UserID":"00000000-0000-0000-0000-000000000003","Token":"abc"}"#,
        )
        .unwrap();
        assert_eq!(ticket.status, TicketStatus::Valid);

        let used: TicketStatus = serde_json::from_str(r#""usado""#).unwrap();
        assert_eq!(used, TicketStatus::Used);
    }

    #[test]
    fn ticket_carries_loaded_event() {
        let ticket: Ticket = serde_json::from_str(
            r#"{"ID":"00000000-0000-0000-0000-000000000001","EventID":"00000000-0000-0000-0000-000000000002","UserID":"00000000-0000-0000-0000-000000000003","Token":"abc","Status":"valido","Event":{"ID":"00000000-0000-0000-0000-000000000002","Name":"Concert","Date":"2025-03-01T12:00:00Z","Location":"Hall","Description":"","OrganizerID":"00000000-0000-0000-0000-000000000004","Organizer":{"ID":"00000000-0000-0000-0000-000000000004"}}}"#,
        )
        .unwrap();
        let event = ticket.event.expect("event loaded");
        assert_eq!(event.name, "Concert");
        assert_eq!(event.id, ticket.event_id);
    }

    #[test]
    fn zero_valued_event_is_not_loaded() {
        let ticket: Ticket = serde_json::from_str(
            r#"{"ID":"00000000-0000-0000-0000-000000000001","EventID":"00000000-0000-0000-0000-000000000002","UserID":"00000000-0000-0000-0000-000000000003","Token":"abc","Event":{"ID":"00000000-0000-0000-0000-000000000000","Name":"","Date":"0001-01-01T00:00:00Z","Location":"","Description":"","OrganizerID":"00000000-0000-0000-0000-000000000000"}}"#,
        )
        .unwrap();
        assert_eq!(ticket.event, None);

        let json = serde_json::to_value(&ticket).unwrap();
        assert!(json.get("Event").is_none());
    }
}
