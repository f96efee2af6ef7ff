//! Error types for the ticketing client.
//!
//! # Design
//! One enum covers every failure a screen can see. Authentication failures
//! are split by cause: `NoSession` is raised locally before any request is
//! built, `Rejected` comes from a 401. Every other non-2xx response lands in
//! `Http` with the raw status and body.

use std::fmt;

use thiserror::Error;

/// Why an authenticated call could not proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No complete session in the store; nothing was sent.
    NoSession,
    /// The server answered 401 (bad credentials, expired or unknown token).
    Rejected,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::NoSession => write!(f, "no active session"),
            AuthFailure::Rejected => write!(f, "credentials rejected by server"),
        }
    }
}

/// Errors returned by the client, the services and the session store.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication required: {0}")]
    Authentication(AuthFailure),

    /// The server returned a non-2xx status other than 401.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// A local precondition failed; nothing was sent.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The session store could not be read or written.
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn no_session() -> Self {
        ClientError::Authentication(AuthFailure::NoSession)
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ClientError::Authentication(_))
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Authentication(AuthFailure::Rejected) => Some(401),
            _ => None,
        }
    }

    /// Short text suitable for an alert dialog.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Authentication(AuthFailure::NoSession) => {
                "You are not signed in. Please log in again.".to_string()
            }
            ClientError::Authentication(AuthFailure::Rejected) => {
                "Sign-in failed. Check your credentials.".to_string()
            }
            ClientError::Http { status: 403, .. } => {
                "You are not allowed to do that.".to_string()
            }
            ClientError::Http { status: 404, .. } => "That item no longer exists.".to_string(),
            ClientError::Http { status: 409, body } if !body.trim().is_empty() => {
                body.trim().to_string()
            }
            ClientError::Http { status, .. } => format!("The server returned an error ({status})."),
            ClientError::Network(_) => "Could not reach the server. Try again.".to_string(),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Serialization(_) | ClientError::Deserialization(_) => {
                "Unexpected data from the server.".to_string()
            }
            ClientError::Storage(_) => "Could not access saved session.".to_string(),
        }
    }
}
