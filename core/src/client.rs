//! Stateless HTTP request builder and response parser for the ticketing API.
//!
//! # Design
//! `TicketingClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`; the round-trip in between belongs to the
//! caller. Authenticated builders take the current `Session` and fail with
//! `AuthFailure::NoSession` before building anything when it is absent.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AuthFailure, ClientError};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE,
};
use crate::types::{
    ChangePassword, Event, EventDraft, LoginRequest, LoginResponse, ProfileUpdate, PurchaseTicket,
    RegisterUser, Session, Ticket, User, UserProfile,
};

/// Synchronous, stateless client for the ticketing API.
#[derive(Debug, Clone)]
pub struct TicketingClient {
    base_url: String,
}

impl TicketingClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request that needs no credentials.
    pub fn build_public<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, ClientError> {
        let body = body.map(to_json).transpose()?;
        Ok(self.request(method, path, None, body))
    }

    /// Build a request carrying `Authorization: Bearer <token>`.
    pub fn build_authorized<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        session: Option<&Session>,
        body: Option<&B>,
    ) -> Result<HttpRequest, ClientError> {
        let session = session.ok_or_else(ClientError::no_session)?;
        let body = body.map(to_json).transpose()?;
        Ok(self.request(method, path, Some(session), body))
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        session: Option<&Session>,
        body: Option<String>,
    ) -> HttpRequest {
        debug!(%method, path, authorized = session.is_some(), "building request");
        let mut headers = vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
        if let Some(session) = session {
            headers.push((AUTHORIZATION.to_string(), session.bearer()));
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        }
    }

    // --- auth -------------------------------------------------------------

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ClientError> {
        self.build_public(HttpMethod::Post, "/login", Some(input))
    }

    pub fn build_register(&self, input: &RegisterUser) -> Result<HttpRequest, ClientError> {
        self.build_public(HttpMethod::Post, "/register", Some(input))
    }

    // --- events -----------------------------------------------------------

    pub fn build_list_events(&self, session: Option<&Session>) -> Result<HttpRequest, ClientError> {
        self.build_authorized::<()>(HttpMethod::Get, "/events", session, None)
    }

    pub fn build_list_future_events(
        &self,
        session: Option<&Session>,
    ) -> Result<HttpRequest, ClientError> {
        self.build_authorized::<()>(HttpMethod::Get, "/events/future", session, None)
    }

    pub fn build_get_event(
        &self,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<HttpRequest, ClientError> {
        self.build_authorized::<()>(HttpMethod::Get, &format!("/events/{id}"), session, None)
    }

    pub fn build_create_event(
        &self,
        session: Option<&Session>,
        input: &EventDraft,
    ) -> Result<HttpRequest, ClientError> {
        self.build_authorized(HttpMethod::Post, "/events", session, Some(input))
    }

    pub fn build_update_event(
        &self,
        session: Option<&Session>,
        id: Uuid,
        input: &EventDraft,
    ) -> Result<HttpRequest, ClientError> {
        self.build_authorized(HttpMethod::Put, &format!("/events/{id}"), session, Some(input))
    }

    pub fn build_delete_event(
        &self,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<HttpRequest, ClientError> {
        self.build_authorized::<()>(HttpMethod::Delete, &format!("/events/{id}"), session, None)
    }

    // --- tickets ----------------------------------------------------------

    pub fn build_list_tickets(
        &self,
        session: Option<&Session>,
    ) -> Result<HttpRequest, ClientError> {
        self.build_authorized::<()>(HttpMethod::Get, "/tickets", session, None)
    }

    pub fn build_purchase_ticket(
        &self,
        session: Option<&Session>,
        event_id: Uuid,
    ) -> Result<HttpRequest, ClientError> {
        let body = PurchaseTicket { event_id };
        self.build_authorized(HttpMethod::Post, "/tickets", session, Some(&body))
    }

    // --- user -------------------------------------------------------------

    pub fn build_get_profile(&self, session: Option<&Session>) -> Result<HttpRequest, ClientError> {
        self.build_authorized::<()>(HttpMethod::Get, "/user", session, None)
    }

    pub fn build_update_profile(
        &self,
        session: Option<&Session>,
        input: &ProfileUpdate,
    ) -> Result<HttpRequest, ClientError> {
        self.build_authorized(HttpMethod::Put, "/user", session, Some(input))
    }

    pub fn build_change_password(
        &self,
        session: Option<&Session>,
        input: &ChangePassword,
    ) -> Result<HttpRequest, ClientError> {
        self.build_authorized(HttpMethod::Put, "/user/password", session, Some(input))
    }

    // --- parsing ----------------------------------------------------------

    /// Check the status and deserialize the body as `T`.
    pub fn parse_json<T: DeserializeOwned>(
        &self,
        response: HttpResponse,
    ) -> Result<T, ClientError> {
        check_status(&response)?;
        serde_json::from_str(&response.body)
            .map_err(|e| ClientError::Deserialization(e.to_string()))
    }

    /// Check the status and discard the body.
    pub fn parse_no_content(&self, response: HttpResponse) -> Result<(), ClientError> {
        check_status(&response)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ClientError> {
        let login: LoginResponse = self.parse_json(response)?;
        if login.token.is_empty() {
            return Err(ClientError::Deserialization(
                "login response carried an empty token".to_string(),
            ));
        }
        Ok(login)
    }

    pub fn parse_user(&self, response: HttpResponse) -> Result<User, ClientError> {
        self.parse_json(response)
    }

    pub fn parse_profile(&self, response: HttpResponse) -> Result<UserProfile, ClientError> {
        self.parse_json(response)
    }

    /// Parse a list of events. The backend encodes an empty list as `null`.
    pub fn parse_events(&self, response: HttpResponse) -> Result<Vec<Event>, ClientError> {
        Ok(self.parse_json::<Option<Vec<Event>>>(response)?.unwrap_or_default())
    }

    pub fn parse_event(&self, response: HttpResponse) -> Result<Event, ClientError> {
        self.parse_json(response)
    }

    pub fn parse_tickets(&self, response: HttpResponse) -> Result<Vec<Ticket>, ClientError> {
        Ok(self.parse_json::<Option<Vec<Ticket>>>(response)?.unwrap_or_default())
    }

    pub fn parse_ticket(&self, response: HttpResponse) -> Result<Ticket, ClientError> {
        self.parse_json(response)
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<String, ClientError> {
    serde_json::to_string(body).map_err(|e| ClientError::Serialization(e.to_string()))
}

/// Map a non-2xx status to the matching `ClientError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ClientError> {
    if response.is_success() {
        return Ok(());
    }
    debug!(status = response.status, "request failed");
    if response.status == 401 {
        return Err(ClientError::Authentication(AuthFailure::Rejected));
    }
    Err(ClientError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
