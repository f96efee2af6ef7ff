//! Blocking API facade: client, transport and session store in one place.
//!
//! # Design
//! `Api` owns the three collaborators a screen needs and runs the
//! build → execute → parse sequence. Authenticated calls read the session
//! from the store first; when it is absent the call fails with
//! `AuthFailure::NoSession` and the transport is never touched.
//! Resource-specific operations live in the services returned by `auth()`,
//! `events()`, `tickets()` and `users()`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::TicketingClient;
use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::services::{AuthService, EventService, TicketService, UserService};
use crate::session::{load_session, SessionStore};
use crate::transport::Transport;
use crate::types::Session;

#[derive(Debug)]
pub struct Api<T, S> {
    client: TicketingClient,
    transport: T,
    store: S,
}

#[cfg(feature = "ureq")]
impl<S: SessionStore> Api<crate::transport::UreqTransport, S> {
    /// Api over HTTP using the configured base URL and timeout.
    pub fn from_config(config: &crate::config::ClientConfig, store: S) -> Self {
        Self::new(
            TicketingClient::new(&config.base_url),
            crate::transport::UreqTransport::new(config.timeout),
            store,
        )
    }
}

impl<T: Transport, S: SessionStore> Api<T, S> {
    pub fn new(client: TicketingClient, transport: T, store: S) -> Self {
        Self {
            client,
            transport,
            store,
        }
    }

    pub fn client(&self) -> &TicketingClient {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The stored session, if complete.
    pub fn session(&self) -> Result<Option<Session>, ClientError> {
        load_session(&self.store)
    }

    pub fn auth(&self) -> AuthService<'_, T, S> {
        AuthService::new(self)
    }

    pub fn events(&self) -> EventService<'_, T, S> {
        EventService::new(self)
    }

    pub fn tickets(&self) -> TicketService<'_, T, S> {
        TicketService::new(self)
    }

    pub fn users(&self) -> UserService<'_, T, S> {
        UserService::new(self)
    }

    /// Authenticated JSON request against `path`, returning the decoded body.
    pub fn request<B, R>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.authorized(
            |client, session| client.build_authorized(method, path, session, body),
            |client, response| client.parse_json(response),
        )
    }

    /// Run an authenticated operation: load the session, build, execute,
    /// parse.
    pub(crate) fn authorized<R>(
        &self,
        build: impl FnOnce(&TicketingClient, Option<&Session>) -> Result<HttpRequest, ClientError>,
        parse: impl FnOnce(&TicketingClient, HttpResponse) -> Result<R, ClientError>,
    ) -> Result<R, ClientError> {
        let session = self.session()?;
        let request = build(&self.client, session.as_ref())?;
        let response = self.send(request)?;
        let result = parse(&self.client, response);
        if let Err(err) = &result {
            if err.is_authentication() {
                warn!("server rejected the stored session");
            }
        }
        result
    }

    /// Run an operation that needs no session.
    pub(crate) fn public<R>(
        &self,
        build: impl FnOnce(&TicketingClient) -> Result<HttpRequest, ClientError>,
        parse: impl FnOnce(&TicketingClient, HttpResponse) -> Result<R, ClientError>,
    ) -> Result<R, ClientError> {
        let request = build(&self.client)?;
        let response = self.send(request)?;
        parse(&self.client, response)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        self.transport.execute(request)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::error::AuthFailure;
    use crate::session::MemorySessionStore;
    use crate::testing::ScriptedTransport;
    use crate::types::{Event, Role};

    fn session() -> Session {
        Session {
            token: "tok".to_string(),
            role: Role::Organizer,
            user_id: Uuid::nil(),
        }
    }

    #[test]
    fn request_without_session_never_reaches_transport() {
        let transport = ScriptedTransport::new();
        let api = Api::new(
            TicketingClient::new("http://api"),
            &transport,
            MemorySessionStore::new(),
        );

        let err = api
            .request::<(), Vec<Event>>(HttpMethod::Get, "/events", None)
            .unwrap_err();
        assert!(matches!(err, ClientError::Authentication(AuthFailure::NoSession)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn request_attaches_stored_token() {
        let transport = ScriptedTransport::new();
        transport.push(HttpResponse::new(200, "[]"));
        let api = Api::new(
            TicketingClient::new("http://api"),
            &transport,
            MemorySessionStore::with_session(&session()),
        );

        let events: Vec<Event> = api.request::<(), _>(HttpMethod::Get, "/events", None).unwrap();
        assert!(events.is_empty());

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://api/events");
        assert_eq!(sent[0].header("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn transport_failure_surfaces_as_network_error() {
        let transport = ScriptedTransport::new();
        transport.push_error(ClientError::Network("connection refused".to_string()));
        let api = Api::new(
            TicketingClient::new("http://api"),
            &transport,
            MemorySessionStore::with_session(&session()),
        );

        let err = api.events().list().unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
