use tracing::info;
use uuid::Uuid;

use crate::api::Api;
use crate::error::ClientError;
use crate::session::SessionStore;
use crate::transport::Transport;
use crate::types::{Event, EventDraft};

/// Organizer event management and buyer browsing.
pub struct EventService<'a, T, S> {
    api: &'a Api<T, S>,
}

impl<'a, T: Transport, S: SessionStore> EventService<'a, T, S> {
    pub(crate) fn new(api: &'a Api<T, S>) -> Self {
        Self { api }
    }

    /// Events owned by the signed-in organizer.
    pub fn list(&self) -> Result<Vec<Event>, ClientError> {
        self.api
            .authorized(|c, s| c.build_list_events(s), |c, r| c.parse_events(r))
    }

    /// Upcoming events from every organizer.
    pub fn list_future(&self) -> Result<Vec<Event>, ClientError> {
        self.api
            .authorized(|c, s| c.build_list_future_events(s), |c, r| c.parse_events(r))
    }

    pub fn get(&self, id: Uuid) -> Result<Event, ClientError> {
        self.api
            .authorized(|c, s| c.build_get_event(s, id), |c, r| c.parse_event(r))
    }

    pub fn create(&self, draft: &EventDraft) -> Result<Event, ClientError> {
        draft.validate()?;
        let event = self
            .api
            .authorized(|c, s| c.build_create_event(s, draft), |c, r| c.parse_event(r))?;
        info!(event_id = %event.id, "event created");
        Ok(event)
    }

    /// Replace name, date, location and description of an owned event.
    pub fn update(&self, id: Uuid, draft: &EventDraft) -> Result<Event, ClientError> {
        draft.validate()?;
        let event = self
            .api
            .authorized(|c, s| c.build_update_event(s, id, draft), |c, r| c.parse_event(r))?;
        info!(event_id = %event.id, "event updated");
        Ok(event)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        self.api
            .authorized(|c, s| c.build_delete_event(s, id), |c, r| c.parse_no_content(r))?;
        info!(event_id = %id, "event deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use crate::api::Api;
    use crate::client::TicketingClient;
    use crate::error::ClientError;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::session::MemorySessionStore;
    use crate::testing::ScriptedTransport;
    use crate::types::{EventDraft, Role, Session};

    fn store() -> MemorySessionStore {
        MemorySessionStore::with_session(&Session {
            token: "tok".to_string(),
            role: Role::Organizer,
            user_id: Uuid::from_u128(2),
        })
    }

    fn draft(name: &str) -> EventDraft {
        EventDraft {
            name: name.to_string(),
            date: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            location: "X".to_string(),
            description: "Y".to_string(),
        }
    }

    #[test]
    fn create_rejects_blank_name_locally() {
        let transport = ScriptedTransport::new();
        let api = Api::new(TicketingClient::new("http://api"), &transport, store());

        let err = api.events().create(&draft("   ")).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn create_returns_server_event() {
        let transport = ScriptedTransport::new();
        transport.push(HttpResponse::new(
            200,
            format!(
                r#"{{"ID":"{}","Name":"A","Date":"2025-03-01T12:00:00Z","Location":"X","Description":"Y","OrganizerID":"{}"}}"#,
                Uuid::from_u128(1),
                Uuid::from_u128(2)
            ),
        ));
        let api = Api::new(TicketingClient::new("http://api"), &transport, store());

        let event = api.events().create(&draft("A")).unwrap();
        assert_eq!(event.name, "A");
        assert_eq!(event.organizer_id, Uuid::from_u128(2));
        assert_eq!(transport.requests()[0].method, HttpMethod::Post);
    }

    #[test]
    fn delete_of_foreign_event_is_http_error() {
        let transport = ScriptedTransport::new();
        transport.push(HttpResponse::new(403, "not the owner"));
        let api = Api::new(TicketingClient::new("http://api"), &transport, store());

        let err = api.events().delete(Uuid::from_u128(1)).unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 403, .. }));
    }
}
