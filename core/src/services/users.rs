use tracing::info;

use crate::api::Api;
use crate::error::ClientError;
use crate::session::SessionStore;
use crate::transport::Transport;
use crate::types::{ChangePassword, ProfileUpdate, UserProfile};

/// Profile of the signed-in user.
pub struct UserService<'a, T, S> {
    api: &'a Api<T, S>,
}

impl<'a, T: Transport, S: SessionStore> UserService<'a, T, S> {
    pub(crate) fn new(api: &'a Api<T, S>) -> Self {
        Self { api }
    }

    pub fn profile(&self) -> Result<UserProfile, ClientError> {
        self.api
            .authorized(|c, s| c.build_get_profile(s), |c, r| c.parse_profile(r))
    }

    pub fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ClientError> {
        update.validate()?;
        let profile = self
            .api
            .authorized(|c, s| c.build_update_profile(s, update), |c, r| c.parse_profile(r))?;
        info!("profile updated");
        Ok(profile)
    }

    /// Set a new password. The password is never readable afterwards.
    pub fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ClientError> {
        let input = ChangePassword {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        input.validate()?;
        self.api
            .authorized(|c, s| c.build_change_password(s, &input), |c, r| c.parse_no_content(r))?;
        info!("password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::api::Api;
    use crate::client::TicketingClient;
    use crate::error::ClientError;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::session::MemorySessionStore;
    use crate::testing::ScriptedTransport;
    use crate::types::{ProfileUpdate, Role, Session};

    fn store() -> MemorySessionStore {
        MemorySessionStore::with_session(&Session {
            token: "tok".to_string(),
            role: Role::Buyer,
            user_id: Uuid::from_u128(3),
        })
    }

    #[test]
    fn profile_reads_name_and_email() {
        let transport = ScriptedTransport::new();
        transport.push(HttpResponse::new(
            200,
            r#"{"ID":"00000000-0000-0000-0000-000000000003","Name":"Bo","Email":"bo@x.io","Role":"buyer"}"#,
        ));
        let api = Api::new(TicketingClient::new("http://api"), &transport, store());

        let profile = api.users().profile().unwrap();
        assert_eq!(profile.name, "Bo");
        assert_eq!(profile.email, "bo@x.io");
    }

    #[test]
    fn update_profile_validates_before_sending() {
        let transport = ScriptedTransport::new();
        let api = Api::new(TicketingClient::new("http://api"), &transport, store());
        let update = ProfileUpdate {
            name: String::new(),
            email: "bo@x.io".to_string(),
        };
        assert!(matches!(api.users().update_profile(&update), Err(ClientError::Validation(_))));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn change_password_puts_old_and_new() {
        let transport = ScriptedTransport::new();
        transport.push(HttpResponse::new(204, ""));
        let api = Api::new(TicketingClient::new("http://api"), &transport, store());

        api.users().change_password("old", "new").unwrap();
        let sent = transport.requests();
        assert_eq!(sent[0].method, HttpMethod::Put);
        assert_eq!(sent[0].url, "http://api/user/password");
        let body: serde_json::Value =
            serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["old_password"], "old");
        assert_eq!(body["new_password"], "new");
    }
}
