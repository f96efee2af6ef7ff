use tracing::info;

use crate::api::Api;
use crate::error::ClientError;
use crate::session::{clear_session, save_session, SessionStore};
use crate::transport::Transport;
use crate::types::{LoginRequest, RegisterUser, Session, User};

/// Sign-in, sign-up and sign-out.
pub struct AuthService<'a, T, S> {
    api: &'a Api<T, S>,
}

impl<'a, T: Transport, S: SessionStore> AuthService<'a, T, S> {
    pub(crate) fn new(api: &'a Api<T, S>) -> Self {
        Self { api }
    }

    /// Authenticate and persist the returned session, replacing any
    /// previous one.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let input = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        input.validate()?;
        let login = self
            .api
            .public(|c| c.build_login(&input), |c, r| c.parse_login(r))?;
        let session = login.session();
        save_session(self.api.store(), &session)?;
        info!(role = %session.role, user_id = %session.user_id, "signed in");
        Ok(session)
    }

    /// Create an account. Does not sign in.
    pub fn register(&self, input: &RegisterUser) -> Result<User, ClientError> {
        input.validate()?;
        let user = self
            .api
            .public(|c| c.build_register(input), |c, r| c.parse_user(r))?;
        info!(user_id = %user.id, role = %user.role, "registered");
        Ok(user)
    }

    /// Drop the local session. The server is not contacted.
    pub fn logout(&self) -> Result<(), ClientError> {
        clear_session(self.api.store())?;
        info!("signed out");
        Ok(())
    }

    pub fn current_session(&self) -> Result<Option<Session>, ClientError> {
        self.api.session()
    }
}
