//! Local persistence of the signed-in session.
//!
//! # Design
//! `SessionStore` is a three-key string store (token, role, user id) with no
//! transactions across keys. `load_session` only yields a `Session` when all
//! three keys are present and valid, so a half-written session reads as
//! signed out. `save_session` writes the token last and `clear_session`
//! removes it first; an interrupted sequence therefore never leaves a token
//! next to stale role data.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ClientError;
use crate::types::{Role, Session};

/// The fields a session is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Token,
    Role,
    UserId,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [SessionKey::Token, SessionKey::Role, SessionKey::UserId];

    /// Name under which the value is persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::Token => "userToken",
            SessionKey::Role => "userRole",
            SessionKey::UserId => "userId",
        }
    }
}

/// Key-value storage for the session fields.
///
/// Methods take `&self`; implementations synchronize internally so a store
/// can be shared by every service.
pub trait SessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, ClientError>;
    fn set(&self, key: SessionKey, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: SessionKey) -> Result<(), ClientError>;
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn get(&self, key: SessionKey) -> Result<Option<String>, ClientError> {
        (**self).get(key)
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), ClientError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: SessionKey) -> Result<(), ClientError> {
        (**self).remove(key)
    }
}

/// Read the current session. Missing or unparseable role/user id reads as
/// no session even when a token is stored.
pub fn load_session<S: SessionStore + ?Sized>(store: &S) -> Result<Option<Session>, ClientError> {
    let Some(token) = store.get(SessionKey::Token)?.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let role = match store.get(SessionKey::Role)? {
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => role,
            Err(err) => {
                warn!(%err, "stored role not recognized, treating as signed out");
                return Ok(None);
            }
        },
        None => {
            debug!("token stored without role, treating as signed out");
            return Ok(None);
        }
    };
    let user_id = match store.get(SessionKey::UserId)? {
        Some(raw) => match Uuid::parse_str(&raw) {
            Ok(id) => id,
            Err(_) => {
                warn!("stored user id is not a uuid, treating as signed out");
                return Ok(None);
            }
        },
        None => {
            debug!("token stored without user id, treating as signed out");
            return Ok(None);
        }
    };
    Ok(Some(Session {
        token,
        role,
        user_id,
    }))
}

/// Persist `session`, replacing whatever was stored.
pub fn save_session<S: SessionStore + ?Sized>(
    store: &S,
    session: &Session,
) -> Result<(), ClientError> {
    store.remove(SessionKey::Token)?;
    store.set(SessionKey::Role, session.role.as_str())?;
    store.set(SessionKey::UserId, &session.user_id.to_string())?;
    store.set(SessionKey::Token, &session.token)
}

/// Remove every session field.
pub fn clear_session<S: SessionStore + ?Sized>(store: &S) -> Result<(), ClientError> {
    store.remove(SessionKey::Token)?;
    store.remove(SessionKey::Role)?;
    store.remove(SessionKey::UserId)
}

/// Process-local store. Used in tests and by hosts that keep the session in
/// their own secure storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: &Session) -> Self {
        let values = HashMap::from([
            (SessionKey::Token, session.token.clone()),
            (SessionKey::Role, session.role.as_str().to_string()),
            (SessionKey::UserId, session.user_id.to_string()),
        ]);
        Self {
            values: RwLock::new(values),
        }
    }
}

fn poisoned() -> ClientError {
    ClientError::Storage("session lock poisoned".to_string())
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, ClientError> {
        let values = self.values.read().map_err(|_| poisoned())?;
        Ok(values.get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), ClientError> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), ClientError> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.remove(&key);
        Ok(())
    }
}

/// Session persisted as a JSON object in a single file.
///
/// Every write replaces the file through a sibling temp file and a rename.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                ClientError::Storage(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ClientError::Storage(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<(), ClientError> {
        let storage_err =
            |e: std::io::Error| ClientError::Storage(format!("{}: {e}", self.path.display()));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(storage_err)?;
        }
        let body = serde_json::to_string_pretty(values)
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        write_private(&tmp, &body).map_err(storage_err)?;
        fs::rename(&tmp, &self.path).map_err(storage_err)
    }
}

/// Write `body` to a fresh file only the owner can read.
fn write_private(path: &Path, body: &str) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(body.as_bytes())?;
    file.sync_all()
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, ClientError> {
        let _guard = self.lock.read().map_err(|_| poisoned())?;
        Ok(self.read_all()?.remove(key.as_str()))
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), ClientError> {
        let _guard = self.lock.write().map_err(|_| poisoned())?;
        let mut values = self.read_all()?;
        values.insert(key.as_str().to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: SessionKey) -> Result<(), ClientError> {
        let _guard = self.lock.write().map_err(|_| poisoned())?;
        let mut values = self.read_all()?;
        if values.remove(key.as_str()).is_none() {
            return Ok(());
        }
        self.write_all(&values)
    }
}
