//! In-memory stand-in for the ticketing REST backend.
//!
//! Serves the same routes and JSON shapes as the real service: Pascal-case
//! response fields, lower-snake request fields, opaque bearer tokens.
//! State lives in a single `RwLock` and is lost when the process exits.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Organizer,
    Buyer,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
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

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Date")]
    pub date: DateTime<Utc>,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "OrganizerID")]
    pub organizer_id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "EventID")]
    pub event_id: Uuid,
    #[serde(rename = "UserID")]
    pub user_id: Uuid,
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Event", skip_serializing_if = "Option::is_none", default)]
    pub event: Option<Event>,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EventInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct TicketInput {
    pub event_id: Uuid,
}

#[derive(Deserialize)]
pub struct ProfileInput {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct PasswordInput {
    pub old_password: String,
    pub new_password: String,
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<Uuid, Account>,
    tokens: HashMap<String, Uuid>,
    events: Vec<Event>,
    tickets: Vec<Ticket>,
}

pub type Db = Arc<RwLock<Store>>;

type ApiError = (StatusCode, String);

fn reject(status: StatusCode, msg: &str) -> ApiError {
    (status, msg.to_string())
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/user", get(get_user).put(update_user))
        .route("/user/password", put(change_password))
        .route("/events", get(list_events).post(create_event))
        .route("/events/future", get(list_future_events))
        .route("/events/{id}", get(get_event).put(update_event).delete(delete_event))
        .route("/tickets", get(list_tickets).post(create_ticket))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock ticketing backend listening");
    }
    axum::serve(listener, app()).await
}

/// The caller identified by a valid `Authorization: Bearer <token>` header.
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl FromRequestParts<Db> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                reject(StatusCode::UNAUTHORIZED, "authorization header missing or malformed")
            })?;
        let store = db.read().await;
        let id = *store
            .tokens
            .get(token)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "invalid token"))?;
        let account = store
            .accounts
            .get(&id)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "user not found"))?;
        Ok(AuthUser {
            id,
            role: account.user.role,
        })
    }
}

impl AuthUser {
    fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role != role {
            return Err(reject(StatusCode::FORBIDDEN, "role not permitted"));
        }
        Ok(())
    }
}

fn parse_role(raw: &str) -> Option<Role> {
    match raw {
        "organizer" => Some(Role::Organizer),
        "buyer" => Some(Role::Buyer),
        _ => None,
    }
}

// --- auth ------------------------------------------------------------------

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let role = parse_role(&input.role)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "invalid role"))?;
    if input.name.trim().is_empty() || input.email.trim().is_empty() || input.password.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "name, email and password are required"));
    }
    let mut store = db.write().await;
    if store.accounts.values().any(|a| a.user.email == input.email) {
        return Err(reject(StatusCode::CONFLICT, "email already in use"));
    }
    let user = User {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
        role,
    };
    store.accounts.insert(
        user.id,
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut store = db.write().await;
    let user = store
        .accounts
        .values()
        .find(|a| a.user.email == input.email && a.password == input.password)
        .map(|a| a.user.clone())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "invalid credentials"))?;
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone(), user.id);
    Ok(Json(LoginResponse { token, user }))
}

// --- user ------------------------------------------------------------------

async fn get_user(auth: AuthUser, State(db): State<Db>) -> Result<Json<User>, ApiError> {
    let store = db.read().await;
    store
        .accounts
        .get(&auth.id)
        .map(|a| Json(a.user.clone()))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "user not found"))
}

async fn update_user(
    auth: AuthUser,
    State(db): State<Db>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<User>, ApiError> {
    let mut store = db.write().await;
    if store
        .accounts
        .values()
        .any(|a| a.user.email == input.email && a.user.id != auth.id)
    {
        return Err(reject(StatusCode::CONFLICT, "email is already in use"));
    }
    let account = store
        .accounts
        .get_mut(&auth.id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "user not found"))?;
    account.user.name = input.name;
    account.user.email = input.email;
    Ok(Json(account.user.clone()))
}

async fn change_password(
    auth: AuthUser,
    State(db): State<Db>,
    Json(input): Json<PasswordInput>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    let account = store
        .accounts
        .get_mut(&auth.id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "user not found"))?;
    if account.password != input.old_password {
        return Err(reject(StatusCode::BAD_REQUEST, "old password is incorrect"));
    }
    account.password = input.new_password;
    Ok(StatusCode::NO_CONTENT)
}

// --- events ----------------------------------------------------------------

async fn list_events(auth: AuthUser, State(db): State<Db>) -> Json<Vec<Event>> {
    let store = db.read().await;
    Json(
        store
            .events
            .iter()
            .filter(|e| e.organizer_id == auth.id)
            .cloned()
            .collect(),
    )
}

async fn list_future_events(_auth: AuthUser, State(db): State<Db>) -> Json<Vec<Event>> {
    let now = Utc::now();
    let store = db.read().await;
    Json(store.events.iter().filter(|e| e.date > now).cloned().collect())
}

async fn get_event(
    _auth: AuthUser,
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    let store = db.read().await;
    store
        .events
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "event not found"))
}

async fn create_event(
    auth: AuthUser,
    State(db): State<Db>,
    Json(input): Json<EventInput>,
) -> Result<Json<Event>, ApiError> {
    auth.require(Role::Organizer)?;
    let event = Event {
        id: Uuid::new_v4(),
        name: input.name,
        description: input.description,
        date: input.date,
        location: input.location,
        organizer_id: auth.id,
    };
    db.write().await.events.push(event.clone());
    Ok(Json(event))
}

async fn update_event(
    auth: AuthUser,
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<EventInput>,
) -> Result<Json<Event>, ApiError> {
    let mut store = db.write().await;
    let event = store
        .events
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "event not found"))?;
    if event.organizer_id != auth.id {
        return Err(reject(StatusCode::FORBIDDEN, "you are not authorized to update this event"));
    }
    event.name = input.name;
    event.description = input.description;
    event.location = input.location;
    event.date = input.date;
    Ok(Json(event.clone()))
}

async fn delete_event(
    auth: AuthUser,
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    let event = store
        .events
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "event not found"))?;
    if event.organizer_id != auth.id {
        return Err(reject(StatusCode::FORBIDDEN, "you are not authorized to delete this event"));
    }
    store.events.retain(|e| e.id != id);
    store.tickets.retain(|t| t.event_id != id);
    Ok(StatusCode::NO_CONTENT)
}

// --- tickets ---------------------------------------------------------------

/// The buyer's tickets with their events loaded.
async fn list_tickets(auth: AuthUser, State(db): State<Db>) -> Json<Vec<Ticket>> {
    let store = db.read().await;
    Json(
        store
            .tickets
            .iter()
            .filter(|t| t.user_id == auth.id)
            .map(|t| Ticket {
                event: store.events.iter().find(|e| e.id == t.event_id).cloned(),
                ..t.clone()
            })
            .collect(),
    )
}

async fn create_ticket(
    auth: AuthUser,
    State(db): State<Db>,
    Json(input): Json<TicketInput>,
) -> Result<Json<Ticket>, ApiError> {
    auth.require(Role::Buyer)?;
    let mut store = db.write().await;
    if !store.events.iter().any(|e| e.id == input.event_id) {
        return Err(reject(StatusCode::NOT_FOUND, "event not found"));
    }
    let ticket = Ticket {
        id: Uuid::new_v4(),
        event_id: input.event_id,
        user_id: auth.id,
        token: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
        status: "valido".to_string(),
        event: None,
    };
    store.tickets.push(ticket.clone());
    Ok(Json(ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_backend_field_names() {
        let event = Event {
            id: Uuid::nil(),
            name: "A".to_string(),
            description: "Y".to_string(),
            date: "2025-03-01T12:00:00Z".parse().unwrap(),
            location: "X".to_string(),
            organizer_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["ID"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["Name"], "A");
        assert_eq!(json["Date"], "2025-03-01T12:00:00Z");
        assert_eq!(json["OrganizerID"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn event_input_defaults_description() {
        let input: EventInput =
            serde_json::from_str(r#"{"name":"A","location":"X","date":"2025-03-01T12:00:00Z"}"#)
                .unwrap();
        assert_eq!(input.description, "");
    }

    #[test]
    fn event_input_rejects_non_iso_date() {
        let result: Result<EventInput, _> =
            serde_json::from_str(r#"{"name":"A","location":"X","date":"01/03/2025"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_role_accepts_known_roles_only() {
        assert_eq!(parse_role("organizer"), Some(Role::Organizer));
        assert_eq!(parse_role("buyer"), Some(Role::Buyer));
        assert_eq!(parse_role("admin"), None);
    }
}
