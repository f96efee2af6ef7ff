use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Event, LoginResponse, Ticket, User};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<String> {
    json_request("GET", uri, token, "")
}

async fn register(app: &Router, email: &str, role: &str) -> User {
    let body = format!(r#"{{"name":"Test","email":"{email}","password":"pw","role":"{role}"}}"#);
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/register", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

async fn login(app: &Router, email: &str) -> String {
    let body = format!(r#"{{"email":"{email}","password":"pw"}}"#);
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/login", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let login: LoginResponse = body_json(resp).await;
    login.token
}

async fn signed_in(app: &Router, email: &str, role: &str) -> String {
    register(app, email, role).await;
    login(app, email).await
}

const FUTURE_EVENT: &str =
    r#"{"name":"Concert","description":"Live","location":"Hall","date":"2099-01-01T20:00:00Z"}"#;
const PAST_EVENT: &str =
    r#"{"name":"Old","description":"","location":"Hall","date":"2001-01-01T20:00:00Z"}"#;

async fn create_event(app: &Router, token: &str, body: &str) -> Event {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/events", Some(token), body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn register_returns_201_with_user() {
    let app = app();
    let user = register(&app, "ana@x.io", "organizer").await;
    assert_eq!(user.email, "ana@x.io");
}

#[tokio::test]
async fn register_duplicate_email_returns_409() {
    let app = app();
    register(&app, "ana@x.io", "buyer").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/register",
            None,
            r#"{"name":"Other","email":"ana@x.io","password":"pw","role":"buyer"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_unknown_role_returns_400() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/register",
            None,
            r#"{"name":"A","email":"a@x.io","password":"pw","role":"admin"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_wrong_password_returns_401() {
    let app = app();
    register(&app, "ana@x.io", "buyer").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/login",
            None,
            r#"{"email":"ana@x.io","password":"nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_response_nests_user_with_role() {
    let app = app();
    let user = register(&app, "ana@x.io", "organizer").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/login",
            None,
            r#"{"email":"ana@x.io","password":"pw"}"#,
        ))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(!json["token"].as_str().unwrap().is_empty());
    assert_eq!(json["user"]["Role"], "organizer");
    assert_eq!(json["user"]["ID"], user.id.to_string());
}

// --- authorization ---

#[tokio::test]
async fn missing_token_returns_401() {
    let app = app();
    let resp = app.oneshot(get("/events", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_returns_401() {
    let app = app();
    let resp = app.oneshot(get("/tickets", Some("forged"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- events ---

#[tokio::test]
async fn organizer_lists_only_own_events() {
    let app = app();
    let ana = signed_in(&app, "ana@x.io", "organizer").await;
    let bo = signed_in(&app, "bo@x.io", "organizer").await;
    create_event(&app, &ana, FUTURE_EVENT).await;

    let resp = app.clone().oneshot(get("/events", Some(&ana))).await.unwrap();
    let events: Vec<Event> = body_json(resp).await;
    assert_eq!(events.len(), 1);

    let resp = app.oneshot(get("/events", Some(&bo))).await.unwrap();
    let events: Vec<Event> = body_json(resp).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn buyer_cannot_create_events() {
    let app = app();
    let token = signed_in(&app, "bo@x.io", "buyer").await;
    let resp = app
        .oneshot(json_request("POST", "/events", Some(&token), FUTURE_EVENT))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn future_events_exclude_past_dates() {
    let app = app();
    let organizer = signed_in(&app, "ana@x.io", "organizer").await;
    let buyer = signed_in(&app, "bo@x.io", "buyer").await;
    create_event(&app, &organizer, FUTURE_EVENT).await;
    create_event(&app, &organizer, PAST_EVENT).await;

    let resp = app.oneshot(get("/events/future", Some(&buyer))).await.unwrap();
    let events: Vec<Event> = body_json(resp).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "Concert");
}

#[tokio::test]
async fn update_by_non_owner_returns_403() {
    let app = app();
    let ana = signed_in(&app, "ana@x.io", "organizer").await;
    let bo = signed_in(&app, "bo@x.io", "organizer").await;
    let event = create_event(&app, &ana, FUTURE_EVENT).await;

    let resp = app
        .oneshot(json_request("PUT", &format!("/events/{}", event.id), Some(&bo), FUTURE_EVENT))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_replaces_fields() {
    let app = app();
    let ana = signed_in(&app, "ana@x.io", "organizer").await;
    let event = create_event(&app, &ana, FUTURE_EVENT).await;

    let resp = app
        .oneshot(json_request(
            "PUT",
            &format!("/events/{}", event.id),
            Some(&ana),
            r#"{"name":"Renamed","description":"","location":"Park","date":"2099-02-01T20:00:00Z"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Event = body_json(resp).await;
    assert_eq!(updated.id, event.id);
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.location, "Park");
}

#[tokio::test]
async fn delete_returns_204_then_404() {
    let app = app();
    let ana = signed_in(&app, "ana@x.io", "organizer").await;
    let event = create_event(&app, &ana, FUTURE_EVENT).await;
    let uri = format!("/events/{}", event.id);

    let resp = app
        .clone()
        .oneshot(json_request("DELETE", &uri, Some(&ana), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app.oneshot(get(&uri, Some(&ana))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_event_bad_uuid_returns_400() {
    let app = app();
    let token = signed_in(&app, "ana@x.io", "organizer").await;
    let resp = app.oneshot(get("/events/not-a-uuid", Some(&token))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- tickets ---

#[tokio::test]
async fn tickets_are_distinct_per_purchase() {
    let app = app();
    let organizer = signed_in(&app, "ana@x.io", "organizer").await;
    let buyer = signed_in(&app, "bo@x.io", "buyer").await;
    let event = create_event(&app, &organizer, FUTURE_EVENT).await;
    let body = format!(r#"{{"event_id":"{}"}}"#, event.id);

    let mut tickets = Vec::new();
    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/tickets", Some(&buyer), &body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ticket: Ticket = body_json(resp).await;
        assert_eq!(ticket.status, "valido");
        assert!(ticket.event.is_none());
        tickets.push(ticket);
    }
    assert_ne!(tickets[0].id, tickets[1].id);
    assert_ne!(tickets[0].token, tickets[1].token);

    let resp = app.oneshot(get("/tickets", Some(&buyer))).await.unwrap();
    let listed: Vec<Ticket> = body_json(resp).await;
    assert_eq!(listed.len(), 2);
    for ticket in &listed {
        let loaded = ticket.event.as_ref().expect("event loaded with ticket");
        assert_eq!(loaded.id, event.id);
        assert_eq!(loaded.name, event.name);
    }
}

#[tokio::test]
async fn ticket_for_unknown_event_returns_404() {
    let app = app();
    let buyer = signed_in(&app, "bo@x.io", "buyer").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/tickets",
            Some(&buyer),
            r#"{"event_id":"00000000-0000-0000-0000-000000000000"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- user ---

#[tokio::test]
async fn profile_update_and_password_change() {
    let app = app();
    let token = signed_in(&app, "ana@x.io", "buyer").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/user",
            Some(&token),
            r#"{"name":"Ana B","email":"anab@x.io"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user.name, "Ana B");

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/user/password",
            Some(&token),
            r#"{"old_password":"wrong","new_password":"pw2"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/user/password",
            Some(&token),
            r#"{"old_password":"pw","new_password":"pw2"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(get("/user", Some(&token))).await.unwrap();
    let user: User = body_json(resp).await;
    assert_eq!(user.email, "anab@x.io");
}
