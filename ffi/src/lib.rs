//! C ABI over `ticketing-core`.
//!
//! # Overview
//! Lets a native host (the mobile shell) drive the ticketing client without
//! linking Rust's networking or serde: the host asks for an `FfiHttpRequest`,
//! executes it with its own HTTP stack, and hands the answer back for
//! parsing.
//!
//! # Design
//! - Every `extern "C"` function runs inside `catch_unwind`; panics never
//!   cross the boundary.
//! - `tk_build_*` / `tk_parse_*` mirror the core client one to one.
//! - The handle keeps the session in memory. `tk_parse_login` stores it,
//!   `tk_logout` drops it and authenticated builders read it.
//! - `tk_home_screen` runs the core router against the stored session, so
//!   the host never decides the home screen itself.
//! - Builders return null on failure and record the reason for
//!   `tk_last_error_code`. Parsers always return an `FfiResult`.
//! - The caller owns every returned pointer and releases it with the
//!   matching `tk_free_*` function.

pub mod types;

use std::cell::Cell;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use chrono::{DateTime, Utc};
use ticketing_core::{
    clear_session, load_session, save_session, ChangePassword, ClientError, EventDraft,
    HttpRequest, HttpResponse, LoginRequest, ProfileUpdate, PurchaseTicket, RegisterUser, Router,
    Session,
};
use uuid::Uuid;

use types::*;

thread_local! {
    static LAST_ERROR: Cell<FfiErrorCode> = const { Cell::new(FfiErrorCode::Ok) };
}

fn set_last_error(code: FfiErrorCode) {
    LAST_ERROR.with(|last| last.set(code));
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn client_ref<'a>(
    client: *const FfiTicketingClient,
) -> Result<&'a FfiTicketingClient, FfiErrorCode> {
    if client.is_null() {
        return Err(FfiErrorCode::NullArg);
    }
    Ok(unsafe { &*client })
}

fn arg_str<'a>(s: *const c_char) -> Result<&'a str, FfiErrorCode> {
    if s.is_null() {
        return Err(FfiErrorCode::NullArg);
    }
    unsafe { CStr::from_ptr(s) }
        .to_str()
        .map_err(|_| FfiErrorCode::InvalidArgument)
}

/// Like `arg_str`, but null reads as "".
fn arg_str_or_empty<'a>(s: *const c_char) -> Result<&'a str, FfiErrorCode> {
    if s.is_null() {
        return Ok("");
    }
    arg_str(s)
}

fn arg_uuid(s: *const c_char) -> Result<Uuid, FfiErrorCode> {
    Uuid::parse_str(arg_str(s)?).map_err(|_| FfiErrorCode::InvalidArgument)
}

fn arg_date(s: *const c_char) -> Result<DateTime<Utc>, FfiErrorCode> {
    DateTime::parse_from_rfc3339(arg_str(s)?)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| FfiErrorCode::InvalidArgument)
}

fn draft(
    name: *const c_char,
    date: *const c_char,
    location: *const c_char,
    description: *const c_char,
) -> Result<EventDraft, FfiErrorCode> {
    Ok(EventDraft {
        name: arg_str(name)?.to_string(),
        date: arg_date(date)?,
        location: arg_str(location)?.to_string(),
        description: arg_str_or_empty(description)?.to_string(),
    })
}

fn core_error(err: ClientError) -> FfiErrorCode {
    FfiErrorCode::from(&err)
}

impl FfiTicketingClient {
    fn session(&self) -> Result<Option<Session>, FfiErrorCode> {
        load_session(&self.store).map_err(core_error)
    }
}

/// Run a builder, lowering its request to C and recording the outcome.
fn build(f: impl FnOnce() -> Result<HttpRequest, FfiErrorCode>) -> *mut FfiHttpRequest {
    let outcome = catch_unwind(AssertUnwindSafe(f)).unwrap_or(Err(FfiErrorCode::Panic));
    match outcome {
        Ok(req) => {
            set_last_error(FfiErrorCode::Ok);
            FfiHttpRequest::from_core(req)
        }
        Err(code) => {
            set_last_error(code);
            ptr::null_mut()
        }
    }
}

/// Run an authenticated builder with the stored session.
fn build_authorized(
    client: *const FfiTicketingClient,
    f: impl FnOnce(&FfiTicketingClient, Option<&Session>) -> Result<HttpRequest, FfiErrorCode>,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = client_ref(client)?;
        let session = client.session()?;
        f(client, session.as_ref())
    })
}

/// Run a parser over the host's response.
fn parse(
    client: *const FfiTicketingClient,
    response: *const FfiHttpResponse,
    what: &str,
    f: impl FnOnce(&FfiTicketingClient, HttpResponse) -> Result<Payload, ClientError>,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let response = unsafe { &*response };
        let body = if response.body.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(response.body) }
                .to_string_lossy()
                .into_owned()
        };
        match f(client, HttpResponse::new(response.status, body)) {
            Ok(payload) => FfiResult::ok(payload),
            Err(err) => FfiResult::from_error(&err),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic(&format!("panic in {what}")))
}

// ---------------------------------------------------------------------------
// Client lifecycle and session
// ---------------------------------------------------------------------------

/// Create a client bound to `base_url`, with no session.
///
/// Returns null if `base_url` is null or not UTF-8. Free with
/// `tk_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_client_new(base_url: *const c_char) -> *mut FfiTicketingClient {
    catch_unwind(|| match arg_str(base_url) {
        Ok(url) => {
            set_last_error(FfiErrorCode::Ok);
            Box::into_raw(Box::new(FfiTicketingClient::new(url)))
        }
        Err(code) => {
            set_last_error(code);
            ptr::null_mut()
        }
    })
    .unwrap_or(ptr::null_mut())
}

/// Free a client created by `tk_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tk_client_free(client: *mut FfiTicketingClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Why the last `tk_build_*` or session call on this thread failed, or `Ok`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_last_error_code() -> FfiErrorCode {
    LAST_ERROR.with(Cell::get)
}

/// Install a session the host kept from an earlier `tk_parse_login`.
///
/// Returns false and records the reason if any argument is null or invalid.
#[unsafe(no_mangle)]
pub extern "C" fn tk_restore_session(
    client: *const FfiTicketingClient,
    token: *const c_char,
    role: FfiRole,
    user_id: *const c_char,
) -> bool {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let client = client_ref(client)?;
        let token = arg_str(token)?;
        if token.is_empty() {
            return Err(FfiErrorCode::InvalidArgument);
        }
        let session = Session {
            token: token.to_string(),
            role: role.to_core().ok_or(FfiErrorCode::InvalidArgument)?,
            user_id: arg_uuid(user_id)?,
        };
        save_session(&client.store, &session).map_err(core_error)
    }))
    .unwrap_or(Err(FfiErrorCode::Panic));
    finish(outcome)
}

/// Forget the stored session. Later authenticated builders return null with
/// `Authentication`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_logout(client: *const FfiTicketingClient) -> bool {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let client = client_ref(client)?;
        clear_session(&client.store).map_err(core_error)
    }))
    .unwrap_or(Err(FfiErrorCode::Panic));
    finish(outcome)
}

/// Role of the stored session; the host picks the home screen from it.
/// `None` when signed out.
#[unsafe(no_mangle)]
pub extern "C" fn tk_current_role(client: *const FfiTicketingClient) -> FfiRole {
    catch_unwind(AssertUnwindSafe(|| {
        client_ref(client)
            .and_then(FfiTicketingClient::session)
            .ok()
            .flatten()
            .map_or(FfiRole::None, |s| s.role.into())
    }))
    .unwrap_or(FfiRole::None)
}

/// Screen to show after a successful `tk_parse_login`: the home screen for
/// the stored role, or `Login` when no complete session is stored.
#[unsafe(no_mangle)]
pub extern "C" fn tk_home_screen(client: *const FfiTicketingClient) -> FfiScreen {
    catch_unwind(AssertUnwindSafe(|| {
        let Ok(client) = client_ref(client) else {
            return FfiScreen::Login;
        };
        let mut router = Router::new();
        // On failure the router stays on Login.
        let _ = router.complete_login(&client.store);
        router.screen().into()
    }))
    .unwrap_or(FfiScreen::Login)
}

fn finish(outcome: Result<(), FfiErrorCode>) -> bool {
    let code = outcome.err().unwrap_or(FfiErrorCode::Ok);
    set_last_error(code);
    code == FfiErrorCode::Ok
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// `POST /login`. Needs no session.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_login(
    client: *const FfiTicketingClient,
    email: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = client_ref(client)?;
        let input = LoginRequest {
            email: arg_str(email)?.trim().to_string(),
            password: arg_str(password)?.to_string(),
        };
        input.validate().map_err(core_error)?;
        client.inner.build_login(&input).map_err(core_error)
    })
}

/// `POST /register`. `role` must not be `None`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_register(
    client: *const FfiTicketingClient,
    name: *const c_char,
    email: *const c_char,
    password: *const c_char,
    role: FfiRole,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = client_ref(client)?;
        let input = RegisterUser {
            name: arg_str(name)?.trim().to_string(),
            email: arg_str(email)?.trim().to_string(),
            password: arg_str(password)?.to_string(),
            role: role.to_core().ok_or(FfiErrorCode::InvalidArgument)?,
        };
        input.validate().map_err(core_error)?;
        client.inner.build_register(&input).map_err(core_error)
    })
}

/// `GET /events`: the signed-in organizer's events.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_list_events(client: *const FfiTicketingClient) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| c.inner.build_list_events(s).map_err(core_error))
}

/// `GET /events/future`: upcoming events for buyers.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_list_future_events(
    client: *const FfiTicketingClient,
) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| {
        c.inner.build_list_future_events(s).map_err(core_error)
    })
}

/// `GET /events/{id}`. Returns null if `id` is not a UUID.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_get_event(
    client: *const FfiTicketingClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| {
        let id = arg_uuid(id)?;
        c.inner.build_get_event(s, id).map_err(core_error)
    })
}

/// `POST /events`. `date` is RFC 3339; `description` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_create_event(
    client: *const FfiTicketingClient,
    name: *const c_char,
    date: *const c_char,
    location: *const c_char,
    description: *const c_char,
) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| {
        let input = draft(name, date, location, description)?;
        input.validate().map_err(core_error)?;
        c.inner.build_create_event(s, &input).map_err(core_error)
    })
}

/// `PUT /events/{id}` with the full set of editable fields.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_update_event(
    client: *const FfiTicketingClient,
    id: *const c_char,
    name: *const c_char,
    date: *const c_char,
    location: *const c_char,
    description: *const c_char,
) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| {
        let id = arg_uuid(id)?;
        let input = draft(name, date, location, description)?;
        input.validate().map_err(core_error)?;
        c.inner.build_update_event(s, id, &input).map_err(core_error)
    })
}

/// `DELETE /events/{id}`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_delete_event(
    client: *const FfiTicketingClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| {
        let id = arg_uuid(id)?;
        c.inner.build_delete_event(s, id).map_err(core_error)
    })
}

/// `GET /tickets`: the signed-in buyer's tickets.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_list_tickets(client: *const FfiTicketingClient) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| c.inner.build_list_tickets(s).map_err(core_error))
}

/// `POST /tickets` for `event_id`. The nil UUID fails with `Validation`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_purchase_ticket(
    client: *const FfiTicketingClient,
    event_id: *const c_char,
) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| {
        let event_id = arg_uuid(event_id)?;
        PurchaseTicket { event_id }.validate().map_err(core_error)?;
        c.inner.build_purchase_ticket(s, event_id).map_err(core_error)
    })
}

/// `GET /user`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_get_profile(client: *const FfiTicketingClient) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| c.inner.build_get_profile(s).map_err(core_error))
}

/// `PUT /user`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_update_profile(
    client: *const FfiTicketingClient,
    name: *const c_char,
    email: *const c_char,
) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| {
        let input = ProfileUpdate {
            name: arg_str(name)?.trim().to_string(),
            email: arg_str(email)?.trim().to_string(),
        };
        input.validate().map_err(core_error)?;
        c.inner.build_update_profile(s, &input).map_err(core_error)
    })
}

/// `PUT /user/password`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_build_change_password(
    client: *const FfiTicketingClient,
    old_password: *const c_char,
    new_password: *const c_char,
) -> *mut FfiHttpRequest {
    build_authorized(client, |c, s| {
        let input = ChangePassword {
            old_password: arg_str(old_password)?.to_string(),
            new_password: arg_str(new_password)?.to_string(),
        };
        input.validate().map_err(core_error)?;
        c.inner.build_change_password(s, &input).map_err(core_error)
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Parse a login response and store the session on success.
/// Data: `FfiSession`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_parse_login(
    client: *const FfiTicketingClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(client, response, "tk_parse_login", |c, r| {
        let session = c.inner.parse_login(r)?.session();
        save_session(&c.store, &session)?;
        Ok(Payload::Session(session))
    })
}

/// Parse a register response. Data: `FfiUser`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_parse_user(
    client: *const FfiTicketingClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(client, response, "tk_parse_user", |c, r| {
        c.inner.parse_user(r).map(Payload::User)
    })
}

/// Parse a get or update profile response. Data: `FfiProfile`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_parse_profile(
    client: *const FfiTicketingClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(client, response, "tk_parse_profile", |c, r| {
        c.inner.parse_profile(r).map(Payload::Profile)
    })
}

/// Parse either event listing. A `null` body is an empty list.
/// Data: `FfiEventList`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_parse_events(
    client: *const FfiTicketingClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(client, response, "tk_parse_events", |c, r| {
        c.inner.parse_events(r).map(Payload::Events)
    })
}

/// Parse a get, create or update event response. Data: `FfiEvent`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_parse_event(
    client: *const FfiTicketingClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(client, response, "tk_parse_event", |c, r| {
        c.inner.parse_event(r).map(Payload::Event)
    })
}

/// Data: `FfiTicketList`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_parse_tickets(
    client: *const FfiTicketingClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(client, response, "tk_parse_tickets", |c, r| {
        c.inner.parse_tickets(r).map(Payload::Tickets)
    })
}

/// Data: `FfiTicket`.
#[unsafe(no_mangle)]
pub extern "C" fn tk_parse_ticket(
    client: *const FfiTicketingClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(client, response, "tk_parse_ticket", |c, r| {
        c.inner.parse_ticket(r).map(Payload::Ticket)
    })
}

/// Parse a response whose body is ignored (delete event, change password).
#[unsafe(no_mangle)]
pub extern "C" fn tk_parse_no_content(
    client: *const FfiTicketingClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse(client, response, "tk_parse_no_content", |c, r| {
        c.inner.parse_no_content(r).map(|()| Payload::None)
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request from any `tk_build_*`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tk_free_request(req: *mut FfiHttpRequest) {
    if !req.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(req) });
        });
    }
}

/// Free a result from any `tk_parse_*`, payload included. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn tk_free_result(result: *mut FfiResult) {
    if !result.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(result) });
        });
    }
}
