//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: owned strings
//! become `*mut c_char`, vectors become pointer + length, enums carry
//! explicit discriminants. Types allocated by this library implement `Drop`,
//! so `tk_free_*` only has to rebuild the `Box` and let it go.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::ptr;

use ticketing_core::{
    ClientError, Event, HttpMethod, HttpRequest, MemorySessionStore, Role, Screen, Session,
    Ticket, TicketStatus, TicketingClient, User, UserProfile,
};

/// Opaque handle. Holds the request builder and the signed-in session.
pub struct FfiTicketingClient {
    pub(crate) inner: TicketingClient,
    pub(crate) store: MemorySessionStore,
}

impl FfiTicketingClient {
    pub(crate) fn new(base_url: &str) -> Self {
        Self {
            inner: TicketingClient::new(base_url),
            store: MemorySessionStore::new(),
        }
    }
}

/// Copy `s` into a C string owned by the caller. Interior NULs yield "".
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

pub(crate) fn drop_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Hand `items` to C as pointer + length. Empty vectors become null.
fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let ptr = Box::into_raw(items.into_boxed_slice()) as *mut T;
    (ptr, len)
}

fn drop_raw_slice<T>(items: *mut T, len: u32) {
    if !items.is_null() {
        drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(items, len as usize)) });
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// Account role. `None` means no session is stored.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiRole {
    None = 0,
    Organizer = 1,
    Buyer = 2,
}

impl From<Role> for FfiRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Organizer => FfiRole::Organizer,
            Role::Buyer => FfiRole::Buyer,
        }
    }
}

impl FfiRole {
    pub(crate) fn to_core(self) -> Option<Role> {
        match self {
            FfiRole::Organizer => Some(Role::Organizer),
            FfiRole::Buyer => Some(Role::Buyer),
            FfiRole::None => None,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiScreen {
    Login = 0,
    Register = 1,
    OrganizerHome = 2,
    BuyerHome = 3,
}

impl From<Screen> for FfiScreen {
    fn from(screen: Screen) -> Self {
        match screen {
            Screen::Login => FfiScreen::Login,
            Screen::Register => FfiScreen::Register,
            Screen::OrganizerHome => FfiScreen::OrganizerHome,
            Screen::BuyerHome => FfiScreen::BuyerHome,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiTicketStatus {
    Valid = 0,
    Used = 1,
    Cancelled = 2,
}

impl From<TicketStatus> for FfiTicketStatus {
    fn from(status: TicketStatus) -> Self {
        match status {
            TicketStatus::Valid => FfiTicketStatus::Valid,
            TicketStatus::Used => FfiTicketStatus::Used,
            TicketStatus::Cancelled => FfiTicketStatus::Cancelled,
        }
    }
}

/// Error category reported in `FfiResult` and by `tk_last_error_code`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// No session stored, or the server answered 401.
    Authentication = 1,
    Http = 2,
    Network = 3,
    Validation = 4,
    Deserialization = 5,
    Serialization = 6,
    Storage = 7,
    Panic = 8,
    NullArg = 9,
    /// A string argument was not UTF-8, not a UUID or not an RFC 3339 date.
    InvalidArgument = 10,
}

impl From<&ClientError> for FfiErrorCode {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Authentication(_) => FfiErrorCode::Authentication,
            ClientError::Http { .. } => FfiErrorCode::Http,
            ClientError::Network(_) => FfiErrorCode::Network,
            ClientError::Validation(_) => FfiErrorCode::Validation,
            ClientError::Serialization(_) => FfiErrorCode::Serialization,
            ClientError::Deserialization(_) => FfiErrorCode::Deserialization,
            ClientError::Storage(_) => FfiErrorCode::Storage,
        }
    }
}

/// Tells `tk_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Session = 1,
    User = 2,
    Profile = 3,
    Event = 4,
    EventList = 5,
    Ticket = 6,
    TicketList = 7,
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

impl Drop for FfiHeader {
    fn drop(&mut self) {
        drop_c_string(self.key);
        drop_c_string(self.value);
    }
}

/// An HTTP request for the host to execute. `url` is absolute; `body` is
/// null when there is none.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_slice(headers);
        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body: req.body.map(c_string).unwrap_or(ptr::null_mut()),
        }))
    }
}

impl Drop for FfiHttpRequest {
    fn drop(&mut self) {
        drop_c_string(self.url);
        drop_c_string(self.body);
        drop_raw_slice(self.headers, self.headers_len);
    }
}

/// The host's answer to an `FfiHttpRequest`. Owned by the caller; this
/// library only reads it. A null `body` reads as empty.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Returned by `tk_parse_login`. The host may keep `token` in secure
/// storage and hand it back through `tk_restore_session`.
#[repr(C)]
pub struct FfiSession {
    pub token: *mut c_char,
    pub role: FfiRole,
    pub user_id: *mut c_char,
}

impl From<&Session> for FfiSession {
    fn from(s: &Session) -> Self {
        FfiSession {
            token: c_string(s.token.as_str()),
            role: s.role.into(),
            user_id: c_string(s.user_id.to_string()),
        }
    }
}

impl Drop for FfiSession {
    fn drop(&mut self) {
        drop_c_string(self.token);
        drop_c_string(self.user_id);
    }
}

#[repr(C)]
pub struct FfiUser {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub email: *mut c_char,
    pub role: FfiRole,
}

impl From<User> for FfiUser {
    fn from(u: User) -> Self {
        FfiUser {
            id: c_string(u.id.to_string()),
            name: c_string(u.name),
            email: c_string(u.email),
            role: u.role.into(),
        }
    }
}

impl Drop for FfiUser {
    fn drop(&mut self) {
        drop_c_string(self.id);
        drop_c_string(self.name);
        drop_c_string(self.email);
    }
}

#[repr(C)]
pub struct FfiProfile {
    pub name: *mut c_char,
    pub email: *mut c_char,
}

impl From<UserProfile> for FfiProfile {
    fn from(p: UserProfile) -> Self {
        FfiProfile {
            name: c_string(p.name),
            email: c_string(p.email),
        }
    }
}

impl Drop for FfiProfile {
    fn drop(&mut self) {
        drop_c_string(self.name);
        drop_c_string(self.email);
    }
}

/// An event. `date` is RFC 3339 in UTC.
#[repr(C)]
pub struct FfiEvent {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub date: *mut c_char,
    pub location: *mut c_char,
    pub description: *mut c_char,
    pub organizer_id: *mut c_char,
}

impl From<Event> for FfiEvent {
    fn from(e: Event) -> Self {
        FfiEvent {
            id: c_string(e.id.to_string()),
            name: c_string(e.name),
            date: c_string(e.date.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)),
            location: c_string(e.location),
            description: c_string(e.description),
            organizer_id: c_string(e.organizer_id.to_string()),
        }
    }
}

impl Drop for FfiEvent {
    fn drop(&mut self) {
        drop_c_string(self.id);
        drop_c_string(self.name);
        drop_c_string(self.date);
        drop_c_string(self.location);
        drop_c_string(self.description);
        drop_c_string(self.organizer_id);
    }
}

#[repr(C)]
pub struct FfiEventList {
    pub items: *mut FfiEvent,
    pub len: u32,
}

impl Drop for FfiEventList {
    fn drop(&mut self) {
        drop_raw_slice(self.items, self.len);
    }
}

/// A ticket. `token` is the QR payload.
#[repr(C)]
pub struct FfiTicket {
    pub id: *mut c_char,
    pub event_id: *mut c_char,
    pub owner_id: *mut c_char,
    pub token: *mut c_char,
    pub status: FfiTicketStatus,
    /// Null unless the event was loaded with the ticket.
    pub event: *mut FfiEvent,
}

impl From<Ticket> for FfiTicket {
    fn from(t: Ticket) -> Self {
        FfiTicket {
            id: c_string(t.id.to_string()),
            event_id: c_string(t.event_id.to_string()),
            owner_id: c_string(t.owner_id.to_string()),
            token: c_string(t.token),
            status: t.status.into(),
            event: t
                .event
                .map_or(ptr::null_mut(), |e| Box::into_raw(Box::new(FfiEvent::from(e)))),
        }
    }
}

impl Drop for FfiTicket {
    fn drop(&mut self) {
        drop_c_string(self.id);
        drop_c_string(self.event_id);
        drop_c_string(self.owner_id);
        drop_c_string(self.token);
        if !self.event.is_null() {
            drop(unsafe { Box::from_raw(self.event) });
        }
    }
}

#[repr(C)]
pub struct FfiTicketList {
    pub items: *mut FfiTicket,
    pub len: u32,
}

impl Drop for FfiTicketList {
    fn drop(&mut self) {
        drop_raw_slice(self.items, self.len);
    }
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// Successful parse outcome before it is lowered to C.
pub(crate) enum Payload {
    None,
    Session(Session),
    User(User),
    Profile(UserProfile),
    Event(Event),
    Events(Vec<Event>),
    Ticket(Ticket),
    Tickets(Vec<Ticket>),
}

fn boxed<T>(value: T) -> *mut c_void {
    Box::into_raw(Box::new(value)) as *mut c_void
}

/// Result envelope for every parse operation.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data`
/// points to the payload named by `data_tag`. On failure `data` is null,
/// `error_message` is a user-facing sentence and `http_status` is set when
/// the server answered.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn into_raw(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, message: String) -> *mut Self {
        FfiResult {
            error_code,
            error_message: c_string(message),
            http_status,
            data_tag: FfiDataTag::None,
            data: ptr::null_mut(),
        }
        .into_raw()
    }

    pub(crate) fn ok(payload: Payload) -> *mut Self {
        let (data_tag, data) = match payload {
            Payload::None => (FfiDataTag::None, ptr::null_mut()),
            Payload::Session(s) => (FfiDataTag::Session, boxed(FfiSession::from(&s))),
            Payload::User(u) => (FfiDataTag::User, boxed(FfiUser::from(u))),
            Payload::Profile(p) => (FfiDataTag::Profile, boxed(FfiProfile::from(p))),
            Payload::Event(e) => (FfiDataTag::Event, boxed(FfiEvent::from(e))),
            Payload::Events(events) => {
                let (items, len) =
                    into_raw_slice(events.into_iter().map(FfiEvent::from).collect());
                (FfiDataTag::EventList, boxed(FfiEventList { items, len }))
            }
            Payload::Ticket(t) => (FfiDataTag::Ticket, boxed(FfiTicket::from(t))),
            Payload::Tickets(tickets) => {
                let (items, len) =
                    into_raw_slice(tickets.into_iter().map(FfiTicket::from).collect());
                (FfiDataTag::TicketList, boxed(FfiTicketList { items, len }))
            }
        };
        FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }
        .into_raw()
    }

    pub(crate) fn from_error(err: &ClientError) -> *mut Self {
        Self::failure(err.into(), err.status().unwrap_or(0), err.user_message())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, msg.to_string())
    }
}

impl Drop for FfiResult {
    fn drop(&mut self) {
        drop_c_string(self.error_message);
        if self.data.is_null() {
            return;
        }
        let data = self.data;
        unsafe {
            match self.data_tag {
                FfiDataTag::None => {}
                FfiDataTag::Session => drop(Box::from_raw(data as *mut FfiSession)),
                FfiDataTag::User => drop(Box::from_raw(data as *mut FfiUser)),
                FfiDataTag::Profile => drop(Box::from_raw(data as *mut FfiProfile)),
                FfiDataTag::Event => drop(Box::from_raw(data as *mut FfiEvent)),
                FfiDataTag::EventList => drop(Box::from_raw(data as *mut FfiEventList)),
                FfiDataTag::Ticket => drop(Box::from_raw(data as *mut FfiTicket)),
                FfiDataTag::TicketList => drop(Box::from_raw(data as *mut FfiTicketList)),
            }
        }
    }
}
