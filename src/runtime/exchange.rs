//! The HTTP exchange a dispatch unit reads from and answers on.
//!
//! An [`Exchange`] is a cheap handle (`Arc`) over one request and its single
//! reply slot. Cloning it lets an asynchronous completion write the response
//! after `handle` has returned. Whoever created the exchange holds the
//! matching [`PendingResponse`] and receives exactly one [`ExchangeResponse`].

use super::error::EndpointError;
use futures::channel::oneshot;
use http::{Method, StatusCode};
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Maximum inline path/query parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header carrying a caller-supplied request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Name/value pairs for path and query parameters
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Name/value pairs for headers; names may repeat
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Strongly typed request identifier backed by ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Parse from a header value; if absent or invalid, generate a new one.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.parse::<RequestId>().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RequestId(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}

/// Incoming request data, as handed over by the server and router.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub request_id: RequestId,
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Path variables extracted by the router
    pub path_params: ParamVec,
    /// Query parameters in wire order; names may repeat
    pub query_params: ParamVec,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl ExchangeRequest {
    /// Create a request; a `?query` suffix on `target` is split off and parsed.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        ExchangeRequest {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            path_params: ParamVec::new(),
            query_params: query.map(parse_query_string).unwrap_or_default(),
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_query_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            self.request_id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a path parameter by name; the last occurrence wins
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a query parameter, in wire order
    #[must_use]
    pub fn query_values(&self, name: &str) -> SmallVec<[&str; 4]> {
        self.query_params
            .iter()
            .filter(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Every value of a header (case-insensitive per RFC 7230), in wire order
    #[must_use]
    pub fn header_values(&self, name: &str) -> SmallVec<[&str; 4]> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// First value of a header
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse `a=1&b=x%20y&a=2` into ordered pairs.
#[must_use]
pub fn parse_query_string(query: &str) -> ParamVec {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (Arc::from(decode_component(name).as_str()), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map(Cow::into_owned);
    decoded.unwrap_or(spaced)
}

/// Outgoing response written once per exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResponse {
    pub status: StatusCode,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl ExchangeResponse {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        ExchangeResponse {
            status,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// JSON error body `{"error": message}`
    #[must_use]
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body)
    }

    /// Add or replace a header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8 text, lossily
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct ExchangeInner {
    request: ExchangeRequest,
    reply: Mutex<Option<oneshot::Sender<ExchangeResponse>>>,
}

/// Handle on one in-flight request and its reply slot.
#[derive(Clone)]
pub struct Exchange {
    inner: Arc<ExchangeInner>,
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("request", &self.inner.request)
            .field("complete", &self.is_complete())
            .finish()
    }
}

impl Exchange {
    /// Create an exchange and the receiver for its response.
    #[must_use]
    pub fn new(request: ExchangeRequest) -> (Exchange, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        let exchange = Exchange {
            inner: Arc::new(ExchangeInner {
                request,
                reply: Mutex::new(Some(tx)),
            }),
        };
        (exchange, PendingResponse { rx })
    }

    #[must_use]
    pub fn request(&self) -> &ExchangeRequest {
        &self.inner.request
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.inner.request.request_id
    }

    /// True once a response has been written
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.inner.reply.lock().is_none()
    }

    /// Write the response. Fails if one was already written.
    pub fn respond(&self, response: ExchangeResponse) -> Result<(), EndpointError> {
        let Some(tx) = self.inner.reply.lock().take() else {
            return Err(EndpointError::AlreadyCompleted);
        };
        debug!(
            request_id = %self.request_id(),
            status = response.status.as_u16(),
            body_len = response.body.len(),
            "Exchange completed"
        );
        // The receiver may be gone; the exchange is complete either way
        if tx.send(response).is_err() {
            debug!(request_id = %self.request_id(), "Response receiver dropped");
        }
        Ok(())
    }

    /// Answer 204 with no body
    pub fn no_content(&self) -> Result<(), EndpointError> {
        self.respond(ExchangeResponse::no_content())
    }

    /// Answer with a JSON error body
    pub fn respond_error(&self, status: StatusCode, message: &str) -> Result<(), EndpointError> {
        self.respond(ExchangeResponse::error(status, message))
    }
}

/// Receiving side of an exchange's reply slot.
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<ExchangeResponse>,
}

impl PendingResponse {
    /// Wait for the response; `None` if every exchange handle was dropped
    /// without one being written.
    pub async fn recv(self) -> Option<ExchangeResponse> {
        self.rx.await.ok()
    }

    /// The response if it has already been written
    pub fn try_recv(&mut self) -> Option<ExchangeResponse> {
        self.rx.try_recv().ok().flatten()
    }

    /// Block the current thread until the response arrives.
    ///
    /// Do not call from inside an async runtime worker.
    #[must_use]
    pub fn wait(self) -> Option<ExchangeResponse> {
        futures::executor::block_on(self.recv())
    }
}
