//! The exchange descriptor.

use crate::error::{Error, Result};
use crate::types::{Body, Mapping, ProgressEvent, QueryPairs};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use std::fmt;
use std::time::Duration;

/// Default exchange timeout: 60 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);

/// A lifecycle hook; `on_progress` may fire many times, the others at most
/// once per exchange.
pub type ProgressHandler = Box<dyn FnMut(&ProgressEvent) + Send>;

/// A query field: either a mapping flattened by the repeat-key rule, or an
/// already-encoded query-string container used verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Flattened at send time.
    Mapping(Mapping),
    /// Appended as given.
    Pairs(QueryPairs),
}

impl From<Mapping> for Query {
    fn from(mapping: Mapping) -> Self {
        Query::Mapping(mapping)
    }
}

impl From<QueryPairs> for Query {
    fn from(pairs: QueryPairs) -> Self {
        Query::Pairs(pairs)
    }
}

/// Descriptor of one HTTP exchange.
///
/// Header names are normalized to their canonical (lowercase) form once, here
/// at ingestion; nothing downstream re-derives case-insensitivity. Once the
/// exchange leaves its initial state the descriptor is immutable; see
/// [`Exchange`](crate::client::Exchange).
///
/// # Examples
///
/// ```
/// use http_exchange::client::Request;
/// use http_exchange::types::{Mapping, Value};
/// use http::Method;
///
/// let mut body = Mapping::new();
/// body.insert("name".into(), Value::from("ada"));
///
/// let request = Request::new(Method::POST, "https://api.example.com/users")
///     .with_body(body)
///     .with_header("X-Trace", "abc123")
///     .unwrap()
///     .with_timeout(std::time::Duration::from_secs(5));
/// assert_eq!(request.method(), &Method::POST);
/// ```
pub struct Request {
    pub(crate) path: String,
    pub(crate) method: Method,
    pub(crate) query: Option<Query>,
    pub(crate) body: Option<Body>,
    pub(crate) headers: HeaderMap,
    pub(crate) timeout: Duration,
    pub(crate) on_start: Option<ProgressHandler>,
    pub(crate) on_progress: Option<ProgressHandler>,
    pub(crate) on_complete: Option<ProgressHandler>,
}

impl Request {
    /// Describe an exchange with the given verb and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            path: path.into(),
            method,
            query: None,
            body: None,
            headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
            on_start: None,
            on_progress: None,
            on_complete: None,
        }
    }

    /// Shorthand for a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a query field.
    pub fn with_query(mut self, query: impl Into<Query>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a header; the name is canonicalized immediately.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeader(format!("value for {name}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Override the default 60 s timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Hook invoked once when the transport starts moving.
    pub fn on_start(mut self, handler: impl FnMut(&ProgressEvent) + Send + 'static) -> Self {
        self.on_start = Some(Box::new(handler));
        self
    }

    /// Hook invoked on every progress signal.
    pub fn on_progress(mut self, handler: impl FnMut(&ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(handler));
        self
    }

    /// Hook invoked once when the response has fully arrived.
    pub fn on_complete(mut self, handler: impl FnMut(&ProgressEvent) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(handler));
        self
    }

    /// The request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request verb.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The canonical headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether this verb suppresses the body entirely.
    pub(crate) fn is_read_only(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::TRACE)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
