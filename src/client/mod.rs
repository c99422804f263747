//! Request lifecycle: descriptor, state machine, exchange driver, response.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── request   - Request descriptor and builder
//! ├── lifecycle - ExchangeState and the pure transition function
//! ├── exchange  - Exchange: memoized send(), signal loop, abort
//! └── response  - the immutable terminal Response
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Request`] | One exchange's configuration |
//! | [`Exchange`] | Drives one request over one transport |
//! | [`AbortHandle`] | Cancels an in-flight exchange |
//! | [`Response`] | Terminal result, produced exactly once |
//! | [`Client`] | Convenience wrapper over a shared connection pool |
//!
//! # Examples
//!
//! ```no_run
//! use http_exchange::client::{Client, Request};
//! use http_exchange::types::{Mapping, Value};
//!
//! # async fn run() -> http_exchange::Result<()> {
//! let client = Client::new();
//!
//! let mut body = Mapping::new();
//! body.insert("title".into(), Value::from("hello"));
//!
//! let response = client
//!     .execute(Request::post("https://api.example.com/posts").with_body(body))
//!     .await?;
//! assert!(response.success);
//! # Ok(())
//! # }
//! ```

mod exchange;
mod lifecycle;
mod request;
mod response;

pub use exchange::{AbortHandle, Exchange};
pub use lifecycle::{transition, Effect, ExchangeState, Step};
pub use request::{Query, Request, DEFAULT_TIMEOUT};
pub use response::{Response, STATUS_NONE};

use crate::error::Result;
use crate::transport::HttpTransport;

/// Convenience entry point: builds exchanges over a shared `reqwest` pool.
///
/// Each call still creates one [`Exchange`] owning one transport; the client
/// only shares the underlying connection pool between them.
#[derive(Clone, Default)]
pub struct Client {
    client: reqwest::Client,
}

impl Client {
    /// Create a client with its own connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client over an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Client { client }
    }

    /// Pair a request with a fresh transport on this client's pool.
    pub fn exchange(&self, request: Request) -> Exchange<HttpTransport> {
        Exchange::new(request, HttpTransport::with_client(self.client.clone()))
    }

    /// Build and drive an exchange to settlement.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        self.exchange(request).send().await
    }
}
