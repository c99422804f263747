//! Error types and result handling.
//!
//! The crate draws a hard line between the two failure families:
//!
//! - **Synchronous, pre-dispatch** errors ([`Error::InvalidState`],
//!   [`Error::Conversion`], [`Error::InvalidHeader`], [`Error::InvalidUrl`]) are
//!   raised before any network I/O begins and are terminal for the exchange.
//! - **Asynchronous, post-dispatch** failures all funnel through a single shape:
//!   [`Error::Failed`] carrying the terminal [`Response`](crate::Response), so
//!   callers handle transport errors, timeouts and aborts uniformly.

use crate::client::Response;
use crate::types::BodyShape;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the exchange layer.
///
/// The enum is `Clone` so a memoized `send()` outcome can be handed out again
/// on repeated calls.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An exchange field was mutated after the exchange left its initial state.
    #[error("exchange is no longer configurable: {0}")]
    InvalidState(String),

    /// The body codec has no lossless conversion for this shape/target pair.
    #[error("cannot convert body of shape '{shape}' to content type '{content_type}'")]
    Conversion {
        /// Semantic shape of the offending body value.
        shape: BodyShape,
        /// The requested wire content type.
        content_type: String,
    },

    /// A caller-supplied header name or value was not a valid HTTP header.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The request path could not be interpreted as a URL.
    #[error("invalid url '{0}'")]
    InvalidUrl(String),

    /// The transport signal channel closed before a terminal signal arrived.
    #[error("transport closed its signal channel before the exchange settled")]
    TransportClosed,

    /// The exchange settled in a failure state (ERROR, TIMEOUT or ABORTED).
    ///
    /// The boxed [`Response`] carries the terminal state, the status sentinel
    /// and whatever the peer managed to deliver.
    #[error("exchange failed in state {}", .0.state)]
    Failed(Box<Response>),
}

impl Error {
    /// The terminal response for post-dispatch failures, if this is one.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Failed(response) => Some(response),
            _ => None,
        }
    }
}
