//! The transport boundary.
//!
//! An exchange never talks to the network itself; it drives a [`Transport`]
//! through the capabilities the platform HTTP primitive offers (open, header
//! attachment, send, abort) and listens to the transport's lifecycle signals.
//! Each transport object is exclusively owned by the exchange that created it
//! and is never shared.
//!
//! # Signals
//!
//! | Signal | Fired | Meaning |
//! |--------|-------|---------|
//! | [`TransportSignal::Start`] | at most once | the request left the machine |
//! | [`TransportSignal::Progress`] | many times | response bytes arrived |
//! | [`TransportSignal::Load`] | at most once | terminal: full response in hand |
//! | [`TransportSignal::Error`] | at most once | terminal: transport-level failure |
//! | [`TransportSignal::Timeout`] | at most once | terminal: the transport's timer fired |
//! | [`TransportSignal::Abort`] | at most once | terminal: cancellation acknowledged |
//!
//! Timeout bookkeeping is the transport's job; the exchange layer installs no
//! timer of its own.

mod http;

pub use self::http::HttpTransport;

use crate::codec::Payload;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
// `::http` paths keep the crate distinct from the local `http` module.
use ::http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// One lifecycle signal from the underlying transport.
#[derive(Debug, Clone)]
pub enum TransportSignal {
    /// The exchange started moving on the wire.
    Start,
    /// Response bytes arrived.
    Progress {
        /// Bytes received so far.
        loaded: u64,
        /// Declared total, when known.
        total: Option<u64>,
    },
    /// The peer's response arrived in full.
    Load {
        /// Numeric HTTP status.
        status: u16,
        /// Response headers.
        headers: HeaderMap,
        /// Response body.
        body: Bytes,
    },
    /// Transport-level failure (connect, TLS, stream reset...).
    Error(String),
    /// The transport's own timer fired.
    Timeout,
    /// Cancellation acknowledged.
    Abort,
}

/// Cancels an in-flight transport from outside the exchange's borrow.
///
/// Calling [`Aborter::abort`] must cause the transport to stop and emit
/// [`TransportSignal::Abort`]; the exchange's at-most-one-settlement guarantee
/// leans on that signal arriving. Idempotent.
#[derive(Clone)]
pub struct Aborter {
    cancel: Arc<dyn Fn() + Send + Sync>,
}

impl Aborter {
    /// Wrap a cancellation closure.
    pub fn new(cancel: impl Fn() + Send + Sync + 'static) -> Self {
        Aborter {
            cancel: Arc::new(cancel),
        }
    }

    /// Cancel the transport.
    pub fn abort(&self) {
        (self.cancel)();
    }
}

impl std::fmt::Debug for Aborter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Aborter")
    }
}

/// The platform HTTP primitive, as the exchange layer sees it.
///
/// Implementations emit their lifecycle through the receiver handed out by
/// [`Transport::signals`], which is taken exactly once per exchange.
#[async_trait]
pub trait Transport: Send {
    /// Stage the method and URL for the exchange.
    fn open(&mut self, method: &Method, url: &str) -> Result<()>;

    /// Attach one request header.
    fn set_request_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Arm the transport's own timeout timer.
    fn set_timeout(&mut self, timeout: Duration);

    /// Dispatch the request with an optional payload.
    async fn send(&mut self, payload: Option<Payload>) -> Result<()>;

    /// A handle that cancels the transport and makes it emit
    /// [`TransportSignal::Abort`].
    fn aborter(&self) -> Aborter;

    /// Take the signal receiver; yields `None` on a second take.
    fn signals(&mut self) -> Option<mpsc::Receiver<TransportSignal>>;
}
