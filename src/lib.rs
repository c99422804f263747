#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Architecture
//!
//! Two components, leaf first:
//!
//! - **[codec]**: pure functions converting between semantic body shapes and
//!   wire payloads for a target content type, and inferring a default content
//!   type from a body's shape when none is given. Every impossible conversion
//!   fails synchronously, before any network I/O.
//! - **[client]**: one [`Exchange`](client::Exchange) per request: an explicit
//!   state machine (`READY → OPENED → LOADING → DONE | ERROR | TIMEOUT |
//!   ABORTED`) driven by the signals of a pluggable [transport], settling
//!   exactly once with an immutable [`Response`].
//!
//! Concurrency is "many independent exchanges in flight at once": each owns its
//! transport, `send()` is memoized per exchange, and a local abort flag
//! suppresses any completion signal that races a cancellation.
//!
//! ## Module Structure
//!
//! - **[types]**: the tagged-union body model and containers
//! - **[codec]**: content-type inference, the conversion matrix, response parsing
//! - **[transport]**: the transport trait, its signals, and the reqwest implementation
//! - **[client]**: request descriptor, lifecycle, exchange driver, response
//! - **[error]**: error taxonomy and result alias

pub mod client;
pub mod codec;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{Client, Exchange, ExchangeState, Request, Response};
pub use codec::{ContentType, Payload, ResponseData};
pub use error::{Error, Result};
pub use transport::{HttpTransport, Transport, TransportSignal};
pub use types::{Body, BodyShape};
