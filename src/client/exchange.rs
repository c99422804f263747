//! One exchange's execution: memoized send, signal loop, abort.

use crate::client::lifecycle::{transition, Effect, ExchangeState};
use crate::client::request::{Query, Request};
use crate::client::response::Response;
use crate::codec::{self, append_query, flatten_mapping, ContentType, Payload};
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportSignal};
use crate::types::ProgressEvent;
use http::header::CONTENT_TYPE;
use http::HeaderValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancels an exchange from outside its `send()` borrow.
///
/// Cloneable; safe to call from callbacks or other tasks. Sets the local
/// aborted flag first, then forwards the abort to the transport, so a
/// completion signal already in flight is suppressed and the exchange settles
/// as aborted. Idempotent.
#[derive(Clone)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
    transport: crate::transport::Aborter,
}

impl AbortHandle {
    /// Abort the exchange.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.transport.abort();
    }
}

/// Owns exactly one [`Request`]'s execution over one transport.
///
/// `send()` is idempotent: the first call drives the exchange, every further
/// call returns the same settled outcome without re-issuing anything. This
/// memoization is the only synchronization the lifecycle needs, since each
/// exchange owns its transport outright and shares no mutable state with any
/// other.
///
/// # Examples
///
/// ```no_run
/// use http_exchange::client::{Exchange, Request};
/// use http_exchange::transport::HttpTransport;
///
/// # async fn run() -> http_exchange::Result<()> {
/// let request = Request::get("https://example.com/data");
/// let mut exchange = Exchange::new(request, HttpTransport::new());
/// let response = exchange.send().await?;
/// assert!(response.success);
/// # Ok(())
/// # }
/// ```
pub struct Exchange<T: Transport> {
    request: Request,
    transport: T,
    state: ExchangeState,
    aborted: Arc<AtomicBool>,
    progress: f64,
    outcome: Option<Result<Response>>,
}

impl<T: Transport> Exchange<T> {
    /// Pair a request with the transport that will carry it.
    pub fn new(request: Request, transport: T) -> Self {
        Exchange {
            request,
            transport,
            state: ExchangeState::Ready,
            aborted: Arc::new(AtomicBool::new(false)),
            progress: 0.0,
            outcome: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Progress as a 0-100 percentage.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// A handle that can abort this exchange while `send()` is pending.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            aborted: self.aborted.clone(),
            transport: self.transport.aborter(),
        }
    }

    /// Abort the exchange. Callable in any state; idempotent.
    pub fn abort(&mut self) {
        self.abort_handle().abort();
    }

    fn configurable(&self) -> Result<()> {
        if self.state == ExchangeState::Ready {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "exchange already {}",
                self.state
            )))
        }
    }

    /// Replace the path; fails once the exchange has left its initial state.
    pub fn set_path(&mut self, path: impl Into<String>) -> Result<()> {
        self.configurable()?;
        self.request.path = path.into();
        Ok(())
    }

    /// Replace the verb; fails once the exchange has left its initial state.
    pub fn set_method(&mut self, method: http::Method) -> Result<()> {
        self.configurable()?;
        self.request.method = method;
        Ok(())
    }

    /// Replace the timeout; fails once the exchange has left its initial state.
    pub fn set_timeout(&mut self, timeout: std::time::Duration) -> Result<()> {
        self.configurable()?;
        self.request.timeout = timeout;
        Ok(())
    }

    /// Insert a header; fails once the exchange has left its initial state.
    pub fn insert_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.configurable()?;
        let name = http::header::HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeader(name.to_string()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.to_string()))?;
        self.request.headers.insert(name, value);
        Ok(())
    }

    /// Drive the exchange to settlement.
    ///
    /// Resolves with the [`Response`] on DONE; rejects with
    /// [`Error::Failed`] carrying the terminal response on ERROR, TIMEOUT or
    /// ABORTED; rejects with [`Error::Conversion`] before any I/O when the
    /// body cannot be represented in the effective content type.
    pub async fn send(&mut self) -> Result<Response> {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        let outcome = self.dispatch().await;
        self.outcome = Some(outcome.clone());
        outcome
    }

    async fn dispatch(&mut self) -> Result<Response> {
        if self.aborted.load(Ordering::SeqCst) {
            self.state = ExchangeState::Aborted;
            return Err(Error::Failed(Box::new(Response::failure(self.state))));
        }

        // Payload first: conversion failures must reject before any transport
        // interaction.
        let read_only = self.request.is_read_only();
        let payload = if read_only {
            None
        } else {
            match &self.request.body {
                Some(body) => {
                    let content_type = match self.explicit_content_type() {
                        Some(explicit) => explicit,
                        None => ContentType::infer(body),
                    };
                    Some(codec::encode(body, &content_type)?)
                }
                None => None,
            }
        };

        let url = match &self.request.query {
            Some(Query::Mapping(mapping)) => {
                append_query(&self.request.path, &flatten_mapping(mapping))
            }
            Some(Query::Pairs(pairs)) => append_query(&self.request.path, pairs),
            None => self.request.path.clone(),
        };

        self.state = ExchangeState::Opened;
        tracing::debug!(method = %self.request.method, %url, state = %self.state, "opening exchange");

        self.transport.set_timeout(self.request.timeout);
        self.transport.open(&self.request.method, &url)?;
        self.attach_headers(&payload, read_only);

        let mut signals = self.transport.signals().ok_or(Error::TransportClosed)?;
        self.transport.send(payload).await?;

        while let Some(signal) = signals.recv().await {
            let aborted = self.aborted.load(Ordering::SeqCst);
            let step = transition(self.state, aborted, &signal);
            if step.next != self.state {
                tracing::debug!(from = %self.state, to = %step.next, "exchange transition");
            }

            match step.effect {
                Effect::Ignore => {}
                Effect::ForwardAbort => self.transport.aborter().abort(),
                Effect::InvokeStart => {
                    self.state = step.next;
                    let event = ProgressEvent {
                        loaded: 0,
                        total: None,
                    };
                    if let Some(handler) = self.request.on_start.as_mut() {
                        handler(&event);
                    }
                }
                Effect::InvokeProgress(event) => {
                    self.progress = event.percent();
                    if let Some(handler) = self.request.on_progress.as_mut() {
                        handler(&event);
                    }
                }
                Effect::Settle => {
                    self.state = step.next;
                    return self.settle(signal);
                }
            }
        }

        Err(Error::TransportClosed)
    }

    fn settle(&mut self, signal: TransportSignal) -> Result<Response> {
        match signal {
            TransportSignal::Load {
                status,
                headers,
                body,
            } => {
                let loaded = body.len() as u64;
                let response = Response::from_load(status, headers, body);
                self.progress = 100.0;
                let event = ProgressEvent {
                    loaded,
                    total: Some(loaded),
                };
                if let Some(handler) = self.request.on_complete.as_mut() {
                    handler(&event);
                }
                Ok(response)
            }
            TransportSignal::Error(message) => {
                tracing::warn!(%message, "exchange failed at the transport");
                Err(Error::Failed(Box::new(Response::failure(self.state))))
            }
            TransportSignal::Timeout | TransportSignal::Abort => {
                Err(Error::Failed(Box::new(Response::failure(self.state))))
            }
            TransportSignal::Start | TransportSignal::Progress { .. } => {
                unreachable!("non-terminal signal cannot settle")
            }
        }
    }

    fn explicit_content_type(&self) -> Option<String> {
        self.request
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    fn attach_headers(&mut self, payload: &Option<Payload>, read_only: bool) {
        let multipart = matches!(payload, Some(Payload::Multipart(_)));

        for (name, value) in self.request.headers.iter() {
            if name == CONTENT_TYPE || value.as_bytes().is_empty() {
                continue;
            }
            self.transport.set_request_header(name.clone(), value.clone());
        }

        // Read-only verbs clear the content type entirely; multipart leaves it
        // to the transport, which must generate its own boundary.
        if read_only || multipart {
            return;
        }

        let value = match self.request.headers.get(CONTENT_TYPE) {
            Some(explicit) => Some(explicit.clone()),
            None => payload
                .as_ref()
                .and_then(Payload::content_type)
                .and_then(|ct| HeaderValue::from_str(ct).ok()),
        };
        if let Some(value) = value {
            if !value.as_bytes().is_empty() {
                self.transport.set_request_header(CONTENT_TYPE, value);
            }
        }
    }
}
