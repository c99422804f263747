//! Production transport over reqwest.
//!
//! The response body is streamed chunk by chunk so
//! [`TransportSignal::Progress`] carries real byte counts, mirroring the
//! platform progress events the exchange layer was designed around.

use crate::codec::Payload;
use crate::error::{Error, Result};
use crate::transport::{Aborter, Transport, TransportSignal};
use crate::types::{FormEntry, MultipartForm};
use ::http::{HeaderMap, HeaderName, HeaderValue, Method};
use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

const SIGNAL_CAPACITY: usize = 32;

/// State shared with the in-flight task so an [`Aborter`] can cancel it.
struct Inflight {
    tx: mpsc::Sender<TransportSignal>,
    task: Option<tokio::task::JoinHandle<()>>,
    cancelled: bool,
}

/// Transport implementation over a (possibly shared) `reqwest::Client`.
///
/// One `HttpTransport` serves exactly one exchange; the inner `reqwest::Client`
/// is cheap to clone and carries the connection pool across transports.
pub struct HttpTransport {
    client: reqwest::Client,
    method: Method,
    url: Option<Url>,
    headers: HeaderMap,
    timeout: Duration,
    tx: mpsc::Sender<TransportSignal>,
    rx: Option<mpsc::Receiver<TransportSignal>>,
    inflight: Arc<Mutex<Inflight>>,
}

impl HttpTransport {
    /// Create a transport on its own connection pool.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a transport sharing an existing pool.
    pub fn with_client(client: reqwest::Client) -> Self {
        let (tx, rx) = mpsc::channel(SIGNAL_CAPACITY);
        HttpTransport {
            client,
            method: Method::GET,
            url: None,
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(60),
            tx: tx.clone(),
            rx: Some(rx),
            inflight: Arc::new(Mutex::new(Inflight {
                tx,
                task: None,
                cancelled: false,
            })),
        }
    }

    fn multipart_form(form: &MultipartForm) -> reqwest::multipart::Form {
        let mut out = reqwest::multipart::Form::new();
        for (key, entry) in form.entries() {
            out = match entry {
                FormEntry::Text(text) => out.text(key.clone(), text.clone()),
                FormEntry::File(file) => {
                    let part = reqwest::multipart::Part::bytes(file.data.to_vec())
                        .file_name(file.filename.clone());
                    let part = match part.mime_str(&file.content_type) {
                        Ok(part) => part,
                        Err(_) => reqwest::multipart::Part::bytes(file.data.to_vec())
                            .file_name(file.filename.clone()),
                    };
                    out.part(key.clone(), part)
                }
            };
        }
        out
    }

    fn classify(error: reqwest::Error) -> TransportSignal {
        if error.is_timeout() {
            TransportSignal::Timeout
        } else {
            TransportSignal::Error(error.to_string())
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn open(&mut self, method: &Method, url: &str) -> Result<()> {
        self.method = method.clone();
        self.url = Some(Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?);
        Ok(())
    }

    fn set_request_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    async fn send(&mut self, payload: Option<Payload>) -> Result<()> {
        let url = self
            .url
            .take()
            .ok_or_else(|| Error::InvalidUrl("send before open".to_string()))?;

        let mut builder = self
            .client
            .request(self.method.clone(), url)
            .timeout(self.timeout)
            .headers(self.headers.clone());

        builder = match payload {
            Some(Payload::Text { data, .. }) => builder.body(data),
            Some(Payload::Bytes { data, .. }) => builder.body(data),
            Some(Payload::Multipart(form)) => builder.multipart(Self::multipart_form(&form)),
            None => builder,
        };

        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let _ = tx.send(TransportSignal::Start).await;
            let response = match builder.send().await {
                Ok(response) => response,
                Err(error) => {
                    let _ = tx.send(Self::classify(error)).await;
                    return;
                }
            };

            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let total = response.content_length();
            let mut loaded = 0u64;
            let mut collected = BytesMut::new();
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(chunk) => {
                        loaded += chunk.len() as u64;
                        collected.extend_from_slice(&chunk);
                        let _ = tx.send(TransportSignal::Progress { loaded, total }).await;
                    }
                    Err(error) => {
                        let _ = tx.send(Self::classify(error)).await;
                        return;
                    }
                }
            }

            let _ = tx
                .send(TransportSignal::Load {
                    status,
                    headers,
                    body: collected.freeze(),
                })
                .await;
        });

        self.inflight.lock().task = Some(task);
        Ok(())
    }

    fn aborter(&self) -> Aborter {
        let inflight = self.inflight.clone();
        Aborter::new(move || {
            let mut guard = inflight.lock();
            if guard.cancelled {
                return;
            }
            guard.cancelled = true;
            if let Some(task) = guard.task.take() {
                task.abort();
            }
            // The channel may be backlogged with progress signals; the Abort
            // acknowledgment must still arrive or the exchange never settles.
            if let Err(mpsc::error::TrySendError::Full(signal)) =
                guard.tx.try_send(TransportSignal::Abort)
            {
                let tx = guard.tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(signal).await;
                });
            }
        })
    }

    fn signals(&mut self) -> Option<mpsc::Receiver<TransportSignal>> {
        self.rx.take()
    }
}
