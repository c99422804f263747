//! The terminal, immutable result of one exchange.

use crate::client::lifecycle::ExchangeState;
use crate::codec::{decode, ResponseData};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};

/// Sentinel status for transport-level failures that carry no HTTP status.
pub const STATUS_NONE: u16 = 0;

/// Produced exactly once, on the terminal transition of an exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Numeric HTTP status; [`STATUS_NONE`] when the transport failed before
    /// a status existed, `408` when the transport's timer fired.
    pub status: u16,
    /// The terminal exchange state.
    pub state: ExchangeState,
    /// Human status text.
    pub message: String,
    /// Headers received from the peer.
    pub headers: HeaderMap,
    /// Peer body, parsed according to the response content type.
    pub data: ResponseData,
    /// Whether the status denotes the HTTP 200 class.
    pub success: bool,
}

impl Response {
    pub(crate) fn from_load(status: u16, headers: HeaderMap, body: Bytes) -> Self {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let data = decode(content_type.as_deref(), &body);
        Response {
            status,
            state: ExchangeState::Done,
            message: message_for(status, ExchangeState::Done),
            headers,
            data,
            success: (200..300).contains(&status),
        }
    }

    pub(crate) fn failure(state: ExchangeState) -> Self {
        let status = match state {
            ExchangeState::Timeout => StatusCode::REQUEST_TIMEOUT.as_u16(),
            _ => STATUS_NONE,
        };
        Response {
            status,
            state,
            message: message_for(status, state),
            headers: HeaderMap::new(),
            data: ResponseData::None,
            success: false,
        }
    }
}

fn message_for(status: u16, state: ExchangeState) -> String {
    if let Some(reason) = StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        return reason.to_string();
    }
    match state {
        ExchangeState::Error => "Error".to_string(),
        ExchangeState::Aborted => "Aborted".to_string(),
        _ => "No message could be provided.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        let response = Response::from_load(200, headers, Bytes::from_static(b"{\"k\":1}"));

        assert!(response.success);
        assert_eq!(response.message, "OK");
        assert_eq!(response.state, ExchangeState::Done);
        assert_eq!(response.data.as_json().unwrap()["k"], 1);
    }

    #[test]
    fn test_non_2xx_is_not_success() {
        let response = Response::from_load(404, HeaderMap::new(), Bytes::new());
        assert!(!response.success);
        assert_eq!(response.message, "Not Found");
        // DONE is still the terminal state; failure is an HTTP-level matter.
        assert_eq!(response.state, ExchangeState::Done);
    }

    #[test]
    fn test_timeout_sentinel() {
        let response = Response::failure(ExchangeState::Timeout);
        assert_eq!(response.status, 408);
        assert_eq!(response.message, "Request Timeout");
        assert!(!response.success);
    }

    #[test]
    fn test_error_and_abort_have_no_status() {
        let error = Response::failure(ExchangeState::Error);
        assert_eq!(error.status, STATUS_NONE);
        assert_eq!(error.message, "Error");

        let aborted = Response::failure(ExchangeState::Aborted);
        assert_eq!(aborted.status, STATUS_NONE);
        assert_eq!(aborted.message, "Aborted");
    }
}
