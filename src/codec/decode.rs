//! Response body parsing: the shape-inference rules applied in reverse.

use crate::codec::content_type::ContentType;
use crate::types::MarkupDocument;
use bytes::Bytes;

/// A parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// Empty body.
    None,
    /// Parsed `application/json` body.
    Json(serde_json::Value),
    /// `text/html` body.
    Document(MarkupDocument),
    /// Any other textual body.
    Text(String),
    /// `application/octet-stream` or non-UTF-8 body.
    Binary(Bytes),
}

impl ResponseData {
    /// The body as a JSON value, when it parsed as one.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The body as text, when it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            ResponseData::Document(document) => Some(&document.html),
            _ => None,
        }
    }
}

/// Parse a response body according to the peer's declared content type.
///
/// A json body that fails to parse does not fail the exchange: the parse
/// error's message takes the place of the data, and the failure is logged.
pub fn decode(content_type: Option<&str>, body: &Bytes) -> ResponseData {
    if body.is_empty() {
        return ResponseData::None;
    }

    match content_type.and_then(ContentType::parse) {
        Some(ContentType::Json) => match serde_json::from_slice(body) {
            Ok(value) => ResponseData::Json(value),
            Err(error) => {
                tracing::warn!(%error, "response declared json but did not parse");
                ResponseData::Text(error.to_string())
            }
        },
        Some(ContentType::Html) => ResponseData::Document(MarkupDocument::new(
            String::from_utf8_lossy(body).into_owned(),
        )),
        Some(ContentType::OctetStream) => ResponseData::Binary(body.clone()),
        _ => match std::str::from_utf8(body) {
            Ok(text) => ResponseData::Text(text.to_string()),
            Err(_) => ResponseData::Binary(body.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_none() {
        assert_eq!(decode(Some("application/json"), &Bytes::new()), ResponseData::None);
    }

    #[test]
    fn test_json_parses() {
        let data = decode(Some("application/json"), &Bytes::from_static(b"{\"a\":1}"));
        assert_eq!(data.as_json().unwrap()["a"], 1);
    }

    #[test]
    fn test_malformed_json_becomes_error_text() {
        let data = decode(Some("application/json"), &Bytes::from_static(b"{nope"));
        match data {
            ResponseData::Text(message) => assert!(!message.is_empty()),
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn test_html_becomes_document() {
        let data = decode(Some("text/html; charset=utf-8"), &Bytes::from_static(b"<p/>"));
        assert_eq!(data.as_text(), Some("<p/>"));
        assert!(matches!(data, ResponseData::Document(_)));
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        let data = decode(None, &Bytes::from_static(b"plain"));
        assert_eq!(data.as_text(), Some("plain"));
    }

    #[test]
    fn test_octet_stream_stays_binary() {
        let data = decode(
            Some("application/octet-stream"),
            &Bytes::from_static(b"\x00\x01"),
        );
        assert!(matches!(data, ResponseData::Binary(_)));
    }
}
