//! Content-type classification and inference.

use crate::types::Body;
use std::fmt;

/// The six wire content types the conversion matrix targets.
///
/// Parsing matches by substring, so parameterized header values such as
/// `application/json; charset=utf-8` classify correctly.
///
/// # Examples
///
/// ```
/// use http_exchange::codec::ContentType;
///
/// assert_eq!(ContentType::parse("application/json; charset=utf-8"), Some(ContentType::Json));
/// assert_eq!(ContentType::parse("image/png"), None);
/// assert_eq!(ContentType::Json.to_string(), "application/json");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `text/html`
    Html,
    /// `multipart/form-data`
    Multipart,
    /// `application/x-www-form-urlencoded`
    UrlEncoded,
    /// `application/octet-stream`
    OctetStream,
    /// `text/plain`
    Text,
}

impl ContentType {
    /// Classify a content-type header value, ignoring parameters.
    ///
    /// Returns `None` for MIME types outside the matrix (e.g. `image/png`);
    /// only blob bodies can be carried under such types.
    pub fn parse(header: &str) -> Option<ContentType> {
        let lowered = header.to_ascii_lowercase();
        if lowered.contains("application/json") {
            Some(ContentType::Json)
        } else if lowered.contains("text/html") {
            Some(ContentType::Html)
        } else if lowered.contains("multipart/form-data") {
            Some(ContentType::Multipart)
        } else if lowered.contains("application/x-www-form-urlencoded") {
            Some(ContentType::UrlEncoded)
        } else if lowered.contains("application/octet-stream") {
            Some(ContentType::OctetStream)
        } else if lowered.contains("text/plain") {
            Some(ContentType::Text)
        } else {
            None
        }
    }

    /// The canonical MIME string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Html => "text/html",
            ContentType::Multipart => "multipart/form-data",
            ContentType::UrlEncoded => "application/x-www-form-urlencoded",
            ContentType::OctetStream => "application/octet-stream",
            ContentType::Text => "text/plain",
        }
    }

    /// Infer the default content type for a body when the caller set none.
    ///
    /// Returned as a string because a blob carries its own declared type, which
    /// may be any MIME type.
    pub fn infer(body: &Body) -> String {
        match body {
            Body::Buffer(_) => ContentType::OctetStream.as_str().to_string(),
            Body::Blob(blob) => blob.content_type.clone(),
            Body::Document(_) => ContentType::Html.as_str().to_string(),
            Body::Form(_) => ContentType::Multipart.as_str().to_string(),
            Body::Query(_) => ContentType::UrlEncoded.as_str().to_string(),
            Body::Mapping(_) => ContentType::Json.as_str().to_string(),
            Body::Scalar(_) => ContentType::Text.as_str().to_string(),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
