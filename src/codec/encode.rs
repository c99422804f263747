//! The conversion matrix: `(Body, target content type) -> Payload`.

use crate::codec::content_type::ContentType;
use crate::codec::urlencoded::{
    flatten_mapping, form_json, form_string, form_to_pairs, mapping_json, mapping_to_form,
    pairs_to_form, query_json, scalar_json, serialize_pairs,
};
use crate::error::{Error, Result};
use crate::types::{Body, MultipartForm};
use bytes::Bytes;

/// A wire-ready payload produced by the codec.
///
/// `Text` and `Bytes` carry the content-type header value the exchange should
/// attach. `Multipart` carries the structured form instead: the transport must
/// generate its own boundary, so the exchange suppresses the content-type
/// header for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Textual payload.
    Text {
        /// Content-type header value to attach.
        content_type: String,
        /// The serialized body.
        data: String,
    },
    /// Binary payload.
    Bytes {
        /// Content-type header value to attach.
        content_type: String,
        /// The serialized body.
        data: Bytes,
    },
    /// Structured multipart form; boundary is the transport's business.
    Multipart(MultipartForm),
}

impl Payload {
    /// The content-type header value to attach, if any.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Payload::Text { content_type, .. } | Payload::Bytes { content_type, .. } => {
                Some(content_type)
            }
            Payload::Multipart(_) => None,
        }
    }

    /// The payload as raw bytes; multipart forms encode with the boundary the
    /// caller supplies.
    pub fn to_bytes(&self, multipart_boundary: &str) -> Bytes {
        match self {
            Payload::Text { data, .. } => Bytes::copy_from_slice(data.as_bytes()),
            Payload::Bytes { data, .. } => data.clone(),
            Payload::Multipart(form) => form.encode(multipart_boundary),
        }
    }
}

fn text(content_type: impl Into<String>, data: String) -> Payload {
    Payload::Text {
        content_type: content_type.into(),
        data,
    }
}

fn bytes(content_type: impl Into<String>, data: Bytes) -> Payload {
    Payload::Bytes {
        content_type: content_type.into(),
        data,
    }
}

fn json_text(value: &serde_json::Value) -> String {
    // serde_json never fails on the tree shapes the codec builds.
    serde_json::to_string(value).unwrap_or_default()
}

fn fail(body: &Body, content_type: &str) -> Error {
    Error::Conversion {
        shape: body.shape(),
        content_type: content_type.to_string(),
    }
}

/// Convert a body into the payload for `content_type`.
///
/// Every fail cell of the matrix returns [`Error::Conversion`] synchronously,
/// naming the source shape and the target content type; no I/O has happened by
/// the time this function settles.
///
/// # Examples
///
/// ```
/// use http_exchange::codec::encode;
/// use http_exchange::types::{Body, MultipartForm};
///
/// let err = encode(&Body::Form(MultipartForm::new()), "text/plain").unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "cannot convert body of shape 'multipart-form' to content type 'text/plain'"
/// );
/// ```
pub fn encode(body: &Body, content_type: &str) -> Result<Payload> {
    let target = match ContentType::parse(content_type) {
        Some(target) => target,
        // Outside the matrix only a blob can travel, under its own type.
        None => {
            return match body {
                Body::Blob(blob) => Ok(bytes(content_type, blob.data.clone())),
                _ => Err(fail(body, content_type)),
            };
        }
    };

    match (body, target) {
        (Body::Mapping(mapping), ContentType::Json) => {
            Ok(text(target.as_str(), json_text(&mapping_json(mapping))))
        }
        (Body::Mapping(mapping), ContentType::Multipart) => {
            Ok(Payload::Multipart(mapping_to_form(mapping)))
        }
        (Body::Mapping(mapping), ContentType::UrlEncoded) => Ok(text(
            target.as_str(),
            serialize_pairs(&flatten_mapping(mapping)),
        )),
        (Body::Mapping(mapping), ContentType::OctetStream) => Ok(bytes(
            target.as_str(),
            Bytes::from(json_text(&mapping_json(mapping))),
        )),
        (Body::Mapping(mapping), ContentType::Text) => {
            Ok(text(target.as_str(), json_text(&mapping_json(mapping))))
        }

        (Body::Form(form), ContentType::Json) => {
            Ok(text(target.as_str(), json_text(&form_json(form))))
        }
        (Body::Form(form), ContentType::Multipart) => Ok(Payload::Multipart(form.clone())),
        (Body::Form(form), ContentType::UrlEncoded) => {
            Ok(text(target.as_str(), serialize_pairs(&form_to_pairs(form))))
        }

        (Body::Query(query), ContentType::Json) => {
            Ok(text(target.as_str(), json_text(&query_json(query))))
        }
        (Body::Query(query), ContentType::Multipart) => {
            Ok(Payload::Multipart(pairs_to_form(query)))
        }
        (Body::Query(query), ContentType::UrlEncoded) => {
            Ok(text(target.as_str(), serialize_pairs(query)))
        }

        (Body::Document(document), ContentType::Json) => Ok(text(
            target.as_str(),
            json_text(&serde_json::Value::String(document.html.clone())),
        )),
        (Body::Document(document), ContentType::Html) => {
            Ok(text(target.as_str(), document.html.clone()))
        }
        (Body::Document(document), ContentType::OctetStream) => Ok(bytes(
            target.as_str(),
            Bytes::copy_from_slice(document.html.as_bytes()),
        )),
        (Body::Document(document), ContentType::Text) => {
            Ok(text(target.as_str(), document.html.clone()))
        }

        (Body::Blob(blob), ContentType::Json) => Ok(bytes(target.as_str(), blob.data.clone())),
        (Body::Blob(blob), ContentType::Html) => {
            if blob.content_type.to_ascii_lowercase().contains("html") {
                Ok(bytes(target.as_str(), blob.data.clone()))
            } else {
                Err(fail(body, content_type))
            }
        }
        (Body::Blob(blob), ContentType::OctetStream) => {
            Ok(bytes(target.as_str(), blob.data.clone()))
        }
        (Body::Blob(blob), ContentType::Text) => Ok(bytes(target.as_str(), blob.data.clone())),

        (Body::Buffer(buffer), ContentType::OctetStream) => {
            Ok(bytes(target.as_str(), buffer.clone()))
        }
        (Body::Buffer(buffer), ContentType::Text) => Ok(text(
            target.as_str(),
            String::from_utf8_lossy(buffer).into_owned(),
        )),

        (Body::Scalar(scalar), ContentType::Json) => {
            Ok(text(target.as_str(), json_text(&scalar_json(scalar))))
        }
        (Body::Scalar(scalar), ContentType::Html) => {
            Ok(text(target.as_str(), form_string(scalar)))
        }
        (Body::Scalar(scalar), ContentType::OctetStream) => Ok(bytes(
            target.as_str(),
            Bytes::from(form_string(scalar).into_bytes()),
        )),
        (Body::Scalar(scalar), ContentType::Text) => {
            Ok(text(target.as_str(), form_string(scalar)))
        }

        _ => Err(fail(body, content_type)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Blob, BodyShape, MarkupDocument, Mapping, QueryPairs, Scalar, Value};

    fn shape_of_err(result: Result<Payload>) -> (BodyShape, String) {
        match result.unwrap_err() {
            Error::Conversion {
                shape,
                content_type,
            } => (shape, content_type),
            other => panic!("expected Conversion, got {other:?}"),
        }
    }

    #[test]
    fn test_mapping_to_json_stringifies() {
        let mut mapping = Mapping::new();
        mapping.insert("a".into(), Value::from("x"));
        mapping.insert("n".into(), Value::from(2i64));

        let payload = encode(&Body::Mapping(mapping), "application/json").unwrap();
        assert_eq!(
            payload,
            Payload::Text {
                content_type: "application/json".into(),
                data: r#"{"a":"x","n":2}"#.into(),
            }
        );
    }

    #[test]
    fn test_mapping_to_html_fails() {
        let (shape, target) = shape_of_err(encode(&Body::Mapping(Mapping::new()), "text/html"));
        assert_eq!(shape, BodyShape::Mapping);
        assert_eq!(target, "text/html");
    }

    #[test]
    fn test_mapping_to_urlencoded_scenario() {
        // body = {a: "x", b: [1, 2]}, target = urlencoded
        let mut mapping = Mapping::new();
        mapping.insert("a".into(), Value::from("x"));
        mapping.insert(
            "b".into(),
            Value::Array(vec![Value::from(1i64), Value::from(2i64)]),
        );

        let payload = encode(
            &Body::Mapping(mapping),
            "application/x-www-form-urlencoded",
        )
        .unwrap();
        match payload {
            Payload::Text { data, .. } => assert_eq!(data, "a=x&b=1&b=2"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_form_to_text_fails_with_names() {
        let err = encode(&Body::Form(MultipartForm::new()), "text/plain").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("multipart-form"));
        assert!(message.contains("text/plain"));
    }

    #[test]
    fn test_form_identity_and_urlencoded_projection() {
        let mut form = MultipartForm::new();
        form.append("a", "1");
        form.append_file(
            "f",
            crate::types::FileAttachment::new("f.bin", "application/octet-stream", "zz"),
        );

        match encode(&Body::Form(form.clone()), "multipart/form-data").unwrap() {
            Payload::Multipart(out) => assert_eq!(out, form),
            other => panic!("unexpected payload {other:?}"),
        }

        match encode(&Body::Form(form), "application/x-www-form-urlencoded").unwrap() {
            Payload::Text { data, .. } => assert_eq!(data, "a=1"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_query_identity_and_copies() {
        let mut query = QueryPairs::new();
        query.append("a", "1");
        query.append("a", "2");

        match encode(&Body::Query(query.clone()), "application/x-www-form-urlencoded").unwrap() {
            Payload::Text { data, .. } => assert_eq!(data, "a=1&a=2"),
            other => panic!("unexpected payload {other:?}"),
        }
        match encode(&Body::Query(query.clone()), "multipart/form-data").unwrap() {
            Payload::Multipart(form) => assert_eq!(form.len(), 2),
            other => panic!("unexpected payload {other:?}"),
        }
        match encode(&Body::Query(query), "application/json").unwrap() {
            Payload::Text { data, .. } => assert_eq!(data, r#"{"a":["1","2"]}"#),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_document_cells() {
        let document = Body::Document(MarkupDocument::new("<p>hi</p>"));

        match encode(&document, "text/html").unwrap() {
            Payload::Text { data, .. } => assert_eq!(data, "<p>hi</p>"),
            other => panic!("unexpected payload {other:?}"),
        }
        match encode(&document, "application/json").unwrap() {
            Payload::Text { data, .. } => assert_eq!(data, r#""<p>hi</p>""#),
            other => panic!("unexpected payload {other:?}"),
        }
        assert!(encode(&document, "multipart/form-data").is_err());
        assert!(encode(&document, "application/x-www-form-urlencoded").is_err());
    }

    #[test]
    fn test_blob_passthrough_rules() {
        let png = Body::Blob(Blob::new("image/png", Bytes::from_static(b"\x89PNG")));

        // Own (non-matrix) type passes through opaque.
        match encode(&png, "image/png").unwrap() {
            Payload::Bytes { content_type, data } => {
                assert_eq!(content_type, "image/png");
                assert_eq!(data, Bytes::from_static(b"\x89PNG"));
            }
            other => panic!("unexpected payload {other:?}"),
        }

        // html target only when html-typed.
        assert!(encode(&png, "text/html").is_err());
        let page = Body::Blob(Blob::new("text/html", Bytes::from_static(b"<p/>")));
        assert!(encode(&page, "text/html").is_ok());

        assert!(encode(&png, "multipart/form-data").is_err());
        assert!(encode(&png, "application/x-www-form-urlencoded").is_err());
    }

    #[test]
    fn test_buffer_cells() {
        let buffer = Body::Buffer(Bytes::from_static(b"abc"));

        assert!(matches!(
            encode(&buffer, "application/octet-stream").unwrap(),
            Payload::Bytes { .. }
        ));
        match encode(&buffer, "text/plain").unwrap() {
            Payload::Text { data, .. } => assert_eq!(data, "abc"),
            other => panic!("unexpected payload {other:?}"),
        }
        for target in [
            "application/json",
            "text/html",
            "multipart/form-data",
            "application/x-www-form-urlencoded",
        ] {
            let (shape, _) = shape_of_err(encode(&buffer, target));
            assert_eq!(shape, BodyShape::BinaryBuffer);
        }
    }

    #[test]
    fn test_scalar_cells() {
        let text = Body::Scalar(Scalar::Text("hi".into()));
        match encode(&text, "application/json").unwrap() {
            Payload::Text { data, .. } => assert_eq!(data, r#""hi""#),
            other => panic!("unexpected payload {other:?}"),
        }
        match encode(&text, "text/plain").unwrap() {
            Payload::Text { data, .. } => assert_eq!(data, "hi"),
            other => panic!("unexpected payload {other:?}"),
        }
        assert!(encode(&text, "multipart/form-data").is_err());
        assert!(encode(&text, "application/x-www-form-urlencoded").is_err());
    }

    #[test]
    fn test_every_fail_cell_rejects() {
        let cases: Vec<(Body, &str)> = vec![
            (Body::Mapping(Mapping::new()), "text/html"),
            (Body::Form(MultipartForm::new()), "text/html"),
            (Body::Form(MultipartForm::new()), "application/octet-stream"),
            (Body::Form(MultipartForm::new()), "text/plain"),
            (Body::Query(QueryPairs::new()), "text/html"),
            (Body::Query(QueryPairs::new()), "application/octet-stream"),
            (Body::Query(QueryPairs::new()), "text/plain"),
            (Body::Document(MarkupDocument::new("")), "multipart/form-data"),
            (
                Body::Document(MarkupDocument::new("")),
                "application/x-www-form-urlencoded",
            ),
            (Body::Buffer(Bytes::new()), "application/json"),
            (Body::Buffer(Bytes::new()), "text/html"),
            (Body::Buffer(Bytes::new()), "multipart/form-data"),
            (
                Body::Buffer(Bytes::new()),
                "application/x-www-form-urlencoded",
            ),
            (Body::Scalar(Scalar::Null), "multipart/form-data"),
            (
                Body::Scalar(Scalar::Null),
                "application/x-www-form-urlencoded",
            ),
        ];
        for (body, target) in cases {
            let shape = body.shape();
            let (err_shape, err_target) = shape_of_err(encode(&body, target));
            assert_eq!(err_shape, shape);
            assert_eq!(err_target, target);
        }
    }

    #[test]
    fn test_payload_to_bytes_multipart_uses_boundary() {
        let mut form = MultipartForm::new();
        form.append("a", "1");
        let payload = Payload::Multipart(form);
        let wire = payload.to_bytes("bnd");
        assert!(String::from_utf8_lossy(&wire).contains("--bnd\r\n"));
    }
}
