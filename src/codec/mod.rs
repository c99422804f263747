//! Body/content-type conversion core.
//!
//! Pure functions mapping a [`Body`](crate::types::Body) and a target content
//! type to a wire [`Payload`], plus the reverse direction for response bodies.
//! Nothing in this module performs I/O; every fail cell of the conversion
//! matrix rejects synchronously, before a transport is ever touched.
//!
//! # Module Organization
//!
//! ```text
//! codec/
//! ├── content_type - ContentType parsing and shape inference
//! ├── encode       - the conversion matrix: (Body, target) -> Payload
//! ├── urlencoded   - flatten rule, scalar stringification, query strings
//! └── decode       - response body parsing (inference in reverse)
//! ```
//!
//! # The conversion matrix
//!
//! | source ↓ \ target → | json | html | multipart | urlencoded | octet-stream | text |
//! |---|---|---|---|---|---|---|
//! | mapping | stringify | fail | flatten | flatten | stringify bytes | stringify |
//! | multipart-form | flatten, stringify | fail | identity | drop files | fail | fail |
//! | query-string | flatten, stringify | fail | copy entries | identity | fail | fail |
//! | markup-document | stringify markup | identity | fail | fail | markup bytes | markup |
//! | blob | pass through | pass if html-typed | fail | fail | pass through | pass through |
//! | binary-buffer | fail | fail | fail | fail | identity | decode utf-8 |
//! | primitive | json form | stringify | fail | fail | stringified bytes | stringify |
//!
//! Every `fail` cell raises [`Error::Conversion`](crate::Error::Conversion)
//! naming the source shape and the target content type.
//!
//! # Examples
//!
//! ```
//! use http_exchange::codec::{encode, ContentType, Payload};
//! use http_exchange::types::{Body, Mapping, Value};
//!
//! let mut mapping = Mapping::new();
//! mapping.insert("a".into(), Value::from("x"));
//! mapping.insert("b".into(), Value::Array(vec![Value::from(1i64), Value::from(2i64)]));
//!
//! let payload = encode(&Body::Mapping(mapping), "application/x-www-form-urlencoded").unwrap();
//! match payload {
//!     Payload::Text { data, .. } => assert_eq!(data, "a=x&b=1&b=2"),
//!     _ => unreachable!(),
//! }
//! ```

mod content_type;
mod decode;
mod encode;
mod urlencoded;

pub use content_type::ContentType;
pub use decode::{decode, ResponseData};
pub use encode::{encode, Payload};
pub use urlencoded::{
    append_query, flatten_mapping, form_string, format_iso8601, serialize_pairs,
};
