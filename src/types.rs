//! Core data model for the exchange layer.
//!
//! A request body is classified exactly once, at construction time, into the
//! [`Body`] sum type. The codec and the lifecycle never re-inspect a value to
//! guess its shape; every conversion decision keys off the [`BodyShape`]
//! discriminant carried here.
//!
//! # Body shapes
//!
//! | Variant | Carries | Default content type |
//! |---------|---------|----------------------|
//! | [`Body::Mapping`] | keyed scalars / arrays / files / nested maps | `application/json` |
//! | [`Body::Form`] | multipart container with file attachments | `multipart/form-data` |
//! | [`Body::Query`] | ordered `k=v` pairs | `application/x-www-form-urlencoded` |
//! | [`Body::Document`] | outer markup | `text/html` |
//! | [`Body::Blob`] | typed opaque bytes | the blob's own type |
//! | [`Body::Buffer`] | raw bytes | `application/octet-stream` |
//! | [`Body::Scalar`] | bare primitive | `text/plain` |

use bytes::{BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// A keyed mapping body, ordered by key.
pub type Mapping = BTreeMap<String, Value>;

/// A bare primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Explicit null.
    Null,
    /// Boolean; form-encodes as `"1"` / `"0"`.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Plain text; passes through every stringification unchanged.
    Text(String),
    /// Date-like value; form-encodes as an ISO-8601 UTC timestamp.
    DateTime(SystemTime),
}

/// A value inside a [`Mapping`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single scalar.
    Scalar(Scalar),
    /// An array; flattening repeats the key once per element, in order.
    Array(Vec<Value>),
    /// A binary attachment; only multipart targets can carry it.
    File(FileAttachment),
    /// A nested mapping; stringifies to its JSON form when flattened.
    Object(Mapping),
}

/// A binary file attachment inside a mapping or multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
    /// File name reported to the peer.
    pub filename: String,
    /// Declared MIME type of the attachment.
    pub content_type: String,
    /// Raw content.
    pub data: Bytes,
}

impl FileAttachment {
    /// Create an attachment from its parts.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        FileAttachment {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// One entry of a [`MultipartForm`].
#[derive(Debug, Clone, PartialEq)]
pub enum FormEntry {
    /// A text field.
    Text(String),
    /// A file attachment.
    File(FileAttachment),
}

/// A multipart/form-data container: ordered key-to-multivalue, able to carry
/// binary file attachments.
///
/// # Examples
///
/// ```
/// use http_exchange::types::{FileAttachment, MultipartForm};
///
/// let mut form = MultipartForm::new();
/// form.append("name", "ada");
/// form.append_file("avatar", FileAttachment::new("a.png", "image/png", vec![1u8, 2, 3]));
/// assert_eq!(form.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    entries: Vec<(String, FormEntry)>,
}

impl MultipartForm {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), FormEntry::Text(value.into())));
    }

    /// Append a file attachment.
    pub fn append_file(&mut self, key: impl Into<String>, file: FileAttachment) {
        self.entries.push((key.into(), FormEntry::File(file)));
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[(String, FormEntry)] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the form holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generate a boundary suitable for [`MultipartForm::encode`].
    pub fn generate_boundary() -> String {
        format!("exchange-{}", uuid::Uuid::new_v4().simple())
    }

    /// Encode the form as a `multipart/form-data` byte stream using `boundary`.
    ///
    /// Transports that accept a structured form (reqwest) generate their own
    /// boundary instead; this encoder exists for transports and tests that need
    /// the raw wire bytes.
    pub fn encode(&self, boundary: &str) -> Bytes {
        let mut buf = BytesMut::new();
        for (key, entry) in &self.entries {
            buf.put_slice(b"--");
            buf.put_slice(boundary.as_bytes());
            buf.put_slice(b"\r\n");
            match entry {
                FormEntry::Text(value) => {
                    buf.put_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", key)
                            .as_bytes(),
                    );
                    buf.put_slice(value.as_bytes());
                }
                FormEntry::File(file) => {
                    buf.put_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                            key, file.filename
                        )
                        .as_bytes(),
                    );
                    buf.put_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
                    buf.put_slice(&file.data);
                }
            }
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(b"--\r\n");
        buf.freeze()
    }
}

/// An ordered query-string container, serialized as `k=v&k=v`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPairs {
    pairs: Vec<(String, String)>,
}

impl QueryPairs {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one pair.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Pairs in insertion order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the container holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for QueryPairs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        QueryPairs {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// An outer-markup document body.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupDocument {
    /// The serialized outer markup.
    pub html: String,
}

impl MarkupDocument {
    /// Wrap pre-serialized markup.
    pub fn new(html: impl Into<String>) -> Self {
        MarkupDocument { html: html.into() }
    }
}

/// A typed opaque binary body.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// The blob's own declared MIME type.
    pub content_type: String,
    /// Raw content.
    pub data: Bytes,
}

impl Blob {
    /// Wrap bytes under a declared MIME type.
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Blob {
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// A request body, classified at construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Plain keyed mapping.
    Mapping(Mapping),
    /// Multipart-form container.
    Form(MultipartForm),
    /// Query-string container.
    Query(QueryPairs),
    /// Markup document.
    Document(MarkupDocument),
    /// Binary blob with its own declared type.
    Blob(Blob),
    /// Raw binary buffer.
    Buffer(Bytes),
    /// Bare primitive.
    Scalar(Scalar),
}

impl Body {
    /// The shape discriminant used by the conversion matrix and its errors.
    pub fn shape(&self) -> BodyShape {
        match self {
            Body::Mapping(_) => BodyShape::Mapping,
            Body::Form(_) => BodyShape::MultipartForm,
            Body::Query(_) => BodyShape::QueryString,
            Body::Document(_) => BodyShape::MarkupDocument,
            Body::Blob(_) => BodyShape::Blob,
            Body::Buffer(_) => BodyShape::BinaryBuffer,
            Body::Scalar(_) => BodyShape::Primitive,
        }
    }
}

/// Discriminant naming a body's semantic shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// Plain keyed mapping.
    Mapping,
    /// Multipart-form container.
    MultipartForm,
    /// Query-string container.
    QueryString,
    /// Markup document.
    MarkupDocument,
    /// Binary blob.
    Blob,
    /// Raw binary buffer.
    BinaryBuffer,
    /// Bare primitive.
    Primitive,
}

impl fmt::Display for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyShape::Mapping => "mapping",
            BodyShape::MultipartForm => "multipart-form",
            BodyShape::QueryString => "query-string",
            BodyShape::MarkupDocument => "markup-document",
            BodyShape::Blob => "blob",
            BodyShape::BinaryBuffer => "binary-buffer",
            BodyShape::Primitive => "primitive",
        };
        f.write_str(name)
    }
}

/// Progress of one exchange, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Bytes received so far.
    pub loaded: u64,
    /// Total bytes expected, when the peer declared a length.
    pub total: Option<u64>,
}

impl ProgressEvent {
    /// Progress as a 0-100 percentage; 0 when the total is unknown.
    pub fn percent(&self) -> f64 {
        match self.total {
            Some(total) if total > 0 => self.loaded as f64 / total as f64 * 100.0,
            _ => 0.0,
        }
    }
}

impl From<&str> for Scalar {
    fn from(text: &str) -> Self {
        Scalar::Text(text.to_string())
    }
}

impl From<String> for Scalar {
    fn from(text: String) -> Self {
        Scalar::Text(text)
    }
}

impl From<bool> for Scalar {
    fn from(flag: bool) -> Self {
        Scalar::Bool(flag)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<SystemTime> for Scalar {
    fn from(instant: SystemTime) -> Self {
        Scalar::DateTime(instant)
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Scalar(Scalar::from(text))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Scalar(Scalar::Text(text))
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Scalar(Scalar::Bool(flag))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(Scalar::Integer(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(Scalar::Float(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<Mapping> for Value {
    fn from(mapping: Mapping) -> Self {
        Value::Object(mapping)
    }
}

impl From<FileAttachment> for Value {
    fn from(file: FileAttachment) -> Self {
        Value::File(file)
    }
}

impl From<Mapping> for Body {
    fn from(mapping: Mapping) -> Self {
        Body::Mapping(mapping)
    }
}

impl From<MultipartForm> for Body {
    fn from(form: MultipartForm) -> Self {
        Body::Form(form)
    }
}

impl From<QueryPairs> for Body {
    fn from(query: QueryPairs) -> Self {
        Body::Query(query)
    }
}

impl From<MarkupDocument> for Body {
    fn from(document: MarkupDocument) -> Self {
        Body::Document(document)
    }
}

impl From<Blob> for Body {
    fn from(blob: Blob) -> Self {
        Body::Blob(blob)
    }
}

impl From<Bytes> for Body {
    fn from(buffer: Bytes) -> Self {
        Body::Buffer(buffer)
    }
}

impl From<Scalar> for Body {
    fn from(scalar: Scalar) -> Self {
        Body::Scalar(scalar)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Scalar(Scalar::Text(text.to_string()))
    }
}
