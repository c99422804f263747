//! Flattening and stringification for form-encoded targets.
//!
//! Implements the flatten rule shared by the urlencoded and multipart cells of
//! the conversion matrix: for every key, an array value appends one entry per
//! element under the same key (stable order); anything else appends one entry.
//!
//! The scalar stringification rule: booleans become `"1"`/`"0"`, date-like
//! values become an ISO-8601 UTC string, plain strings pass through unchanged,
//! everything else takes its JSON string form.

use crate::types::{FormEntry, Mapping, MultipartForm, QueryPairs, Scalar, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use url::form_urlencoded;

/// Whether file attachments survive flattening; only multipart targets can
/// carry them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilePolicy {
    Drop,
    Keep,
}

/// Stringify one scalar under the form rule.
pub fn form_string(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Text(text) => text.clone(),
        Scalar::Bool(true) => "1".to_string(),
        Scalar::Bool(false) => "0".to_string(),
        Scalar::DateTime(instant) => format_iso8601(*instant),
        Scalar::Integer(value) => value.to_string(),
        Scalar::Float(value) => {
            serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
        }
        Scalar::Null => "null".to_string(),
    }
}

/// The JSON value form of one scalar.
pub(crate) fn scalar_json(scalar: &Scalar) -> serde_json::Value {
    match scalar {
        Scalar::Null => serde_json::Value::Null,
        Scalar::Bool(flag) => serde_json::Value::Bool(*flag),
        Scalar::Integer(value) => serde_json::Value::from(*value),
        Scalar::Float(value) => serde_json::Number::from_f64(*value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Scalar::Text(text) => serde_json::Value::String(text.clone()),
        Scalar::DateTime(instant) => serde_json::Value::String(format_iso8601(*instant)),
    }
}

/// The JSON value form of a mapping value; `None` for file attachments, which
/// JSON cannot carry.
pub(crate) fn value_json(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::Scalar(scalar) => Some(scalar_json(scalar)),
        Value::Array(values) => Some(serde_json::Value::Array(
            values.iter().filter_map(value_json).collect(),
        )),
        Value::Object(mapping) => Some(mapping_json(mapping)),
        Value::File(_) => None,
    }
}

/// The JSON value form of a mapping, file attachments dropped.
pub(crate) fn mapping_json(mapping: &Mapping) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (key, value) in mapping {
        if let Some(json) = value_json(value) {
            object.insert(key.clone(), json);
        }
    }
    serde_json::Value::Object(object)
}

/// The JSON value form of a multipart form: keys flattened to an object,
/// repeated keys collected into arrays, file entries dropped.
pub(crate) fn form_json(form: &MultipartForm) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (key, entry) in form.entries() {
        let text = match entry {
            FormEntry::Text(text) => text.clone(),
            FormEntry::File(_) => continue,
        };
        push_grouped(&mut object, key, text);
    }
    serde_json::Value::Object(object)
}

/// The JSON value form of a query-string container: repeated keys collected
/// into arrays.
pub(crate) fn query_json(query: &QueryPairs) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (key, value) in query.pairs() {
        push_grouped(&mut object, key, value.clone());
    }
    serde_json::Value::Object(object)
}

fn push_grouped(object: &mut serde_json::Map<String, serde_json::Value>, key: &str, text: String) {
    match object.get_mut(key) {
        Some(serde_json::Value::Array(values)) => values.push(serde_json::Value::String(text)),
        Some(existing) => {
            let first = existing.take();
            *existing = serde_json::Value::Array(vec![first, serde_json::Value::String(text)]);
        }
        None => {
            object.insert(key.to_string(), serde_json::Value::String(text));
        }
    }
}

/// Flatten a mapping to query pairs; file attachments are dropped.
pub fn flatten_mapping(mapping: &Mapping) -> QueryPairs {
    let mut pairs = QueryPairs::new();
    for (key, value) in mapping {
        flatten_value(&mut pairs, key, value);
    }
    pairs
}

fn flatten_value(pairs: &mut QueryPairs, key: &str, value: &Value) {
    match value {
        Value::Scalar(scalar) => pairs.append(key, form_string(scalar)),
        Value::Array(values) => {
            for element in values {
                flatten_value(pairs, key, element);
            }
        }
        Value::Object(mapping) => {
            // Nested structure carries no form shape of its own; ship its JSON form.
            if let Ok(text) = serde_json::to_string(&mapping_json(mapping)) {
                pairs.append(key, text);
            }
        }
        Value::File(_) => {}
    }
}

/// Flatten a mapping to a multipart form; file attachments are kept verbatim.
pub(crate) fn mapping_to_form(mapping: &Mapping) -> MultipartForm {
    let mut form = MultipartForm::new();
    for (key, value) in mapping {
        form_value(&mut form, key, value, FilePolicy::Keep);
    }
    form
}

fn form_value(form: &mut MultipartForm, key: &str, value: &Value, files: FilePolicy) {
    match value {
        Value::Scalar(scalar) => form.append(key, form_string(scalar)),
        Value::Array(values) => {
            for element in values {
                form_value(form, key, element, files);
            }
        }
        Value::Object(mapping) => {
            if let Ok(text) = serde_json::to_string(&mapping_json(mapping)) {
                form.append(key, text);
            }
        }
        Value::File(file) => {
            if files == FilePolicy::Keep {
                form.append_file(key, file.clone());
            }
        }
    }
}

/// Project a multipart form onto query pairs, dropping file entries.
pub(crate) fn form_to_pairs(form: &MultipartForm) -> QueryPairs {
    let mut pairs = QueryPairs::new();
    for (key, entry) in form.entries() {
        if let FormEntry::Text(text) = entry {
            pairs.append(key, text.clone());
        }
    }
    pairs
}

/// Copy query pairs into a multipart form (every entry is a text field).
pub(crate) fn pairs_to_form(query: &QueryPairs) -> MultipartForm {
    let mut form = MultipartForm::new();
    for (key, value) in query.pairs() {
        form.append(key, value.clone());
    }
    form
}

/// Serialize pairs as a percent-encoded `k=v&k=v` string.
pub fn serialize_pairs(pairs: &QueryPairs) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs.pairs() {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Append flattened query pairs to a URL, preserving any existing query string.
pub fn append_query(path: &str, pairs: &QueryPairs) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let encoded = serialize_pairs(pairs);
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}", path, separator, encoded)
}

/// Format an instant as an ISO-8601 UTC timestamp with millisecond precision.
///
/// Instants before the Unix epoch clamp to the epoch.
pub fn format_iso8601(instant: SystemTime) -> String {
    let since_epoch = instant.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs();
    let millis = since_epoch.subsec_millis();

    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        rem / 3600,
        rem % 3600 / 60,
        rem % 60,
        millis
    )
}

// Gregorian civil date from days since 1970-01-01 (Hinnant's algorithm).
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileAttachment;
    use std::time::Duration;

    #[test]
    fn test_form_string_booleans() {
        assert_eq!(form_string(&Scalar::Bool(true)), "1");
        assert_eq!(form_string(&Scalar::Bool(false)), "0");
    }

    #[test]
    fn test_form_string_passthrough_and_json_forms() {
        assert_eq!(form_string(&Scalar::Text("plain".into())), "plain");
        assert_eq!(form_string(&Scalar::Integer(42)), "42");
        assert_eq!(form_string(&Scalar::Float(1.5)), "1.5");
        assert_eq!(form_string(&Scalar::Null), "null");
    }

    #[test]
    fn test_iso8601_epoch() {
        assert_eq!(
            format_iso8601(UNIX_EPOCH),
            "1970-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_iso8601_known_instant() {
        // 2024-02-29T12:30:45.500Z
        let instant = UNIX_EPOCH + Duration::from_millis(1_709_209_845_500);
        assert_eq!(format_iso8601(instant), "2024-02-29T12:30:45.500Z");
    }

    #[test]
    fn test_flatten_array_repeats_key_in_order() {
        let mut mapping = Mapping::new();
        mapping.insert("a".into(), Value::from("x"));
        mapping.insert(
            "b".into(),
            Value::Array(vec![Value::from(1i64), Value::from(2i64)]),
        );

        let pairs = flatten_mapping(&mapping);
        assert_eq!(serialize_pairs(&pairs), "a=x&b=1&b=2");
    }

    #[test]
    fn test_flatten_drops_files() {
        let mut mapping = Mapping::new();
        mapping.insert("doc".into(), Value::from(FileAttachment::new("d", "text/plain", "x")));
        mapping.insert("name".into(), Value::from("ada"));

        let pairs = flatten_mapping(&mapping);
        assert_eq!(pairs.pairs(), &[("name".to_string(), "ada".to_string())]);
    }

    #[test]
    fn test_mapping_to_form_keeps_files() {
        let mut mapping = Mapping::new();
        mapping.insert("doc".into(), Value::from(FileAttachment::new("d", "text/plain", "x")));

        let form = mapping_to_form(&mapping);
        assert!(matches!(form.entries()[0].1, FormEntry::File(_)));
    }

    #[test]
    fn test_nested_object_ships_json_form() {
        let mut inner = Mapping::new();
        inner.insert("k".into(), Value::from(true));
        let mut mapping = Mapping::new();
        mapping.insert("outer".into(), Value::Object(inner));

        let pairs = flatten_mapping(&mapping);
        assert_eq!(pairs.pairs()[0].1, r#"{"k":true}"#);
    }

    #[test]
    fn test_query_json_groups_repeats() {
        let mut query = QueryPairs::new();
        query.append("b", "1");
        query.append("b", "2");
        query.append("a", "x");

        let json = query_json(&query);
        assert_eq!(json["a"], "x");
        assert_eq!(json["b"], serde_json::json!(["1", "2"]));
    }

    #[test]
    fn test_serialize_percent_encodes() {
        let mut pairs = QueryPairs::new();
        pairs.append("q", "a b&c");
        assert_eq!(serialize_pairs(&pairs), "q=a+b%26c");
    }

    #[test]
    fn test_append_query_respects_existing() {
        let mut pairs = QueryPairs::new();
        pairs.append("a", "1");
        assert_eq!(append_query("/p", &pairs), "/p?a=1");
        assert_eq!(append_query("/p?x=0", &pairs), "/p?x=0&a=1");
        assert_eq!(append_query("/p", &QueryPairs::new()), "/p");
    }
}
