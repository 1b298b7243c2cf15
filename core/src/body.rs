//! Body parts, the serializer strategy and multipart encoding.
//!
//! # Design
//! Auxiliary objects are kept as `serde_json::Value`s and turned into
//! `BodyPart`s only at assembly time through a `BodySerializer`. The default
//! `JsonBodySerializer` writes compact (or pretty) JSON; callers plug in their
//! own strategy to emit other content types.
//!
//! The multipart writer is deterministic for a given boundary, which is what
//! makes repeated assembly of the same request byte-identical.

use serde_json::Value;

use crate::error::RequestError;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// One independently serialized unit of request content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl BodyPart {
    pub fn new(content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn json(text: impl Into<String>) -> Self {
        Self::new(APPLICATION_JSON, text.into().into_bytes())
    }
}

/// Strategy that turns an auxiliary object into a body part.
pub trait BodySerializer: Send + Sync {
    fn serialize(&self, object: &Value) -> Result<BodyPart, RequestError>;
}

/// Default strategy: JSON text with an `application/json` content type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonBodySerializer {
    pretty: bool,
}

impl JsonBodySerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl BodySerializer for JsonBodySerializer {
    fn serialize(&self, object: &Value) -> Result<BodyPart, RequestError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(object)
        } else {
            serde_json::to_string(object)
        }
        .map_err(|e| RequestError::encoding("object", e.to_string()))?;
        Ok(BodyPart::json(text))
    }
}

/// One entry of a `multipart/form-data` body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MultipartEntry<'a> {
    pub name: Option<&'a str>,
    pub file_name: Option<&'a str>,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

/// Content type header value for a multipart body.
pub(crate) fn multipart_content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Encode entries as a `multipart/form-data` body.
pub(crate) fn encode_multipart(boundary: &str, entries: &[MultipartEntry<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for entry in entries {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());

        let mut disposition = String::from("Content-Disposition: form-data");
        if let Some(name) = entry.name {
            disposition.push_str(&format!("; name=\"{}\"", escape_quoted(name)));
        }
        if let Some(file_name) = entry.file_name {
            disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(file_name)));
        }
        disposition.push_str("\r\n");
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", entry.content_type).as_bytes());

        body.extend_from_slice(entry.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

// Quotes and line breaks inside disposition parameters are percent-encoded.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_serializer_is_compact_by_default() {
        let part = JsonBodySerializer::new().serialize(&json!({"a": 1})).unwrap();
        assert_eq!(part.content_type, APPLICATION_JSON);
        assert_eq!(part.data, br#"{"a":1}"#);
    }

    #[test]
    fn pretty_serializer_indents() {
        let part = JsonBodySerializer::pretty().serialize(&json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(part.data).unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn multipart_layout() {
        let entries = [
            MultipartEntry {
                name: None,
                file_name: None,
                content_type: APPLICATION_JSON,
                data: br#"{"k":"v"}"#,
            },
            MultipartEntry {
                name: Some("doc"),
                file_name: Some("a.txt"),
                content_type: APPLICATION_OCTET_STREAM,
                data: b"hello",
            },
        ];
        let body = encode_multipart("XyZ", &entries);
        let expected = "--XyZ\r\n\
            Content-Disposition: form-data\r\n\
            Content-Type: application/json\r\n\r\n\
            {\"k\":\"v\"}\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            hello\r\n\
            --XyZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn disposition_values_are_escaped() {
        assert_eq!(escape_quoted("a\"b\r\n"), "a%22b%0D%0A");
    }

    #[test]
    fn multipart_content_type_carries_boundary() {
        assert_eq!(
            multipart_content_type("abc"),
            "multipart/form-data; boundary=abc"
        );
    }
}
