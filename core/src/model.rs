//! Model description: the compile-time replacement for runtime reflection.
//!
//! # Design
//! A type that can be turned into a request implements `ApiModel`. It lists
//! its type-level directives and describes each field as a `FieldDescriptor`:
//! the declared name, a borrowed view of the value and the field's
//! directives. The builder never inspects types at runtime; everything it
//! needs is in the descriptors.

use std::borrow::Cow;
use std::fmt;
use std::io::Read;

use serde_json::Value;

use crate::directive::{self, Directive, FileDirective, SerializeDestination, TextCase};
use crate::error::RequestError;

/// A data type that describes how it maps onto an HTTP request.
pub trait ApiModel {
    /// Type-level directives. Defaults to none.
    fn directives(&self) -> &[Directive] {
        &[]
    }

    /// Fields in declaration order.
    fn describe_fields(&self) -> Vec<FieldDescriptor<'_>>;
}

/// The runtime shape of a field value.
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(Cow<'a, str>),
    /// Any JSON value, written inline into the form body.
    Json(Value),
    Bytes(Cow<'a, [u8]>),
    /// Drained fully when attached as a file.
    Stream(Box<dyn Read + 'a>),
    /// A composite value resolved as its own sub-request. `None` is an absent
    /// nested object, which still ends the walk of its parent.
    Nested(Option<&'a dyn ApiModel>),
}

impl<'a> FieldValue<'a> {
    pub fn nested<M: ApiModel>(model: &'a M) -> Self {
        FieldValue::Nested(Some(model))
    }

    pub fn nested_opt<M: ApiModel>(model: Option<&'a M>) -> Self {
        FieldValue::Nested(model.map(|m| m as &dyn ApiModel))
    }

    pub fn stream(reader: impl Read + 'a) -> Self {
        FieldValue::Stream(Box::new(reader))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    fn shape(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) | FieldValue::UInt(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "string",
            FieldValue::Json(_) => "json",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Stream(_) => "stream",
            FieldValue::Nested(_) => "nested model",
        }
    }

    /// String form used for query parameters, headers and URLs.
    pub fn to_text(&self, field: &str) -> Result<String, RequestError> {
        let text = match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::UInt(n) => n.to_string(),
            FieldValue::Float(n) => n.to_string(),
            FieldValue::Text(s) => s.to_string(),
            FieldValue::Json(Value::Null) => String::new(),
            FieldValue::Json(Value::String(s)) => s.clone(),
            FieldValue::Json(v @ (Value::Bool(_) | Value::Number(_))) => v.to_string(),
            other => {
                return Err(RequestError::encoding(
                    field,
                    format!("{} value has no text form", other.shape()),
                ));
            }
        };
        Ok(text)
    }

    /// JSON form used for form-body properties.
    pub fn to_json(&self, field: &str) -> Result<Value, RequestError> {
        let value = match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::UInt(n) => Value::from(*n),
            FieldValue::Float(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .ok_or_else(|| RequestError::encoding(field, format!("{n} is not a JSON number")))?,
            FieldValue::Text(s) => Value::String(s.to_string()),
            FieldValue::Json(v) => v.clone(),
            other => {
                return Err(RequestError::encoding(
                    field,
                    format!("{} value cannot be a JSON property", other.shape()),
                ));
            }
        };
        Ok(value)
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("Null"),
            FieldValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            FieldValue::Int(n) => f.debug_tuple("Int").field(n).finish(),
            FieldValue::UInt(n) => f.debug_tuple("UInt").field(n).finish(),
            FieldValue::Float(n) => f.debug_tuple("Float").field(n).finish(),
            FieldValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            FieldValue::Json(v) => f.debug_tuple("Json").field(v).finish(),
            FieldValue::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            FieldValue::Stream(_) => f.write_str("Stream"),
            FieldValue::Nested(m) => write!(f, "Nested({})", if m.is_some() { "Some" } else { "None" }),
        }
    }
}

macro_rules! from_int {
    ($variant:ident, $target:ty; $($t:ty),*) => {
        $(impl From<$t> for FieldValue<'_> {
            fn from(v: $t) -> Self {
                FieldValue::$variant(<$target>::from(v))
            }
        })*
    };
}

from_int!(Int, i64; i8, i16, i32, i64);
from_int!(UInt, u64; u8, u16, u32, u64);

impl From<bool> for FieldValue<'_> {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

// Widening goes through the shortest f32 text so `0.1f32` stays `0.1`.
impl From<f32> for FieldValue<'_> {
    fn from(v: f32) -> Self {
        FieldValue::Float(v.to_string().parse().unwrap_or(f64::from(v)))
    }
}

impl From<f64> for FieldValue<'_> {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(v: &'a str) -> Self {
        FieldValue::Text(Cow::Borrowed(v))
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(v: &'a String) -> Self {
        FieldValue::Text(Cow::Borrowed(v.as_str()))
    }
}

impl From<String> for FieldValue<'_> {
    fn from(v: String) -> Self {
        FieldValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a [u8]> for FieldValue<'a> {
    fn from(v: &'a [u8]) -> Self {
        FieldValue::Bytes(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for FieldValue<'_> {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(Cow::Owned(v))
    }
}

impl From<Value> for FieldValue<'_> {
    fn from(v: Value) -> Self {
        FieldValue::Json(v)
    }
}

impl<'a, T: Into<FieldValue<'a>>> From<Option<T>> for FieldValue<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// One declared field of a model.
#[derive(Debug)]
pub struct FieldDescriptor<'a> {
    pub name: &'static str,
    pub value: FieldValue<'a>,
    pub directives: Vec<Directive>,
}

impl<'a> FieldDescriptor<'a> {
    pub fn new(name: &'static str, value: impl Into<FieldValue<'a>>) -> Self {
        Self {
            name,
            value: value.into(),
            directives: Vec::new(),
        }
    }

    pub fn with(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn query(self) -> Self {
        self.with(Directive::Query)
    }

    pub fn header(self) -> Self {
        self.with(Directive::Header)
    }

    pub fn form(self) -> Self {
        self.with(Directive::Form)
    }

    pub fn file(self, file: FileDirective) -> Self {
        self.with(Directive::File(file))
    }

    pub fn url(self) -> Self {
        self.with(Directive::Url)
    }

    pub fn ignore(self) -> Self {
        self.with(Directive::Ignore)
    }

    pub fn camel_case(self) -> Self {
        self.with(Directive::CamelCase)
    }

    pub fn has(&self, directive: Directive) -> bool {
        self.directives.contains(&directive)
    }

    pub fn is_ignored(&self) -> bool {
        self.has(Directive::Ignore)
    }

    /// Field-level destination override, if any.
    pub fn destination(&self) -> Option<SerializeDestination> {
        directive::explicit_destination(&self.directives)
    }

    pub fn file_directive(&self) -> Option<FileDirective> {
        self.directives.iter().find_map(|d| match d {
            Directive::File(file) => Some(*file),
            _ => None,
        })
    }

    pub fn text_case(&self) -> TextCase {
        directive::text_case(&self.directives)
    }
}
