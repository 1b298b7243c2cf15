//! Declarative request assembly.
//!
//! # Overview
//! Turns a described data model into a plain-data `HttpRequest`: each field
//! is routed to the URL, the query string, a header, the JSON form body or a
//! file attachment, and the result is assembled into a single JSON body or a
//! multipart body. The caller executes the request with whatever transport it
//! uses (host-does-IO pattern).
//!
//! # Design
//! - Models implement `ApiModel` and describe their fields with
//!   `FieldDescriptor`s carrying `Directive`s; no runtime reflection.
//! - Precedence: field directive, then type directive, then the method
//!   fallback (`GET` to query, everything else to the form body).
//! - `Request` is a mutable accumulator; `Request::build_request` is a pure
//!   assembly step and returns byte-identical output for unchanged state.
//! - Auxiliary objects are serialized through a pluggable `BodySerializer`.
//!
//! ```
//! use apireq_core::{ApiModel, FieldDescriptor, HttpMethod, Request};
//!
//! struct Search {
//!     term: String,
//! }
//!
//! impl ApiModel for Search {
//!     fn describe_fields(&self) -> Vec<FieldDescriptor<'_>> {
//!         vec![FieldDescriptor::new("term", &self.term)]
//!     }
//! }
//!
//! let search = Search { term: "a b".to_string() };
//! let request = Request::from_model(&search, HttpMethod::Get, Some("http://localhost/search"))?;
//! assert_eq!(request.build_request()?.url, "http://localhost/search?term=a%20b");
//! # Ok::<(), apireq_core::RequestError>(())
//! ```

pub mod body;
pub mod directive;
pub mod error;
pub mod http;
pub mod model;
pub mod request;

pub use body::{BodyPart, BodySerializer, JsonBodySerializer};
pub use directive::{Directive, FileDirective, SerializeDestination, TextCase, TypeDefaults};
pub use error::RequestError;
pub use http::{HttpMethod, HttpRequest};
pub use model::{ApiModel, FieldDescriptor, FieldValue};
pub use request::{FileAttachment, FileSource, Request};
