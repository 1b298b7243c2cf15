//! The request accumulator: field walk, mutators and message assembly.
//!
//! # Design
//! `Request` collects everything a model (or the caller directly) routes into
//! an outbound request: query and header maps, a JSON object for the form
//! body, auxiliary objects and file attachments. `build_request` turns that
//! state into an `HttpRequest` without mutating it, so it can be called any
//! number of times.
//!
//! A nested model field ends the walk of the object that declares it: fields
//! declared after the nested one are skipped.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::body::{
    self, APPLICATION_OCTET_STREAM, BodyPart, BodySerializer, JsonBodySerializer, MultipartEntry,
};
use crate::directive::{self, FileDirective, SerializeDestination, TextCase, TypeDefaults};
use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest};
use crate::model::{ApiModel, FieldDescriptor, FieldValue};

/// A file attached to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub name: String,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where attachment bytes come from.
pub enum FileSource<'a> {
    Bytes(Vec<u8>),
    Reader(Box<dyn Read + 'a>),
    Path(PathBuf),
}

impl FileSource<'_> {
    fn into_bytes(self) -> Result<Vec<u8>, RequestError> {
        match self {
            FileSource::Bytes(bytes) => Ok(bytes),
            FileSource::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .map_err(|source| RequestError::Io { path: None, source })?;
                Ok(bytes)
            }
            FileSource::Path(path) => fs::read(&path).map_err(|source| RequestError::Io {
                path: Some(path),
                source,
            }),
        }
    }
}

impl From<Vec<u8>> for FileSource<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        FileSource::Bytes(bytes)
    }
}

impl From<&[u8]> for FileSource<'_> {
    fn from(bytes: &[u8]) -> Self {
        FileSource::Bytes(bytes.to_vec())
    }
}

impl From<PathBuf> for FileSource<'_> {
    fn from(path: PathBuf) -> Self {
        FileSource::Path(path)
    }
}

impl From<&Path> for FileSource<'_> {
    fn from(path: &Path) -> Self {
        FileSource::Path(path.to_path_buf())
    }
}

impl<'a> FileSource<'a> {
    pub fn reader(reader: impl Read + 'a) -> Self {
        FileSource::Reader(Box::new(reader))
    }
}

/// Mutable accumulator for one outbound request.
#[derive(Clone)]
pub struct Request {
    url: Option<String>,
    method: HttpMethod,
    query: IndexMap<String, String>,
    headers: IndexMap<String, String>,
    json_body: Map<String, Value>,
    objects: Vec<Value>,
    files: Vec<FileAttachment>,
    serializer: Arc<dyn BodySerializer>,
    boundary: String,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("json_body", &self.json_body)
            .field("objects", &self.objects.len())
            .field("files", &self.files.len())
            .finish_non_exhaustive()
    }
}

impl Request {
    pub fn new(url: Option<&str>) -> Self {
        Self {
            url: url.map(str::to_string),
            method: HttpMethod::default(),
            query: IndexMap::new(),
            headers: IndexMap::new(),
            json_body: Map::new(),
            objects: Vec::new(),
            files: Vec::new(),
            serializer: Arc::new(JsonBodySerializer::new()),
            boundary: format!("----request-{}", Uuid::new_v4().simple()),
        }
    }

    /// Resolve `model` into a new request. A non-empty `url` is set before the
    /// walk, so `Url` fields of the model are then routed like any other field.
    pub fn from_model<M: ApiModel + ?Sized>(
        model: &M,
        method: HttpMethod,
        url: Option<&str>,
    ) -> Result<Self, RequestError> {
        let mut request = Self::new(None);
        request.parse_model(model, method, url)?;
        Ok(request)
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Replace the strategy used to serialize auxiliary objects.
    pub fn with_serializer(mut self, serializer: Arc<dyn BodySerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn files(&self) -> &[FileAttachment] {
        &self.files
    }

    pub fn objects(&self) -> &[Value] {
        &self.objects
    }

    // -----------------------------------------------------------------------
    // Field walk
    // -----------------------------------------------------------------------

    /// Walk `model` and route each field into this request.
    pub fn parse_model<M: ApiModel + ?Sized>(
        &mut self,
        model: &M,
        method: HttpMethod,
        url: Option<&str>,
    ) -> Result<(), RequestError> {
        self.method = method;
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.url = Some(url.to_string());
        }

        let defaults = TypeDefaults::resolve(model.directives(), method);
        let mut fields = model.describe_fields();
        debug!(
            method = %method,
            fields = fields.len(),
            destination = ?defaults.destination,
            "resolving model"
        );

        for index in 0..fields.len() {
            let field = &fields[index];
            if field.is_ignored() {
                continue;
            }

            let name = match (field.text_case(), defaults.case) {
                (TextCase::LowerCamel, _) | (_, TextCase::LowerCamel) => {
                    directive::to_lower_camel(field.name)
                }
                _ => field.name.to_string(),
            };

            if let FieldValue::Nested(child) = field.value {
                self.merge_nested(&name, child, method)?;
                debug!(
                    field = field.name,
                    skipped = fields.len() - index - 1,
                    "nested field ends the walk"
                );
                return Ok(());
            }

            if self.url.is_none() && field.has(directive::Directive::Url) {
                self.url = Some(field.value.to_text(field.name)?);
                continue;
            }

            match field.destination().unwrap_or(defaults.destination) {
                SerializeDestination::Query => {
                    trace!(field = field.name, "query");
                    let value = field.value.to_text(field.name)?;
                    self.add_query(name, value);
                }
                SerializeDestination::Header => {
                    trace!(field = field.name, "header");
                    let value = field.value.to_text(field.name)?;
                    self.add_header(name, value);
                }
                SerializeDestination::Form => match field.file_directive() {
                    Some(file) => {
                        let (file_name_key, file_name) = resolve_file_names(&fields, field, file)?;
                        let value = std::mem::replace(&mut fields[index].value, FieldValue::Null);
                        self.attach_field(fields[index].name, file_name_key, file_name, value)?;
                    }
                    None => {
                        trace!(field = field.name, "form");
                        let value = field.value.to_json(field.name)?;
                        self.json_body.insert(name, value);
                    }
                },
            }
        }
        Ok(())
    }

    fn merge_nested(
        &mut self,
        name: &str,
        child: Option<&dyn ApiModel>,
        method: HttpMethod,
    ) -> Result<(), RequestError> {
        let mut sub = Request::new(None);
        // Attachments of the child stay with the child.
        if let Some(child) = child {
            sub.parse_model(child, method, None)?;
        }

        self.query.extend(sub.query);
        self.headers.extend(sub.headers);
        if self.url.is_none() {
            self.url = sub.url;
        }
        if !sub.json_body.is_empty() {
            self.json_body.insert(name.to_string(), Value::Object(sub.json_body));
        }
        Ok(())
    }

    fn attach_field(
        &mut self,
        field: &str,
        name: String,
        file_name: Option<String>,
        value: FieldValue<'_>,
    ) -> Result<(), RequestError> {
        let source = match value {
            FieldValue::Null => {
                trace!(field, "null file field, nothing attached");
                return Ok(());
            }
            FieldValue::Bytes(bytes) => FileSource::Bytes(bytes.into_owned()),
            FieldValue::Stream(reader) => FileSource::Reader(reader),
            FieldValue::Text(path) => FileSource::Path(PathBuf::from(path.into_owned())),
            other => {
                return Err(RequestError::encoding(
                    field,
                    format!("{other:?} cannot be attached as a file"),
                ));
            }
        };
        self.add_file(name, file_name, source)
    }

    // -----------------------------------------------------------------------
    // Mutators and readers
    // -----------------------------------------------------------------------

    pub fn add_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.insert(key.into(), value.into());
    }

    pub fn remove_query(&mut self, key: &str) -> Option<String> {
        self.query.shift_remove(key)
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    pub fn remove_header(&mut self, key: &str) -> Option<String> {
        self.headers.shift_remove(key)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Queue an object to be serialized as its own body part.
    pub fn add_object<T: Serialize + ?Sized>(&mut self, object: &T) -> Result<(), RequestError> {
        let value = serde_json::to_value(object)
            .map_err(|e| RequestError::encoding("object", e.to_string()))?;
        self.objects.push(value);
        Ok(())
    }

    /// Remove the first queued object equal to `object`.
    pub fn remove_object<T: Serialize + ?Sized>(&mut self, object: &T) -> Result<bool, RequestError> {
        let value = serde_json::to_value(object)
            .map_err(|e| RequestError::encoding("object", e.to_string()))?;
        match self.objects.iter().position(|o| *o == value) {
            Some(pos) => {
                self.objects.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Attach a file. Readers are drained and paths read before returning.
    pub fn add_file<'a>(
        &mut self,
        name: impl Into<String>,
        file_name: Option<String>,
        source: impl Into<FileSource<'a>>,
    ) -> Result<(), RequestError> {
        let bytes = source.into().into_bytes()?;
        let name = name.into();
        debug!(name = %name, size = bytes.len(), "file attached");
        self.files.push(FileAttachment {
            name,
            file_name,
            bytes,
        });
        Ok(())
    }

    /// Remove every attachment named `name`. Returns how many were removed.
    pub fn remove_file(&mut self, name: &str) -> usize {
        let before = self.files.len();
        self.files.retain(|f| f.name != name);
        before - self.files.len()
    }

    /// `key=value` pairs joined by `&`, values percent-encoded.
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Base URL followed by the query string, if any.
    pub fn url(&self) -> String {
        let base = self.url.as_deref().unwrap_or_default();
        let query = self.query_string();
        if query.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{query}")
        }
    }

    /// The form body as JSON text. Empty when no form field was routed.
    pub fn json_text(&self) -> String {
        if self.json_body.is_empty() {
            return String::new();
        }
        Value::Object(self.json_body.clone()).to_string()
    }

    // -----------------------------------------------------------------------
    // Assembly
    // -----------------------------------------------------------------------

    /// Assemble the outbound request. Does not modify `self`.
    pub fn build_request(&self) -> Result<HttpRequest, RequestError> {
        let mut parts = Vec::with_capacity(self.objects.len() + 1);
        let json = self.json_text();
        if !json.is_empty() {
            parts.push(BodyPart::json(json));
        }
        for object in &self.objects {
            parts.push(self.serializer.serialize(object)?);
        }

        let part_count = parts.len();
        let body = match (part_count, self.files.len()) {
            (0, 0) => None,
            (1, 0) => parts.pop(),
            _ => Some(self.multipart(&parts)),
        };

        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter(|(k, _)| body.is_none() || !k.eq_ignore_ascii_case("content-type"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        debug!(
            method = %self.method,
            parts = part_count,
            files = self.files.len(),
            has_body = body.is_some(),
            "request assembled"
        );

        let body = body.map(|part| {
            headers.push(("content-type".to_string(), part.content_type));
            part.data
        });

        Ok(HttpRequest {
            method: self.method,
            url: self.url(),
            headers,
            body,
        })
    }

    fn multipart(&self, parts: &[BodyPart]) -> BodyPart {
        let entries: Vec<MultipartEntry<'_>> = parts
            .iter()
            .map(|part| MultipartEntry {
                name: None,
                file_name: None,
                content_type: &part.content_type,
                data: &part.data,
            })
            .chain(self.files.iter().map(|file| MultipartEntry {
                name: Some(&file.name),
                file_name: file.file_name.as_deref(),
                content_type: APPLICATION_OCTET_STREAM,
                data: &file.bytes,
            }))
            .collect();
        BodyPart::new(
            body::multipart_content_type(&self.boundary),
            body::encode_multipart(&self.boundary, &entries),
        )
    }
}

/// Attachment name and file name for a `File` field. Unset values are taken
/// from the referenced sibling field when it holds a value.
fn resolve_file_names(
    fields: &[FieldDescriptor<'_>],
    field: &FieldDescriptor<'_>,
    file: FileDirective,
) -> Result<(String, Option<String>), RequestError> {
    let mut name = file.name.map(str::to_string);
    let mut file_name = file.file_name.map(str::to_string);

    if let Some(reference) = file.file_name_field {
        let sibling = fields.iter().find(|f| f.name == reference).ok_or_else(|| {
            RequestError::configuration(
                field.name,
                format!("file name field `{reference}` is not declared"),
            )
        })?;
        if !sibling.value.is_null() {
            let text = sibling.value.to_text(sibling.name)?;
            name.get_or_insert_with(|| text.clone());
            file_name.get_or_insert(text);
        }
    }

    let name = name.ok_or_else(|| {
        RequestError::configuration(field.name, "file directive has no resolvable name")
    })?;
    Ok((name, file_name))
}
