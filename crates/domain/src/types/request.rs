//! Per-call request description

use std::fmt;
use std::path::PathBuf;

use serde_json::{Map, Value};

use super::http::{ContentType, Verb};
use crate::constants::FILE_MARKER;
use crate::errors::{DigirestError, Result};

/// Ordered list of string pairs, used for query parameters and headers
pub type Pairs = Vec<(String, String)>;

/// A single multipart/form field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    /// Reference to a local file uploaded as the field content
    File(PathBuf),
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::File(path) => write!(f, "{FILE_MARKER}{}", path.display()),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Request payload before encoding
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Already-encoded payload, sent verbatim
    Raw(String),
    /// Ordered key/value mapping, encoded according to the content type
    Fields(Vec<(String, FormValue)>),
    /// Structured JSON payload
    Json(Value),
}

impl RequestBody {
    /// Build a field mapping from string pairs
    pub fn fields<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<FormValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Fields(fields) => fields.is_empty(),
            Self::Raw(_) | Self::Json(_) => false,
        }
    }

    /// Insert or replace a field.
    ///
    /// An empty body becomes a field mapping. Text goes into a JSON object as
    /// a string; a file turns the object into a field mapping, since only
    /// multipart can carry it.
    ///
    /// # Errors
    /// Returns `Config` for raw bodies and JSON values that are not objects
    pub fn set_field(&mut self, key: impl Into<String>, value: FormValue) -> Result<()> {
        let key = key.into();
        match self {
            Self::Empty => *self = Self::Fields(vec![(key, value)]),
            Self::Fields(fields) => upsert_field(fields, key, value),
            Self::Json(Value::Object(map)) => match value {
                FormValue::Text(text) => {
                    map.insert(key, Value::String(text));
                }
                FormValue::File(_) => {
                    let mut fields: Vec<(String, FormValue)> = object_fields(map)
                        .into_iter()
                        .map(|(k, v)| (k, FormValue::Text(v)))
                        .collect();
                    upsert_field(&mut fields, key, value);
                    *self = Self::Fields(fields);
                }
            },
            Self::Json(_) => {
                return Err(DigirestError::config(format!(
                    "cannot add field `{key}` to a JSON body that is not an object"
                )));
            }
            Self::Raw(_) => {
                return Err(DigirestError::config(format!(
                    "cannot add field `{key}` to a raw body"
                )));
            }
        }
        Ok(())
    }

    /// Text value of a field, if present
    pub fn field(&self, key: &str) -> Option<String> {
        match self {
            Self::Fields(fields) => {
                fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.to_string())
            }
            Self::Json(Value::Object(map)) => map.get(key).map(json_text),
            _ => None,
        }
    }

    pub fn has_field(&self, key: &str) -> bool {
        match self {
            Self::Fields(fields) => fields.iter().any(|(k, _)| k == key),
            Self::Json(Value::Object(map)) => map.contains_key(key),
            _ => false,
        }
    }
}

/// Ephemeral description of one API call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub resource: String,
    pub verb: Verb,
    pub query: Pairs,
    pub body: RequestBody,
    /// Overrides the client's configured content type for this call
    pub content_type: Option<ContentType>,
    pub extra_headers: Pairs,
}

impl RequestSpec {
    pub fn new(verb: Verb, resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            verb,
            query: Vec::new(),
            body: RequestBody::Empty,
            content_type: None,
            extra_headers: Vec::new(),
        }
    }

    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(Verb::Get, resource)
    }

    pub fn post(resource: impl Into<String>) -> Self {
        Self::new(Verb::Post, resource)
    }

    pub fn put(resource: impl Into<String>) -> Self {
        Self::new(Verb::Put, resource)
    }

    pub fn delete(resource: impl Into<String>) -> Self {
        Self::new(Verb::Delete, resource)
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_pairs<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn json(self, value: Value) -> Self {
        self.body(RequestBody::Json(value))
    }

    /// Add a per-call header; it overrides client defaults with the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.extra_headers.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Attach files as multipart fields and force the multipart content type
    ///
    /// # Errors
    /// Returns `Config` when the body cannot carry form fields (raw text or
    /// a JSON value that is not an object)
    pub fn files<K, I>(mut self, files: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PathBuf)>,
    {
        for (name, path) in files {
            self.body.set_field(name, FormValue::File(path))?;
        }
        self.content_type = Some(ContentType::MultipartForm);
        Ok(self)
    }
}

/// Flatten a JSON object into string pairs; nested values keep their JSON text
///
/// # Errors
/// Returns `Config` when `value` is not an object
pub fn json_object_fields(value: &Value) -> Result<Vec<(String, String)>> {
    match value {
        Value::Object(map) => Ok(object_fields(map)),
        _ => Err(DigirestError::config("only a JSON object can be sent as form fields")),
    }
}

fn object_fields(map: &Map<String, Value>) -> Vec<(String, String)> {
    map.iter().map(|(k, v)| (k.clone(), json_text(v))).collect()
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn upsert_field(fields: &mut Vec<(String, FormValue)>, key: String, value: FormValue) {
    match fields.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => fields.push((key, value)),
    }
}
