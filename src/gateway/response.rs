use crate::spec::is_json_mimetype;
use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;

/// Transport-neutral HTTP response.
///
/// Returned by client calls and by server dispatch. Header keys are stored
/// lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
    pub mimetype: Option<String>,
}

impl OpenApiResponse {
    /// Empty response with a status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
            mimetype: None,
        }
    }

    /// `application/json` response serialized from a value.
    #[must_use]
    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self::new(status).with_body(body.to_string(), "application/json")
    }

    /// JSON error body: `{"error": message, "details": details}`.
    #[must_use]
    pub fn error(status: StatusCode, message: &str, details: Vec<Value>) -> Self {
        Self::json(
            status,
            &serde_json::json!({ "error": message, "details": details }),
        )
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>, mimetype: impl Into<String>) -> Self {
        let mimetype = mimetype.into();
        self.headers
            .insert("content-type".to_string(), mimetype.clone());
        self.mimetype = Some(mimetype);
        self.body = body.into();
        self
    }

    /// Add a header; `content-type` also sets the mimetype.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        let name = name.as_ref().to_ascii_lowercase();
        let value = value.into();
        if name == "content-type" {
            self.mimetype = Some(value.clone());
        }
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as JSON when it parses, otherwise as a (lossy) UTF-8 string.
    #[must_use]
    pub fn payload(&self) -> Value {
        self.json_body()
            .unwrap_or_else(|| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }

    /// Body parsed as JSON. Only attempted for JSON media types or when no
    /// media type is known.
    #[must_use]
    pub fn json_body(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        match self.mimetype.as_deref() {
            Some(mt) if !is_json_mimetype(mt) => None,
            _ => serde_json::from_slice(&self.body).ok(),
        }
    }
}
