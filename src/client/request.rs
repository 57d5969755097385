use crate::gateway::QueryParams;
use bytes::Bytes;
use serde_json::Value;

/// Body supplied for one call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallBody {
    /// Encoded according to the request media type.
    Json(Value),
    /// Sent as-is with its own media type.
    Raw { bytes: Bytes, mimetype: String },
}

/// Arguments of one client call.
///
/// Positional arguments fill the path template in order of first
/// appearance; query keywords are sent verbatim (repeats allowed).
///
/// ```rust
/// use oasbind::client::Call;
/// use serde_json::json;
///
/// let call = Call::new()
///     .arg(42)
///     .query("verbose", "true")
///     .header("X-Trace", "abc")
///     .body(json!({"name": "rex"}));
/// assert_eq!(call.positional(), ["42"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Call {
    pub(crate) args: Vec<String>,
    pub(crate) body: Option<CallBody>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query: QueryParams,
}

impl Call {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one positional path value.
    #[must_use]
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Append several positional path values.
    #[must_use]
    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.args.extend(values.into_iter().map(|v| v.to_string()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(CallBody::Json(body));
        self
    }

    #[must_use]
    pub fn raw_body(mut self, bytes: impl Into<Bytes>, mimetype: impl Into<String>) -> Self {
        self.body = Some(CallBody::Raw {
            bytes: bytes.into(),
            mimetype: mimetype.into(),
        });
        self
    }

    /// Per-call header; overrides a client default with the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.append(key, value.to_string());
        self
    }

    /// Positional values collected so far.
    #[must_use]
    pub fn positional(&self) -> &[String] {
        &self.args
    }
}
