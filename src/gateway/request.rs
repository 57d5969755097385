use crate::template::PathParams;
use bytes::Bytes;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// Ordered query parameters; keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (`a=1&b=2&a=3`), percent-decoding keys and values.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// First value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for a key, in order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Percent-encoded `k=v&...` form, without the leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.0 {
            ser.append_pair(k, v);
        }
        ser.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryParams(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parse a `Cookie` header value into name/value pairs.
#[must_use]
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim().to_string();
            Some((name, value))
        })
        .collect()
}

/// Transport-neutral HTTP request.
///
/// The client builds one per call and the server builds one per inbound
/// request; both are then handed to the validator. Header keys are stored
/// lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiRequest {
    pub method: Method,
    /// Scheme and authority (`http://localhost:8080`), empty on the server side.
    pub host_url: String,
    /// Full template including the server base path (`/v1/pets/{petId}`).
    pub path_pattern: Option<String>,
    /// Concrete path without query string.
    pub path: String,
    pub query: QueryParams,
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub path_params: PathParams,
    pub body: Option<Bytes>,
    /// Media type of `body` as sent, parameters included.
    pub mimetype: Option<String>,
}

/// Request as seen by a server endpoint.
pub type IncomingRequest = OpenApiRequest;

impl OpenApiRequest {
    /// Request for a path; a `?query` suffix is split off and parsed.
    pub fn new(method: Method, path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        match path.split_once('?') {
            Some((p, q)) => {
                let mut req = Self::from_path(method, p);
                req.query = QueryParams::parse(q);
                req
            }
            None => Self::from_path(method, path),
        }
    }

    /// Request for an already encoded path, taken as is.
    pub fn from_path(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            host_url: String::new(),
            path_pattern: None,
            path: if path.is_empty() { "/".to_string() } else { path },
            query: QueryParams::new(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            path_params: PathParams::new(),
            body: None,
            mimetype: None,
        }
    }

    #[must_use]
    pub fn get(path: impl AsRef<str>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl AsRef<str>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn with_host_url(mut self, host_url: impl Into<String>) -> Self {
        self.host_url = host_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.path_pattern = Some(pattern.into());
        self
    }

    /// Add a header; `cookie` headers are also parsed into `cookies` and
    /// `content-type` also sets the mimetype.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert_header(name.as_ref(), value.into());
        self
    }

    pub fn insert_header(&mut self, name: &str, value: String) {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "cookie" => self.cookies.extend(parse_cookies(&value)),
            "content-type" => self.mimetype = Some(value.clone()),
            _ => {}
        }
        self.headers.insert(name, value);
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.append(key, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>, mimetype: impl Into<String>) -> Self {
        let mimetype = mimetype.into();
        self.headers
            .insert("content-type".to_string(), mimetype.clone());
        self.body = Some(body.into());
        self.mimetype = Some(mimetype);
        self
    }

    /// JSON body with `application/json` mimetype.
    #[must_use]
    pub fn with_json(self, body: &Value) -> Self {
        self.with_body(body.to_string(), "application/json")
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body parsed as JSON, if there is a body and it parses.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        self.body
            .as_ref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }

    /// Value of a path parameter extracted by the router.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// `host_url` followed by the path pattern (or the concrete path).
    #[must_use]
    pub fn full_url_pattern(&self) -> String {
        let pattern = self.path_pattern.as_deref().unwrap_or(&self.path);
        format!("{}{}", self.host_url, pattern)
    }

    /// Concrete URL including the query string.
    #[must_use]
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            format!("{}{}", self.host_url, self.path)
        } else {
            format!("{}{}?{}", self.host_url, self.path, self.query.to_query_string())
        }
    }
}
