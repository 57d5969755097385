use super::{SecurityRequirement, SecurityScheme};
use crate::template::PathTemplate;
use heck::ToLowerCamelCase;
use http::Method;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    /// Lowercase name as written in the document (`in: query`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<oas3::spec::ParameterIn> for ParameterLocation {
    fn from(loc: oas3::spec::ParameterIn) -> Self {
        match loc {
            oas3::spec::ParameterIn::Path => ParameterLocation::Path,
            oas3::spec::ParameterIn::Query => ParameterLocation::Query,
            oas3::spec::ParameterIn::Header => ParameterLocation::Header,
            oas3::spec::ParameterIn::Cookie => ParameterLocation::Cookie,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl From<oas3::spec::ParameterStyle> for ParameterStyle {
    fn from(style: oas3::spec::ParameterStyle) -> Self {
        use oas3::spec::ParameterStyle as PS;
        match style {
            PS::Matrix => ParameterStyle::Matrix,
            PS::Label => ParameterStyle::Label,
            PS::Form => ParameterStyle::Form,
            PS::Simple => ParameterStyle::Simple,
            PS::SpaceDelimited => ParameterStyle::SpaceDelimited,
            PS::PipeDelimited => ParameterStyle::PipeDelimited,
            PS::DeepObject => ParameterStyle::DeepObject,
        }
    }
}

/// One declared parameter of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParameterLocation,
    /// Always `true` for path parameters.
    pub required: bool,
    /// Parameter schema with `$ref`s expanded.
    pub schema: Option<Value>,
    pub style: Option<ParameterStyle>,
    pub explode: Option<bool>,
}

/// Declared request body of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    pub required: bool,
    /// Media type -> schema, in declaration order.
    pub content: Vec<(String, Option<Value>)>,
}

impl BodySpec {
    /// Declared media types in declaration order.
    pub fn media_types(&self) -> impl Iterator<Item = &str> {
        self.content.iter().map(|(mt, _)| mt.as_str())
    }

    /// Find the declared entry for a concrete mimetype.
    ///
    /// Parameters (`; charset=utf-8`) and case are ignored; `type/*` and
    /// `*/*` ranges match any concrete subtype.
    #[must_use]
    pub fn media_type_for(&self, mimetype: &str) -> Option<(&str, Option<&Value>)> {
        find_media(&self.content, mimetype).map(|(mt, schema)| (mt, schema.as_ref()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub schema: Option<Value>,
    pub example: Option<Value>,
}

/// Status key (`"200"`, `"2XX"`, `"default"`) -> media type -> response.
pub type Responses = BTreeMap<String, Vec<(String, ResponseSpec)>>;

/// A server entry from the document's `servers` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub url: String,
    pub description: Option<String>,
}

impl Server {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }
}

/// One `(path, method)` pair identified by its `operationId`.
#[derive(Debug, Clone)]
pub struct Operation {
    pub operation_id: String,
    /// Relative path template as declared under `paths`.
    pub path: String,
    pub method: Method,
    pub template: PathTemplate,
    /// Path-item and operation parameters merged; operation level wins.
    pub parameters: Vec<ParamSpec>,
    pub request_body: Option<BodySpec>,
    pub responses: Responses,
    /// Effective security requirements (operation level, else document level).
    /// Empty means the operation is public.
    pub security: Vec<SecurityRequirement>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub(crate) raw: Value,
}

impl Operation {
    /// Human readable documentation: summary (or the id) and description.
    #[must_use]
    pub fn doc(&self) -> String {
        let head = self
            .summary
            .clone()
            .unwrap_or_else(|| self.operation_id.clone());
        match &self.description {
            Some(description) => format!("{head}\n\n{description}"),
            None => head,
        }
    }

    /// Raw field of the operation object; tries the exact key, then its
    /// camelCase form (`operation_id` → `operationId`).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        field(&self.raw, name)
    }

    /// Parameters declared in a given location.
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &ParamSpec> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    /// Documented responses for a status: exact code, then `NXX` range, then `default`.
    #[must_use]
    pub fn response_for(&self, status: u16) -> Option<&[(String, ResponseSpec)]> {
        let exact = status.to_string();
        let range = format!("{}XX", status / 100);
        self.responses
            .get(&exact)
            .or_else(|| {
                self.responses
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(&range))
                    .map(|(_, v)| v)
            })
            .or_else(|| self.responses.get("default"))
            .map(Vec::as_slice)
    }
}

/// Normalized, immutable view of an OpenAPI document.
///
/// Cloning is cheap: operations, schemes and the raw document are shared.
#[derive(Debug, Clone)]
pub struct Spec {
    pub(crate) document: Arc<Value>,
    pub(crate) title: String,
    pub(crate) version: String,
    pub(crate) servers: Vec<Server>,
    pub(crate) operations: Vec<Arc<Operation>>,
    pub(crate) security_schemes: Arc<HashMap<String, SecurityScheme>>,
    pub(crate) fingerprint: String,
}

impl Spec {
    /// `info.title`.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// `info.version`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Declared servers, in order.
    #[must_use]
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// All operations, in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    /// `components.securitySchemes`.
    #[must_use]
    pub fn security_schemes(&self) -> &HashMap<String, SecurityScheme> {
        &self.security_schemes
    }

    /// Short content hash of the document, stable across clones.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The decoded document as loaded.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Top-level field of the document; tries the exact key, then its
    /// camelCase form (`external_docs` → `externalDocs`).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        field(&self.document, name)
    }

    /// Operation by exact `operationId`.
    #[must_use]
    pub fn operation(&self, operation_id: &str) -> Option<&Arc<Operation>> {
        self.operations
            .iter()
            .find(|op| op.operation_id == operation_id)
    }
}

pub(crate) fn field<'a>(object: &'a Value, name: &str) -> Option<&'a Value> {
    object
        .get(name)
        .or_else(|| object.get(name.to_lower_camel_case()))
}

pub(crate) fn base_mimetype(mimetype: &str) -> String {
    mimetype
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

pub(crate) fn find_media<'a, T>(
    content: &'a [(String, T)],
    mimetype: &str,
) -> Option<(&'a str, &'a T)>
where
    T: 'a,
{
    let wanted = base_mimetype(mimetype);
    let exact = content
        .iter()
        .find(|(declared, _)| base_mimetype(declared) == wanted);
    let ranged = || {
        content.iter().find(|(declared, _)| {
            let declared = base_mimetype(declared);
            declared == "*/*"
                || declared
                    .strip_suffix("/*")
                    .is_some_and(|major| wanted.split('/').next() == Some(major))
        })
    };
    exact
        .or_else(ranged)
        .map(|(declared, value)| (declared.as_str(), value))
}

/// Whether a mimetype carries JSON (`application/json`, `application/problem+json`, …).
#[must_use]
pub fn is_json_mimetype(mimetype: &str) -> bool {
    let base = base_mimetype(mimetype);
    base == "application/json" || base.ends_with("+json")
}
