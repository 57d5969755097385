use super::types::{
    BodySpec, Operation, ParamSpec, ParameterLocation, ParameterStyle, ResponseSpec, Responses,
    Server, Spec,
};
use super::{SecurityRequirement, SecurityScheme};
use crate::error::SpecError;
use crate::template::PathTemplate;
use http::Method;
use oas3::spec::{ObjectOrReference, Parameter};
use oas3::OpenApiV3Spec;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// HTTP verbs recognised as operation keys of a path item.
pub const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Drop path-item keys that are neither HTTP verbs nor known path-item fields.
///
/// `oas3` rejects unknown path-item keys, while real-world documents often
/// carry tool-specific ones.
pub fn strip_unknown_verbs(val: &mut Value) {
    let Some(Value::Object(paths)) = val.get_mut("paths") else {
        return;
    };
    for item in paths.values_mut() {
        if let Value::Object(obj) = item {
            obj.retain(|k, _| {
                let lk = k.to_ascii_lowercase();
                match lk.as_str() {
                    "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                    m if METHODS.contains(&m) => true,
                    _ => k.starts_with("x-"),
                }
            });
        }
    }
}

/// Resolve a local JSON pointer reference (`#/components/schemas/Pet`).
pub fn resolve_ref<'a>(document: &'a Value, ref_path: &str) -> Option<&'a Value> {
    let pointer = ref_path.strip_prefix('#')?;
    document.pointer(pointer)
}

/// Recursively replace `$ref` objects with the definitions they point to.
///
/// Expanded component schemas carry an `x-ref-name` marker. A reference that
/// is already being expanded higher up the tree (a recursive schema) becomes
/// the permissive schema `{}`; unresolvable references are left untouched.
pub fn expand_schema_refs(document: &Value, value: &mut Value) {
    let mut stack = Vec::new();
    expand_with_stack(document, value, &mut stack);
}

fn expand_with_stack(document: &Value, value: &mut Value, stack: &mut Vec<String>) {
    match value {
        Value::Object(obj) => {
            if let Some(ref_path) = obj.get("$ref").and_then(Value::as_str).map(str::to_string) {
                if stack.contains(&ref_path) {
                    *value = Value::Object(Map::new());
                    return;
                }
                if let Some(target) = resolve_ref(document, &ref_path) {
                    let mut new_val = target.clone();
                    stack.push(ref_path.clone());
                    expand_with_stack(document, &mut new_val, stack);
                    stack.pop();
                    if let Some(name) = ref_path.strip_prefix("#/components/schemas/") {
                        if let Value::Object(o) = &mut new_val {
                            o.insert("x-ref-name".to_string(), Value::String(name.to_string()));
                        }
                    }
                    *value = new_val;
                    return;
                }
            }
            for v in obj.values_mut() {
                expand_with_stack(document, v, stack);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                expand_with_stack(document, v, stack);
            }
        }
        _ => {}
    }
}

fn expanded(document: &Value, schema: Option<&Value>) -> Option<Value> {
    schema.map(|s| {
        let mut s = s.clone();
        expand_schema_refs(document, &mut s);
        s
    })
}

/// Follow a `$ref` on an object (parameter, request body, response) if present.
fn deref<'a>(document: &'a Value, value: &'a Value) -> Option<&'a Value> {
    match value.get("$ref").and_then(Value::as_str) {
        Some(ref_path) => resolve_ref(document, ref_path),
        None => Some(value),
    }
}

/// Extract all security schemes from `components.securitySchemes`.
pub fn extract_security_schemes(spec: &OpenApiV3Spec) -> HashMap<String, SecurityScheme> {
    spec.components
        .as_ref()
        .map(|c| {
            c.security_schemes
                .iter()
                .filter_map(|(name, scheme)| match scheme {
                    ObjectOrReference::Object(obj) => Some((name.clone(), obj.clone())),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Decode a raw `security` list into requirements. Malformed entries are skipped.
pub fn parse_security(value: &Value) -> Vec<SecurityRequirement> {
    value
        .as_array()
        .map(|reqs| {
            reqs.iter()
                .filter_map(Value::as_object)
                .map(|req| {
                    let schemes: BTreeMap<String, Vec<String>> = req
                        .iter()
                        .map(|(name, scopes)| {
                            let scopes = scopes
                                .as_array()
                                .map(|s| {
                                    s.iter()
                                        .filter_map(Value::as_str)
                                        .map(str::to_string)
                                        .collect()
                                })
                                .unwrap_or_default();
                            (name.clone(), scopes)
                        })
                        .collect();
                    SecurityRequirement(schemes)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Extract parameter metadata from a raw `parameters` list.
///
/// `$ref`s to `#/components/parameters/*` are followed and every entry is
/// decoded as an `oas3` [`Parameter`]. Entries that fail to decode are
/// skipped with a warning.
pub fn extract_parameters(document: &Value, params: Option<&Value>) -> Vec<ParamSpec> {
    let mut out = Vec::new();
    for raw in params.and_then(Value::as_array).into_iter().flatten() {
        let Some(resolved) = deref(document, raw) else {
            warn!(parameter = %raw, "Unresolvable parameter reference");
            continue;
        };
        let param: Parameter = match serde_json::from_value(resolved.clone()) {
            Ok(p) => p,
            Err(e) => {
                warn!(parameter = %resolved, error = %e, "Skipping undecodable parameter");
                continue;
            }
        };
        let location = ParameterLocation::from(param.location);
        out.push(ParamSpec {
            name: param.name.clone(),
            location,
            required: location == ParameterLocation::Path || param.required.unwrap_or(false),
            schema: expanded(document, resolved.get("schema")),
            style: param.style.map(ParameterStyle::from),
            explode: param.explode,
        });
    }
    out
}

/// Merge path-item and operation parameters; the operation wins on `(name, in)`.
fn merge_parameters(path_level: Vec<ParamSpec>, op_level: Vec<ParamSpec>) -> Vec<ParamSpec> {
    let mut merged: Vec<ParamSpec> = path_level
        .into_iter()
        .filter(|p| {
            !op_level
                .iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .collect();
    merged.extend(op_level);
    merged
}

/// Extract the request body declaration, keeping media types in declaration order.
pub fn extract_request_body(document: &Value, operation: &Value) -> Option<BodySpec> {
    let body = deref(document, operation.get("requestBody")?)?;
    let content = body
        .get("content")
        .and_then(Value::as_object)
        .map(|content| {
            content
                .iter()
                .map(|(mt, media)| (mt.clone(), expanded(document, media.get("schema"))))
                .collect()
        })
        .unwrap_or_default();
    Some(BodySpec {
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
        content,
    })
}

fn media_example(media: &Value) -> Option<Value> {
    media.get("example").cloned().or_else(|| {
        media
            .get("examples")
            .and_then(Value::as_object)
            .and_then(|examples| examples.values().find_map(|ex| ex.get("value").cloned()))
    })
}

/// Extract every documented response, keyed by the status key as written.
pub fn extract_responses(document: &Value, operation: &Value) -> Responses {
    let mut all = Responses::new();
    let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
        return all;
    };
    for (status, resp) in responses {
        let Some(resp) = deref(document, resp) else {
            continue;
        };
        let media: Vec<(String, ResponseSpec)> = resp
            .get("content")
            .and_then(Value::as_object)
            .map(|content| {
                content
                    .iter()
                    .map(|(mt, media)| {
                        (
                            mt.clone(),
                            ResponseSpec {
                                schema: expanded(document, media.get("schema")),
                                example: media_example(media),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        all.insert(status.to_ascii_uppercase().replace("DEFAULT", "default"), media);
    }
    all
}

/// First 16 hex characters of the SHA-256 of the serialized document.
pub fn fingerprint(document: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.to_string().as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    hash.chars().take(16).collect()
}

/// Build every operation of a raw document.
///
/// # Errors
///
/// [`SpecError::Malformed`] when `paths` is absent or no operation carries an
/// id, [`SpecError::DuplicateOperationId`] on a repeated id.
pub fn build_operations(document: &Value) -> Result<Vec<Arc<Operation>>, SpecError> {
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| SpecError::Malformed("the document has no `paths` object".into()))?;
    let global_security = document.get("security").map(parse_security).unwrap_or_default();

    let mut operations: Vec<Arc<Operation>> = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();

    for (path, item) in paths {
        let Some(item) = deref(document, item) else {
            warn!(path = %path, "Unresolvable path item reference");
            continue;
        };
        let Some(item_obj) = item.as_object() else {
            continue;
        };
        let path_params = extract_parameters(document, item.get("parameters"));

        for (key, op) in item_obj {
            let verb = key.to_ascii_lowercase();
            if !METHODS.contains(&verb.as_str()) {
                continue;
            }
            let Ok(method) = Method::from_bytes(verb.to_ascii_uppercase().as_bytes()) else {
                continue;
            };
            let location = format!("{method} {path}");

            let Some(operation_id) = op.get("operationId").and_then(Value::as_str).map(str::to_string) else {
                warn!(location = %location, "Skipping operation without operationId");
                continue;
            };
            if let Some(first) = seen.insert(operation_id.clone(), location.clone()) {
                return Err(SpecError::DuplicateOperationId {
                    operation_id,
                    first,
                    second: location,
                });
            }

            let parameters = merge_parameters(
                path_params.clone(),
                extract_parameters(document, op.get("parameters")),
            );
            let security = match op.get("security") {
                Some(explicit) => parse_security(explicit),
                None => global_security.clone(),
            };

            debug!(
                operation_id = %operation_id,
                method = %method,
                path = %path,
                parameters = parameters.len(),
                "Operation extracted"
            );

            operations.push(Arc::new(Operation {
                operation_id,
                path: path.clone(),
                method,
                template: PathTemplate::compile(path),
                parameters,
                request_body: extract_request_body(document, op),
                responses: extract_responses(document, op),
                security,
                summary: op.get("summary").and_then(Value::as_str).map(str::to_string),
                description: op
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                raw: op.clone(),
            }));
        }
    }

    if operations.is_empty() {
        return Err(SpecError::Malformed(
            "no path declares an operation with an operationId".into(),
        ));
    }
    Ok(operations)
}

impl Spec {
    /// Build a [`Spec`] from an already decoded document.
    ///
    /// # Errors
    ///
    /// [`SpecError::Malformed`] when the document lacks `paths`, does not
    /// decode as OpenAPI 3, or declares no identifiable operation;
    /// [`SpecError::DuplicateOperationId`] on a repeated operation id.
    pub fn from_value(mut raw: Value) -> Result<Spec, SpecError> {
        if raw.get("paths").and_then(Value::as_object).is_none() {
            return Err(SpecError::Malformed(
                "the document has no `paths` object".into(),
            ));
        }
        strip_unknown_verbs(&mut raw);
        let decoded: OpenApiV3Spec = serde_json::from_value(raw.clone())
            .map_err(|e| SpecError::Malformed(e.to_string()))?;

        let operations = build_operations(&raw)?;
        let servers = decoded
            .servers
            .iter()
            .map(|s| Server {
                url: s.url.clone(),
                description: s.description.clone(),
            })
            .collect();

        let spec = Spec {
            fingerprint: fingerprint(&raw),
            title: decoded.info.title.clone(),
            version: decoded.info.version.clone(),
            servers,
            operations,
            security_schemes: Arc::new(extract_security_schemes(&decoded)),
            document: Arc::new(raw),
        };
        info!(
            title = %spec.title,
            version = %spec.version,
            operations = spec.operations.len(),
            servers = spec.servers.len(),
            fingerprint = %spec.fingerprint,
            "OpenAPI document loaded"
        );
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(paths: Value) -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Test", "version": "1.0.0"},
            "paths": paths
        })
    }

    #[test]
    fn strip_unknown_path_item_keys() {
        let mut v = json!({
            "paths": {
                "/x": { "get": {}, "patch": {}, "unknown": {}, "x-extra": 1 }
            }
        });
        strip_unknown_verbs(&mut v);
        assert!(v["paths"]["/x"].get("unknown").is_none());
        assert!(v["paths"]["/x"].get("x-extra").is_some());
        assert!(v["paths"]["/x"].get("patch").is_some());
    }

    #[test]
    fn expand_refs_and_break_cycles() {
        let document = json!({
            "components": {"schemas": {
                "Pet": {"type": "object", "properties": {"tag": {"$ref": "#/components/schemas/Tag"}}},
                "Tag": {"type": "string"},
                "Node": {"type": "object", "properties": {"next": {"$ref": "#/components/schemas/Node"}}}
            }}
        });
        let mut pet = json!({"$ref": "#/components/schemas/Pet"});
        expand_schema_refs(&document, &mut pet);
        assert_eq!(pet["properties"]["tag"]["type"], "string");
        assert_eq!(pet["x-ref-name"], "Pet");

        let mut node = json!({"$ref": "#/components/schemas/Node"});
        expand_schema_refs(&document, &mut node);
        assert_eq!(node["properties"]["next"], json!({}));
    }

    #[test]
    fn operation_parameters_override_path_parameters() {
        let document = doc(json!({
            "/pets/{id}": {
                "parameters": [
                    {"name": "id", "in": "path", "schema": {"type": "string"}},
                    {"name": "trace", "in": "header", "schema": {"type": "string"}}
                ],
                "get": {
                    "operationId": "getPet",
                    "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}}],
                    "responses": {"200": {"description": "ok"}}
                }
            }
        }));
        let ops = build_operations(&document).unwrap();
        let op = &ops[0];
        assert_eq!(op.parameters.len(), 2);
        let id = op.parameters.iter().find(|p| p.name == "id").unwrap();
        assert_eq!(id.schema, Some(json!({"type": "integer"})));
        assert!(id.required);
    }

    #[test]
    fn operations_without_an_id_are_skipped() {
        let document = doc(json!({
            "/a": {"get": {"operationId": "handleA", "responses": {}}},
            "/b": {"get": {"responses": {}}}
        }));
        let ops = build_operations(&document).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operation_id, "handleA");

        // Extensions are not ids.
        let document = doc(json!({
            "/a": {"get": {"x-handler-name": "handleA", "responses": {}}}
        }));
        assert!(matches!(build_operations(&document), Err(SpecError::Malformed(_))));
    }

    #[test]
    fn duplicate_operation_ids_are_rejected() {
        let document = doc(json!({
            "/a": {"get": {"operationId": "same", "responses": {}}},
            "/b": {"post": {"operationId": "same", "responses": {}}}
        }));
        let err = build_operations(&document).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateOperationId { ref operation_id, .. } if operation_id == "same"));
    }

    #[test]
    fn explicit_empty_security_overrides_global() {
        let mut document = doc(json!({
            "/open": {"get": {"operationId": "open", "security": [], "responses": {}}},
            "/closed": {"get": {"operationId": "closed", "responses": {}}}
        }));
        document["security"] = json!([{"api_key": []}]);
        let ops = build_operations(&document).unwrap();
        assert!(ops[0].security.is_empty());
        assert_eq!(ops[1].security.len(), 1);
        assert!(ops[1].security[0].0.contains_key("api_key"));
    }

    #[test]
    fn request_body_keeps_declaration_order() {
        let document = doc(json!({
            "/upload": {"post": {
                "operationId": "upload",
                "requestBody": {"required": true, "content": {
                    "text/plain": {"schema": {"type": "string"}},
                    "application/json": {"schema": {"type": "object"}}
                }},
                "responses": {}
            }}
        }));
        let ops = build_operations(&document).unwrap();
        let body = ops[0].request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(body.media_types().collect::<Vec<_>>(), ["text/plain", "application/json"]);
    }

    #[test]
    fn missing_paths_is_malformed() {
        let err = Spec::from_value(json!({"openapi": "3.0.0", "info": {"title": "t", "version": "1"}}))
            .unwrap_err();
        assert!(matches!(err, SpecError::Malformed(_)));
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = json!({"a": 1});
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_eq!(fingerprint(&a).len(), 16);
    }
}
