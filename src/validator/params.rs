use crate::spec::ParameterStyle;
use serde_json::Value;

fn convert_primitive(val: &str, schema: Option<&Value>) -> Value {
    match schema.and_then(|s| s.get("type")).and_then(Value::as_str) {
        Some("integer") => val
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(val.to_string())),
        Some("number") => val
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(val.to_string())),
        Some("boolean") => val
            .parse::<bool>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(val.to_string())),
        _ => Value::String(val.to_string()),
    }
}

/// Decode raw parameter text into a JSON value according to its schema and style.
///
/// Integers, numbers and booleans are parsed when the schema asks for them;
/// text that does not parse is kept as a string so the schema check reports
/// it. Arrays split on the style's delimiter (`,` for form/simple, space for
/// `spaceDelimited`, `|` for `pipeDelimited`); when a query key repeats, the
/// values are taken one per occurrence instead. Objects are read as JSON.
#[must_use]
pub fn decode_param_value(
    values: &[&str],
    schema: Option<&Value>,
    style: Option<ParameterStyle>,
) -> Value {
    let first = values.first().copied().unwrap_or("");
    match schema.and_then(|s| s.get("type")).and_then(Value::as_str) {
        Some("array") => {
            let items_schema = schema.and_then(|s| s.get("items"));
            let parts: Vec<&str> = if values.len() > 1 {
                values.to_vec()
            } else {
                let delim = match style.unwrap_or(ParameterStyle::Form) {
                    ParameterStyle::SpaceDelimited => ' ',
                    ParameterStyle::PipeDelimited => '|',
                    _ => ',',
                };
                first.split(delim).filter(|s| !s.is_empty()).collect()
            };
            Value::Array(
                parts
                    .into_iter()
                    .map(|p| convert_primitive(p.trim(), items_schema))
                    .collect(),
            )
        }
        Some("object") => {
            serde_json::from_str(first).unwrap_or_else(|_| Value::String(first.to_string()))
        }
        _ => convert_primitive(first, schema),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives() {
        assert_eq!(decode_param_value(&["42"], Some(&json!({"type": "integer"})), None), json!(42));
        assert_eq!(decode_param_value(&["1.5"], Some(&json!({"type": "number"})), None), json!(1.5));
        assert_eq!(decode_param_value(&["true"], Some(&json!({"type": "boolean"})), None), json!(true));
        assert_eq!(decode_param_value(&["abc"], Some(&json!({"type": "integer"})), None), json!("abc"));
        assert_eq!(decode_param_value(&["abc"], None, None), json!("abc"));
    }

    #[test]
    fn arrays_by_style() {
        let schema = json!({"type": "array", "items": {"type": "integer"}});
        assert_eq!(decode_param_value(&["1,2,3"], Some(&schema), None), json!([1, 2, 3]));
        assert_eq!(
            decode_param_value(&["1|2"], Some(&schema), Some(ParameterStyle::PipeDelimited)),
            json!([1, 2])
        );
        assert_eq!(
            decode_param_value(&["1 2"], Some(&schema), Some(ParameterStyle::SpaceDelimited)),
            json!([1, 2])
        );
        assert_eq!(decode_param_value(&["4", "5"], Some(&schema), None), json!([4, 5]));
    }

    #[test]
    fn objects_from_json() {
        let schema = json!({"type": "object"});
        assert_eq!(decode_param_value(&[r#"{"a":1}"#], Some(&schema), None), json!({"a": 1}));
    }
}
