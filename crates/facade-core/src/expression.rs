//! JMESPath expressions over request bodies.

use crate::error::FacadeError;
use jmespath::Variable;
use serde_json::Value;
use std::rc::Rc;

/// Check that an expression compiles.
pub fn validate_expression(expression: &str) -> Result<(), FacadeError> {
    jmespath::compile(expression)
        .map(|_| ())
        .map_err(|e| FacadeError::validation(format!("invalid JMESPath expression: {e}")))
}

/// Evaluate `expression` against `data` and report whether the result is truthy.
///
/// Compile or evaluation errors count as no match.
pub fn matches_expression(expression: &str, data: &Value) -> bool {
    let Ok(compiled) = jmespath::compile(expression) else {
        return false;
    };
    let Ok(result) = compiled.search(&to_variable(data)) else {
        return false;
    };
    is_truthy(&result)
}

fn to_variable(value: &Value) -> Rc<Variable> {
    let variable = match value {
        Value::Null => Variable::Null,
        Value::Bool(b) => Variable::Bool(*b),
        Value::Number(n) => Variable::Number(n.clone()),
        Value::String(s) => Variable::String(s.clone()),
        Value::Array(items) => Variable::Array(items.iter().map(to_variable).collect()),
        Value::Object(map) => Variable::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_variable(v)))
                .collect(),
        ),
    };
    Rc::new(variable)
}

fn is_truthy(variable: &Variable) -> bool {
    match variable {
        Variable::Null => false,
        Variable::Bool(b) => *b,
        Variable::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Variable::String(s) => !s.is_empty(),
        Variable::Array(items) => !items.is_empty(),
        Variable::Object(map) => !map.is_empty(),
        Variable::Expref(_) => false,
    }
}

/// Match a raw request body against an expression.
pub fn raw_body_matches_expression(raw: Option<&str>, expression: &str) -> bool {
    raw.and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .is_some_and(|body| matches_expression(expression, &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("verified", json!({"verified": true}), true)]
    #[case("verified", json!({"verified": false}), false)]
    #[case("patient.name == 'Joe'", json!({"patient": {"name": "Joe"}}), true)]
    #[case("patient.name == 'Joe'", json!({"patient": {"name": "Jane"}}), false)]
    #[case("contains(ids, `5`)", json!({"ids": [1, 5, 3]}), true)]
    #[case("length(items[?qty > `2`]) > `0`", json!({"items": [{"qty": 1}, {"qty": 4}]}), true)]
    #[case("count", json!({"count": 0}), false)]
    #[case("tags", json!({"tags": []}), false)]
    #[case("missing", json!({}), false)]
    fn test_matches_expression(#[case] expression: &str, #[case] data: Value, #[case] expected: bool) {
        assert_eq!(matches_expression(expression, &data), expected);
    }

    #[rstest]
    fn test_invalid_expression_never_matches() {
        assert!(!matches_expression("[invalid", &json!({"a": 1})));
        let err = validate_expression("[invalid").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[rstest]
    #[case(Some(r#"{"status": "active"}"#), true)]
    #[case(Some(r#"{"status": "closed"}"#), false)]
    #[case(Some("{broken"), false)]
    #[case(None, false)]
    fn test_raw_body_matches_expression(#[case] raw: Option<&str>, #[case] expected: bool) {
        assert_eq!(
            raw_body_matches_expression(raw, "status == 'active'"),
            expected
        );
    }
}
