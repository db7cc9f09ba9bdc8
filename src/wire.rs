//! JSON 线格式的编解码
//!
//! 序列化依赖 serde 派生: `kind` 在前, 其余字段按声明顺序输出。
//! 反序列化先在 `serde_json::Value` 上检查判别字段和节点形状, 以便报告
//! 带 JSON pointer 位置的错误, 然后再交给 serde。

use crate::ast::{CollectionOperator, Combinator, FilterNode, Operator};
use crate::error::AstError;
use serde_json::{Map, Value};

const KINDS: [&str; 3] = ["Group", "Condition", "CollectionCondition"];

/// 序列化为紧凑 JSON
pub fn to_json(node: &FilterNode) -> serde_json::Result<String> {
    serde_json::to_string(node)
}

/// 序列化为带缩进的 JSON
pub fn to_json_pretty(node: &FilterNode) -> serde_json::Result<String> {
    serde_json::to_string_pretty(node)
}

/// 从 JSON 文本解码过滤树
pub fn from_json(json: &str) -> Result<FilterNode, AstError> {
    let value: Value = serde_json::from_str(json).map_err(|e| malformed("", e.to_string()))?;
    from_value(value)
}

/// 从已解析的 JSON 值解码过滤树
pub fn from_value(value: Value) -> Result<FilterNode, AstError> {
    check_node(&value, "")?;
    serde_json::from_value(value).map_err(|e| malformed("", e.to_string()))
}

fn malformed(location: &str, message: impl Into<String>) -> AstError {
    AstError::MalformedPayload { location: display_pointer(location), message: message.into() }
}

fn display_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

fn check_node(value: &Value, pointer: &str) -> Result<(), AstError> {
    let Some(object) = value.as_object() else {
        return Err(malformed(pointer, "expected a JSON object"));
    };
    let kind = match object.get("kind") {
        None => return Err(malformed(pointer, "missing discriminator `kind`")),
        Some(Value::String(kind)) => kind.as_str(),
        Some(_) => return Err(malformed(pointer, "`kind` must be a string")),
    };
    if !KINDS.contains(&kind) {
        return Err(AstError::UnknownVariant { location: display_pointer(pointer), kind: kind.to_string() });
    }

    match kind {
        "Group" => {
            check_name(object, "combinator", Combinator::ALL.map(|c| c.as_str()), pointer)?;
            let children = match object.get("children") {
                Some(Value::Array(children)) => children,
                Some(_) => return Err(malformed(pointer, "`children` must be an array")),
                None => return Err(malformed(pointer, "missing field `children`")),
            };
            if children.is_empty() {
                return Err(malformed(pointer, "a group needs at least one child"));
            }
            for (i, child) in children.iter().enumerate() {
                check_node(child, &format!("{}/children/{}", pointer, i))?;
            }
            Ok(())
        }
        "Condition" => {
            check_path(object, pointer)?;
            check_name(object, "operator", Operator::ALL.map(|op| op.as_str()), pointer)?;
            match object.get("value") {
                None | Some(Value::Null | Value::String(_)) => {}
                Some(_) => return Err(malformed(pointer, "`value` must be a string or null")),
            }
            match object.get("ignoreCase") {
                None | Some(Value::Bool(_)) => Ok(()),
                Some(_) => Err(malformed(pointer, "`ignoreCase` must be a boolean")),
            }
        }
        _ => {
            check_path(object, pointer)?;
            let operator = check_name(object, "operator", CollectionOperator::ALL.map(|op| op.as_str()), pointer)?;
            let requires = CollectionOperator::ALL
                .iter()
                .find(|op| op.as_str() == operator)
                .is_some_and(CollectionOperator::requires_predicate);

            // 出现 predicate 键 (即使为 null) 即视为提供了谓词
            match (requires, object.get("predicate")) {
                (true, None) => Err(malformed(pointer, format!("operator {} requires a predicate", operator))),
                (false, Some(_)) => Err(malformed(pointer, "HasElements does not take a predicate")),
                (true, Some(predicate)) => check_node(predicate, &format!("{}/predicate", pointer)),
                (false, None) => Ok(()),
            }
        }
    }
}

/// 检查取值为固定名称集合之一的字符串字段, 返回该名称
fn check_name<'v, const N: usize>(
    object: &'v Map<String, Value>,
    field: &str,
    names: [&str; N],
    pointer: &str,
) -> Result<&'v str, AstError> {
    match object.get(field) {
        Some(Value::String(name)) if names.contains(&name.as_str()) => Ok(name),
        Some(Value::String(name)) => Err(malformed(
            pointer,
            format!("unknown {} `{}`, expected one of {}", field, name, names.join(", ")),
        )),
        Some(_) => Err(malformed(pointer, format!("`{}` must be a string", field))),
        None => Err(malformed(pointer, format!("missing field `{}`", field))),
    }
}

fn check_path(object: &Map<String, Value>, pointer: &str) -> Result<(), AstError> {
    match object.get("path") {
        Some(Value::String(path)) if !path.is_empty() => Ok(()),
        Some(Value::String(_)) => Err(malformed(pointer, "`path` must not be empty")),
        Some(_) => Err(malformed(pointer, "`path` must be a string")),
        None => Err(malformed(pointer, "missing field `path`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"{"kind":"Group","combinator":"And","children":[
      {"kind":"Condition","path":"Status","operator":"Equals","value":"Active"},
      {"kind":"CollectionCondition","path":"Tags","operator":"Any",
        "predicate":{"kind":"Condition","path":"Name","operator":"Contains","value":"ops","ignoreCase":true}}
    ]}"#;

    #[test]
    fn test_decode_example_payload() {
        let node = from_json(EXAMPLE).unwrap();
        let expected = FilterNode::and(vec![
            FilterNode::condition("Status", Operator::Equals, Some("Active")),
            FilterNode::any("Tags", FilterNode::condition("Name", Operator::Contains, Some("ops")).ignoring_case()),
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn test_round_trip() {
        let nodes = vec![
            from_json(EXAMPLE).unwrap(),
            FilterNode::condition("Score", Operator::Equals, None),
            FilterNode::is_in("Status", &["Active", "Pending"]),
            FilterNode::has_elements("Labels"),
            FilterNode::or(vec![
                FilterNode::all("Tags", FilterNode::condition("Weight", Operator::LessOrEqual, Some("3"))),
                FilterNode::condition("Owner.Name", Operator::StartsWith, Some("a")).ignoring_case(),
            ]),
        ];
        for node in nodes {
            let json = to_json(&node).unwrap();
            assert_eq!(from_json(&json).unwrap(), node, "{json}");
            let pretty = to_json_pretty(&node).unwrap();
            assert_eq!(from_json(&pretty).unwrap(), node);
        }
    }

    #[test]
    fn test_field_order_and_omitted_defaults() {
        let json = to_json(&FilterNode::condition("Status", Operator::Equals, Some("Active"))).unwrap();
        assert_eq!(json, r#"{"kind":"Condition","path":"Status","operator":"Equals","value":"Active"}"#);

        let json = to_json(&FilterNode::has_elements("Tags")).unwrap();
        assert_eq!(json, r#"{"kind":"CollectionCondition","path":"Tags","operator":"HasElements"}"#);
    }

    #[test]
    fn test_unknown_variant() {
        let err = from_json(r#"{"kind":"Bogus"}"#).unwrap_err();
        assert_eq!(err, AstError::UnknownVariant { location: "/".into(), kind: "Bogus".into() });

        let nested = r#"{"kind":"Group","combinator":"Or","children":[
            {"kind":"Condition","path":"A","operator":"Equals","value":"1"},
            {"kind":"PropertyFilter"}]}"#;
        let err = from_json(nested).unwrap_err();
        assert_eq!(err, AstError::UnknownVariant { location: "/children/1".into(), kind: "PropertyFilter".into() });
    }

    #[test]
    fn test_malformed_payloads() {
        let cases = [
            ("not json", "/"),
            ("[]", "/"),
            (r#"{"path":"A"}"#, "/"),
            (r#"{"kind":"Condition","operator":"Equals","value":"x"}"#, "/"),
            (r#"{"kind":"Condition","path":"","operator":"Equals"}"#, "/"),
            (r#"{"kind":"Group","combinator":"And","children":[]}"#, "/"),
            (r#"{"kind":"CollectionCondition","path":"Tags","operator":"Any"}"#, "/"),
            (
                r#"{"kind":"CollectionCondition","path":"Tags","operator":"HasElements",
                    "predicate":{"kind":"Condition","path":"Name","operator":"Equals","value":"x"}}"#,
                "/",
            ),
            (
                r#"{"kind":"CollectionCondition","path":"Tags","operator":"All",
                    "predicate":{"kind":"Condition","operator":"Equals"}}"#,
                "/predicate",
            ),
        ];
        for (json, location) in cases {
            match from_json(json) {
                Err(AstError::MalformedPayload { location: actual, .. }) => assert_eq!(actual, location, "{json}"),
                other => panic!("Expected MalformedPayload for {json}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bad_enum_values_are_malformed() {
        let err = from_json(r#"{"kind":"Condition","path":"A","operator":"Like","value":"x"}"#).unwrap_err();
        assert!(matches!(err, AstError::MalformedPayload { .. }));
    }

    #[test]
    fn test_nested_field_errors_report_their_node() {
        let cases = [
            (
                r#"{"kind":"Group","combinator":"And","children":[
                    {"kind":"Condition","path":"A","operator":"Equals","value":"1"},
                    {"kind":"Condition","path":"B","operator":"Like","value":"x"}]}"#,
                "/children/1",
            ),
            (r#"{"kind":"Group","combinator":"Xor","children":[{"kind":"Condition","path":"A","operator":"Equals"}]}"#, "/"),
            (
                r#"{"kind":"Group","combinator":"Or","children":[
                    {"kind":"Group","combinator":"And","children":[
                        {"kind":"Condition","path":"A","operator":"Equals","value":5}]}]}"#,
                "/children/0/children/0",
            ),
            (
                r#"{"kind":"CollectionCondition","path":"Tags","operator":"Any",
                    "predicate":{"kind":"Condition","path":"Name","operator":"Equals","ignoreCase":"yes"}}"#,
                "/predicate",
            ),
            (
                r#"{"kind":"Group","combinator":"And","children":[
                    {"kind":"CollectionCondition","path":"Tags","operator":"Some"}]}"#,
                "/children/0",
            ),
        ];
        for (json, location) in cases {
            match from_json(json) {
                Err(AstError::MalformedPayload { location: actual, .. }) => assert_eq!(actual, location, "{json}"),
                other => panic!("Expected MalformedPayload for {json}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_null_predicate_is_rejected() {
        let has = r#"{"kind":"CollectionCondition","path":"Tags","operator":"HasElements","predicate":null}"#;
        match from_json(has) {
            Err(AstError::MalformedPayload { location, message }) => {
                assert_eq!(location, "/");
                assert!(message.contains("HasElements"), "{message}");
            }
            other => panic!("Expected MalformedPayload, got {other:?}"),
        }

        let any = r#"{"kind":"CollectionCondition","path":"Tags","operator":"Any","predicate":null}"#;
        match from_json(any) {
            Err(AstError::MalformedPayload { location, .. }) => assert_eq!(location, "/predicate"),
            other => panic!("Expected MalformedPayload, got {other:?}"),
        }
    }
}
