//! Structural validation of raw filter payloads.
//!
//! Runs before [`crate::wire::from_json`] whenever a payload crosses a
//! process boundary. Unlike the decoder it does not stop at the first
//! problem: every violation is reported with its JSON pointer.

use crate::ast::{CollectionOperator, Combinator, Operator};
use crate::error::{ValidationError, ValidationIssue};
use serde_json::{Map, Value};

/// Companion JSON Schema describing the wire format.
pub const SCHEMA_DOCUMENT: &str = include_str!("../schema/filter-node.schema.json");

/// Bumped whenever a node kind or operator is added.
pub const SCHEMA_VERSION: &str = "1.0.0";

const GROUP_FIELDS: &[&str] = &["kind", "combinator", "children"];
const CONDITION_FIELDS: &[&str] = &["kind", "path", "operator", "value", "ignoreCase"];
const COLLECTION_FIELDS: &[&str] = &["kind", "path", "operator", "predicate"];

/// Validate a raw payload against the filter node shape.
pub fn validate(json: &str) -> Result<(), ValidationError> {
    let value: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            return Err(ValidationError {
                issues: vec![ValidationIssue { location: String::new(), message: e.to_string() }],
            })
        }
    };
    validate_value(&value)
}

/// Validate an already parsed payload.
pub fn validate_value(value: &Value) -> Result<(), ValidationError> {
    let mut validator = Validator::default();
    validator.node(value, "");
    if validator.issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues: validator.issues })
    }
}

#[derive(Default)]
struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    fn report(&mut self, location: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue { location: location.to_string(), message: message.into() });
    }

    fn node(&mut self, value: &Value, pointer: &str) {
        let Some(object) = value.as_object() else {
            self.report(pointer, format!("expected an object, found {}", type_of(value)));
            return;
        };

        let kind = match object.get("kind") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => {
                self.report(&child(pointer, "kind"), format!("expected a string, found {}", type_of(other)));
                return;
            }
            None => {
                self.report(pointer, "missing required property `kind`");
                return;
            }
        };

        match kind {
            "Group" => self.group(object, pointer),
            "Condition" => self.condition(object, pointer),
            "CollectionCondition" => self.collection(object, pointer),
            other => self.report(
                &child(pointer, "kind"),
                format!("unknown node kind {:?}; expected Group, Condition or CollectionCondition", other),
            ),
        }
    }

    fn group(&mut self, object: &Map<String, Value>, pointer: &str) {
        self.known_fields(object, pointer, GROUP_FIELDS);
        let combinators: Vec<&str> = Combinator::ALL.iter().map(Combinator::as_str).collect();
        self.one_of(object, pointer, "combinator", &combinators);

        match object.get("children") {
            Some(Value::Array(children)) => {
                if children.is_empty() {
                    self.report(&child(pointer, "children"), "a group needs at least one child");
                }
                for (i, node) in children.iter().enumerate() {
                    self.node(node, &format!("{}/children/{}", pointer, i));
                }
            }
            Some(other) => self.report(
                &child(pointer, "children"),
                format!("expected an array, found {}", type_of(other)),
            ),
            None => self.report(pointer, "missing required property `children`"),
        }
    }

    fn condition(&mut self, object: &Map<String, Value>, pointer: &str) {
        self.known_fields(object, pointer, CONDITION_FIELDS);
        self.path(object, pointer);
        let operators: Vec<&str> = Operator::ALL.iter().map(Operator::as_str).collect();
        self.one_of(object, pointer, "operator", &operators);

        match object.get("value") {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(other) => self.report(
                &child(pointer, "value"),
                format!("expected a string or null, found {}", type_of(other)),
            ),
        }
        match object.get("ignoreCase") {
            None | Some(Value::Bool(_)) => {}
            Some(other) => self.report(
                &child(pointer, "ignoreCase"),
                format!("expected a boolean, found {}", type_of(other)),
            ),
        }
    }

    fn collection(&mut self, object: &Map<String, Value>, pointer: &str) {
        self.known_fields(object, pointer, COLLECTION_FIELDS);
        self.path(object, pointer);
        let operators: Vec<&str> = CollectionOperator::ALL.iter().map(CollectionOperator::as_str).collect();
        let operator = self.one_of(object, pointer, "operator", &operators);
        let operator = CollectionOperator::ALL.iter().find(|op| Some(op.as_str()) == operator);

        match (operator, object.get("predicate")) {
            (Some(op), None) if op.requires_predicate() => {
                self.report(pointer, format!("operator {} requires a predicate", op.as_str()))
            }
            (Some(op), Some(_)) if !op.requires_predicate() => self.report(
                &child(pointer, "predicate"),
                format!("operator {} does not take a predicate", op.as_str()),
            ),
            (_, Some(predicate)) => self.node(predicate, &child(pointer, "predicate")),
            _ => {}
        }
    }

    fn path(&mut self, object: &Map<String, Value>, pointer: &str) {
        match object.get("path") {
            Some(Value::String(path)) if path.is_empty() => {
                self.report(&child(pointer, "path"), "must not be empty")
            }
            Some(Value::String(_)) => {}
            Some(other) => self.report(
                &child(pointer, "path"),
                format!("expected a string, found {}", type_of(other)),
            ),
            None => self.report(pointer, "missing required property `path`"),
        }
    }

    /// Checks a required string enum; returns the value when it is valid.
    fn one_of<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        pointer: &str,
        field: &str,
        allowed: &[&str],
    ) -> Option<&'v str> {
        match object.get(field) {
            Some(Value::String(value)) if allowed.contains(&value.as_str()) => Some(value.as_str()),
            Some(other) => {
                self.report(
                    &child(pointer, field),
                    format!("{} is not one of {}", other, allowed.join(", ")),
                );
                None
            }
            None => {
                self.report(pointer, format!("missing required property `{}`", field));
                None
            }
        }
    }

    fn known_fields(&mut self, object: &Map<String, Value>, pointer: &str, allowed: &[&str]) {
        for key in object.keys() {
            if !allowed.contains(&key.as_str()) {
                self.report(&child(pointer, key), "unknown property");
            }
        }
    }
}

/// Appends one reference token, escaped per RFC 6901.
fn child(pointer: &str, token: &str) -> String {
    format!("{}/{}", pointer, token.replace('~', "~0").replace('/', "~1"))
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations(json: &str) -> Vec<String> {
        validate(json)
            .unwrap_err()
            .issues
            .into_iter()
            .map(|issue| issue.location)
            .collect()
    }

    #[test]
    fn test_valid_payload() {
        let json = r#"{"kind":"Group","combinator":"And","children":[
          {"kind":"Condition","path":"Status","operator":"Equals","value":"Active"},
          {"kind":"Condition","path":"Score","operator":"Equals","value":null},
          {"kind":"CollectionCondition","path":"Labels","operator":"HasElements"},
          {"kind":"CollectionCondition","path":"Tags","operator":"Any",
            "predicate":{"kind":"Condition","path":"Name","operator":"Contains","value":"ops","ignoreCase":true}}
        ]}"#;
        assert!(validate(json).is_ok());
    }

    #[test]
    fn test_malformed_json_reports_root() {
        let error = validate("{\"kind\":").unwrap_err();
        assert_eq!(error.issues.len(), 1);
        assert_eq!(error.issues[0].location, "");
    }

    #[test]
    fn test_bogus_kind() {
        assert_eq!(locations(r#"{"kind":"Bogus"}"#), vec!["/kind"]);
        assert_eq!(locations(r#"{"path":"A"}"#), vec![""]);
        assert_eq!(locations("42"), vec![""]);
    }

    #[test]
    fn test_collects_every_issue() {
        let json = r#"{"kind":"Group","combinator":"Xor","children":[
          {"kind":"Condition","path":"","operator":"Like","value":5,"extra":true},
          {"kind":"CollectionCondition","path":"Tags","operator":"All"},
          {"kind":"CollectionCondition","path":"Tags","operator":"HasElements",
            "predicate":{"kind":"Condition","path":"Name","operator":"Equals"}}
        ]}"#;
        assert_eq!(
            locations(json),
            vec![
                "/combinator",
                "/children/0/extra",
                "/children/0/path",
                "/children/0/operator",
                "/children/0/value",
                "/children/1",
                "/children/2/predicate",
            ]
        );
    }

    #[test]
    fn test_empty_group_and_nested_errors() {
        assert_eq!(locations(r#"{"kind":"Group","combinator":"Or","children":[]}"#), vec!["/children"]);

        let json = r#"{"kind":"CollectionCondition","path":"Tags","operator":"Any",
            "predicate":{"kind":"Group","combinator":"And","children":[{"kind":"Nope"}]}}"#;
        assert_eq!(locations(json), vec!["/predicate/children/0/kind"]);
    }

    #[test]
    fn test_pointer_escaping() {
        let json = r#"{"kind":"Condition","path":"A","operator":"Equals","a/b~c":1}"#;
        assert_eq!(locations(json), vec!["/a~1b~0c"]);
    }

    #[test]
    fn test_schema_document_matches_node_model() {
        let schema: Value = serde_json::from_str(SCHEMA_DOCUMENT).unwrap();
        assert_eq!(schema["version"], SCHEMA_VERSION);

        let operators: Vec<&str> = schema["$defs"]["condition"]["properties"]["operator"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        let expected: Vec<&str> = Operator::ALL.iter().map(Operator::as_str).collect();
        assert_eq!(operators, expected);

        let collection: Vec<&str> = schema["$defs"]["collectionCondition"]["properties"]["operator"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        let expected: Vec<&str> = CollectionOperator::ALL.iter().map(CollectionOperator::as_str).collect();
        assert_eq!(collection, expected);
    }

    #[test]
    fn test_validated_payloads_decode() {
        let json = r#"{"kind":"CollectionCondition","path":"Tags","operator":"All",
            "predicate":{"kind":"Condition","path":"Weight","operator":"GreaterThan","value":"1"}}"#;
        assert!(validate(json).is_ok());
        assert!(crate::wire::from_json(json).is_ok());
    }

    #[test]
    fn test_rejected_payloads_fail_to_decode() {
        let payloads = [
            r#"{"kind":"CollectionCondition","path":"Tags","operator":"HasElements","predicate":null}"#,
            r#"{"kind":"CollectionCondition","path":"Tags","operator":"Any","predicate":null}"#,
            r#"{"kind":"Condition","path":"Name","operator":"Equals","ignoreCase":1}"#,
            r#"{"kind":"Group","combinator":"Xor","children":[{"kind":"Condition","path":"A","operator":"Equals"}]}"#,
        ];
        for json in payloads {
            assert!(validate(json).is_err(), "{json}");
            assert!(crate::wire::from_json(json).is_err(), "{json}");
        }
    }
}
