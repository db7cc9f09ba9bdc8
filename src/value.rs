//! Runtime values read from filter targets, coerced literals, and the
//! comparison kernel every back-end evaluates with.

use crate::reflect::{EnumInfo, Reflect};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// A member value borrowed from a target object.
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Uuid(Uuid),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Str(&'a str),
    /// Variant ordinal in the member's [`EnumInfo`]
    Enum(usize),
    Object(&'a dyn Reflect),
    List(Vec<Value<'a>>),
}

impl Value<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Int(v) => write!(f, "Int({v})"),
            Value::Float(v) => write!(f, "Float({v})"),
            Value::Decimal(v) => write!(f, "Decimal({v})"),
            Value::Uuid(v) => write!(f, "Uuid({v})"),
            Value::DateTime(v) => write!(f, "DateTime({v})"),
            Value::DateTimeOffset(v) => write!(f, "DateTimeOffset({v})"),
            Value::Str(v) => write!(f, "Str({v:?})"),
            Value::Enum(v) => write!(f, "Enum({v})"),
            Value::Object(_) => f.write_str("Object(..)"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

impl PartialEq for Value<'_> {
    /// Objects compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::DateTimeOffset(a), Value::DateTimeOffset(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => std::ptr::addr_eq(*a, *b),
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

/// A literal coerced to the static type of the member it is compared with.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Uuid(Uuid),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Str(String),
    Enum {
        info: &'static EnumInfo,
        ordinal: usize,
    },
}

impl Literal {
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Lower-cases string literals, leaves everything else untouched.
    pub fn folded(&self) -> Literal {
        match self {
            Literal::Str(s) => Literal::Str(s.to_lowercase()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v}"),
            Literal::Decimal(v) => write!(f, "{v}"),
            Literal::Uuid(v) => write!(f, "{v}"),
            Literal::DateTime(v) => write!(f, "{v}"),
            Literal::DateTimeOffset(v) => write!(f, "{}", v.to_rfc3339()),
            Literal::Str(v) => write!(f, "{v:?}"),
            Literal::Enum { info, ordinal } => {
                write!(f, "{}.{}", info.name, info.variant(*ordinal).unwrap_or("?"))
            }
        }
    }
}

/// Ordering between a member value and a literal of the same kind.
///
/// `None` when either side is null or the kinds differ.
pub fn compare(value: &Value<'_>, literal: &Literal) -> Option<Ordering> {
    match (value, literal) {
        (Value::Int(a), Literal::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Literal::Float(b)) => a.partial_cmp(b),
        (Value::Decimal(a), Literal::Decimal(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Literal::DateTime(b)) => Some(a.cmp(b)),
        (Value::DateTimeOffset(a), Literal::DateTimeOffset(b)) => Some(a.cmp(b)),
        (Value::Str(a), Literal::Str(b)) => Some((*a).cmp(b.as_str())),
        _ => None,
    }
}

/// Equality with null propagation: null equals only null.
///
/// With `ignore_case`, string values are lower-cased and the literal is
/// expected to be folded already.
pub fn equals(value: &Value<'_>, literal: &Literal, ignore_case: bool) -> bool {
    match (value, literal) {
        (Value::Null, Literal::Null) => true,
        (Value::Null, _) | (_, Literal::Null) => false,
        (Value::Bool(a), Literal::Bool(b)) => a == b,
        (Value::Uuid(a), Literal::Uuid(b)) => a == b,
        (Value::Enum(a), Literal::Enum { ordinal, .. }) => a == ordinal,
        (Value::Str(a), Literal::Str(b)) if ignore_case => a.to_lowercase() == *b,
        (Value::Object(_) | Value::List(_), _) => false,
        _ => compare(value, literal) == Some(Ordering::Equal),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Contains,
    StartsWith,
    EndsWith,
}

/// Substring test; a null member never matches.
pub fn text_matches(value: &Value<'_>, op: TextMatch, needle: &str, ignore_case: bool) -> bool {
    let Value::Str(haystack) = value else {
        return false;
    };
    let folded;
    let haystack = if ignore_case {
        folded = haystack.to_lowercase();
        folded.as_str()
    } else {
        haystack
    };
    match op {
        TextMatch::Contains => haystack.contains(needle),
        TextMatch::StartsWith => haystack.starts_with(needle),
        TextMatch::EndsWith => haystack.ends_with(needle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Status;

    #[test]
    fn test_null_propagation() {
        assert!(equals(&Value::Null, &Literal::Null, false));
        assert!(!equals(&Value::Null, &Literal::Int(1), false));
        assert!(!equals(&Value::Int(1), &Literal::Null, false));
        assert_eq!(compare(&Value::Null, &Literal::Int(1)), None);
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(compare(&Value::Int(3), &Literal::Int(2)), Some(Ordering::Greater));
        assert_eq!(compare(&Value::Float(0.5), &Literal::Float(0.5)), Some(Ordering::Equal));
        assert_eq!(
            compare(&Value::Decimal(Decimal::new(150, 2)), &Literal::Decimal(Decimal::new(15, 1))),
            Some(Ordering::Equal)
        );
        assert_eq!(compare(&Value::Float(f64::NAN), &Literal::Float(1.0)), None);
    }

    #[test]
    fn test_enum_equality_by_ordinal() {
        let literal = Literal::Enum { info: &Status::ENUM_INFO, ordinal: 1 };
        assert!(equals(&Value::Enum(1), &literal, false));
        assert!(!equals(&Value::Enum(0), &literal, false));
        assert_eq!(literal.to_string(), "Status.Pending");
    }

    #[test]
    fn test_ignore_case_equality() {
        let literal = Literal::Str("OPS".into()).folded();
        assert!(equals(&Value::Str("Ops"), &literal, true));
        assert!(!equals(&Value::Str("Ops"), &Literal::Str("OPS".into()), false));
    }

    #[test]
    fn test_text_matches() {
        assert!(text_matches(&Value::Str("devops-team"), TextMatch::Contains, "ops", false));
        assert!(!text_matches(&Value::Str("devops-team"), TextMatch::Contains, "OPS", false));
        assert!(text_matches(&Value::Str("DevOps-Team"), TextMatch::StartsWith, "devops", true));
        assert!(text_matches(&Value::Str("devops-team"), TextMatch::EndsWith, "team", false));
        assert!(!text_matches(&Value::Null, TextMatch::Contains, "", false));
    }
}
