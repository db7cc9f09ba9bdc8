//! Error types shared across the crate.
//!
//! Boundary errors (`AstError`, `ValidationError`) are hard failures reported
//! to the caller. `CompileError` is only produced in strict mode; in lenient
//! mode the same situations drop the offending condition instead.

use std::fmt;
use thiserror::Error;

/// Failure to decode a wire payload into a [`crate::ast::FilterNode`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AstError {
    /// The discriminator names none of the three node variants
    #[error("unknown node kind {kind:?} at {location}")]
    UnknownVariant {
        /// JSON pointer of the offending node
        location: String,
        kind: String,
    },

    /// Required fields are absent or have the wrong shape
    #[error("malformed payload at {location}: {message}")]
    MalformedPayload { location: String, message: String },
}

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// JSON pointer; empty string is the document root
    pub location: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = if self.location.is_empty() { "/" } else { &self.location };
        write!(f, "{}: {}", location, self.message)
    }
}

/// Every violation found in a payload, in document order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("filter payload failed validation with {} issue(s): {}", .issues.len(), summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// A condition that could not be compiled. Only surfaced in strict mode.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("path {path:?} does not resolve on type {type_name}")]
    UnresolvedPath { type_name: String, path: String },

    #[error("operator {operator} is not supported for {path:?} of type {type_name}")]
    UnsupportedOperator {
        path: String,
        operator: String,
        type_name: String,
    },

    #[error("value {value:?} cannot be coerced to {type_name} for {path:?}")]
    InvalidLiteral {
        path: String,
        value: Option<String>,
        type_name: String,
    },

    #[error("path {path:?} is not a collection")]
    NotACollection { path: String },

    #[error("collection operator {operator} on {path:?} requires a predicate")]
    MissingPredicate { path: String, operator: String },

    #[error("group has no children")]
    EmptyGroup,
}

/// Configuration loading failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(String),

    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON配置文件 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
