//! Bound filter expression: the AST after member resolution, literal
//! coercion and operator validation.
//!
//! This is the target-agnostic form both back-ends consume. The in-memory
//! compiler lowers it into closures; query providers translate it into
//! their own plans.

use crate::ast::Combinator;
use crate::resolve::MemberChain;
use crate::value::{Literal, TextMatch};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
}

#[derive(Debug, Clone)]
pub enum FilterExpr {
    /// At least one child; children that failed to bind are already gone
    Group {
        combinator: Combinator,
        children: Vec<FilterExpr>,
    },
    Compare {
        member: Arc<MemberChain>,
        op: Comparison,
        literal: Literal,
        ignore_case: bool,
    },
    /// Needle is lower-cased when `ignore_case` is set
    Text {
        member: Arc<MemberChain>,
        op: TextMatch,
        needle: String,
        ignore_case: bool,
    },
    /// Non-empty list of alternatives
    In {
        member: Arc<MemberChain>,
        literals: Vec<Literal>,
        ignore_case: bool,
    },
    HasElements {
        member: Arc<MemberChain>,
    },
    /// `predicate` is `None` when it imposes no constraint on elements
    Quantified {
        member: Arc<MemberChain>,
        quantifier: Quantifier,
        predicate: Option<Box<FilterExpr>>,
    },
}

impl FilterExpr {
    /// Number of leaf conditions.
    pub fn condition_count(&self) -> usize {
        match self {
            FilterExpr::Group { children, .. } => children.iter().map(Self::condition_count).sum(),
            FilterExpr::Quantified { predicate, .. } => {
                1 + predicate.as_ref().map_or(0, |p| p.condition_count())
            }
            _ => 1,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
        })
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Group { combinator, children } => {
                let joiner = match combinator {
                    Combinator::And => " && ",
                    Combinator::Or => " || ",
                };
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
            FilterExpr::Compare { member, op, literal, ignore_case } => {
                write!(f, "{} {} {}", member.path(), op, literal)?;
                if *ignore_case {
                    f.write_str(" (ignore case)")?;
                }
                Ok(())
            }
            FilterExpr::Text { member, op, needle, ignore_case } => {
                let name = match op {
                    TextMatch::Contains => "contains",
                    TextMatch::StartsWith => "startsWith",
                    TextMatch::EndsWith => "endsWith",
                };
                write!(f, "{}.{}({:?})", member.path(), name, needle)?;
                if *ignore_case {
                    f.write_str(" (ignore case)")?;
                }
                Ok(())
            }
            FilterExpr::In { member, literals, .. } => {
                let values: Vec<String> = literals.iter().map(ToString::to_string).collect();
                write!(f, "{} in [{}]", member.path(), values.join(", "))
            }
            FilterExpr::HasElements { member } => write!(f, "{}.any()", member.path()),
            FilterExpr::Quantified { member, quantifier, predicate } => {
                let name = match quantifier {
                    Quantifier::Any => "any",
                    Quantifier::All => "all",
                };
                match predicate {
                    Some(predicate) => write!(f, "{}.{}(x => {})", member.path(), name, predicate),
                    None => write!(f, "{}.{}(x => true)", member.path(), name),
                }
            }
        }
    }
}
