//! Shared binder: walks a [`FilterNode`] against a root type and produces the
//! bound [`FilterExpr`] both back-ends consume.
//!
//! Soft failures (unknown path, operator not valid for the member type,
//! literal that does not coerce) drop the condition in lenient mode and are
//! returned as [`CompileError`] in strict mode.

use crate::ast::{CollectionCondition, CollectionOperator, Condition, FilterNode, Group, Operator};
use crate::coerce::{coerce, decode_in_list};
use crate::error::CompileError;
use crate::expr::{Comparison, FilterExpr, Quantifier};
use crate::reflect::{Type, TypeInfo};
use crate::resolve::{MemberChain, MemberResolver};
use crate::value::{Literal, TextMatch};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How per-condition failures are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strictness {
    /// Drop the condition; it imposes no constraint
    #[default]
    Lenient,
    /// Fail the whole compilation
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub strictness: Strictness,
}

impl CompileOptions {
    pub fn strict() -> Self {
        Self { strictness: Strictness::Strict }
    }
}

type BindResult = Result<Option<FilterExpr>, CompileError>;

pub struct Binder<'r> {
    resolver: &'r MemberResolver,
    options: CompileOptions,
}

impl<'r> Binder<'r> {
    pub fn new(resolver: &'r MemberResolver, options: CompileOptions) -> Self {
        Self { resolver, options }
    }

    /// Binds `node` against `root`. `Ok(None)` means no constraint.
    pub fn bind(&self, root: &'static TypeInfo, node: &FilterNode) -> BindResult {
        match node {
            FilterNode::Group(group) => self.bind_group(root, group),
            FilterNode::Condition(condition) => self.bind_condition(root, condition),
            FilterNode::CollectionCondition(collection) => self.bind_collection(root, collection),
        }
    }

    fn bind_group(&self, root: &'static TypeInfo, group: &Group) -> BindResult {
        if group.children.is_empty() {
            return self.soft_fail(CompileError::EmptyGroup);
        }

        let mut children = Vec::with_capacity(group.children.len());
        for child in &group.children {
            if let Some(bound) = self.bind(root, child)? {
                children.push(bound);
            }
        }

        Ok(match children.len() {
            0 => {
                debug!("group on {} has no surviving children, dropping it", root.name);
                None
            }
            1 => children.pop(),
            _ => Some(FilterExpr::Group { combinator: group.combinator, children }),
        })
    }

    fn bind_condition(&self, root: &'static TypeInfo, condition: &Condition) -> BindResult {
        let Some(member) = self.resolver.resolve(root, &condition.path) else {
            return self.soft_fail(CompileError::UnresolvedPath {
                type_name: root.name.to_string(),
                path: condition.path.clone(),
            });
        };
        let ty = member.ty();
        let ignore_case = condition.ignore_case && ty.is_textual();
        let value = condition.value.as_deref();

        match condition.operator {
            Operator::Equals | Operator::NotEquals => {
                let Some(literal) = self.equality_literal(value, ty) else {
                    return self.invalid_literal_or_operator(condition, ty);
                };
                let op = if condition.operator == Operator::Equals {
                    Comparison::Equal
                } else {
                    Comparison::NotEqual
                };
                Ok(Some(FilterExpr::Compare {
                    member,
                    op,
                    literal: if ignore_case { literal.folded() } else { literal },
                    ignore_case,
                }))
            }
            Operator::GreaterThan
            | Operator::GreaterOrEqual
            | Operator::LessThan
            | Operator::LessOrEqual => {
                if !ty.is_ordered() {
                    return self.unsupported(condition, ty);
                }
                let Some(literal) = coerce(value, ty) else {
                    return self.invalid_literal(condition, ty);
                };
                let op = match condition.operator {
                    Operator::GreaterThan => Comparison::Greater,
                    Operator::GreaterOrEqual => Comparison::GreaterOrEqual,
                    Operator::LessThan => Comparison::Less,
                    _ => Comparison::LessOrEqual,
                };
                Ok(Some(FilterExpr::Compare { member, op, literal, ignore_case: false }))
            }
            Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
                if !ty.is_textual() {
                    return self.unsupported(condition, ty);
                }
                let Some(needle) = value else {
                    return self.invalid_literal(condition, ty);
                };
                let op = match condition.operator {
                    Operator::Contains => TextMatch::Contains,
                    Operator::StartsWith => TextMatch::StartsWith,
                    _ => TextMatch::EndsWith,
                };
                Ok(Some(FilterExpr::Text {
                    member,
                    op,
                    needle: if ignore_case { needle.to_lowercase() } else { needle.to_string() },
                    ignore_case,
                }))
            }
            Operator::In => self.bind_in(member, condition, ignore_case),
        }
    }

    fn bind_in(&self, member: Arc<MemberChain>, condition: &Condition, ignore_case: bool) -> BindResult {
        let ty = member.ty();
        if !ty.is_scalar() {
            return self.unsupported(condition, ty);
        }
        let Some(elements) = decode_in_list(condition.value.as_deref()) else {
            return self.invalid_literal(condition, ty);
        };

        let mut literals = Vec::with_capacity(elements.len());
        for element in &elements {
            match coerce(element.as_deref(), ty) {
                Some(literal) if ignore_case => literals.push(literal.folded()),
                Some(literal) => literals.push(literal),
                None => {
                    if self.is_strict() {
                        return Err(CompileError::InvalidLiteral {
                            path: condition.path.clone(),
                            value: element.clone(),
                            type_name: ty.name(),
                        });
                    }
                    debug!("skipping In element {:?} for {}: not a {}", element, condition.path, ty.name());
                }
            }
        }

        if literals.is_empty() {
            debug!("In list for {} is empty, dropping condition", condition.path);
            return Ok(None);
        }
        Ok(Some(FilterExpr::In { member, literals, ignore_case }))
    }

    fn bind_collection(&self, root: &'static TypeInfo, collection: &CollectionCondition) -> BindResult {
        let Some(member) = self.resolver.resolve(root, &collection.path) else {
            return self.soft_fail(CompileError::UnresolvedPath {
                type_name: root.name.to_string(),
                path: collection.path.clone(),
            });
        };
        let Some(element) = member.ty().element() else {
            return self.soft_fail(CompileError::NotACollection { path: collection.path.clone() });
        };

        let quantifier = match collection.operator {
            CollectionOperator::HasElements => {
                return Ok(Some(FilterExpr::HasElements { member }));
            }
            CollectionOperator::Any => Quantifier::Any,
            CollectionOperator::All => Quantifier::All,
        };

        let Some(predicate) = &collection.predicate else {
            return self.soft_fail(CompileError::MissingPredicate {
                path: collection.path.clone(),
                operator: collection.operator.as_str().to_string(),
            });
        };

        let predicate = match element.object_info() {
            Some(element_info) => self.bind(element_info, predicate)?,
            None => self.soft_fail(CompileError::UnresolvedPath {
                type_name: element.name(),
                path: collection.path.clone(),
            })?,
        };

        Ok(Some(FilterExpr::Quantified {
            member,
            quantifier,
            predicate: predicate.map(Box::new),
        }))
    }

    /// Scalars coerce normally; objects and collections only compare to null.
    fn equality_literal(&self, value: Option<&str>, ty: &Type) -> Option<Literal> {
        if ty.is_scalar() {
            coerce(value, ty)
        } else if value.is_none() && ty.is_nullable() {
            Some(Literal::Null)
        } else {
            None
        }
    }

    fn invalid_literal_or_operator(&self, condition: &Condition, ty: &Type) -> BindResult {
        if ty.is_scalar() {
            self.invalid_literal(condition, ty)
        } else {
            self.unsupported(condition, ty)
        }
    }

    fn invalid_literal(&self, condition: &Condition, ty: &Type) -> BindResult {
        self.soft_fail(CompileError::InvalidLiteral {
            path: condition.path.clone(),
            value: condition.value.clone(),
            type_name: ty.name(),
        })
    }

    fn unsupported(&self, condition: &Condition, ty: &Type) -> BindResult {
        self.soft_fail(CompileError::UnsupportedOperator {
            path: condition.path.clone(),
            operator: condition.operator.as_str().to_string(),
            type_name: ty.name(),
        })
    }

    fn is_strict(&self) -> bool {
        self.options.strictness == Strictness::Strict
    }

    fn soft_fail(&self, error: CompileError) -> BindResult {
        if self.is_strict() {
            return Err(error);
        }
        debug!("dropping condition: {}", error);
        Ok(None)
    }
}
