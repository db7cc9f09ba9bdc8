//! Deferred query compiler output and the query-source seam.
//!
//! A [`QueryFilter`] is never executed by this crate's compiler. It is handed
//! to a [`QuerySource`], which translates it into whatever plan its backing
//! store understands: [`MemoryQuery`] lowers it into the in-memory evaluator
//! when iterated, `SqlQuery` renders SQL.

use crate::expr::FilterExpr;
use crate::predicate::{lower, Eval};
use crate::reflect::{Reflect, TypeInfo};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// An uncompiled, provider-translatable filter over `T`.
pub struct QueryFilter<T> {
    root: &'static TypeInfo,
    expr: Option<Arc<FilterExpr>>,
    _target: PhantomData<fn(&T) -> bool>,
}

impl<T> QueryFilter<T> {
    pub(crate) fn new(root: &'static TypeInfo, expr: Option<FilterExpr>) -> Self {
        Self { root, expr: expr.map(Arc::new), _target: PhantomData }
    }

    pub fn root(&self) -> &'static TypeInfo {
        self.root
    }

    /// `None` when the filter imposes no constraint.
    pub fn expr(&self) -> Option<&FilterExpr> {
        self.expr.as_deref()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.expr.is_none()
    }
}

impl<T> Clone for QueryFilter<T> {
    fn clone(&self) -> Self {
        Self { root: self.root, expr: self.expr.clone(), _target: PhantomData }
    }
}

impl<T> fmt::Debug for QueryFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFilter")
            .field("root", &self.root.name)
            .field("expr", &self.expr.as_ref().map(ToString::to_string))
            .finish()
    }
}

impl<T> fmt::Display for QueryFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expr {
            Some(expr) => write!(f, "{} => {}", self.root.name, expr),
            None => write!(f, "{} => true", self.root.name),
        }
    }
}

/// A source that accepts deferred filters and narrows itself.
pub trait QuerySource: Sized {
    type Item;

    fn apply(self, filter: &QueryFilter<Self::Item>) -> Self;
}

/// Query source backed by a slice. Filters accumulate and only run when the
/// query is enumerated.
pub struct MemoryQuery<'a, T> {
    items: &'a [T],
    pending: Vec<QueryFilter<T>>,
}

impl<'a, T: Reflect> MemoryQuery<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self { items, pending: Vec::new() }
    }

    /// Filters applied but not yet translated.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> + 'a {
        let predicates: Vec<Eval> = self
            .pending
            .iter()
            .filter_map(|filter| filter.expr().map(lower))
            .collect();
        self.items.iter().filter(move |item| {
            let target: &dyn Reflect = *item;
            predicates.iter().all(|predicate| predicate(target))
        })
    }

    pub fn to_vec(&self) -> Vec<&'a T> {
        self.iter().collect()
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

impl<T: Reflect> QuerySource for MemoryQuery<'_, T> {
    type Item = T;

    fn apply(mut self, filter: &QueryFilter<T>) -> Self {
        self.pending.push(filter.clone());
        self
    }
}
