//! In-memory predicate compiler: lowers a bound [`FilterExpr`] into a tree of
//! closures that can be invoked directly on candidate objects.

use crate::ast::Combinator;
use crate::expr::{Comparison, FilterExpr, Quantifier};
use crate::reflect::Reflect;
use crate::value::{compare, equals, text_matches, Literal, Value};
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub(crate) type Eval = Arc<dyn Fn(&dyn Reflect) -> bool + Send + Sync>;

/// Compiled boolean predicate over `T`.
///
/// Pure and cheap to clone; one predicate may serve any number of threads.
pub struct Predicate<T> {
    eval: Option<Eval>,
    _target: PhantomData<fn(&T) -> bool>,
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self { eval: self.eval.clone(), _target: PhantomData }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("unconstrained", &self.eval.is_none())
            .finish()
    }
}

impl<T: Reflect> Predicate<T> {
    /// The predicate that accepts everything.
    pub fn always() -> Self {
        Self { eval: None, _target: PhantomData }
    }

    pub(crate) fn from_expr(expr: Option<&FilterExpr>) -> Self {
        Self { eval: expr.map(lower), _target: PhantomData }
    }

    pub fn matches(&self, item: &T) -> bool {
        match &self.eval {
            Some(eval) => {
                let target: &dyn Reflect = item;
                eval(target)
            }
            None => true,
        }
    }

    /// True when every condition was dropped or the tree was empty.
    pub fn is_unconstrained(&self) -> bool {
        self.eval.is_none()
    }

    /// Lazily filters a borrowed sequence, preserving order.
    pub fn filter<'p, 'a: 'p, I>(&'p self, items: I) -> impl Iterator<Item = &'a T> + 'p
    where
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: 'p,
        T: 'a,
    {
        items.into_iter().filter(move |item| self.matches(item))
    }
}

pub(crate) fn lower(expr: &FilterExpr) -> Eval {
    match expr {
        FilterExpr::Group { combinator, children } => {
            let children: Vec<Eval> = children.iter().map(lower).collect();
            match combinator {
                Combinator::And => Arc::new(move |item: &dyn Reflect| children.iter().all(|c| c(item))),
                Combinator::Or => Arc::new(move |item: &dyn Reflect| children.iter().any(|c| c(item))),
            }
        }
        FilterExpr::Compare { member, op, literal, ignore_case } => {
            let (member, op, literal, ignore_case) = (member.clone(), *op, literal.clone(), *ignore_case);
            Arc::new(move |item: &dyn Reflect| {
                evaluate_comparison(&member.read(item), op, &literal, ignore_case)
            })
        }
        FilterExpr::Text { member, op, needle, ignore_case } => {
            let (member, op, needle, ignore_case) = (member.clone(), *op, needle.clone(), *ignore_case);
            Arc::new(move |item: &dyn Reflect| text_matches(&member.read(item), op, &needle, ignore_case))
        }
        FilterExpr::In { member, literals, ignore_case } => {
            let (member, literals, ignore_case) = (member.clone(), literals.clone(), *ignore_case);
            Arc::new(move |item: &dyn Reflect| {
                let value = member.read(item);
                literals.iter().any(|literal| equals(&value, literal, ignore_case))
            })
        }
        FilterExpr::HasElements { member } => {
            let member = member.clone();
            Arc::new(move |item: &dyn Reflect| {
                matches!(member.read(item), Value::List(elements) if !elements.is_empty())
            })
        }
        FilterExpr::Quantified { member, quantifier, predicate } => {
            let (member, quantifier) = (member.clone(), *quantifier);
            let predicate = predicate.as_deref().map(lower);
            Arc::new(move |item: &dyn Reflect| {
                // 空集合 (包括 null) 时 Any 为 false, All 为 true
                let elements = match member.read(item) {
                    Value::List(elements) => elements,
                    _ => Vec::new(),
                };
                let holds = |element: &Value<'_>| match (&predicate, element) {
                    (None, _) => true,
                    (Some(predicate), Value::Object(object)) => predicate(*object),
                    (Some(_), _) => false,
                };
                match quantifier {
                    Quantifier::Any => elements.iter().any(holds),
                    Quantifier::All => elements.iter().all(holds),
                }
            })
        }
    }
}

fn evaluate_comparison(value: &Value<'_>, op: Comparison, literal: &Literal, ignore_case: bool) -> bool {
    match op {
        Comparison::Equal => equals(value, literal, ignore_case),
        Comparison::NotEqual => !equals(value, literal, ignore_case),
        Comparison::Greater => compare(value, literal) == Some(Ordering::Greater),
        Comparison::GreaterOrEqual => {
            matches!(compare(value, literal), Some(Ordering::Greater | Ordering::Equal))
        }
        Comparison::Less => compare(value, literal) == Some(Ordering::Less),
        Comparison::LessOrEqual => {
            matches!(compare(value, literal), Some(Ordering::Less | Ordering::Equal))
        }
    }
}
