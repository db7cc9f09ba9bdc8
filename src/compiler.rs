//! Compiler entry points shared by the in-memory and the deferred back-ends.

use crate::ast::FilterNode;
use crate::bind::{Binder, CompileOptions};
use crate::error::CompileError;
use crate::expr::FilterExpr;
use crate::predicate::Predicate;
use crate::query::QueryFilter;
use crate::reflect::{Reflect, TypeInfo};
use crate::resolve::MemberResolver;
use log::debug;
use std::sync::LazyLock;

static DEFAULT_COMPILER: LazyLock<FilterCompiler> = LazyLock::new(FilterCompiler::new);

/// Compiles filter trees against target types.
///
/// Compilation is a pure function of `(tree, type)`; the only state is the
/// resolver cache, which makes repeated compiles of the same paths cheaper.
#[derive(Debug, Default)]
pub struct FilterCompiler {
    resolver: MemberResolver,
    options: CompileOptions,
}

impl FilterCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self { resolver: MemberResolver::new(), options }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    pub fn resolver(&self) -> &MemberResolver {
        &self.resolver
    }

    /// Resolves, coerces and validates without choosing a back-end.
    pub fn bind(&self, root: &'static TypeInfo, node: &FilterNode) -> Result<Option<FilterExpr>, CompileError> {
        Binder::new(&self.resolver, self.options).bind(root, node)
    }

    /// In-memory compile: a predicate invocable on `&T`.
    pub fn compile<T: Reflect>(&self, node: &FilterNode) -> Result<Predicate<T>, CompileError> {
        let bound = self.bind(T::type_info(), node)?;
        Ok(Predicate::from_expr(bound.as_ref()))
    }

    /// Deferred compile: a description left for a query source to translate.
    pub fn compile_query<T: Reflect>(&self, node: &FilterNode) -> Result<QueryFilter<T>, CompileError> {
        let bound = self.bind(T::type_info(), node)?;
        Ok(QueryFilter::new(T::type_info(), bound))
    }
}

/// Lenient in-memory compile with the shared default compiler.
pub fn compile<T: Reflect>(node: &FilterNode) -> Predicate<T> {
    match DEFAULT_COMPILER.compile(node) {
        Ok(predicate) => predicate,
        Err(error) => {
            debug!("lenient compile failed unexpectedly: {}", error);
            Predicate::always()
        }
    }
}

/// Lenient deferred compile with the shared default compiler.
pub fn compile_query<T: Reflect>(node: &FilterNode) -> QueryFilter<T> {
    match DEFAULT_COMPILER.compile_query(node) {
        Ok(filter) => filter,
        Err(error) => {
            debug!("lenient compile failed unexpectedly: {}", error);
            QueryFilter::new(T::type_info(), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operator;
    use crate::bind::Strictness;
    use crate::testing::Ticket;

    #[test]
    fn test_strict_compiler_rejects_unknown_paths() {
        let compiler = FilterCompiler::with_options(CompileOptions { strictness: Strictness::Strict });
        let node = FilterNode::condition("Nope", Operator::Equals, Some("x"));
        assert!(compiler.compile::<Ticket>(&node).is_err());
        assert!(compiler.compile_query::<Ticket>(&node).is_err());

        let lenient = FilterCompiler::new();
        assert!(lenient.compile::<Ticket>(&node).unwrap().is_unconstrained());
    }

    #[test]
    fn test_compilers_share_resolution_cache() {
        let compiler = FilterCompiler::new();
        let node = FilterNode::condition("Owner.Name", Operator::Equals, Some("alice"));
        compiler.compile::<Ticket>(&node).unwrap();
        compiler.compile_query::<Ticket>(&node).unwrap();
        assert_eq!(compiler.resolver().cached_entries(), 1);
    }

    #[test]
    fn test_unknown_paths_do_not_grow_the_cache() {
        let compiler = FilterCompiler::new();
        for i in 0..10_000 {
            let node = FilterNode::condition(format!("Field{}", i), Operator::Equals, Some("x"));
            assert!(compiler.compile::<Ticket>(&node).unwrap().is_unconstrained());
        }
        assert_eq!(compiler.resolver().cached_entries(), 0);
    }
}
