//! SQL query provider that translates deferred filters into sea-query
//! statements.
//!
//! Nested object paths flatten to snake_case columns on the owning row
//! (`Owner.Name` -> `owner_name`), an object member itself to its key column
//! (`Reviewer` -> `reviewer_id`); collection members become correlated
//! `EXISTS` subqueries against their relation table.

use crate::ast::Combinator;
use crate::config::{to_snake_case, FilterConfig};
use crate::expr::{Comparison, FilterExpr, Quantifier};
use crate::query::{QueryFilter, QuerySource};
use crate::reflect::Reflect;
use crate::resolve::MemberChain;
use crate::value::{Literal, TextMatch};
use sea_query::{
    Asterisk, Expr, Func, Iden, LikeExpr, MysqlQueryBuilder, PostgresQueryBuilder, Query,
    SelectStatement, SimpleExpr, SqliteQueryBuilder, Value, Values,
};
use std::marker::PhantomData;

/// Represents a table identifier for sea-query
#[derive(Debug, Clone)]
pub enum TableName {
    Named(String),
    /// Alias of the row scope at a given subquery depth
    Scope(usize),
}

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = match self {
            TableName::Named(name) => write!(s, "{}", name),
            TableName::Scope(depth) => write!(s, "t{}", depth),
        };
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = write!(s, "{}", self.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlBackend {
    #[default]
    Postgres,
    MySql,
    Sqlite,
}

impl SqlBackend {
    pub fn render(&self, select: &SelectStatement) -> String {
        match self {
            SqlBackend::Postgres => select.to_string(PostgresQueryBuilder),
            SqlBackend::MySql => select.to_string(MysqlQueryBuilder),
            SqlBackend::Sqlite => select.to_string(SqliteQueryBuilder),
        }
    }

    pub fn build(&self, select: &SelectStatement) -> (String, Values) {
        match self {
            SqlBackend::Postgres => select.build(PostgresQueryBuilder),
            SqlBackend::MySql => select.build(MysqlQueryBuilder),
            SqlBackend::Sqlite => select.build(SqliteQueryBuilder),
        }
    }
}

/// Represents an optimization applied during translation
#[derive(Debug, Clone, PartialEq)]
pub enum Optimization {
    /// A long IN list was split into OR'ed chunks
    InListSplit {
        field: String,
        total_values: usize,
        chunk_count: usize,
    },
    /// An ordering comparison against null can never hold
    ConstantFalse { field: String },
}

/// Result of SQL compilation with optimization information
#[derive(Debug)]
pub struct CompileResult {
    pub sql: String,
    pub optimizations: Vec<Optimization>,
}

/// Translates deferred filters into SQL
#[derive(Debug, Clone, Default)]
pub struct SqlCompiler {
    config: FilterConfig,
}

impl SqlCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Start a query against the table mapped for `T`
    pub fn query<T>(&self) -> SqlQuery<'_, T> {
        SqlQuery { compiler: self, filters: Vec::new(), _target: PhantomData }
    }

    /// Compile a single filter into a complete SELECT for the given backend
    pub fn compile<T>(&self, filter: &QueryFilter<T>, backend: SqlBackend) -> CompileResult {
        let (select, optimizations) = self.select(filter.root().name, std::slice::from_ref(filter));
        CompileResult { sql: backend.render(&select), optimizations }
    }

    fn select<T>(&self, root: &str, filters: &[QueryFilter<T>]) -> (SelectStatement, Vec<Optimization>) {
        let mut optimizations = Vec::new();
        let mut select = Query::select();
        select
            .column(Asterisk)
            .from_as(TableName::Named(self.config.get_table_name(root)), TableName::Scope(0));

        for filter in filters {
            if let Some(expr) = filter.expr() {
                let condition = self.translate(expr, 0, &mut optimizations);
                select.and_where(condition);
            }
        }
        (select, optimizations)
    }

    /// Translate a bound expression evaluated against the row scope `depth`
    pub fn translate(&self, expr: &FilterExpr, depth: usize, optimizations: &mut Vec<Optimization>) -> SimpleExpr {
        match expr {
            FilterExpr::Group { combinator, children } => {
                let mut parts = children.iter().map(|child| self.translate(child, depth, optimizations));
                let first = parts.next().unwrap_or_else(|| Expr::val(true).into());
                match combinator {
                    Combinator::And => parts.fold(first, SimpleExpr::and),
                    Combinator::Or => parts.fold(first, SimpleExpr::or),
                }
            }
            FilterExpr::Compare { member, op, literal, ignore_case } => {
                self.compile_comparison(member, depth, *op, literal, *ignore_case, optimizations)
            }
            FilterExpr::Text { member, op, needle, ignore_case } => {
                let escaped = escape_like(needle);
                let pattern = match op {
                    TextMatch::Contains => format!("%{}%", escaped),
                    TextMatch::StartsWith => format!("{}%", escaped),
                    TextMatch::EndsWith => format!("%{}", escaped),
                };
                self.column_expr(member, depth, *ignore_case)
                    .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
            }
            FilterExpr::In { member, literals, ignore_case } => {
                self.compile_in(member, depth, literals, *ignore_case, optimizations)
            }
            FilterExpr::HasElements { member } => Expr::exists(self.correlated(member, depth)),
            FilterExpr::Quantified { member, quantifier, predicate } => {
                let mut subquery = self.correlated(member, depth);
                match (quantifier, predicate) {
                    (Quantifier::Any, None) => Expr::exists(subquery),
                    (Quantifier::Any, Some(predicate)) => {
                        subquery.and_where(self.translate(predicate, depth + 1, optimizations));
                        Expr::exists(subquery)
                    }
                    (Quantifier::All, None) => Expr::val(true).into(),
                    (Quantifier::All, Some(predicate)) => {
                        // All(p) == NOT EXISTS(element WHERE p IS NOT TRUE); a NULL p is a counterexample
                        let holds = self.translate(predicate, depth + 1, optimizations);
                        let fails = SimpleExpr::from(Func::coalesce([holds, Expr::val(false).into()])).not();
                        subquery.and_where(fails);
                        Expr::exists(subquery).not()
                    }
                }
            }
        }
    }

    /// Compile a comparison operation
    fn compile_comparison(
        &self,
        member: &MemberChain,
        depth: usize,
        op: Comparison,
        literal: &Literal,
        ignore_case: bool,
        optimizations: &mut Vec<Optimization>,
    ) -> SimpleExpr {
        let col = || self.column_expr(member, depth, ignore_case);

        if literal.is_null() {
            return match op {
                Comparison::Equal => col().is_null(),
                Comparison::NotEqual => col().is_not_null(),
                _ => {
                    optimizations.push(Optimization::ConstantFalse { field: self.column_name(member) });
                    Expr::val(false).into()
                }
            };
        }

        let val = literal_to_value(literal);
        match op {
            Comparison::Equal => col().eq(val),
            Comparison::NotEqual if is_nullable(member) => col().ne(val).or(col().is_null()),
            Comparison::NotEqual => col().ne(val),
            Comparison::Greater => col().gt(val),
            Comparison::GreaterOrEqual => col().gte(val),
            Comparison::Less => col().lt(val),
            Comparison::LessOrEqual => col().lte(val),
        }
    }

    fn compile_in(
        &self,
        member: &MemberChain,
        depth: usize,
        literals: &[Literal],
        ignore_case: bool,
        optimizations: &mut Vec<Optimization>,
    ) -> SimpleExpr {
        let values: Vec<Value> = literals
            .iter()
            .filter(|literal| !literal.is_null())
            .map(literal_to_value)
            .collect();
        let has_null = values.len() < literals.len();

        let chunk_size = self.config.max_in_values.max(1);
        if values.len() > chunk_size {
            optimizations.push(Optimization::InListSplit {
                field: self.column_name(member),
                total_values: values.len(),
                chunk_count: values.len().div_ceil(chunk_size),
            });
        }

        let mut parts = values
            .chunks(chunk_size)
            .map(|chunk| self.column_expr(member, depth, ignore_case).is_in(chunk.iter().cloned()));
        let mut combined = parts.next();
        for part in parts {
            combined = combined.map(|acc| acc.or(part));
        }
        if has_null {
            let null_check = self.column_expr(member, depth, false).is_null();
            combined = Some(match combined {
                Some(acc) => acc.or(null_check),
                None => null_check,
            });
        }
        combined.unwrap_or_else(|| Expr::val(false).into())
    }

    /// `SELECT 1 FROM <relation> AS t{depth+1} WHERE t{depth+1}.fk = t{depth}.pk`
    fn correlated(&self, member: &MemberChain, depth: usize) -> SelectStatement {
        let relation = self.config.get_relation(member.root().name, &member.path());
        let inner = TableName::Scope(depth + 1);
        let mut subquery = Query::select();
        subquery
            .expr(Expr::val(1))
            .from_as(TableName::Named(relation.table), inner.clone())
            .and_where(
                Expr::col((inner, ColumnName(relation.foreign_key)))
                    .equals((TableName::Scope(depth), ColumnName(relation.parent_key))),
            );
        subquery
    }

    /// Column for a member chain, flattened through owned objects.
    ///
    /// A chain ending at an object maps to that object's key column, so only
    /// null checks on it are meaningful.
    fn column_name(&self, member: &MemberChain) -> String {
        if member.ty().is_scalar() {
            flattened(member)
        } else {
            self.config.get_object_key(member.root().name, &member.path())
        }
    }

    fn column_expr(&self, member: &MemberChain, depth: usize, lower: bool) -> Expr {
        let col = Expr::col((TableName::Scope(depth), ColumnName(self.column_name(member))));
        if lower {
            Expr::expr(Func::lower(col))
        } else {
            col
        }
    }
}

fn flattened(member: &MemberChain) -> String {
    member
        .steps()
        .iter()
        .map(|step| to_snake_case(step.name))
        .collect::<Vec<_>>()
        .join("_")
}

/// Any nullable step makes the flattened column nullable
fn is_nullable(member: &MemberChain) -> bool {
    member.steps().iter().any(|step| step.ty.is_nullable())
}

const LIKE_ESCAPE: char = '!';

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Convert a coerced literal to sea-query Value
fn literal_to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::String(None),
        Literal::Bool(b) => Value::Bool(Some(*b)),
        Literal::Int(n) => Value::BigInt(Some(*n)),
        Literal::Float(f) => Value::Double(Some(*f)),
        Literal::Decimal(d) => (*d).into(),
        Literal::Uuid(u) => (*u).into(),
        Literal::DateTime(dt) => (*dt).into(),
        Literal::DateTimeOffset(dt) => (*dt).into(),
        Literal::Str(s) => Value::String(Some(Box::new(s.clone()))),
        Literal::Enum { info, ordinal } => {
            Value::String(info.variant(*ordinal).map(|name| Box::new(name.to_string())))
        }
    }
}

/// Deferred SQL source: filters accumulate and are rendered on demand
pub struct SqlQuery<'c, T> {
    compiler: &'c SqlCompiler,
    filters: Vec<QueryFilter<T>>,
    _target: PhantomData<fn(&T)>,
}

impl<T: Reflect> SqlQuery<'_, T> {
    pub fn to_sql(&self, backend: SqlBackend) -> CompileResult {
        let (select, optimizations) = self.compiler.select(T::type_info().name, &self.filters);
        CompileResult { sql: backend.render(&select), optimizations }
    }

    /// Parameterized form for drivers that bind values separately
    pub fn build(&self, backend: SqlBackend) -> (String, Values) {
        let (select, _) = self.compiler.select(T::type_info().name, &self.filters);
        backend.build(&select)
    }
}

impl<T> QuerySource for SqlQuery<'_, T> {
    type Item = T;

    fn apply(mut self, filter: &QueryFilter<T>) -> Self {
        self.filters.push(filter.clone());
        self
    }
}
