//! Filter Dispatcher: 可序列化的过滤条件树, 以及把它编译为内存谓词、延迟查询和 SQL 的编译器。
//!
//! 数据流: JSON -> [`schema::validate`] -> [`wire::from_json`] -> [`compiler`] ->
//! [`predicate::Predicate`] 或 [`query::QueryFilter`] (再交给 [`query::MemoryQuery`] /
//! [`sql_compiler::SqlQuery`])。

pub mod ast;
pub mod bind;
pub mod coerce;
pub mod compiler;
pub mod config;
pub mod error;
pub mod expr;
pub mod predicate;
pub mod query;
pub mod reflect;
pub mod resolve;
pub mod schema;
pub mod sql_compiler;
pub mod value;
pub mod wire;

#[cfg(test)]
mod testing;

pub use ast::{CollectionOperator, Combinator, FilterNode, Operator};
pub use bind::{CompileOptions, Strictness};
pub use compiler::{compile, compile_query, FilterCompiler};
pub use config::FilterConfig;
pub use error::{AstError, CompileError, ConfigError, ValidationError, ValidationIssue};
pub use predicate::Predicate;
pub use query::{MemoryQuery, QueryFilter, QuerySource};
pub use reflect::{Reflect, Type, TypeInfo};
pub use sql_compiler::{SqlBackend, SqlCompiler, SqlQuery};
