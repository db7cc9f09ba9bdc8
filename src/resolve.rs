//! Member Resolver: dotted path to a chain of member accessors.

use crate::reflect::{MemberInfo, MemberKind, Reflect, Type, TypeInfo};
use crate::value::Value;
use dashmap::DashMap;
use log::trace;
use std::sync::Arc;

/// Resolved accessor chain for one `(type, path)` pair.
#[derive(Debug, Clone)]
pub struct MemberChain {
    root: &'static TypeInfo,
    steps: Vec<&'static MemberInfo>,
}

impl MemberChain {
    pub fn root(&self) -> &'static TypeInfo {
        self.root
    }

    pub fn steps(&self) -> &[&'static MemberInfo] {
        &self.steps
    }

    /// Type of the last member in the chain.
    pub fn ty(&self) -> &'static Type {
        // chains are never empty, see `resolve_uncached`
        &self.steps[self.steps.len() - 1].ty
    }

    /// Canonical dotted path, using declared member names.
    pub fn path(&self) -> String {
        self.steps.iter().map(|m| m.name).collect::<Vec<_>>().join(".")
    }

    /// Reads the leaf value; a null intermediate object yields `Value::Null`.
    pub fn read<'a>(&self, target: &'a dyn Reflect) -> Value<'a> {
        let mut current = Value::Object(target);
        for step in &self.steps {
            current = match current {
                Value::Object(object) => object.member(step.index),
                _ => return Value::Null,
            };
        }
        current
    }
}

/// Upper bound on memoized chains per resolver.
pub const DEFAULT_CACHE_LIMIT: usize = 1024;

/// Memoizing resolver, safe to share between threads.
///
/// Only successful resolutions are memoized, and at most `limit` of them;
/// paths beyond the limit are still resolved, just not remembered.
#[derive(Debug)]
pub struct MemberResolver {
    cache: DashMap<(usize, String), Arc<MemberChain>>,
    limit: usize,
}

impl Default for MemberResolver {
    fn default() -> Self {
        Self::with_limit(DEFAULT_CACHE_LIMIT)
    }
}

impl MemberResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self { cache: DashMap::new(), limit }
    }

    /// Resolves `path` against `root`; `None` if any segment is unknown.
    pub fn resolve(&self, root: &'static TypeInfo, path: &str) -> Option<Arc<MemberChain>> {
        let key = (root as *const TypeInfo as usize, path.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit.value().clone());
        }
        trace!("resolving {}.{}", root.name, path);
        let resolved = Arc::new(resolve_uncached(root, path)?);
        if self.cache.len() < self.limit {
            self.cache.insert(key, resolved.clone());
        }
        Some(resolved)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

fn resolve_uncached(root: &'static TypeInfo, path: &str) -> Option<MemberChain> {
    if path.is_empty() {
        return None;
    }
    let mut steps = Vec::new();
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let member = find_member(current, segment)?;
        steps.push(member);
        if segments.peek().is_some() {
            // only objects can be traversed; collections end the path
            current = member.ty.object_info()?;
        }
    }
    Some(MemberChain { root, steps })
}

/// Properties before fields, exact case before case-insensitive.
fn find_member(info: &'static TypeInfo, segment: &str) -> Option<&'static MemberInfo> {
    if segment.is_empty() {
        return None;
    }
    [MemberKind::Property, MemberKind::Field]
        .into_iter()
        .find_map(|kind| {
            info.public_members(kind)
                .find(|m| m.name == segment)
                .or_else(|| info.public_members(kind).find(|m| same_name(m.name, segment)))
        })
}

fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}
