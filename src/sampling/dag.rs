//! Topological ordering of attributes by their table dependencies.

use ahash::AHashSet;

use crate::distribution::DistributionStore;
use crate::error::{StockError, StockResult};

/// Order `attrs` so that every attribute follows its dependencies.
///
/// An attribute is eligible once each of its dependencies is either in `preassigned`
/// or already ordered. Each pass scans the remaining attributes in input order and
/// places every eligible one immediately, so ties resolve by input order.
pub fn resolve<'a, S: AsRef<str>>(
    attrs: &[S],
    preassigned: &[S],
    deps_of: impl Fn(&str) -> StockResult<&'a [String]>,
) -> StockResult<Vec<String>> {
    let mut available = preassigned.iter().map(|s| s.as_ref()).collect::<AHashSet<_>>();
    let mut remaining = attrs.iter().map(|s| s.as_ref()).collect::<Vec<_>>();
    let mut ordered = Vec::with_capacity(remaining.len());

    for _ in 0..=attrs.len() {
        if remaining.is_empty() { break }
        let mut next = Vec::with_capacity(remaining.len());
        for attr in remaining {
            if deps_of(attr)?.iter().all(|dep| available.contains(dep.as_str())) {
                available.insert(attr);
                ordered.push(attr.to_string());
            } else {
                next.push(attr);
            }
        }
        remaining = next;
    }

    if !remaining.is_empty() {
        return Err(StockError::UnresolvableDependencies {
            remaining: remaining.into_iter().map(str::to_string).collect(),
        });
    }
    Ok(ordered)
}

/// [`resolve`] against the dependency columns of a store's tables.
pub fn resolve_in<S: AsRef<str>>(
    store: &DistributionStore,
    attrs: &[S],
    preassigned: &[S],
) -> StockResult<Vec<String>> {
    resolve(attrs, preassigned, |name| store.dependencies(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;

    fn graph(edges: &[(&str, &[&str])]) -> AHashMap<String, Vec<String>> {
        edges.iter()
            .map(|(a, deps)| (a.to_string(), deps.iter().map(|d| d.to_string()).collect()))
            .collect()
    }

    fn run(g: &AHashMap<String, Vec<String>>, attrs: &[&str], pre: &[&str]) -> StockResult<Vec<String>> {
        resolve(attrs, pre, |name| {
            g.get(name).map(Vec::as_slice).ok_or_else(|| StockError::UnresolvableDependencies {
                remaining: vec![name.to_string()],
            })
        })
    }

    #[test]
    fn chain_orders_dependencies_first() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);
        assert_eq!(run(&g, &["c", "b", "a"], &[]).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(run(&g, &["a", "b", "c"], &[]).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn preassigned_attributes_count_as_available() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);
        assert_eq!(run(&g, &["a", "c"], &["b"]).unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn independent_attributes_keep_input_order() {
        let g = graph(&[("x", &[]), ("y", &[]), ("z", &[])]);
        assert_eq!(run(&g, &["z", "x", "y"], &[]).unwrap(), vec!["z", "x", "y"]);
    }

    #[test]
    fn cycle_is_unresolvable() {
        let g = graph(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);
        match run(&g, &["a", "b", "c"], &[]) {
            Err(StockError::UnresolvableDependencies { remaining }) => assert_eq!(remaining, vec!["a", "b"]),
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_dependency_is_unresolvable() {
        let g = graph(&[("a", &["ghost"])]);
        assert!(matches!(run(&g, &["a"], &[]), Err(StockError::UnresolvableDependencies { .. })));
    }
}
