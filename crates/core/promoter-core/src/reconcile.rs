//! Set-difference reconciliation and name resolution
//!
//! [`diff`] is pure and total. Resolution runs before it and follows a
//! resolve-all-or-abort policy: one unknown name stops the run, and the error
//! lists every unknown name, not just the first.

use crate::error::{PromotionError, ResourceKind, Result};
use crate::types::{ArtifactSummary, FunctionSummary, ResourceIdentifier};
use std::collections::{BTreeMap, BTreeSet};

/// Changes needed to move observed state to desired state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<T: Ord> {
    /// desired − observed
    pub to_create: BTreeSet<T>,
    /// observed − desired
    pub to_remove: BTreeSet<T>,
}

impl<T: Ord> Diff<T> {
    /// Nothing to create and nothing to remove
    pub fn is_converged(&self) -> bool {
        self.to_create.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the create/remove sets. Identifiers are compared exactly.
pub fn diff<T: Ord + Clone>(desired: &BTreeSet<T>, observed: &BTreeSet<T>) -> Diff<T> {
    Diff {
        to_create: desired.difference(observed).cloned().collect(),
        to_remove: observed.difference(desired).cloned().collect(),
    }
}

/// Resolve requested function names (or ARNs) to ARNs.
///
/// A request matches an inventory entry when it equals the entry's name or
/// its ARN. Fails with every unresolved request if any is missing.
pub fn resolve_functions(
    requested: &BTreeSet<String>,
    inventory: &[FunctionSummary],
) -> Result<BTreeMap<String, ResourceIdentifier>> {
    let mut by_key: BTreeMap<&str, &str> = BTreeMap::new();
    for function in inventory {
        by_key.entry(function.name.as_str()).or_insert(function.arn.as_str());
        by_key.entry(function.arn.as_str()).or_insert(function.arn.as_str());
    }

    let mut resolved = BTreeMap::new();
    let mut missing = Vec::new();

    for name in requested {
        match by_key.get(name.as_str()) {
            Some(arn) => {
                resolved.insert(name.clone(), arn.to_string());
            }
            None => missing.push(name.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(PromotionError::not_found(ResourceKind::Function, missing));
    }

    Ok(resolved)
}

/// Pick the summaries for the requested artifact names.
///
/// Missing names are fatal, same as function resolution. When a name occurs
/// more than once in the listing the first occurrence wins.
pub fn select_artifacts(
    kind: ResourceKind,
    requested: &BTreeSet<String>,
    summaries: &[ArtifactSummary],
) -> Result<Vec<ArtifactSummary>> {
    let mut by_name: BTreeMap<&str, &ArtifactSummary> = BTreeMap::new();
    for summary in summaries {
        by_name.entry(summary.name.as_str()).or_insert(summary);
    }

    let missing: Vec<&String> = requested
        .iter()
        .filter(|name| !by_name.contains_key(name.as_str()))
        .collect();

    if !missing.is_empty() {
        return Err(PromotionError::not_found(kind, missing.into_iter().cloned()));
    }

    Ok(requested
        .iter()
        .filter_map(|name| by_name.get(name.as_str()).map(|s| (*s).clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn subsets(universe: &[&str]) -> Vec<BTreeSet<String>> {
        (0..1u32 << universe.len())
            .map(|mask| {
                universe
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, s)| s.to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_diff_matches_set_difference_for_all_small_sets() {
        let universe = ["a", "b", "c", "d"];
        for desired in subsets(&universe) {
            for observed in subsets(&universe) {
                let result = diff(&desired, &observed);
                for item in &result.to_create {
                    assert!(desired.contains(item) && !observed.contains(item));
                }
                for item in &result.to_remove {
                    assert!(observed.contains(item) && !desired.contains(item));
                }
                let expected_create = desired.iter().filter(|d| !observed.contains(*d)).count();
                let expected_remove = observed.iter().filter(|o| !desired.contains(*o)).count();
                assert_eq!(result.to_create.len(), expected_create);
                assert_eq!(result.to_remove.len(), expected_remove);
            }
        }
    }

    #[test]
    fn test_diff_with_itself_is_converged() {
        for desired in subsets(&["a", "b", "c"]) {
            let result = diff(&desired, &desired);
            assert!(result.to_create.is_empty());
            assert!(result.to_remove.is_empty());
            assert!(result.is_converged());
        }
    }

    #[test]
    fn test_diff_observed_superset_creates_nothing() {
        let result = diff(&set(&["a", "b"]), &set(&["a", "b", "z"]));
        assert!(result.to_create.is_empty());
        assert_eq!(result.to_remove, set(&["z"]));
    }

    #[test]
    fn test_diff_is_case_sensitive() {
        let result = diff(&set(&["Fn"]), &set(&["fn"]));
        assert_eq!(result.to_create, set(&["Fn"]));
        assert_eq!(result.to_remove, set(&["fn"]));
    }

    #[test]
    fn test_resolve_reports_every_missing_name() {
        let inventory = vec![
            FunctionSummary::new("a", "arn:fn:a"),
            FunctionSummary::new("c", "arn:fn:c"),
        ];

        let err = resolve_functions(&set(&["a", "b", "c"]), &inventory).unwrap_err();
        match err {
            PromotionError::ResourceNotFound { kind, names } => {
                assert_eq!(kind, ResourceKind::Function);
                assert_eq!(names, vec!["b".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = resolve_functions(&set(&["x", "a", "y"]), &inventory).unwrap_err();
        assert!(matches!(
            err,
            PromotionError::ResourceNotFound { ref names, .. } if names == &["x", "y"]
        ));
    }

    #[test]
    fn test_resolve_accepts_names_and_arns() {
        let inventory = vec![
            FunctionSummary::new("a", "arn:fn:a"),
            FunctionSummary::new("b", "arn:fn:b"),
        ];

        let resolved = resolve_functions(&set(&["a", "arn:fn:b"]), &inventory).unwrap();
        assert_eq!(resolved["a"], "arn:fn:a");
        assert_eq!(resolved["arn:fn:b"], "arn:fn:b");
    }

    #[test]
    fn test_resolve_does_not_normalize() {
        let inventory = vec![FunctionSummary::new("Handler", "arn:fn:Handler")];
        assert!(resolve_functions(&set(&["handler"]), &inventory).is_err());
        assert!(resolve_functions(&set(&[" Handler"]), &inventory).is_err());
    }

    #[test]
    fn test_select_artifacts_first_match_wins() {
        let summaries = vec![
            ArtifactSummary::new("f1", "_test"),
            ArtifactSummary::new("f2", "_other"),
            ArtifactSummary::new("f3", "_test"),
        ];

        let selected =
            select_artifacts(ResourceKind::ContactFlow, &set(&["_test"]), &summaries).unwrap();
        assert_eq!(selected, vec![ArtifactSummary::new("f1", "_test")]);
    }

    #[test]
    fn test_select_artifacts_missing_is_fatal() {
        let summaries = vec![ArtifactSummary::new("p1", "Basic")];
        let err = select_artifacts(
            ResourceKind::RoutingProfile,
            &set(&["Basic", "Sales", "Support"]),
            &summaries,
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "routing profile not found: Sales, Support");
    }
}
