use crate::domain::BuildResult;
use crate::registry::BranchRegistry;
use std::collections::BTreeMap;
use tracing::warn;

/// Final build result given the state of every tracked branch
///
/// A build better than unstable is downgraded to unstable while any
/// tracked branch is unstable or worse. Results are never upgraded.
pub fn escalate(result: BuildResult, registry: &BranchRegistry) -> BuildResult {
    if !result.is_better_than(BuildResult::Unstable) {
        return result;
    }

    let broken = registry.broken_branches();
    if broken.is_empty() {
        return result;
    }

    let mut by_result: BTreeMap<BuildResult, Vec<String>> = BTreeMap::new();
    for record in broken {
        by_result
            .entry(record.last_build_result)
            .or_default()
            .push(record.display_name());
    }
    for (branch_result, branches) in &by_result {
        warn!(
            result = %branch_result,
            branches = %branches.join(", "),
            "tracked branches are broken"
        );
    }
    warn!(from = %result, to = %BuildResult::Unstable, "build result downgraded");
    BuildResult::Unstable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(results: &[(&str, BuildResult)]) -> BranchRegistry {
        let mut registry = BranchRegistry::new();
        for (name, result) in results {
            let record = registry.get_or_add("origin", name).with_result(*result);
            registry.put(record);
        }
        registry
    }

    #[test]
    fn test_success_downgraded_by_unstable_branch() {
        let registry = registry(&[
            ("develop", BuildResult::Success),
            ("release/2.3", BuildResult::Unstable),
        ]);
        assert_eq!(
            escalate(BuildResult::Success, &registry),
            BuildResult::Unstable
        );
    }

    #[test]
    fn test_clean_registry_keeps_result() {
        let registry = registry(&[("develop", BuildResult::Success)]);
        assert_eq!(
            escalate(BuildResult::Success, &registry),
            BuildResult::Success
        );
        assert_eq!(
            escalate(BuildResult::Success, &BranchRegistry::new()),
            BuildResult::Success
        );
    }

    #[test]
    fn test_never_upgrades() {
        let registry = registry(&[("release/2.3", BuildResult::Unstable)]);
        assert_eq!(
            escalate(BuildResult::Failure, &registry),
            BuildResult::Failure
        );
        assert_eq!(
            escalate(BuildResult::Aborted, &registry),
            BuildResult::Aborted
        );
        assert_eq!(
            escalate(BuildResult::Unstable, &registry),
            BuildResult::Unstable
        );
    }
}
