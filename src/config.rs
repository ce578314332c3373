/// Config for a [`crate::DefinitionRegistry`]
/// ## Fields
/// - `cache_contextual`:
///   If `true`, results of contextual resolution (including misses) are memoized per consumer and dependency.
///
///   The memo is cleared on every `add` and `add_contextual` call, so it never serves a stale rule.
/// - `cache_hierarchy`:
///   If `true`, ancestor and interface lists are requested from the type hierarchy once per type.
///
///   Hierarchy facts are static, so this memo is never invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub cache_contextual: bool,
    pub cache_hierarchy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_contextual: true,
            cache_hierarchy: true,
        }
    }
}

/// Config for dependency graph analysis
/// ## Fields
/// - `max_tree_depth`: depth bound for [`crate::DependencyGraph::dependency_tree`] when no explicit depth is given.
/// - `max_dependencies_per_service`: services with more outgoing constructor edges are reported as excessive.
/// - `most_depended_limit`: length of the most depended ranking in a [`crate::HealthReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub max_tree_depth: usize,
    pub max_dependencies_per_service: usize,
    pub most_depended_limit: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_tree_depth: 5,
            max_dependencies_per_service: 8,
            most_depended_limit: 10,
        }
    }
}

/// Config for a [`crate::DiscoveryQueryEngine`]
/// ## Fields
/// - `recommendation_limit`: cap for every list in [`crate::Recommendations`].
/// - `common_dependency_threshold`: minimum number of shared dependencies for a "common dependencies" recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub recommendation_limit: usize,
    pub common_dependency_threshold: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            recommendation_limit: 5,
            common_dependency_threshold: 2,
        }
    }
}
