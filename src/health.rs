use core::fmt::{self, Display, Formatter};
use std::collections::BTreeSet;
use tracing::{debug, info_span};

use crate::{
    config::AnalyzerConfig,
    dependency::DependencyKind,
    graph::{DependencyGraph, GraphStats},
    lifetime::Lifetime,
    registry::DefinitionRegistry,
};

/// Number of medium issues tolerated before the score drops to [`HealthScore::Warning`]
const MEDIUM_ISSUES_TOLERANCE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueKind {
    CircularDependency,
    /// Longer-lived service depends on a shorter-lived one
    LifetimeMismatch,
    MissingDependency,
    ExcessiveDependencies,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub services: Vec<String>,
    pub message: String,
}

impl Issue {
    #[inline]
    #[must_use]
    pub fn new(kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            services: Vec::new(),
            message: message.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_services<I, T>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.services.extend(services.into_iter().map(Into::into));
        self
    }
}

/// Coarse verdict over a list of issues, worst first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthScore {
    Critical,
    Warning,
    Attention,
    Healthy,
}

impl HealthScore {
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            HealthScore::Critical => "critical",
            HealthScore::Warning => "warning",
            HealthScore::Attention => "attention",
            HealthScore::Healthy => "healthy",
        }
    }
}

impl Display for HealthScore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Adding an issue never improves the score
#[must_use]
pub fn health_score(issues: &[Issue]) -> HealthScore {
    let medium = issues.iter().filter(|issue| issue.severity == Severity::Medium).count();

    if issues.iter().any(|issue| issue.severity == Severity::High) {
        HealthScore::Critical
    } else if medium > MEDIUM_ISSUES_TOLERANCE {
        HealthScore::Warning
    } else if issues.is_empty() {
        HealthScore::Healthy
    } else {
        HealthScore::Attention
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub score: HealthScore,
    pub issues: Vec<Issue>,
    /// Registered services nothing depends on. Roots look the same, so these aren't issues
    pub orphans: BTreeSet<String>,
    pub most_depended: Vec<(String, usize)>,
    pub stats: GraphStats,
}

impl HealthReport {
    #[must_use]
    pub fn analyze(registry: &DefinitionRegistry, graph: &DependencyGraph, config: &AnalyzerConfig) -> Self {
        let span = info_span!("analyze", services = registry.len(), edges = graph.edge_count());
        let _guard = span.enter();

        let mut issues = Vec::new();

        for cycle in graph.detect_cycles() {
            let message = format!("Circular dependency: {}", cycle.join(" -> "));
            issues.push(Issue::new(IssueKind::CircularDependency, Severity::High, message).with_services(cycle));
        }

        for (dependent, edges) in graph.adjacency() {
            let dependent_lifetime = registry.get(dependent).map(|record| record.lifetime());

            for edge in edges {
                match registry.get(&edge.dependency) {
                    Some(dependency) => {
                        if dependent_lifetime == Some(Lifetime::Singleton) && dependency.lifetime() == Lifetime::Scoped {
                            let message = format!("Singleton `{dependent}` depends on scoped `{}`", edge.dependency);
                            issues.push(
                                Issue::new(IssueKind::LifetimeMismatch, Severity::High, message)
                                    .with_services([dependent.as_str(), edge.dependency.as_str()]),
                            );
                        }
                    }
                    None if !edge.optional => {
                        let message = format!("`{dependent}` depends on unregistered `{}`", edge.dependency);
                        issues.push(
                            Issue::new(IssueKind::MissingDependency, Severity::Medium, message)
                                .with_services([dependent.as_str(), edge.dependency.as_str()]),
                        );
                    }
                    None => {}
                }
            }

            let constructor_edges = edges.iter().filter(|edge| edge.kind == DependencyKind::Constructor).count();
            if constructor_edges > config.max_dependencies_per_service {
                let message = format!(
                    "`{dependent}` has {constructor_edges} constructor dependencies, more than {}",
                    config.max_dependencies_per_service
                );
                issues.push(Issue::new(IssueKind::ExcessiveDependencies, Severity::Medium, message).with_services([dependent.as_str()]));
            }
        }

        let score = health_score(&issues);
        debug!(issues = issues.len(), %score, "Health analyzed");

        Self {
            score,
            issues,
            orphans: graph.orphaned_services(registry.identifiers()),
            most_depended: graph.most_depended(config.most_depended_limit),
            stats: graph.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{health_score, HealthReport, HealthScore, Issue, IssueKind, Severity};
    use crate::{
        config::AnalyzerConfig,
        definition::DefinitionRecord,
        dependency::{DependencyKind, DependencyRecord},
        graph::DependencyGraph,
        lifetime::Lifetime,
        registry::DefinitionRegistry,
    };

    use tracing_test::traced_test;

    fn issue(severity: Severity) -> Issue {
        Issue::new(IssueKind::MissingDependency, severity, "issue")
    }

    fn registry_of(services: &[(&str, Lifetime)]) -> DefinitionRegistry {
        let mut registry = DefinitionRegistry::new();
        for (id, lifetime) in services {
            registry.add(DefinitionRecord::new(*id).unwrap().with_lifetime(*lifetime));
        }
        registry
    }

    fn graph_of(edges: &[(&str, &str, DependencyKind, bool)]) -> DependencyGraph {
        let records: Vec<_> = edges
            .iter()
            .map(|(dependent, dependency, kind, optional)| {
                DependencyRecord::new(*dependent, *dependency, *kind)
                    .unwrap()
                    .with_optional(*optional)
            })
            .collect();
        DependencyGraph::build(&records)
    }

    #[test]
    #[traced_test]
    fn test_health_score_thresholds() {
        assert_eq!(health_score(&[]), HealthScore::Healthy);
        assert_eq!(health_score(&[issue(Severity::Low)]), HealthScore::Attention);
        assert_eq!(health_score(&[issue(Severity::Medium), issue(Severity::Medium)]), HealthScore::Attention);
        assert_eq!(
            health_score(&[issue(Severity::Medium), issue(Severity::Medium), issue(Severity::Medium)]),
            HealthScore::Warning
        );
        assert_eq!(health_score(&[issue(Severity::Low), issue(Severity::High)]), HealthScore::Critical);
    }

    #[test]
    #[traced_test]
    fn test_health_score_monotonic() {
        let severities = [Severity::Low, Severity::Medium, Severity::Medium, Severity::High, Severity::Low];
        let mut issues = Vec::new();
        let mut previous = health_score(&issues);

        for severity in severities {
            issues.push(issue(severity));
            let current = health_score(&issues);
            assert!(current <= previous, "{current} is better than {previous}");
            previous = current;
        }
        assert_eq!(previous, HealthScore::Critical);
    }

    #[test]
    #[traced_test]
    fn test_analyze_healthy() {
        let registry = registry_of(&[("App", Lifetime::Scoped), ("Logger", Lifetime::Singleton)]);
        let graph = graph_of(&[("App", "Logger", DependencyKind::Constructor, false)]);

        let report = HealthReport::analyze(&registry, &graph, &AnalyzerConfig::default());

        assert_eq!(report.score, HealthScore::Healthy);
        assert!(report.issues.is_empty());
        assert_eq!(report.orphans.into_iter().collect::<Vec<_>>(), ["App"]);
        assert_eq!(report.most_depended, [("Logger".to_owned(), 1)]);
        assert_eq!(report.stats.total, 1);
    }

    #[test]
    #[traced_test]
    fn test_analyze_issues() {
        let registry = registry_of(&[
            ("Cache", Lifetime::Singleton),
            ("Request", Lifetime::Scoped),
            ("A", Lifetime::Transient),
            ("B", Lifetime::Transient),
        ]);
        let graph = graph_of(&[
            ("Cache", "Request", DependencyKind::Constructor, false),
            ("A", "B", DependencyKind::Constructor, false),
            ("B", "A", DependencyKind::Property, false),
            ("A", "Missing", DependencyKind::Constructor, false),
            ("A", "Ignored", DependencyKind::Setter, true),
        ]);

        let report = HealthReport::analyze(&registry, &graph, &AnalyzerConfig::default());
        let kinds: Vec<_> = report.issues.iter().map(|issue| issue.kind).collect();

        assert!(kinds.contains(&IssueKind::CircularDependency));
        assert!(kinds.contains(&IssueKind::LifetimeMismatch));
        assert_eq!(kinds.iter().filter(|kind| **kind == IssueKind::MissingDependency).count(), 1);
        assert_eq!(report.score, HealthScore::Critical);
    }

    #[test]
    #[traced_test]
    fn test_analyze_excessive_dependencies() {
        let registry = registry_of(&[("Hub", Lifetime::Transient)]);
        let edges: Vec<_> = ["A", "B", "C"]
            .into_iter()
            .map(|dependency| ("Hub", dependency, DependencyKind::Constructor, true))
            .collect();
        let graph = graph_of(&edges);
        let config = AnalyzerConfig {
            max_dependencies_per_service: 2,
            ..AnalyzerConfig::default()
        };

        let report = HealthReport::analyze(&registry, &graph, &config);

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::ExcessiveDependencies);
        assert_eq!(report.issues[0].services, ["Hub"]);
        assert_eq!(report.score, HealthScore::Attention);
    }
}
