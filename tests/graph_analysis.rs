use defgraph::{
    find_orphaned_services, health_score, AnalyzerConfig, CycleErrorKind, DefinitionRecord, DefinitionRegistry,
    DependencyKind, DependencyRecord, DependencyTracker, HealthReport, HealthScore, Issue, IssueKind, Lifetime,
    Severity, ValidationErrorKind,
};
use std::collections::BTreeSet;

fn tracker_of(edges: &[(&str, &str)]) -> DependencyTracker {
    let mut tracker = DependencyTracker::new();
    for (dependent, dependency) in edges {
        tracker
            .track_edge(*dependent, *dependency, DependencyKind::Constructor, false)
            .unwrap();
    }
    tracker
}

#[test]
fn test_self_dependency_is_rejected() {
    for kind in DependencyKind::all() {
        assert_eq!(
            DependencyRecord::new("A", "A", kind),
            Err(ValidationErrorKind::SelfDependency { id: "A".to_owned() })
        );
    }
}

#[test]
fn test_cycle_membership() {
    let graph = tracker_of(&[("A", "B"), ("B", "C"), ("C", "A")]).graph();

    let cycles = graph.detect_cycles();
    let expected: BTreeSet<&str> = ["A", "B", "C"].into_iter().collect();
    assert!(cycles
        .iter()
        .any(|cycle| cycle.iter().map(String::as_str).collect::<BTreeSet<_>>() == expected));

    let err = graph.ensure_acyclic().unwrap_err();
    assert_eq!(err.to_string(), "Cyclic dependency detected: A -> B -> C -> A");
    assert!(matches!(graph.topological_order(), Err(CycleErrorKind::CyclicDependency { .. })));
}

#[test]
fn test_orphans() {
    let graph = tracker_of(&[("A", "B")]).graph();

    assert_eq!(
        find_orphaned_services(["A", "B"], graph.dependency_targets()),
        BTreeSet::from(["A".to_owned()])
    );
    assert_eq!(graph.orphaned_services(["A", "B"]), BTreeSet::from(["A".to_owned()]));
}

#[test]
fn test_tree_terminates_on_cycle() {
    let graph = tracker_of(&[("A", "B"), ("B", "A")]).graph();

    let tree = graph.dependency_tree_with_config("A", &AnalyzerConfig::default());

    assert!(tree.node_count() <= 3);
    assert!(tree.height() <= 5);
    assert!(tree.contains("B"));
}

#[test]
fn test_health_score_transitions() {
    let high = Issue::new(IssueKind::CircularDependency, Severity::High, "cycle");
    assert_eq!(health_score(&[]), HealthScore::Healthy);
    assert_eq!(health_score(&[high]), HealthScore::Critical);

    let mut issues: Vec<_> = (0..2)
        .map(|_| Issue::new(IssueKind::MissingDependency, Severity::Medium, "missing"))
        .collect();
    assert_eq!(health_score(&issues), HealthScore::Attention);
    issues.push(Issue::new(IssueKind::MissingDependency, Severity::Medium, "missing"));
    assert_eq!(health_score(&issues), HealthScore::Warning);
}

#[test]
fn test_startup_order_and_report() {
    let mut registry = DefinitionRegistry::new();
    for (id, lifetime) in [
        ("App", Lifetime::Scoped),
        ("Mailer", Lifetime::Singleton),
        ("Logger", Lifetime::Singleton),
        ("Config", Lifetime::Singleton),
    ] {
        registry.add(DefinitionRecord::new(id).unwrap().with_lifetime(lifetime));
    }
    let tracker = tracker_of(&[("App", "Mailer"), ("App", "Logger"), ("Mailer", "Logger"), ("Logger", "Config")]);
    let graph = tracker.graph();

    assert_eq!(graph.topological_order().unwrap(), ["Config", "Logger", "Mailer", "App"]);

    let report = HealthReport::analyze(&registry, &graph, &AnalyzerConfig::default());
    assert_eq!(report.score, HealthScore::Healthy);
    assert_eq!(report.orphans, BTreeSet::from(["App".to_owned()]));
    assert_eq!(report.most_depended[0], ("Logger".to_owned(), 2));
    assert_eq!(report.stats.unique_services, 3);
}
