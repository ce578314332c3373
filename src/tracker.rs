use chrono::Utc;
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};
use tracing::debug;

use crate::{
    dependency::{DependencyKind, DependencyRecord},
    errors::{StoreErrorKind, ValidationErrorKind},
    graph::DependencyGraph,
    reflection::{discover_dependencies, ReflectionProvider},
    store::Repository,
};

/// Result of [`DependencyTracker::track`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Inserted,
    /// The edge existed and only its `optional` flag changed
    Updated,
    Unchanged,
}

/// Dependency records unique by `(dependent, dependency, kind)`
#[derive(Debug, Clone, Default)]
pub struct DependencyTracker {
    records: BTreeMap<(String, String, DependencyKind), DependencyRecord>,
}

impl DependencyTracker {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the record, or updates the `optional` flag of an already tracked edge.
    /// Everything else about an existing edge, its creation time included, is kept.
    pub fn track(&mut self, record: DependencyRecord) -> TrackOutcome {
        match self.records.entry(record.key()) {
            Entry::Vacant(entry) => {
                entry.insert(record);
                TrackOutcome::Inserted
            }
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                if existing.optional == record.optional {
                    TrackOutcome::Unchanged
                } else {
                    existing.optional = record.optional;
                    TrackOutcome::Updated
                }
            }
        }
    }

    /// # Errors
    /// - Returns [`ValidationErrorKind`] if the edge is invalid, see [`DependencyRecord::new`]
    pub fn track_edge(
        &mut self,
        dependent: impl Into<String>,
        dependency: impl Into<String>,
        kind: DependencyKind,
        optional: bool,
    ) -> Result<TrackOutcome, ValidationErrorKind> {
        let record = DependencyRecord::new(dependent, dependency, kind)?
            .with_optional(optional)
            .with_created_at(Utc::now());
        Ok(self.track(record))
    }

    pub fn untrack(&mut self, dependent: &str, dependency: &str, kind: DependencyKind) -> Option<DependencyRecord> {
        self.records.remove(&(dependent.to_owned(), dependency.to_owned(), kind))
    }

    /// Drops every edge touching the service, returns how many were dropped
    pub fn remove_service(&mut self, id: &str) -> usize {
        let before = self.records.len();
        self.records
            .retain(|(dependent, dependency, _), _| dependent != id && dependency != id);
        let removed = before - self.records.len();
        debug!(id, removed, "Service edges removed");
        removed
    }

    #[inline]
    pub fn records(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.records.values()
    }

    pub fn dependencies_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a DependencyRecord> + 'a {
        self.records().filter(move |record| record.dependent == id)
    }

    pub fn dependents_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a DependencyRecord> + 'a {
        self.records().filter(move |record| record.dependency == id)
    }

    #[must_use]
    pub fn dependency_targets(&self) -> BTreeSet<&str> {
        self.records().map(|record| record.dependency.as_str()).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::build(self.records())
    }

    /// Tracks constructor and property dependencies of `type_token` reported by reflection,
    /// returns how many edges are new
    pub fn auto_discover(&mut self, reflection: &dyn ReflectionProvider, id: &str, type_token: &str) -> usize {
        let now = Utc::now();
        let inserted = discover_dependencies(reflection, id, type_token)
            .into_iter()
            .filter(|record| self.track(record.clone().with_created_at(now)) == TrackOutcome::Inserted)
            .count();

        debug!(id, type_token, inserted, "Dependencies discovered");
        inserted
    }
}

impl DependencyTracker {
    /// Tracks every record found in the repository
    ///
    /// # Errors
    /// - Returns [`StoreErrorKind`] if the repository fails
    pub fn load<R>(repository: &R) -> Result<Self, StoreErrorKind>
    where
        R: Repository<DependencyRecord> + ?Sized,
    {
        let mut tracker = Self::new();
        for record in repository.find_all()? {
            tracker.track(record);
        }
        debug!(records = tracker.len(), "Dependency records loaded");
        Ok(tracker)
    }

    /// Saves every tracked record, returns how many were saved
    ///
    /// # Errors
    /// - Returns [`StoreErrorKind`] on the first failed save
    pub fn persist<R>(&self, repository: &mut R) -> Result<usize, StoreErrorKind>
    where
        R: Repository<DependencyRecord> + ?Sized,
    {
        for record in self.records() {
            repository.save(record.clone())?;
        }
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::{DependencyTracker, TrackOutcome};
    use crate::{
        dependency::{DependencyKind, DependencyRecord},
        errors::ValidationErrorKind,
        reflection::{Candidate, StaticReflection},
        store::{MemoryRepository, Repository as _},
    };

    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_triple_uniqueness() {
        let mut tracker = DependencyTracker::new();
        let first = DependencyRecord::new("Mailer", "Logger", DependencyKind::Constructor).unwrap();
        let created_at = chrono::Utc::now() - chrono::Duration::days(1);

        assert_eq!(tracker.track(first.clone().with_created_at(created_at)), TrackOutcome::Inserted);
        assert_eq!(tracker.track(first.clone()), TrackOutcome::Unchanged);
        assert_eq!(tracker.track(first.clone().with_optional(true)), TrackOutcome::Updated);
        assert_eq!(tracker.len(), 1);

        let stored = tracker.records().next().unwrap();
        assert!(stored.is_optional());
        assert_eq!(stored.created_at(), Some(created_at));

        let property = DependencyRecord::new("Mailer", "Logger", DependencyKind::Property).unwrap();
        assert_eq!(tracker.track(property), TrackOutcome::Inserted);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    #[traced_test]
    fn test_track_edge_validates() {
        let mut tracker = DependencyTracker::new();
        assert_eq!(
            tracker.track_edge("A", "A", DependencyKind::Constructor, false),
            Err(ValidationErrorKind::SelfDependency { id: "A".into() })
        );
        assert!(tracker.is_empty());

        assert_eq!(tracker.track_edge("A", "B", DependencyKind::Constructor, false), Ok(TrackOutcome::Inserted));
        assert!(tracker.records().next().unwrap().created_at().is_some());
    }

    #[test]
    #[traced_test]
    fn test_queries_and_removal() {
        let mut tracker = DependencyTracker::new();
        tracker.track_edge("App", "Mailer", DependencyKind::Constructor, false).unwrap();
        tracker.track_edge("Mailer", "Logger", DependencyKind::Constructor, false).unwrap();
        tracker.track_edge("App", "Logger", DependencyKind::Setter, true).unwrap();

        assert_eq!(tracker.dependencies_of("App").count(), 2);
        assert_eq!(tracker.dependents_of("Logger").count(), 2);
        assert_eq!(tracker.dependency_targets().into_iter().collect::<Vec<_>>(), ["Logger", "Mailer"]);
        assert_eq!(tracker.graph().edge_count(), 3);

        assert!(tracker.untrack("App", "Logger", DependencyKind::Setter).is_some());
        assert!(tracker.untrack("App", "Logger", DependencyKind::Setter).is_none());
        assert_eq!(tracker.remove_service("Mailer"), 2);
        assert!(tracker.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_load_and_persist() {
        let mut tracker = DependencyTracker::new();
        tracker.track_edge("App", "Mailer", DependencyKind::Constructor, false).unwrap();
        tracker.track_edge("Mailer", "Logger", DependencyKind::Property, true).unwrap();

        let mut repository = MemoryRepository::new();
        assert_eq!(tracker.persist(&mut repository).unwrap(), 2);
        assert_eq!(repository.find_all().unwrap().len(), 2);

        let loaded = DependencyTracker::load(&repository).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.graph(), tracker.graph());
    }

    #[test]
    #[traced_test]
    fn test_auto_discover() {
        let reflection = StaticReflection::new()
            .with_constructor("App::Mailer", [Candidate::new("Logger"), Candidate::new("u16")])
            .with_properties("App::Mailer", [Candidate::optional("Clock")]);
        let mut tracker = DependencyTracker::new();

        assert_eq!(tracker.auto_discover(&reflection, "mailer", "App::Mailer"), 2);
        assert_eq!(tracker.auto_discover(&reflection, "mailer", "App::Mailer"), 0);
        assert_eq!(tracker.auto_discover(&reflection, "unknown", "App::Unknown"), 0);

        let clock = tracker.dependents_of("Clock").next().unwrap();
        assert_eq!(clock.kind(), DependencyKind::Property);
        assert!(clock.is_optional());
    }
}
