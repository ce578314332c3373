pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod definition;
pub(crate) mod dependency;
pub(crate) mod discovery;
pub(crate) mod entity;
pub(crate) mod errors;
pub(crate) mod extender;
pub(crate) mod graph;
pub(crate) mod health;
pub(crate) mod hierarchy;
pub(crate) mod lifetime;
pub(crate) mod migration;
pub(crate) mod pattern;
pub(crate) mod payload;
pub(crate) mod reflection;
pub(crate) mod registry;
pub(crate) mod search;
pub(crate) mod store;
pub(crate) mod tracker;

pub use config::{AnalyzerConfig, Config, DiscoveryConfig};
pub use definition::DefinitionRecord;
pub use dependency::{strength_of, DependencyKind, DependencyRecord, UNKNOWN_KIND_STRENGTH};
pub use discovery::{DiscoveryQueryEngine, Recommendations, TagOperator};
pub use entity::{EntityUpdate, ServiceDefinitionEntity};
pub use errors::{CycleErrorKind, StoreErrorKind, ValidationErrorKind};
pub use extender::{BoxedExtender, Extender, GLOBAL_EXTENDER};
pub use graph::{find_orphaned_services, DependencyGraph, DependencyTree, Edge, GraphStats, Truncation};
pub use health::{health_score, HealthReport, HealthScore, Issue, IssueKind, Severity};
pub use hierarchy::{NoHierarchy, StaticHierarchy, TypeHierarchy};
pub use lifetime::Lifetime;
pub use migration::{LifetimeChange, MigrationSuggestion};
pub use pattern::WILDCARD_MARKER;
pub use payload::{AnyValue, Payload};
pub use reflection::{discover_dependencies, Candidate, ReflectionProvider, StaticReflection};
pub use registry::DefinitionRegistry;
pub use search::{FilterValue, SearchFilter, SearchFilters};
pub use store::{MemoryRepository, Record, Repository};
pub use tracker::{DependencyTracker, TrackOutcome};
