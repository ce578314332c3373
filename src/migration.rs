use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info_span};

use crate::{
    discovery::DiscoveryQueryEngine,
    entity::ServiceDefinitionEntity,
    lifetime::Lifetime,
    reflection::{constructor_candidates_or_empty, is_primitive, ReflectionProvider},
};

/// Type name parts of services that usually live for a single request
const REQUEST_SCOPED_INDICATORS: &[&str] = &["Request", "Controller", "Handler", "Middleware"];

/// Lowercase type name parts and the tag they hint at
const TAG_HINTS: &[(&str, &str)] = &[
    ("repository", "data"),
    ("service", "business"),
    ("cache", "cache"),
    ("log", "logging"),
    ("http", "http"),
    ("client", "http"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifetimeChange {
    pub from: Lifetime,
    pub to: Lifetime,
    pub reason: String,
}

/// Heuristic findings for one service. Nothing here is applied automatically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSuggestion {
    pub lifetime: Option<LifetimeChange>,
    pub missing_tags: BTreeSet<String>,
    /// Constructor parameter types not listed as dependencies
    pub missing_dependencies: BTreeSet<String>,
}

impl MigrationSuggestion {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lifetime.is_none() && self.missing_tags.is_empty() && self.missing_dependencies.is_empty()
    }
}

impl DiscoveryQueryEngine<'_> {
    /// Suggestions for every service with at least one finding, by identifier.
    ///
    /// Services whose type can't be reflected get no missing dependencies.
    #[must_use]
    pub fn suggest_migrations(&self, reflection: &dyn ReflectionProvider) -> BTreeMap<String, MigrationSuggestion> {
        let span = info_span!("suggest_migrations", services = self.len());
        let _guard = span.enter();

        let suggestions: BTreeMap<String, MigrationSuggestion> = self
            .services
            .values()
            .filter_map(|entity| {
                let suggestion = MigrationSuggestion {
                    lifetime: lifetime_change(entity),
                    missing_tags: missing_tags(entity),
                    missing_dependencies: missing_dependencies(entity, reflection),
                };
                (!suggestion.is_empty()).then(|| (entity.id.clone(), suggestion))
            })
            .collect();

        debug!(suggestions = suggestions.len(), "Migrations suggested");
        suggestions
    }
}

fn lifetime_change(entity: &ServiceDefinitionEntity) -> Option<LifetimeChange> {
    if entity.lifetime != Lifetime::Singleton {
        return None;
    }
    let name = entity.type_token.as_str();
    let indicator = REQUEST_SCOPED_INDICATORS.iter().find(|indicator| name.contains(*indicator))?;

    Some(LifetimeChange {
        from: Lifetime::Singleton,
        to: Lifetime::Scoped,
        reason: format!("`{name}` looks request-bound ({indicator}), a singleton would leak state between requests"),
    })
}

fn missing_tags(entity: &ServiceDefinitionEntity) -> BTreeSet<String> {
    let name = entity.type_token.to_lowercase();
    TAG_HINTS
        .iter()
        .filter(|(part, tag)| name.contains(part) && !entity.tags.contains(*tag))
        .map(|(_, tag)| (*tag).to_owned())
        .collect()
}

fn missing_dependencies(entity: &ServiceDefinitionEntity, reflection: &dyn ReflectionProvider) -> BTreeSet<String> {
    constructor_candidates_or_empty(reflection, &entity.type_token)
        .into_iter()
        .map(|candidate| candidate.type_token)
        .filter(|type_token| {
            !is_primitive(type_token)
                && *type_token != entity.type_token
                && !entity.dependencies.iter().any(|dependency| dependency == type_token)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::MigrationSuggestion;
    use crate::{
        discovery::DiscoveryQueryEngine,
        entity::ServiceDefinitionEntity,
        hierarchy::NoHierarchy,
        lifetime::Lifetime,
        reflection::{Candidate, StaticReflection},
    };

    use std::collections::BTreeSet;
    use tracing_test::traced_test;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[test]
    #[traced_test]
    fn test_suggest_migrations() {
        let services = vec![
            ServiceDefinitionEntity::new("handler", "App::Http::RequestHandler")
                .unwrap()
                .with_lifetime(Lifetime::Singleton),
            ServiceDefinitionEntity::new("users", "App::Data::UserRepository")
                .unwrap()
                .with_tags(["data"])
                .with_dependencies(["Db"]),
            ServiceDefinitionEntity::new("client", "App::Http::HttpClient")
                .unwrap()
                .with_lifetime(Lifetime::Scoped)
                .with_tags(["http"]),
            ServiceDefinitionEntity::new("mailer", "App::Mail::MailService")
                .unwrap()
                .with_tags(["business"])
                .with_dependencies(["Logger"]),
        ];
        let reflection = StaticReflection::new()
            .with_constructor(
                "App::Data::UserRepository",
                [Candidate::new("Db"), Candidate::new("App::Cache::QueryCache"), Candidate::new("int")],
            )
            .with_constructor("App::Mail::MailService", [Candidate::new("Logger")]);

        let engine = DiscoveryQueryEngine::new(&services, &NoHierarchy);
        let suggestions = engine.suggest_migrations(&reflection);

        assert_eq!(suggestions.keys().collect::<Vec<_>>(), ["handler", "users"]);

        let handler = &suggestions["handler"];
        assert_eq!(
            handler.lifetime.as_ref().map(|change| (change.from, change.to)),
            Some((Lifetime::Singleton, Lifetime::Scoped))
        );
        assert_eq!(handler.missing_tags, set(&["http"]));
        assert!(handler.missing_dependencies.is_empty());

        assert_eq!(
            suggestions["users"],
            MigrationSuggestion {
                lifetime: None,
                missing_tags: BTreeSet::new(),
                missing_dependencies: set(&["App::Cache::QueryCache"]),
            }
        );
        assert!(logs_contain("Constructor reflection failed"));
    }

    #[test]
    #[traced_test]
    fn test_missing_tags() {
        let services = vec![ServiceDefinitionEntity::new("logs", "App::LogCacheClient").unwrap()];
        let engine = DiscoveryQueryEngine::new(&services, &NoHierarchy);

        let suggestions = engine.suggest_migrations(&StaticReflection::new());

        assert_eq!(suggestions["logs"].missing_tags, set(&["cache", "http", "logging"]));
        assert!(suggestions["logs"].lifetime.is_none());
    }

    #[test]
    #[traced_test]
    fn test_scoped_services_keep_lifetime() {
        let services = vec![ServiceDefinitionEntity::new("controller", "UserController")
            .unwrap()
            .with_lifetime(Lifetime::Scoped)];
        let engine = DiscoveryQueryEngine::new(&services, &NoHierarchy);

        assert!(engine.suggest_migrations(&StaticReflection::new()).is_empty());
    }

    #[test]
    #[traced_test]
    fn test_namespace_counts_as_type_name() {
        let services = vec![
            ServiceDefinitionEntity::new("router", "App::Http::Controllers::Router")
                .unwrap()
                .with_lifetime(Lifetime::Singleton)
                .with_tags(["http"]),
            ServiceDefinitionEntity::new("redis", "App::Cache::Redis").unwrap(),
        ];
        let engine = DiscoveryQueryEngine::new(&services, &NoHierarchy);

        let suggestions = engine.suggest_migrations(&StaticReflection::new());

        let router = &suggestions["router"];
        assert_eq!(router.lifetime.as_ref().map(|change| change.to), Some(Lifetime::Scoped));
        assert!(router.missing_tags.is_empty());
        assert!(suggestions["redis"].lifetime.is_none());
        assert_eq!(suggestions["redis"].missing_tags, set(&["cache"]));
    }
}
