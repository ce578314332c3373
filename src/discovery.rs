use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::{debug, info_span};

use crate::{
    cache::HierarchyCache,
    config::DiscoveryConfig,
    entity::ServiceDefinitionEntity,
    hierarchy::{HierarchyFacts, TypeHierarchy},
    lifetime::Lifetime,
    search::{SearchFilter, SearchFilters},
};

/// How [`DiscoveryQueryEngine::find_by_capabilities`] combines tags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagOperator {
    /// Every tag is required
    #[default]
    And,
    /// At least one tag is required
    Or,
}

/// Services related to a given one, by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recommendations {
    pub common_dependencies: Vec<String>,
    pub similar_tags: Vec<String>,
    pub same_domain: Vec<String>,
}

impl Recommendations {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.common_dependencies.is_empty() && self.similar_tags.is_empty() && self.same_domain.is_empty()
    }
}

/// Read-only queries over service entities.
///
/// Results are ordered by service identifier.
/// Type-hierarchy facts are memoized per type token for the lifetime of the engine.
pub struct DiscoveryQueryEngine<'a> {
    pub(crate) services: BTreeMap<&'a str, &'a ServiceDefinitionEntity>,
    hierarchy: &'a dyn TypeHierarchy,
    hierarchy_cache: Mutex<HierarchyCache>,
    config: DiscoveryConfig,
}

impl<'a> DiscoveryQueryEngine<'a> {
    /// Entities with the same identifier replace earlier ones
    #[must_use]
    pub fn new<I>(services: I, hierarchy: &'a dyn TypeHierarchy) -> Self
    where
        I: IntoIterator<Item = &'a ServiceDefinitionEntity>,
    {
        Self {
            services: services.into_iter().map(|entity| (entity.id(), entity)).collect(),
            hierarchy,
            hierarchy_cache: Mutex::new(HierarchyCache::new()),
            config: DiscoveryConfig::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> DiscoveryConfig {
        self.config
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a ServiceDefinitionEntity> {
        self.services.get(id).copied()
    }

    fn facts(&self, type_token: &str) -> Arc<HierarchyFacts> {
        self.hierarchy_cache.lock().get_or_collect(self.hierarchy, type_token)
    }

    fn implements(&self, entity: &ServiceDefinitionEntity, type_token: &str) -> bool {
        self.facts(&entity.type_token).is_subtype_of(type_token)
    }

    fn active(&self) -> impl Iterator<Item = &'a ServiceDefinitionEntity> + '_ {
        self.services.values().copied().filter(|entity| entity.is_active)
    }
}

impl<'a> DiscoveryQueryEngine<'a> {
    /// Available services whose type extends or implements `type_token`.
    /// The type itself doesn't count.
    #[must_use]
    pub fn find_by_interface(&self, type_token: &str, environment: Option<&str>) -> Vec<&'a ServiceDefinitionEntity> {
        self.find_by_interfaces(&[type_token], environment)
    }

    /// Available services extending or implementing every token
    #[must_use]
    pub fn find_by_interfaces<T: AsRef<str>>(&self, type_tokens: &[T], environment: Option<&str>) -> Vec<&'a ServiceDefinitionEntity> {
        self.services
            .values()
            .copied()
            .filter(|entity| entity.is_available_in(environment))
            .filter(|entity| type_tokens.iter().all(|token| self.implements(entity, token.as_ref())))
            .collect()
    }

    /// Active services carrying all (`And`) or any (`Or`) of the tags
    #[must_use]
    pub fn find_by_capabilities<T: AsRef<str>>(&self, tags: &[T], operator: TagOperator) -> Vec<&'a ServiceDefinitionEntity> {
        let has_tag = |entity: &ServiceDefinitionEntity, tag: &T| entity.tags.contains(tag.as_ref());

        self.active()
            .filter(|entity| match operator {
                TagOperator::And => tags.iter().all(|tag| has_tag(entity, tag)),
                TagOperator::Or => tags.iter().any(|tag| has_tag(entity, tag)),
            })
            .collect()
    }

    /// Services implementing any interface of `id`'s type, or the type itself if it's an interface.
    /// Empty for unknown identifiers.
    #[must_use]
    pub fn find_alternatives(&self, id: &str, environment: Option<&str>) -> Vec<&'a ServiceDefinitionEntity> {
        let Some(entity) = self.get(id) else {
            return Vec::new();
        };

        let mut interfaces = self.facts(&entity.type_token).interfaces.clone();
        if self.hierarchy.is_interface(&entity.type_token) {
            interfaces.push(entity.type_token.clone());
        }

        let mut alternatives = BTreeMap::new();
        for interface in &interfaces {
            for candidate in self.find_by_interface(interface, environment) {
                if candidate.id != id {
                    alternatives.insert(candidate.id.as_str(), candidate);
                }
            }
        }

        debug!(id, interfaces = interfaces.len(), alternatives = alternatives.len(), "Alternatives found");
        alternatives.into_values().collect()
    }

    /// Narrows active services by each recognized filter in insertion order.
    /// Unknown keys are skipped.
    #[must_use]
    pub fn advanced_search(&self, filters: &SearchFilters) -> Vec<&'a ServiceDefinitionEntity> {
        let span = info_span!("advanced_search", filters = filters.len());
        let _guard = span.enter();

        let mut found: Vec<_> = self.active().collect();
        for (key, value) in filters {
            let Some(filter) = SearchFilter::parse(key, value) else {
                debug!(%key, "Unknown search filter skipped");
                continue;
            };
            found.retain(|entity| filter.matches(entity, |token| self.implements(entity, token)));
            debug!(%key, remaining = found.len(), "Search filter applied");
        }
        found
    }

    /// Active services related to `id`, each list capped by [`DiscoveryConfig::recommendation_limit`].
    ///
    /// Top-level types have no domain, so they get no same domain recommendations.
    #[must_use]
    pub fn recommendations(&self, id: &str) -> Recommendations {
        let Some(entity) = self.get(id) else {
            return Recommendations::default();
        };

        let limit = self.config.recommendation_limit;
        let dependencies: BTreeSet<&str> = entity.dependencies.iter().map(String::as_str).collect();
        let namespace = entity.namespace();
        let mut recommendations = Recommendations::default();

        for other in self.active().filter(|other| other.id != id) {
            let shared = other
                .dependencies
                .iter()
                .filter(|dependency| dependencies.contains(dependency.as_str()))
                .count();
            if shared >= self.config.common_dependency_threshold && recommendations.common_dependencies.len() < limit {
                recommendations.common_dependencies.push(other.id.clone());
            }
            if !entity.tags.is_disjoint(&other.tags) && recommendations.similar_tags.len() < limit {
                recommendations.similar_tags.push(other.id.clone());
            }
            if !namespace.is_empty() && other.namespace() == namespace && recommendations.same_domain.len() < limit {
                recommendations.same_domain.push(other.id.clone());
            }
        }

        recommendations
    }

    /// Active services with the lifetime
    #[must_use]
    pub fn find_by_lifetime(&self, lifetime: Lifetime) -> Vec<&'a ServiceDefinitionEntity> {
        self.active().filter(|entity| entity.lifetime == lifetime).collect()
    }

    /// Active services bound to the environment or to none
    #[must_use]
    pub fn services_in_environment(&self, environment: &str) -> Vec<&'a ServiceDefinitionEntity> {
        self.services
            .values()
            .copied()
            .filter(|entity| entity.is_available_in(Some(environment)))
            .collect()
    }
}
