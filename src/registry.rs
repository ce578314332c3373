use indexmap::IndexMap;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::{debug, info_span};

use crate::{
    cache::{ContextualCache, HierarchyCache},
    config::Config,
    definition::DefinitionRecord,
    extender::{boxed_extender, BoxedExtender, Extender, GLOBAL_EXTENDER},
    hierarchy::{HierarchyFacts, NoHierarchy, TypeHierarchy},
    pattern::{is_wildcard, ConsumerPattern},
    payload::Payload,
};

struct WildcardRule {
    pattern: ConsumerPattern,
    gives: BTreeMap<String, Payload>,
}

/// Authoritative store of service definitions and contextual overrides.
///
/// Mutation needs `&mut self`, so registration is serialized by the borrow checker.
/// Lookups only need `&self` and may run concurrently once registration is finished,
/// the memo caches are guarded internally.
pub struct DefinitionRegistry {
    definitions: BTreeMap<String, DefinitionRecord>,
    tag_index: BTreeMap<String, BTreeSet<String>>,
    exact: BTreeMap<String, BTreeMap<String, Payload>>,
    wildcard: IndexMap<String, WildcardRule>,
    extenders: BTreeMap<String, Vec<BoxedExtender>>,
    hierarchy: Arc<dyn TypeHierarchy>,
    config: Config,
    contextual_cache: Mutex<ContextualCache>,
    hierarchy_cache: Mutex<HierarchyCache>,
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionRegistry {
    /// Creates an empty registry without type-hierarchy facts,
    /// so only exact and wildcard contextual rules can match
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_hierarchy(NoHierarchy)
    }

    #[inline]
    #[must_use]
    pub fn with_hierarchy(hierarchy: impl TypeHierarchy + 'static) -> Self {
        Self::with_shared_hierarchy(Arc::new(hierarchy))
    }

    #[must_use]
    pub fn with_shared_hierarchy(hierarchy: Arc<dyn TypeHierarchy>) -> Self {
        Self {
            definitions: BTreeMap::new(),
            tag_index: BTreeMap::new(),
            exact: BTreeMap::new(),
            wildcard: IndexMap::new(),
            extenders: BTreeMap::new(),
            hierarchy,
            config: Config::default(),
            contextual_cache: Mutex::new(ContextualCache::new()),
            hierarchy_cache: Mutex::new(HierarchyCache::new()),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }
}

impl DefinitionRegistry {
    /// Inserts the definition or replaces the one with the same identifier.
    ///
    /// Tags of a replaced definition are removed from the tag index before the new ones are added.
    /// The whole contextual-match cache is cleared.
    pub fn add(&mut self, record: DefinitionRecord) -> Option<DefinitionRecord> {
        let identifier = record.identifier.clone();

        let replaced = self.definitions.remove(&identifier);
        if let Some(old) = &replaced {
            unindex_tags(&mut self.tag_index, &identifier, &old.tags);
            debug!(%identifier, "Definition replaced");
        }
        index_tags(&mut self.tag_index, &identifier, &record.tags);
        self.definitions.insert(identifier, record);

        self.contextual_cache.get_mut().clear();
        replaced
    }

    #[inline]
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&DefinitionRecord> {
        self.definitions.get(identifier)
    }

    #[inline]
    #[must_use]
    pub fn has(&self, identifier: &str) -> bool {
        self.definitions.contains_key(identifier)
    }

    #[must_use]
    pub fn get_tagged_ids(&self, tag: &str) -> BTreeSet<String> {
        self.tag_index.get(tag).cloned().unwrap_or_default()
    }

    /// Unions `tags` into the definition and the tag index.
    /// Returns `false` and changes nothing if the identifier isn't registered.
    pub fn add_tags<I, T>(&mut self, identifier: &str, tags: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let Some(record) = self.definitions.get_mut(identifier) else {
            debug!(identifier, "Tags for unknown definition ignored");
            return false;
        };

        for tag in tags {
            let tag = tag.into();
            self.tag_index.entry(tag.clone()).or_default().insert(identifier.to_owned());
            record.tags.insert(tag);
        }
        true
    }

    /// Iterates over all definitions in identifier order
    #[inline]
    pub fn get_all_definitions(&self) -> impl Iterator<Item = &DefinitionRecord> {
        self.definitions.values()
    }

    #[inline]
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }
}

impl DefinitionRegistry {
    /// Registers what to give when `consumer` needs `needs`.
    ///
    /// A consumer containing [`crate::WILDCARD_MARKER`] is a glob pattern.
    /// Patterns keep their first registration position, which decides between several matching patterns.
    /// An invalid pattern is stored but never matches.
    /// The whole contextual-match cache is cleared.
    pub fn add_contextual(&mut self, consumer: impl Into<String>, needs: impl Into<String>, give: Payload) {
        let consumer = consumer.into();
        let needs = needs.into();

        if is_wildcard(&consumer) {
            let rule = self.wildcard.entry(consumer.clone()).or_insert_with(|| WildcardRule {
                pattern: ConsumerPattern::new(consumer),
                gives: BTreeMap::new(),
            });
            rule.gives.insert(needs, give);
        } else {
            self.exact.entry(consumer).or_default().insert(needs, give);
        }

        self.contextual_cache.get_mut().clear();
    }

    /// Finds what to give when `consumer` needs `needs`.
    ///
    /// Rule classes are tried in order and the first class with a match wins:
    /// exact consumer, wildcard patterns in registration order, ancestors of the consumer nearest first,
    /// interfaces of the consumer.
    /// Results are memoized, misses included.
    #[must_use]
    pub fn get_contextual_match(&self, consumer: &str, needs: &str) -> Option<Payload> {
        let span = info_span!("get_contextual_match", consumer, needs);
        let _guard = span.enter();

        if !self.config.cache_contextual {
            return self.resolve_contextual(consumer, needs);
        }

        if let Some(give) = self.contextual_cache.lock().get(consumer, needs) {
            debug!("Found in cache");
            return give;
        }
        debug!("Not found in cache");

        let give = self.resolve_contextual(consumer, needs);
        self.contextual_cache.lock().insert(consumer, needs, give.clone());
        give
    }

    /// Number of memoized contextual lookups, misses included
    #[inline]
    #[must_use]
    pub fn cached_contextual_matches(&self) -> usize {
        self.contextual_cache.lock().len()
    }

    /// Number of types with memoized hierarchy facts
    #[inline]
    #[must_use]
    pub fn cached_hierarchy_facts(&self) -> usize {
        self.hierarchy_cache.lock().len()
    }

    fn resolve_contextual(&self, consumer: &str, needs: &str) -> Option<Payload> {
        if let Some(give) = self.exact_give(consumer, needs) {
            debug!("Matched exact rule");
            return Some(give.clone());
        }

        for rule in self.wildcard.values() {
            let Some(give) = rule.gives.get(needs) else {
                continue;
            };
            if rule.pattern.matches(consumer) {
                debug!(pattern = rule.pattern.source(), "Matched wildcard rule");
                return Some(give.clone());
            }
        }

        // Hierarchy rules are exact rules keyed by a supertype
        if self.exact.is_empty() {
            return None;
        }

        let facts = self.hierarchy_facts(consumer);
        for ancestor in &facts.ancestors {
            if let Some(give) = self.exact_give(ancestor, needs) {
                debug!(%ancestor, "Matched ancestor rule");
                return Some(give.clone());
            }
        }
        for interface in &facts.interfaces {
            if let Some(give) = self.exact_give(interface, needs) {
                debug!(%interface, "Matched interface rule");
                return Some(give.clone());
            }
        }

        debug!("No contextual rule");
        None
    }

    #[inline]
    fn exact_give(&self, consumer: &str, needs: &str) -> Option<&Payload> {
        self.exact.get(consumer).and_then(|gives| gives.get(needs))
    }

    fn hierarchy_facts(&self, type_token: &str) -> Arc<HierarchyFacts> {
        if self.config.cache_hierarchy {
            self.hierarchy_cache.lock().get_or_collect(self.hierarchy.as_ref(), type_token)
        } else {
            Arc::new(HierarchyFacts::collect(self.hierarchy.as_ref(), type_token))
        }
    }
}

impl DefinitionRegistry {
    /// Appends an extender for the identifier, [`GLOBAL_EXTENDER`] applies it to every service.
    /// Only cached contextual matches of this identifier are invalidated.
    pub fn add_extender(&mut self, identifier: impl Into<String>, extender: impl Extender) {
        self.add_boxed_extender(identifier, boxed_extender(extender));
    }

    pub fn add_boxed_extender(&mut self, identifier: impl Into<String>, extender: BoxedExtender) {
        let identifier = identifier.into();
        let dropped = self.contextual_cache.get_mut().invalidate_consumer(&identifier);
        debug!(%identifier, dropped, "Extender added");

        self.extenders.entry(identifier).or_default().push(extender);
    }

    /// Global extenders first, then the ones of the identifier, each group in registration order
    #[must_use]
    pub fn get_extenders(&self, identifier: &str) -> Vec<BoxedExtender> {
        let global = self.extenders.get(GLOBAL_EXTENDER).into_iter().flatten();
        if identifier == GLOBAL_EXTENDER {
            return global.cloned().collect();
        }

        global
            .chain(self.extenders.get(identifier).into_iter().flatten())
            .cloned()
            .collect()
    }
}

fn index_tags(tag_index: &mut BTreeMap<String, BTreeSet<String>>, identifier: &str, tags: &BTreeSet<String>) {
    for tag in tags {
        tag_index.entry(tag.clone()).or_default().insert(identifier.to_owned());
    }
}

fn unindex_tags(tag_index: &mut BTreeMap<String, BTreeSet<String>>, identifier: &str, tags: &BTreeSet<String>) {
    for tag in tags {
        let Some(ids) = tag_index.get_mut(tag) else {
            continue;
        };
        ids.remove(identifier);
        if ids.is_empty() {
            tag_index.remove(tag);
        }
    }
}
