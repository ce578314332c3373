use std::{collections::BTreeMap, sync::Arc};

use crate::{
    hierarchy::{HierarchyFacts, TypeHierarchy},
    payload::Payload,
};

/// Memo of contextual resolution results, misses included
#[derive(Debug, Clone, Default)]
pub(crate) struct ContextualCache {
    map: BTreeMap<String, BTreeMap<String, Option<Payload>>>,
}

impl ContextualCache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    /// Outer `None` is a cache miss, inner `None` a cached negative result
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, consumer: &str, needs: &str) -> Option<Option<Payload>> {
        self.map.get(consumer).and_then(|gives| gives.get(needs)).cloned()
    }

    #[inline]
    pub(crate) fn insert(&mut self, consumer: &str, needs: &str, give: Option<Payload>) {
        self.map.entry(consumer.to_owned()).or_default().insert(needs.to_owned(), give);
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }

    /// Drops entries cached for `consumer`, returns how many were dropped
    pub(crate) fn invalidate_consumer(&mut self, consumer: &str) -> usize {
        self.map.remove(consumer).map_or(0, |gives| gives.len())
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.map.values().map(BTreeMap::len).sum()
    }
}

/// Memo of type-hierarchy facts keyed by type token, never invalidated
#[derive(Debug, Clone, Default)]
pub(crate) struct HierarchyCache {
    map: BTreeMap<String, Arc<HierarchyFacts>>,
}

impl HierarchyCache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    pub(crate) fn get_or_collect(&mut self, hierarchy: &dyn TypeHierarchy, type_token: &str) -> Arc<HierarchyFacts> {
        if let Some(facts) = self.map.get(type_token) {
            return facts.clone();
        }
        let facts = Arc::new(HierarchyFacts::collect(hierarchy, type_token));
        self.map.insert(type_token.to_owned(), facts.clone());
        facts
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
