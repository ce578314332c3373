use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use crate::{dependency::DependencyRecord, entity::ServiceDefinitionEntity, errors::StoreErrorKind};

/// Value kept by a [`Repository`]
pub trait Record: Clone + Send + Sync + 'static {
    fn record_id(&self) -> String;

    /// Time used by age-based cleanup, `None` if the record is never too old
    fn recorded_at(&self) -> Option<DateTime<Utc>>;

    /// Whether age-based cleanup may drop the record
    #[inline]
    fn is_removable(&self) -> bool {
        true
    }
}

impl Record for ServiceDefinitionEntity {
    #[inline]
    fn record_id(&self) -> String {
        self.id.clone()
    }

    #[inline]
    fn recorded_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }

    /// Active services are kept regardless of their age
    #[inline]
    fn is_removable(&self) -> bool {
        !self.is_active
    }
}

impl Record for DependencyRecord {
    fn record_id(&self) -> String {
        format!("{}->{}:{}", self.dependent, self.dependency, self.kind)
    }

    #[inline]
    fn recorded_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Persistence provider for records
pub trait Repository<R: Record> {
    /// # Errors
    /// Returns [`StoreErrorKind::Backend`] if the backend fails
    fn find_all(&self) -> Result<Vec<R>, StoreErrorKind>;

    /// # Errors
    /// - Returns [`StoreErrorKind::NotFound`] if there is no record with the id
    /// - Returns [`StoreErrorKind::Backend`] if the backend fails
    fn find_by_id(&self, id: &str) -> Result<R, StoreErrorKind>;

    /// Inserts or replaces the record with the same id
    ///
    /// # Errors
    /// Returns [`StoreErrorKind::Backend`] if the backend fails
    fn save(&mut self, record: R) -> Result<(), StoreErrorKind>;

    /// Deletes removable records recorded before `threshold`, returns how many were deleted
    ///
    /// # Errors
    /// Returns [`StoreErrorKind::Backend`] if the backend fails
    fn delete_older_than(&mut self, threshold: DateTime<Utc>) -> Result<usize, StoreErrorKind>;
}

/// In-process [`Repository`] keyed by record id
#[derive(Debug, Clone)]
pub struct MemoryRepository<R> {
    records: BTreeMap<String, R>,
}

impl<R> Default for MemoryRepository<R> {
    fn default() -> Self {
        Self { records: BTreeMap::new() }
    }
}

impl<R: Record> MemoryRepository<R> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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
}

impl<R: Record> Repository<R> for MemoryRepository<R> {
    fn find_all(&self) -> Result<Vec<R>, StoreErrorKind> {
        Ok(self.records.values().cloned().collect())
    }

    fn find_by_id(&self, id: &str) -> Result<R, StoreErrorKind> {
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreErrorKind::NotFound { id: id.to_owned() })
    }

    fn save(&mut self, record: R) -> Result<(), StoreErrorKind> {
        self.records.insert(record.record_id(), record);
        Ok(())
    }

    fn delete_older_than(&mut self, threshold: DateTime<Utc>) -> Result<usize, StoreErrorKind> {
        let before = self.records.len();
        self.records.retain(|_, record| {
            !(record.is_removable() && record.recorded_at().is_some_and(|recorded_at| recorded_at < threshold))
        });
        let deleted = before - self.records.len();

        debug!(deleted, %threshold, "Old records deleted");
        Ok(deleted)
    }
}
