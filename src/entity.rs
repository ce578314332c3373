use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::{definition::DefinitionRecord, errors::ValidationErrorKind, lifetime::Lifetime, payload::Payload};

pub(crate) const PATH_SEPARATOR: &str = "::";

/// Persisted description of a service used by discovery and analytics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinitionEntity {
    pub(crate) id: String,
    pub(crate) type_token: String,
    pub(crate) lifetime: Lifetime,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) dependencies: Vec<String>,
    pub(crate) config: BTreeMap<String, String>,
    pub(crate) environment: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Changes applied by [`ServiceDefinitionEntity::with_updates`], `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct EntityUpdate {
    pub lifetime: Option<Lifetime>,
    pub tags: Option<BTreeSet<String>>,
    pub dependencies: Option<Vec<String>>,
    pub config: Option<BTreeMap<String, String>>,
    pub environment: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl ServiceDefinitionEntity {
    /// Creates an active transient entity available in every environment.
    ///
    /// # Errors
    /// - Returns [`ValidationErrorKind::EmptyIdentifier`] if the identifier is empty
    /// - Returns [`ValidationErrorKind::EmptyTypeToken`] if the type token is empty
    pub fn new(id: impl Into<String>, type_token: impl Into<String>) -> Result<Self, ValidationErrorKind> {
        let id = id.into();
        let type_token = type_token.into();

        if id.trim().is_empty() {
            return Err(ValidationErrorKind::EmptyIdentifier);
        }
        if type_token.trim().is_empty() {
            return Err(ValidationErrorKind::EmptyTypeToken);
        }

        let now = Utc::now();
        Ok(Self {
            id,
            type_token,
            lifetime: Lifetime::default(),
            tags: BTreeSet::new(),
            dependencies: Vec::new(),
            config: BTreeMap::new(),
            environment: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Builds an entity from a registered definition.
    ///
    /// The type token is the alias or factory the definition points to, otherwise the identifier itself.
    /// Argument names become config keys.
    #[must_use]
    pub fn from_record(record: &DefinitionRecord) -> Self {
        let type_token = record
            .concrete()
            .and_then(|concrete| concrete.as_alias().or_else(|| concrete.as_factory()))
            .unwrap_or(record.identifier());
        let now = Utc::now();

        Self {
            id: record.identifier().to_owned(),
            type_token: type_token.to_owned(),
            lifetime: record.lifetime(),
            tags: record.tags().clone(),
            dependencies: Vec::new(),
            config: record
                .arguments()
                .iter()
                .map(|(name, value)| (name.clone(), describe(value)))
                .collect(),
            environment: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_dependencies<I, T>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for dependency in dependencies {
            let dependency = dependency.into();
            if !self.dependencies.contains(&dependency) {
                self.dependencies.push(dependency);
            }
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn with_config_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Returns a new entity with the changes applied and `updated_at` refreshed, `self` is left untouched
    #[must_use]
    pub fn with_updates(&self, update: EntityUpdate) -> Self {
        let mut entity = self.clone();
        if let Some(lifetime) = update.lifetime {
            entity.lifetime = lifetime;
        }
        if let Some(tags) = update.tags {
            entity.tags = tags;
        }
        if let Some(dependencies) = update.dependencies {
            entity.dependencies = dependencies;
        }
        if let Some(config) = update.config {
            entity.config = config;
        }
        if let Some(environment) = update.environment {
            entity.environment = environment;
        }
        if let Some(description) = update.description {
            entity.description = description;
        }
        if let Some(is_active) = update.is_active {
            entity.is_active = is_active;
        }
        entity.updated_at = Utc::now().max(self.updated_at);
        entity
    }
}

impl ServiceDefinitionEntity {
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn type_token(&self) -> &str {
        &self.type_token
    }

    #[inline]
    #[must_use]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    #[inline]
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &BTreeMap<String, String> {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `1 + 2 * dependencies + 3 if scoped + config entries`
    #[must_use]
    pub fn complexity_score(&self) -> usize {
        let scoped = if self.lifetime == Lifetime::Scoped { 3 } else { 0 };
        1 + 2 * self.dependencies.len() + scoped + self.config.len()
    }

    /// Active and either bound to no environment or to the requested one.
    /// `None` as the requested environment accepts every active entity.
    #[must_use]
    pub fn is_available_in(&self, environment: Option<&str>) -> bool {
        if !self.is_active {
            return false;
        }
        match (self.environment.as_deref(), environment) {
            (None, _) | (_, None) => true,
            (Some(own), Some(requested)) => own == requested,
        }
    }

    /// Type token up to the last path separator, empty for top-level types
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.type_token.rsplit_once(PATH_SEPARATOR).map_or("", |(namespace, _)| namespace)
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.type_token
            .rsplit_once(PATH_SEPARATOR)
            .map_or(self.type_token.as_str(), |(_, name)| name)
    }
}

fn describe(payload: &Payload) -> String {
    match payload {
        Payload::Value(_) => "value".to_owned(),
        Payload::FactoryRef(id) => format!("factory:{id}"),
        Payload::Alias(id) => format!("alias:{id}"),
    }
}
