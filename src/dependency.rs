use chrono::{DateTime, Utc};
use core::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use crate::errors::ValidationErrorKind;

/// Strength reported for an edge kind outside of [`DependencyKind`]
pub const UNKNOWN_KIND_STRENGTH: u8 = 1;

/// The way a dependent receives its dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyKind {
    Constructor,
    Property,
    Method,
    Setter,
    Interface,
}

impl DependencyKind {
    #[inline]
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [Self::Constructor, Self::Property, Self::Method, Self::Setter, Self::Interface]
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            DependencyKind::Constructor => "constructor",
            DependencyKind::Property => "property",
            DependencyKind::Method => "method",
            DependencyKind::Setter => "setter",
            DependencyKind::Interface => "interface",
        }
    }

    /// Coupling tightness, used only for ranking
    #[inline]
    #[must_use]
    pub const fn strength(&self) -> u8 {
        match self {
            DependencyKind::Constructor => 10,
            DependencyKind::Property => 7,
            DependencyKind::Method | DependencyKind::Setter => 5,
            DependencyKind::Interface => 3,
        }
    }
}

/// Strength of an edge kind given by name, unknown names rank lowest
#[must_use]
pub fn strength_of(kind: &str) -> u8 {
    kind.parse::<DependencyKind>()
        .map_or(UNKNOWN_KIND_STRENGTH, |kind| kind.strength())
}

impl Display for DependencyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DependencyKind {
    type Err = ValidationErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationErrorKind::UnknownDependencyKind { kind: s.to_owned() })
    }
}

/// Directed edge `dependent -> dependency`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    pub(crate) dependent: String,
    pub(crate) dependency: String,
    pub(crate) kind: DependencyKind,
    pub(crate) optional: bool,
    pub(crate) created_at: Option<DateTime<Utc>>,
}

impl DependencyRecord {
    /// Creates a required edge.
    ///
    /// # Errors
    /// - Returns [`ValidationErrorKind::EmptyDependent`] or [`ValidationErrorKind::EmptyDependency`] if either end is empty
    /// - Returns [`ValidationErrorKind::SelfDependency`] if both ends are the same service
    pub fn new(dependent: impl Into<String>, dependency: impl Into<String>, kind: DependencyKind) -> Result<Self, ValidationErrorKind> {
        let dependent = dependent.into();
        let dependency = dependency.into();

        if dependent.trim().is_empty() {
            return Err(ValidationErrorKind::EmptyDependent);
        }
        if dependency.trim().is_empty() {
            return Err(ValidationErrorKind::EmptyDependency);
        }
        if dependent == dependency {
            return Err(ValidationErrorKind::SelfDependency { id: dependent });
        }

        Ok(Self {
            dependent,
            dependency,
            kind,
            optional: false,
            created_at: None,
        })
    }

    /// Creates a required edge with kind given by name.
    ///
    /// # Errors
    /// - Returns [`ValidationErrorKind::UnknownDependencyKind`] if the kind is outside of [`DependencyKind`]
    /// - See [`Self::new`] for the rest
    pub fn parse(dependent: impl Into<String>, dependency: impl Into<String>, kind: &str) -> Result<Self, ValidationErrorKind> {
        Self::new(dependent, dependency, kind.parse()?)
    }

    #[inline]
    #[must_use]
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

impl DependencyRecord {
    #[inline]
    #[must_use]
    pub fn dependent(&self) -> &str {
        &self.dependent
    }

    #[inline]
    #[must_use]
    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> DependencyKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    #[inline]
    #[must_use]
    pub fn strength(&self) -> u8 {
        self.kind.strength()
    }

    /// Only required constructor edges must be satisfied before the dependent can be built
    #[inline]
    #[must_use]
    pub fn can_defer_resolution(&self) -> bool {
        self.optional || self.kind != DependencyKind::Constructor
    }

    #[inline]
    #[must_use]
    pub(crate) fn key(&self) -> (String, String, DependencyKind) {
        (self.dependent.clone(), self.dependency.clone(), self.kind)
    }
}
