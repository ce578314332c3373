use std::collections::BTreeMap;
use tracing::debug;

use crate::dependency::{DependencyKind, DependencyRecord};

/// Types never registered as services, ignored by auto-discovery
pub(crate) const PRIMITIVE_TYPES: &[&str] = &[
    "bool", "char", "str", "String", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
    "usize", "f32", "f64", "int", "float", "string", "array", "mixed", "callable", "iterable", "object",
];

#[inline]
#[must_use]
pub(crate) fn is_primitive(type_token: &str) -> bool {
    PRIMITIVE_TYPES.contains(&type_token)
}

/// Type found in a constructor parameter or a property of an inspected type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub type_token: String,
    /// The parameter or property accepts absence
    pub optional: bool,
}

impl Candidate {
    #[inline]
    #[must_use]
    pub fn new(type_token: impl Into<String>) -> Self {
        Self {
            type_token: type_token.into(),
            optional: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn optional(type_token: impl Into<String>) -> Self {
        Self {
            type_token: type_token.into(),
            optional: true,
        }
    }
}

/// Source of dependency candidates for a type token
pub trait ReflectionProvider: Send + Sync {
    /// # Errors
    /// Returns an error if the type can't be inspected
    fn constructor_candidates(&self, type_token: &str) -> anyhow::Result<Vec<Candidate>>;

    /// # Errors
    /// Returns an error if the type can't be inspected
    fn property_candidates(&self, type_token: &str) -> anyhow::Result<Vec<Candidate>> {
        let _ = type_token;
        Ok(Vec::new())
    }
}

/// Reflection data declared up front
#[derive(Debug, Clone, Default)]
pub struct StaticReflection {
    constructors: BTreeMap<String, Vec<Candidate>>,
    properties: BTreeMap<String, Vec<Candidate>>,
}

impl StaticReflection {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the type as known even if it has no candidates
    #[must_use]
    pub fn with_constructor<I>(mut self, type_token: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = Candidate>,
    {
        self.constructors.entry(type_token.into()).or_default().extend(candidates);
        self
    }

    #[must_use]
    pub fn with_properties<I>(mut self, type_token: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = Candidate>,
    {
        self.properties.entry(type_token.into()).or_default().extend(candidates);
        self
    }
}

impl ReflectionProvider for StaticReflection {
    fn constructor_candidates(&self, type_token: &str) -> anyhow::Result<Vec<Candidate>> {
        self.constructors
            .get(type_token)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Type `{type_token}` is not known"))
    }

    fn property_candidates(&self, type_token: &str) -> anyhow::Result<Vec<Candidate>> {
        Ok(self.properties.get(type_token).cloned().unwrap_or_default())
    }
}

/// Constructor candidates, or nothing if reflection fails
pub(crate) fn constructor_candidates_or_empty(reflection: &dyn ReflectionProvider, type_token: &str) -> Vec<Candidate> {
    reflection.constructor_candidates(type_token).unwrap_or_else(|err| {
        debug!(type_token, %err, "Constructor reflection failed");
        Vec::new()
    })
}

pub(crate) fn property_candidates_or_empty(reflection: &dyn ReflectionProvider, type_token: &str) -> Vec<Candidate> {
    reflection.property_candidates(type_token).unwrap_or_else(|err| {
        debug!(type_token, %err, "Property reflection failed");
        Vec::new()
    })
}

/// Builds `Constructor` and `Property` records for the non-primitive candidates of `type_token`.
/// Self-references are skipped.
#[must_use]
pub fn discover_dependencies(reflection: &dyn ReflectionProvider, id: &str, type_token: &str) -> Vec<DependencyRecord> {
    let constructor = constructor_candidates_or_empty(reflection, type_token)
        .into_iter()
        .map(|candidate| (candidate, DependencyKind::Constructor));
    let property = property_candidates_or_empty(reflection, type_token)
        .into_iter()
        .map(|candidate| (candidate, DependencyKind::Property));

    constructor
        .chain(property)
        .filter(|(candidate, _)| !is_primitive(&candidate.type_token))
        .filter_map(|(candidate, kind)| {
            DependencyRecord::new(id, candidate.type_token, kind)
                .ok()
                .map(|record| record.with_optional(candidate.optional))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{discover_dependencies, Candidate, ReflectionProvider as _, StaticReflection};
    use crate::dependency::DependencyKind;

    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_static_reflection() {
        let reflection = StaticReflection::new().with_constructor("Mailer", [Candidate::new("Logger")]);

        assert_eq!(reflection.constructor_candidates("Mailer").unwrap(), [Candidate::new("Logger")]);
        assert!(reflection.constructor_candidates("Unknown").is_err());
        assert!(reflection.property_candidates("Unknown").unwrap().is_empty());
    }

    #[test]
    #[traced_test]
    fn test_discover_dependencies() {
        let reflection = StaticReflection::new()
            .with_constructor(
                "App::Mailer",
                [Candidate::new("Logger"), Candidate::new("string"), Candidate::new("App::Mailer")],
            )
            .with_properties("App::Mailer", [Candidate::optional("Clock")]);

        let records = discover_dependencies(&reflection, "App::Mailer", "App::Mailer");
        let edges: Vec<_> = records
            .iter()
            .map(|record| (record.dependency(), record.kind(), record.is_optional()))
            .collect();

        assert_eq!(
            edges,
            [("Logger", DependencyKind::Constructor, false), ("Clock", DependencyKind::Property, true)]
        );
    }

    #[test]
    #[traced_test]
    fn test_reflection_failure_is_swallowed() {
        let records = discover_dependencies(&StaticReflection::new(), "Mailer", "Mailer");

        assert!(records.is_empty());
        assert!(logs_contain("Constructor reflection failed"));
    }
}
