use std::collections::{BTreeMap, BTreeSet};

use crate::{errors::ValidationErrorKind, lifetime::Lifetime, payload::Payload};

/// Description of how one service is built
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionRecord {
    pub(crate) identifier: String,
    pub(crate) concrete: Option<Payload>,
    pub(crate) lifetime: Lifetime,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) arguments: BTreeMap<String, Payload>,
}

impl DefinitionRecord {
    /// Creates a transient definition without concrete, tags and arguments.
    ///
    /// # Errors
    /// - Returns [`ValidationErrorKind::EmptyIdentifier`] if the identifier is empty
    pub fn new(identifier: impl Into<String>) -> Result<Self, ValidationErrorKind> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(ValidationErrorKind::EmptyIdentifier);
        }

        Ok(Self {
            identifier,
            concrete: None,
            lifetime: Lifetime::default(),
            tags: BTreeSet::new(),
            arguments: BTreeMap::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn with_concrete(mut self, concrete: Payload) -> Self {
        self.concrete = Some(concrete);
        self
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
    pub fn with_argument(mut self, name: impl Into<String>, value: Payload) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }
}

impl DefinitionRecord {
    #[inline]
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[inline]
    #[must_use]
    pub fn concrete(&self) -> Option<&Payload> {
        self.concrete.as_ref()
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
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &BTreeMap<String, Payload> {
        &self.arguments
    }

    #[inline]
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Payload> {
        self.arguments.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::DefinitionRecord;
    use crate::{errors::ValidationErrorKind, lifetime::Lifetime, payload::Payload};

    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_empty_identifier() {
        assert_eq!(DefinitionRecord::new(""), Err(ValidationErrorKind::EmptyIdentifier));
        assert_eq!(DefinitionRecord::new("  "), Err(ValidationErrorKind::EmptyIdentifier));
    }

    #[test]
    #[traced_test]
    fn test_builder() {
        let record = DefinitionRecord::new("Mailer")
            .unwrap()
            .with_concrete(Payload::alias("SmtpMailer"))
            .with_lifetime(Lifetime::Singleton)
            .with_tags(["mail", "io", "mail"])
            .with_argument("host", Payload::value("localhost"));

        assert_eq!(record.identifier(), "Mailer");
        assert_eq!(record.concrete(), Some(&Payload::alias("SmtpMailer")));
        assert_eq!(record.lifetime(), Lifetime::Singleton);
        assert_eq!(record.tags().len(), 2);
        assert!(record.has_tag("io"));
        assert_eq!(record.argument("host").and_then(Payload::downcast_ref::<&str>), Some(&"localhost"));
        assert!(record.argument("port").is_none());
    }
}
