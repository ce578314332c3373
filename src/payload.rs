use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
    ptr,
};
use std::sync::Arc;

pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Opaque build or override instruction.
///
/// The registry stores and returns payloads but never invokes or inspects them,
/// instantiation belongs to the container that consumes the registry.
#[derive(Clone)]
pub enum Payload {
    /// Ready-made value, shared as is
    Value(AnyValue),
    /// Reference to a factory known to the container
    FactoryRef(String),
    /// Another identifier to resolve instead
    Alias(String),
}

impl Payload {
    #[inline]
    #[must_use]
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::Value(Arc::new(value))
    }

    #[inline]
    #[must_use]
    pub fn factory(id: impl Into<String>) -> Self {
        Self::FactoryRef(id.into())
    }

    #[inline]
    #[must_use]
    pub fn alias(id: impl Into<String>) -> Self {
        Self::Alias(id.into())
    }

    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Payload::Value(value) => value.downcast_ref(),
            Payload::FactoryRef(_) | Payload::Alias(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_alias(&self) -> Option<&str> {
        match self {
            Payload::Alias(id) => Some(id),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_factory(&self) -> Option<&str> {
        match self {
            Payload::FactoryRef(id) => Some(id),
            _ => None,
        }
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Value(a), Payload::Value(b)) => ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Payload::FactoryRef(a), Payload::FactoryRef(b)) | (Payload::Alias(a), Payload::Alias(b)) => a == b,
            _ => false,
        }
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Value(_) => f.write_str("Value(..)"),
            Payload::FactoryRef(id) => f.debug_tuple("FactoryRef").field(id).finish(),
            Payload::Alias(id) => f.debug_tuple("Alias").field(id).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Payload;

    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_value_identity() {
        let value = Payload::value(42u32);
        let cloned = value.clone();
        assert_eq!(value, cloned);
        assert_ne!(value, Payload::value(42u32));
        assert_eq!(value.downcast_ref::<u32>(), Some(&42));
        assert_eq!(value.downcast_ref::<i64>(), None);
    }

    #[test]
    #[traced_test]
    fn test_references() {
        assert_eq!(Payload::alias("Logger"), Payload::alias("Logger"));
        assert_ne!(Payload::alias("Logger"), Payload::factory("Logger"));
        assert_eq!(Payload::alias("Logger").as_alias(), Some("Logger"));
        assert_eq!(Payload::factory("make_logger").as_factory(), Some("make_logger"));
        assert_eq!(Payload::factory("make_logger").as_alias(), None);
    }
}
