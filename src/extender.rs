use core::any::Any;
use std::sync::Arc;

/// Identifier under which extenders apply to every service
pub const GLOBAL_EXTENDER: &str = "*";

/// Function run against an already resolved instance.
///
/// The registry only stores and orders extenders, the container applies them after instantiation.
pub trait Extender: Send + Sync + 'static {
    fn extend(&self, instance: &mut dyn Any);
}

pub type BoxedExtender = Arc<dyn Extender>;

impl<F> Extender for F
where
    F: Fn(&mut dyn Any) + Send + Sync + 'static,
{
    #[inline]
    fn extend(&self, instance: &mut dyn Any) {
        self(instance);
    }
}

#[inline]
#[must_use]
pub(crate) fn boxed_extender(extender: impl Extender) -> BoxedExtender {
    Arc::new(extender)
}
