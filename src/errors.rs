mod graph;
mod store;
mod validation;

pub use graph::CycleErrorKind;
pub use store::StoreErrorKind;
pub use validation::ValidationErrorKind;
