#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    #[error("Service identifier can't be empty")]
    EmptyIdentifier,
    #[error("Service type token can't be empty")]
    EmptyTypeToken,
    #[error("Dependent service identifier can't be empty")]
    EmptyDependent,
    #[error("Dependency service identifier can't be empty")]
    EmptyDependency,
    #[error("Service `{id}` can't depend on itself")]
    SelfDependency { id: String },
    #[error("Unknown dependency kind `{kind}`. Expected one of: constructor, property, method, setter, interface")]
    UnknownDependencyKind { kind: String },
    #[error("Unknown lifetime `{lifetime}`. Expected one of: singleton, scoped, transient")]
    UnknownLifetime { lifetime: String },
}
