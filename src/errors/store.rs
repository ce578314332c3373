#[derive(thiserror::Error, Debug)]
pub enum StoreErrorKind {
    #[error("Record `{id}` not found")]
    NotFound { id: String },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
