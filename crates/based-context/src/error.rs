use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache entry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Failure while assembling a history window from cache and store
#[derive(Error, Debug)]
pub enum ContextError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Persist(#[from] based_persist::PersistError),
}
