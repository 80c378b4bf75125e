use crate::model::{Advertisement, AdvertisementId, NewAdvertisement};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures a store can report.
///
/// Only `UniqueViolation` carries meaning for callers; everything else is an
/// infrastructure failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("uniqueness constraint violated: {0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Process-wide handle to the persistence engine.
#[async_trait::async_trait]
pub trait Store: Send + Sync + 'static {
    type Session: StoreSession + 'static;

    /// Open a session private to a single request.
    async fn open_session(&self) -> StoreResult<Self::Session>;
}

/// A unit of work against the store, valid for one request.
///
/// Writes become visible to other sessions only after `commit`. Anything
/// still pending when the session is closed is discarded.
#[async_trait::async_trait]
pub trait StoreSession: Send {
    async fn get(&mut self, id: AdvertisementId) -> StoreResult<Option<Advertisement>>;
    /// Stage a new row; the store assigns `id` and `created_at`.
    async fn add(&mut self, advertisement: NewAdvertisement) -> StoreResult<Advertisement>;
    /// Stage the current field values of an existing row. Returns `false`
    /// when no such row exists any more.
    async fn save(&mut self, advertisement: &Advertisement) -> StoreResult<bool>;
    async fn delete(&mut self, advertisement: &Advertisement) -> StoreResult<()>;
    async fn commit(&mut self) -> StoreResult<()>;
    /// Release the session. Consumes it so it cannot be closed twice.
    async fn close(self) -> StoreResult<()>;
}
