use std::future::Future;
use std::pin::Pin;

use crate::error::{ApiError, ApiResult};
use crate::store::traits::{Store, StoreError, StoreSession};

/// Work run against a borrowed request session.
pub type SessionFuture<'s, T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send + 's>>;

/// Run `work` inside a freshly opened session and release the session
/// afterwards, whatever `work` returned.
///
/// A failure to release is logged and swallowed: the caller always gets the
/// outcome of `work`.
pub async fn with_session<S, T, F>(store: &S, work: F) -> ApiResult<T>
where
    S: Store,
    T: Send,
    F: for<'s> FnOnce(&'s mut S::Session) -> SessionFuture<'s, T>,
{
    let mut session = store.open_session().await.map_err(open_failure)?;

    let outcome = work(&mut session).await;

    if let Err(err) = session.close().await {
        log::warn!("failed to close store session: {err:#}");
    }

    outcome
}

fn open_failure(err: StoreError) -> ApiError {
    ApiError::Internal(anyhow::Error::new(err).context("Failed to open store session"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SessionStats};

    #[tokio::test]
    async fn test_session_released_after_success() {
        let store = MemoryStore::new();

        let value = with_session(&store, |_session| Box::pin(async { Ok::<_, ApiError>(7) }))
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(
            store.session_stats(),
            SessionStats { opened: 1, closed: 1, live: 0 }
        );
    }

    #[tokio::test]
    async fn test_session_released_after_domain_error() {
        let store = MemoryStore::new();

        let result: ApiResult<()> =
            with_session(&store, |_session| Box::pin(async { Err::<(), _>(ApiError::NotFound) })).await;

        assert!(matches!(result, Err(ApiError::NotFound)));
        assert_eq!(
            store.session_stats(),
            SessionStats { opened: 1, closed: 1, live: 0 }
        );
    }

    #[tokio::test]
    async fn test_close_failure_does_not_mask_outcome() {
        let store = MemoryStore::new();
        store.set_close_failure(true);

        let value = with_session(&store, |_session| Box::pin(async { Ok::<_, ApiError>("done") }))
            .await
            .unwrap();

        assert_eq!(value, "done");
        assert_eq!(store.session_stats().closed, 1);
        assert_eq!(store.session_stats().live, 0);
    }
}
