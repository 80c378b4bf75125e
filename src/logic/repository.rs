use crate::error::{ApiError, ApiResult};
use crate::logic::validate::FieldMap;
use crate::model::{Advertisement, AdvertisementId, NewAdvertisement};
use crate::store::traits::{StoreError, StoreSession};

/// Advertisement operations bound to one request session.
///
/// Every write is committed before the method returns.
pub struct AdvertisementRepository<'s, T: StoreSession> {
    session: &'s mut T,
}

impl<'s, T: StoreSession> AdvertisementRepository<'s, T> {
    pub fn new(session: &'s mut T) -> Self {
        Self { session }
    }

    pub async fn get(&mut self, id: AdvertisementId) -> ApiResult<Advertisement> {
        self.session
            .get(id)
            .await
            .map_err(|e| fatal(e, "Failed to load advertisement"))?
            .ok_or(ApiError::NotFound)
    }

    pub async fn create(&mut self, advertisement: NewAdvertisement) -> ApiResult<Advertisement> {
        let created = self
            .session
            .add(advertisement)
            .await
            .map_err(persist_failure)?;
        self.session.commit().await.map_err(persist_failure)?;
        Ok(created)
    }

    /// Apply each field onto `advertisement`, then persist it. `NotFound` if
    /// the row was deleted after it was loaded.
    pub async fn update(
        &mut self,
        advertisement: &mut Advertisement,
        fields: FieldMap,
    ) -> ApiResult<()> {
        for value in fields {
            advertisement.apply(value);
        }
        let exists = self
            .session
            .save(advertisement)
            .await
            .map_err(persist_failure)?;
        if !exists {
            return Err(ApiError::NotFound);
        }
        self.session.commit().await.map_err(persist_failure)
    }

    /// Remove an advertisement previously resolved through [`Self::get`].
    pub async fn delete(&mut self, advertisement: Advertisement) -> ApiResult<()> {
        self.session
            .delete(&advertisement)
            .await
            .map_err(|e| fatal(e, "Failed to delete advertisement"))?;
        self.session
            .commit()
            .await
            .map_err(|e| fatal(e, "Failed to commit advertisement deletion"))
    }
}

/// Uniqueness violations are the only store failure a write may recover from.
fn persist_failure(err: StoreError) -> ApiError {
    match err {
        StoreError::UniqueViolation(detail) => {
            log::info!("advertisement rejected by uniqueness constraint: {detail}");
            ApiError::Conflict
        }
        other => fatal(other, "Failed to persist advertisement"),
    }
}

fn fatal(err: StoreError, action: &'static str) -> ApiError {
    ApiError::Internal(anyhow::Error::new(err).context(action))
}
