use crate::domain::correction_request::{CorrectionRecord, NewCorrectionRequest};
use crate::domain::registry_snapshot::RegistrySnapshot;
use crate::domain::subscriber_repository::RepositoryError;
use async_trait::async_trait;
use chrono::NaiveDateTime;

#[async_trait]
pub trait CorrectionRepository: Send + Sync {
    async fn snapshot(&self) -> Result<RegistrySnapshot<CorrectionRecord>, RepositoryError>;

    async fn insert_request(
        &self,
        request: &NewCorrectionRequest,
        submitted_at: NaiveDateTime,
    ) -> Result<(), RepositoryError>;
}
