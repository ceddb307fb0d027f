use crate::adapters::csv_table::{read_table, write_table, LongRows};
use crate::domain::correction_repository::CorrectionRepository;
use crate::domain::correction_request::{CorrectionRecord, NewCorrectionRequest, CORRECTION_HEADER};
use crate::domain::registry_snapshot::RegistrySnapshot;
use crate::domain::remote_store::RemoteStore;
use crate::domain::subscriber_repository::RepositoryError;
use crate::registry::RegistryFile;
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct CsvCorrectionRepository {
    file: RegistryFile,
    store: Arc<dyn RemoteStore>,
}

impl CsvCorrectionRepository {
    pub fn new(file: RegistryFile, store: Arc<dyn RemoteStore>) -> Self {
        Self { file, store }
    }

    async fn load(&self) -> Result<RegistrySnapshot<CorrectionRecord>, RepositoryError> {
        self.file.sync(self.store.as_ref()).await;

        if !self.file.exists().await {
            tracing::info!("Creating an empty correction registry");
            let empty = write_table::<CorrectionRecord>(&CORRECTION_HEADER, &[])?;
            self.file.write_local(&empty).await?;
        }

        let bytes = self.file.read_bytes().await?;
        let snapshot = read_table::<CorrectionRecord>(&bytes, LongRows::Skip)
            .context("Failed to parse the correction registry")?;
        if snapshot.malformed_rows > 0 {
            tracing::warn!(
                malformed_rows = snapshot.malformed_rows,
                "The correction registry has malformed rows"
            );
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl CorrectionRepository for CsvCorrectionRepository {
    #[tracing::instrument(name = "Reading the correction registry", skip(self))]
    async fn snapshot(&self) -> Result<RegistrySnapshot<CorrectionRecord>, RepositoryError> {
        let _guard = self.file.lock().await;
        self.load().await
    }

    #[tracing::instrument(
        name = "Registering a correction request",
        skip(self, request),
        fields(author_email = %request.email, article = %request.article.original_name)
    )]
    async fn insert_request(
        &self,
        request: &NewCorrectionRequest,
        submitted_at: NaiveDateTime,
    ) -> Result<(), RepositoryError> {
        let _guard = self.file.lock().await;
        let snapshot = self.load().await?;
        if snapshot.malformed_rows > 0 {
            return Err(RepositoryError::UnexpectedError(anyhow::anyhow!(
                "The correction registry has {} malformed rows and cannot be rewritten",
                snapshot.malformed_rows
            )));
        }
        let mut records = snapshot.records;

        records.push(request.into_record(submitted_at.format(TIMESTAMP_FORMAT).to_string()));

        let bytes = write_table(&CORRECTION_HEADER, &records)?;
        self.file
            .replace_with(&bytes, self.store.as_ref())
            .await
            .context("Failed to store the correction registry on the remote host")?;
        Ok(())
    }
}
