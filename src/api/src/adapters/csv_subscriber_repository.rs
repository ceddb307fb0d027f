use crate::adapters::csv_table::{read_table, write_table, LongRows};
use crate::domain::registry_snapshot::RegistrySnapshot;
use crate::domain::remote_store::RemoteStore;
use crate::domain::status::Status;
use crate::domain::subscriber::{parse_counter, NewSubscriber, SubscriberRecord, SUBSCRIBER_HEADER};
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_repository::{RepositoryError, SubscriberRepository};
use crate::registry::RegistryFile;
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The subscriber list kept in a CSV file mirrored from the remote host.
#[derive(Clone)]
pub struct CsvSubscriberRepository {
    file: RegistryFile,
    store: Arc<dyn RemoteStore>,
}

impl CsvSubscriberRepository {
    pub fn new(file: RegistryFile, store: Arc<dyn RemoteStore>) -> Self {
        Self { file, store }
    }

    /// Syncs and parses the registry. The caller must hold the file lock.
    async fn load(
        &self,
        long_rows: LongRows,
    ) -> Result<RegistrySnapshot<SubscriberRecord>, RepositoryError> {
        self.file.sync(self.store.as_ref()).await;

        if !self.file.exists().await {
            tracing::info!("Creating an empty subscriber registry");
            let empty = write_table::<SubscriberRecord>(&SUBSCRIBER_HEADER, &[])?;
            self.file.write_local(&empty).await?;
        }

        let bytes = self.file.read_bytes().await?;
        let mut snapshot = read_table::<SubscriberRecord>(&bytes, long_rows)
            .context("Failed to parse the subscriber registry")?;
        snapshot.records = snapshot
            .records
            .into_iter()
            .map(SubscriberRecord::normalized)
            .collect();
        if snapshot.malformed_rows > 0 {
            tracing::warn!(
                malformed_rows = snapshot.malformed_rows,
                "The subscriber registry has malformed rows"
            );
        }
        Ok(snapshot)
    }

    /// Loads every row that will be written back. Rows longer than the header
    /// keep their leading fields; any row that still cannot be read blocks
    /// the write. The caller must hold the file lock.
    async fn load_for_update(&self) -> Result<Vec<SubscriberRecord>, RepositoryError> {
        let snapshot = self.load(LongRows::Truncate).await?;
        if snapshot.malformed_rows > 0 {
            return Err(RepositoryError::UnexpectedError(anyhow::anyhow!(
                "The subscriber registry has {} unreadable rows and cannot be rewritten",
                snapshot.malformed_rows
            )));
        }
        Ok(snapshot.records)
    }

    /// Writes the records locally and pushes them to the remote host. The
    /// caller must hold the file lock.
    async fn save(&self, records: &[SubscriberRecord]) -> Result<(), RepositoryError> {
        let bytes = write_table(&SUBSCRIBER_HEADER, records)?;
        self.file
            .replace_with(&bytes, self.store.as_ref())
            .await
            .context("Failed to store the subscriber registry on the remote host")?;
        Ok(())
    }
}

#[async_trait]
impl SubscriberRepository for CsvSubscriberRepository {
    #[tracing::instrument(name = "Reading the subscriber registry", skip(self))]
    async fn snapshot(&self) -> Result<RegistrySnapshot<SubscriberRecord>, RepositoryError> {
        let _guard = self.file.lock().await;
        self.load(LongRows::Skip).await
    }

    #[tracing::instrument(name = "Looking up a subscriber", skip(self), fields(subscriber_email = %email))]
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<SubscriberRecord>, RepositoryError> {
        let _guard = self.file.lock().await;
        let snapshot = self.load(LongRows::Truncate).await?;
        Ok(snapshot.records.into_iter().find(|r| r.has_email(email)))
    }

    #[tracing::instrument(
        name = "Registering a new subscriber",
        skip(self, new_subscriber),
        fields(subscriber_email = %new_subscriber.email)
    )]
    async fn insert_subscriber(
        &self,
        new_subscriber: &NewSubscriber,
        registered_on: NaiveDate,
    ) -> Result<(), RepositoryError> {
        let _guard = self.file.lock().await;
        let mut records = self.load_for_update().await?;

        if records.iter().any(|r| r.has_email(&new_subscriber.email)) {
            return Err(RepositoryError::AlreadyRegistered(
                new_subscriber.email.to_string(),
            ));
        }

        records.push(new_subscriber.into_record(registered_on.format(DATE_FORMAT).to_string()));
        self.save(&records).await
    }

    #[tracing::instrument(name = "Changing a subscriber status", skip(self), fields(subscriber_email = %email))]
    async fn set_status(
        &self,
        email: &SubscriberEmail,
        status: Status,
    ) -> Result<SubscriberRecord, RepositoryError> {
        let _guard = self.file.lock().await;
        let mut records = self.load_for_update().await?;

        let record = records
            .iter_mut()
            .find(|r| r.has_email(email))
            .ok_or_else(|| RepositoryError::SubscriberNotFound(email.to_string()))?;
        record.status = status;
        let updated = record.clone();

        self.save(&records).await?;
        Ok(updated)
    }

    #[tracing::instrument(
        name = "Updating and reactivating a subscriber",
        skip(self, update),
        fields(subscriber_email = %current_email, new_email = %update.email)
    )]
    async fn update_and_reactivate(
        &self,
        current_email: &SubscriberEmail,
        update: &NewSubscriber,
        updated_on: NaiveDate,
    ) -> Result<(), RepositoryError> {
        let _guard = self.file.lock().await;
        let mut records = self.load_for_update().await?;

        let position = records
            .iter()
            .position(|r| r.has_email(current_email))
            .ok_or_else(|| RepositoryError::SubscriberNotFound(current_email.to_string()))?;
        let taken = records
            .iter()
            .enumerate()
            .any(|(i, r)| i != position && r.has_email(&update.email));
        if taken {
            return Err(RepositoryError::AlreadyRegistered(update.email.to_string()));
        }

        records[position] = update.into_record(updated_on.format(DATE_FORMAT).to_string());
        self.save(&records).await
    }

    #[tracing::instrument(name = "Counting a convocatoria broadcast", skip(self))]
    async fn record_broadcast(
        &self,
        counter_email: &SubscriberEmail,
        sent_on: NaiveDate,
    ) -> Result<u64, RepositoryError> {
        let _guard = self.file.lock().await;
        let mut records = self.load_for_update().await?;
        let date = sent_on.format(DATE_FORMAT).to_string();

        let count = match records.iter_mut().find(|r| r.is_counter(counter_email)) {
            Some(counter) => {
                let count = parse_counter(&counter.employee_number) + 1;
                counter.employee_number = count.to_string();
                counter.date = date;
                count
            }
            None => {
                records.push(SubscriberRecord::counter(counter_email, 1, date));
                1
            }
        };

        self.save(&records).await?;
        tracing::info!(broadcasts_sent = count, "Broadcast counter updated");
        Ok(count)
    }
}
