use crate::domain::registry_snapshot::RegistrySnapshot;
use crate::domain::status::Status;
use crate::domain::subscriber::{NewSubscriber, SubscriberRecord};
use crate::domain::subscriber_email::SubscriberEmail;
use crate::utils::error_chain_fmt;
use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} is already registered.")]
    AlreadyRegistered(String),
    #[error("There is no registration for {0}.")]
    SubscriberNotFound(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// The convocatoria mailing list. Every operation refreshes the local copy
/// from the remote host first, and every write is pushed back before it
/// returns.
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    async fn snapshot(&self) -> Result<RegistrySnapshot<SubscriberRecord>, RepositoryError>;

    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<SubscriberRecord>, RepositoryError>;

    async fn insert_subscriber(
        &self,
        new_subscriber: &NewSubscriber,
        registered_on: NaiveDate,
    ) -> Result<(), RepositoryError>;

    /// Returns the row as stored after the change.
    async fn set_status(
        &self,
        email: &SubscriberEmail,
        status: Status,
    ) -> Result<SubscriberRecord, RepositoryError>;

    async fn update_and_reactivate(
        &self,
        current_email: &SubscriberEmail,
        update: &NewSubscriber,
        updated_on: NaiveDate,
    ) -> Result<(), RepositoryError>;

    /// Adds one to the broadcast counter row and returns the new count.
    async fn record_broadcast(
        &self,
        counter_email: &SubscriberEmail,
        sent_on: NaiveDate,
    ) -> Result<u64, RepositoryError>;
}
