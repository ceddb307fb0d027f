use crate::utils::error_chain_fmt;
use async_trait::async_trait;
use std::path::Path;

#[derive(thiserror::Error)]
pub enum RemoteStoreError {
    #[error("{0} does not exist on the remote host.")]
    NotFound(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for RemoteStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// The directory on the remote host that holds the registries. Names are
/// relative to that directory.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Replaces `local_path` with the remote file. The local file is left
    /// untouched when the download fails.
    async fn download(&self, remote_name: &str, local_path: &Path) -> Result<(), RemoteStoreError>;

    async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<(), RemoteStoreError>;

    async fn remove(&self, remote_name: &str) -> Result<(), RemoteStoreError>;
}
