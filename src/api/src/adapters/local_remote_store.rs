use crate::domain::remote_store::{RemoteStore, RemoteStoreError};
use crate::registry::write_file_atomically;
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A plain directory standing in for the remote host.
#[derive(Debug, Clone)]
pub struct LocalDirectoryRemoteStore {
    directory: PathBuf,
}

impl LocalDirectoryRemoteStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn remote_path(&self, remote_name: &str) -> PathBuf {
        self.directory.join(remote_name)
    }
}

fn not_found_or(e: std::io::Error, remote_name: &str, action: &str) -> RemoteStoreError {
    if e.kind() == std::io::ErrorKind::NotFound {
        RemoteStoreError::NotFound(remote_name.to_string())
    } else {
        RemoteStoreError::UnexpectedError(
            anyhow::Error::new(e).context(format!("Failed to {} {}", action, remote_name)),
        )
    }
}

#[async_trait]
impl RemoteStore for LocalDirectoryRemoteStore {
    #[tracing::instrument(name = "Copying file from the local remote directory", skip(self))]
    async fn download(&self, remote_name: &str, local_path: &Path) -> Result<(), RemoteStoreError> {
        let bytes = tokio::fs::read(self.remote_path(remote_name))
            .await
            .map_err(|e| not_found_or(e, remote_name, "read"))?;
        write_file_atomically(local_path, &bytes).await?;
        Ok(())
    }

    #[tracing::instrument(name = "Copying file to the local remote directory", skip(self))]
    async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<(), RemoteStoreError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("Failed to read {}", local_path.display()))?;
        write_file_atomically(&self.remote_path(remote_name), &bytes).await?;
        Ok(())
    }

    #[tracing::instrument(name = "Deleting file from the local remote directory", skip(self))]
    async fn remove(&self, remote_name: &str) -> Result<(), RemoteStoreError> {
        tokio::fs::remove_file(self.remote_path(remote_name))
            .await
            .map_err(|e| not_found_or(e, remote_name, "delete"))
    }
}

#[cfg(test)]
mod tests {
    use super::LocalDirectoryRemoteStore;
    use crate::domain::remote_store::{RemoteStore, RemoteStoreError};
    use claims::assert_matches;

    #[tokio::test]
    async fn files_round_trip_through_the_directory() {
        let remote = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let store = LocalDirectoryRemoteStore::new(remote.path());
        let source = local.path().join("origen.csv");
        let target = local.path().join("copia.csv");
        std::fs::write(&source, "Fecha\n").unwrap();

        store.upload(&source, "registro.csv").await.unwrap();
        store.download("registro.csv", &target).await.unwrap();

        assert_eq!(std::fs::read_to_string(target).unwrap(), "Fecha\n");
    }

    #[tokio::test]
    async fn missing_files_are_reported_as_not_found() {
        let remote = tempfile::tempdir().unwrap();
        let store = LocalDirectoryRemoteStore::new(remote.path());

        let download = store
            .download("nada.csv", &remote.path().join("copia.csv"))
            .await;
        let removal = store.remove("nada.csv").await;

        assert_matches!(download, Err(RemoteStoreError::NotFound(_)));
        assert_matches!(removal, Err(RemoteStoreError::NotFound(_)));
    }
}
