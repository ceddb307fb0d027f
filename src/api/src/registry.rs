use crate::configuration::{RegistryFileSettings, RegistrySettings};
use crate::domain::remote_store::{RemoteStore, RemoteStoreError};
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// A file that lives on the remote host and is mirrored locally.
///
/// The lock only orders read-modify-write cycles of this process. Another
/// process editing the remote file at the same time can still lose an
/// update.
#[derive(Debug, Clone)]
pub struct RegistryFile {
    remote_name: String,
    local_path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl RegistryFile {
    pub fn new(remote_name: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            remote_name: remote_name.into(),
            local_path: local_path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_settings(settings: &RegistryFileSettings) -> Self {
        Self::new(settings.remote_file.clone(), settings.local_file.clone())
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Refreshes the local copy. Returns `false` when the remote host could
    /// not be reached and the local copy is used as is.
    #[tracing::instrument(name = "Syncing registry from the remote host", skip(self, store), fields(remote_name = %self.remote_name))]
    pub async fn sync(&self, store: &dyn RemoteStore) -> bool {
        match store.download(&self.remote_name, &self.local_path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Could not download {}, using the local version",
                    self.remote_name
                );
                false
            }
        }
    }

    #[tracing::instrument(name = "Pushing registry to the remote host", skip(self, store), fields(remote_name = %self.remote_name))]
    pub async fn push(&self, store: &dyn RemoteStore) -> Result<(), RemoteStoreError> {
        store.upload(&self.local_path, &self.remote_name).await
    }

    pub async fn write_local(&self, bytes: &[u8]) -> Result<(), anyhow::Error> {
        write_file_atomically(&self.local_path, bytes).await
    }

    pub async fn replace_with(
        &self,
        bytes: &[u8],
        store: &dyn RemoteStore,
    ) -> Result<(), RemoteStoreError> {
        self.write_local(bytes).await?;
        self.push(store).await
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>, anyhow::Error> {
        tokio::fs::read(&self.local_path)
            .await
            .with_context(|| format!("Failed to read {}", self.local_path.display()))
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.local_path)
            .await
            .unwrap_or(false)
    }

    pub async fn remove_local(&self) -> Result<(), anyhow::Error> {
        match tokio::fs::remove_file(&self.local_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to delete {}", self.local_path.display())),
        }
    }

    /// Name of the local copy, used when the file is sent as an attachment.
    pub fn file_name(&self) -> String {
        self.local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.remote_name)
            .to_string()
    }
}

/// Writes to a sibling temporary file first so readers never observe a
/// half-written registry.
pub async fn write_file_atomically(path: &Path, bytes: &[u8]) -> Result<(), anyhow::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("The registry path has no file name")?;
    let temporary = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    tokio::fs::write(&temporary, bytes)
        .await
        .with_context(|| format!("Failed to write {}", temporary.display()))?;
    if let Err(e) = tokio::fs::rename(&temporary, path).await {
        let _ = tokio::fs::remove_file(&temporary).await;
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Convocatorias,
    Correcciones,
}

impl RegistryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Convocatorias => "convocatorias",
            Self::Correcciones => "correcciones",
        }
    }

    /// Every accepted spelling of the email column. An uploaded replacement
    /// must carry one of them.
    pub fn email_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Convocatorias => &["Correo electronico", "Correo Electronico"],
            Self::Correcciones => &["Email"],
        }
    }
}

/// The three files the service mirrors from the remote host.
#[derive(Debug, Clone)]
pub struct Registries {
    pub convocatorias: RegistryFile,
    pub correcciones: RegistryFile,
    pub convocatoria_pdf: RegistryFile,
}

impl Registries {
    pub fn from_settings(settings: &RegistrySettings) -> Self {
        Self {
            convocatorias: RegistryFile::from_settings(&settings.convocatorias),
            correcciones: RegistryFile::from_settings(&settings.correcciones),
            convocatoria_pdf: RegistryFile::from_settings(&settings.convocatoria_pdf),
        }
    }

    pub fn get(&self, kind: RegistryKind) -> &RegistryFile {
        match kind {
            RegistryKind::Convocatorias => &self.convocatorias,
            RegistryKind::Correcciones => &self.correcciones,
        }
    }
}
