use crate::configuration::RemoteSettings;
use crate::domain::remote_store::{RemoteStore, RemoteStoreError};
use crate::registry::write_file_atomically;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use ssh2::{ErrorCode, HashType, Session, Sftp};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use telemetry::spawn_blocking_with_tracing;

const SFTP_NO_SUCH_FILE: i32 = 2;

/// Remote host reached over SFTP. A new session is opened for every
/// operation.
#[derive(Clone)]
pub struct SftpRemoteStore {
    host: String,
    port: u16,
    username: String,
    password: Secret<String>,
    directory: String,
    host_key_sha256: Option<String>,
    timeout: Duration,
}

impl SftpRemoteStore {
    pub fn new(settings: &RemoteSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            username: settings.username.clone(),
            password: settings.password.clone(),
            directory: settings.directory.clone(),
            host_key_sha256: settings.host_key_sha256.clone(),
            timeout: settings.timeout(),
        }
    }

    fn remote_path(&self, remote_name: &str) -> PathBuf {
        if self.directory.is_empty() {
            PathBuf::from(remote_name)
        } else {
            Path::new(&self.directory).join(remote_name)
        }
    }

    fn connect(&self) -> Result<Sftp, anyhow::Error> {
        let address = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("Failed to resolve {}", self.host))?
            .next()
            .ok_or_else(|| anyhow!("{} did not resolve to any address", self.host))?;
        let tcp = TcpStream::connect_timeout(&address, self.timeout)
            .with_context(|| format!("Failed to connect to {}:{}", self.host, self.port))?;

        let mut session = Session::new().context("Failed to create an SSH session")?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
        session.handshake().context("SSH handshake failed")?;

        if let Some(expected) = &self.host_key_sha256 {
            let actual = session
                .host_key_hash(HashType::Sha256)
                .map(to_hex)
                .ok_or_else(|| anyhow!("The server did not present a host key"))?;
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                return Err(anyhow!(
                    "Host key of {} does not match the pinned fingerprint",
                    self.host
                ));
            }
        }

        session
            .userauth_password(&self.username, self.password.expose_secret())
            .context("SSH password authentication failed")?;
        session.sftp().context("Failed to open the SFTP channel")
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn classify(e: ssh2::Error, remote_name: &str, action: &str) -> RemoteStoreError {
    if matches!(e.code(), ErrorCode::SFTP(SFTP_NO_SUCH_FILE)) {
        RemoteStoreError::NotFound(remote_name.to_string())
    } else {
        RemoteStoreError::UnexpectedError(
            anyhow::Error::new(e).context(format!("Failed to {} {}", action, remote_name)),
        )
    }
}

#[async_trait]
impl RemoteStore for SftpRemoteStore {
    #[tracing::instrument(name = "Downloading file over SFTP", skip(self), fields(host = %self.host))]
    async fn download(&self, remote_name: &str, local_path: &Path) -> Result<(), RemoteStoreError> {
        let store = self.clone();
        let name = remote_name.to_string();
        let bytes = spawn_blocking_with_tracing(move || -> Result<Vec<u8>, RemoteStoreError> {
            let sftp = store.connect()?;
            let mut file = sftp
                .open(&store.remote_path(&name))
                .map_err(|e| classify(e, &name, "open"))?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)
                .with_context(|| format!("Failed to read {}", name))?;
            Ok(bytes)
        })
        .await
        .context("The SFTP download task panicked")??;

        write_file_atomically(local_path, &bytes).await?;
        Ok(())
    }

    #[tracing::instrument(name = "Uploading file over SFTP", skip(self), fields(host = %self.host))]
    async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<(), RemoteStoreError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("Failed to read {}", local_path.display()))?;
        let store = self.clone();
        let name = remote_name.to_string();
        spawn_blocking_with_tracing(move || -> Result<(), RemoteStoreError> {
            let sftp = store.connect()?;
            let mut file = sftp
                .create(&store.remote_path(&name))
                .map_err(|e| classify(e, &name, "create"))?;
            file.write_all(&bytes)
                .with_context(|| format!("Failed to write {}", name))?;
            Ok(())
        })
        .await
        .context("The SFTP upload task panicked")?
    }

    #[tracing::instrument(name = "Deleting file over SFTP", skip(self), fields(host = %self.host))]
    async fn remove(&self, remote_name: &str) -> Result<(), RemoteStoreError> {
        let store = self.clone();
        let name = remote_name.to_string();
        spawn_blocking_with_tracing(move || -> Result<(), RemoteStoreError> {
            let sftp = store.connect()?;
            sftp.unlink(&store.remote_path(&name))
                .map_err(|e| classify(e, &name, "delete"))
        })
        .await
        .context("The SFTP delete task panicked")?
    }
}

#[cfg(test)]
mod tests {
    use super::{to_hex, SftpRemoteStore};
    use crate::configuration::RemoteSettings;
    use crate::domain::remote_store::{RemoteStore, RemoteStoreError};
    use claims::assert_matches;
    use secrecy::Secret;
    use std::path::PathBuf;

    fn settings(directory: &str) -> RemoteSettings {
        RemoteSettings {
            host: "127.0.0.1".into(),
            port: 1,
            username: "oasis".into(),
            password: Secret::new("secret".into()),
            directory: directory.into(),
            use_local: false,
            host_key_sha256: None,
            timeout_milliseconds: 200,
        }
    }

    #[test]
    fn remote_names_are_joined_to_the_directory() {
        let store = SftpRemoteStore::new(&settings("/srv/oasis"));
        assert_eq!(
            store.remote_path("registro.csv"),
            PathBuf::from("/srv/oasis/registro.csv")
        );
        let store = SftpRemoteStore::new(&settings(""));
        assert_eq!(store.remote_path("registro.csv"), PathBuf::from("registro.csv"));
    }

    #[test]
    fn fingerprints_are_lowercase_hex() {
        assert_eq!(to_hex(&[0x0a, 0xff, 0x10]), "0aff10");
    }

    #[tokio::test]
    async fn an_unreachable_host_is_an_unexpected_error() {
        let store = SftpRemoteStore::new(&settings("/srv/oasis"));
        let target = tempfile::tempdir().unwrap();

        let outcome = store
            .download("registro.csv", &target.path().join("registro.csv"))
            .await;

        assert_matches!(outcome, Err(RemoteStoreError::UnexpectedError(_)));
        assert!(!target.path().join("registro.csv").exists());
    }
}
