use std::path::Path;

use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("model download failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("model download request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to write model artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches a model artifact to a local destination. Injectable so tests
/// can substitute a local fixture for network I/O.
pub trait ArtifactResolver {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), DownloadError>;
}

/// Streams the artifact over HTTP GET, chunk by chunk, to disk.
#[derive(Clone, Default)]
pub struct HttpArtifactResolver {
    client: reqwest::Client,
}

impl HttpArtifactResolver {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl ArtifactResolver for HttpArtifactResolver {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), DownloadError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::Status(response.status()));
        }

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

/// Fetches the artifact on first use; a file already on disk is trusted
/// as-is and skipped.
pub async fn ensure_artifact<R: ArtifactResolver>(
    resolver: &R,
    url: &str,
    destination: &Path,
) -> Result<(), DownloadError> {
    if destination.exists() {
        log::info!("Model artifact already present at {}", destination.display());
        return Ok(());
    }

    log::info!("Downloading model artifact from {}", url);
    resolver.fetch(url, destination).await?;
    log::info!("Model artifact saved to {}", destination.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixtureResolver {
        payload: Vec<u8>,
        calls: AtomicUsize,
    }

    impl ArtifactResolver for FixtureResolver {
        async fn fetch(&self, _url: &str, destination: &Path) -> Result<(), DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            fs::write(destination, &self.payload).await?;
            Ok(())
        }
    }

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("artifact-{}.pt", uuid::Uuid::new_v4()))
    }

    #[actix_web::test]
    async fn fetches_when_artifact_is_absent() {
        let destination = scratch_path();
        let resolver = FixtureResolver {
            payload: b"weights".to_vec(),
            calls: AtomicUsize::new(0),
        };

        ensure_artifact(&resolver, "http://unused/model.pt", &destination)
            .await
            .unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(&destination).unwrap(), b"weights");
        std::fs::remove_file(&destination).unwrap();
    }

    #[actix_web::test]
    async fn skips_fetch_when_artifact_exists() {
        let destination = scratch_path();
        std::fs::write(&destination, b"existing").unwrap();
        let resolver = FixtureResolver {
            payload: b"weights".to_vec(),
            calls: AtomicUsize::new(0),
        };

        ensure_artifact(&resolver, "http://unused/model.pt", &destination)
            .await
            .unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&destination).unwrap(), b"existing");
        std::fs::remove_file(&destination).unwrap();
    }
}
