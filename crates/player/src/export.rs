use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::future::BoxFuture;

/// Hands a finished artifact to the user.
pub trait ArtifactExporter: Send + Sync {
    fn export_blob<'a>(
        &'a self,
        bytes: Bytes,
        suggested_name: &'a str,
    ) -> BoxFuture<'a, std::io::Result<PathBuf>>;
}

/// Writes artifacts into a directory, replacing files of the same name.
#[derive(Debug, Clone)]
pub struct DirectoryExporter {
    dir: PathBuf,
}

impl DirectoryExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactExporter for DirectoryExporter {
    fn export_blob<'a>(
        &'a self,
        bytes: Bytes,
        suggested_name: &'a str,
    ) -> BoxFuture<'a, std::io::Result<PathBuf>> {
        Box::pin(async move {
            let name = Path::new(suggested_name)
                .file_name()
                .ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("not a file name: {suggested_name:?}"),
                    )
                })?
                .to_owned();

            let target = self.dir.join(name);
            lumen_storage::fs::atomic_write_bytes_async(&target, &bytes).await?;
            tracing::info!(path = %target.display(), bytes = bytes.len(), "artifact_exported");
            Ok(target)
        })
    }
}

/// `"Morning Calm!"` becomes `"morning_calm_.wav"`.
pub fn track_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "track.wav".to_string()
    } else {
        format!("{stem}.wav")
    }
}
