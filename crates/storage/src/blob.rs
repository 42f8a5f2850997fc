use std::path::{Path, PathBuf};

use bytes::Bytes;
use lumen_audio_utils::{WAV_HEADER_LEN, WavHeader};
use tokio::io::AsyncReadExt;

/// A finalized WAV file on disk. Cheap to clone; reads go to storage each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    path: PathBuf,
    len: u64,
    channels: u16,
    sample_rate: u32,
}

impl AudioBlob {
    pub(crate) fn new(path: PathBuf, len: u64, channels: u16, sample_rate: u32) -> Self {
        Self {
            path,
            len,
            channels,
            sample_rate,
        }
    }

    /// Opens an existing WAV file with a canonical 44-byte header.
    pub async fn open(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();
        let mut file = tokio::fs::File::open(&path).await?;
        let len = file.metadata().await?.len();

        let mut header = [0u8; WAV_HEADER_LEN];
        if len < WAV_HEADER_LEN as u64 {
            return Err(crate::Error::NotWav { path });
        }
        file.read_exact(&mut header).await?;
        let Some(header) = WavHeader::parse(&header) else {
            return Err(crate::Error::NotWav { path });
        };

        Ok(Self::new(path, len, header.channels, header.sample_rate))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total length in bytes, header included.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.data_len() == 0
    }

    pub fn data_len(&self) -> u64 {
        self.len.saturating_sub(WAV_HEADER_LEN as u64)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> f64 {
        let bytes_per_second = self.sample_rate as u64 * self.channels as u64 * 2;
        if bytes_per_second == 0 {
            return 0.0;
        }
        self.data_len() as f64 / bytes_per_second as f64
    }

    pub fn suggested_file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session.wav".to_string())
    }

    pub async fn read(&self) -> crate::Result<Bytes> {
        Ok(Bytes::from(tokio::fs::read(&self.path).await?))
    }

    /// Deletes the backing file. Never fails; problems are only logged.
    pub async fn remove(self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "audio_blob_removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "audio_blob_remove_failed")
            }
        }
    }
}
