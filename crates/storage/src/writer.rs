use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use lumen_audio_utils::{SPEECH_CHANNELS, SPEECH_SAMPLE_RATE, WAV_HEADER_LEN, WavHeader};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufWriter};

use crate::{AudioBlob, Error, StorageRuntime};

// RIFF size is `data + 36` and has to fit in a u32.
const MAX_DATA_LEN: u64 = u32::MAX as u64 - (WAV_HEADER_LEN as u64 - 8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Uninitialized,
    Open,
    Finalized,
    Aborted,
    Removed,
}

/// Append-only WAV file writer.
///
/// `init` reserves a zeroed 44-byte header, `append_chunk` streams raw PCM in
/// call order, and `finalize` patches the header from the file length that
/// storage reports. The whole payload is never held in memory.
#[derive(Debug)]
pub struct StreamingWavWriter {
    path: PathBuf,
    channels: u16,
    sample_rate: u32,
    state: WriterState,
    sink: Option<BufWriter<File>>,
    appended: u64,
}

impl StreamingWavWriter {
    /// A writer for mono 24 kHz speech.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_format(path, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE)
    }

    pub fn with_format(path: impl Into<PathBuf>, channels: u16, sample_rate: u32) -> Self {
        Self {
            path: path.into(),
            channels,
            sample_rate,
            state: WriterState::Uninitialized,
            sink: None,
            appended: 0,
        }
    }

    /// Opens `destination` under the runtime's base directory.
    pub async fn create<R: StorageRuntime + ?Sized>(
        runtime: &R,
        destination: &str,
    ) -> crate::Result<Self> {
        let base = runtime.audio_base()?;
        let mut writer = Self::new(base.join(destination));
        writer.init().await?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Bytes accepted by `append_chunk` so far. Diagnostic only; the header
    /// is computed from the file length instead.
    pub fn appended_bytes(&self) -> u64 {
        self.appended
    }

    fn expect_state(&self, operation: &'static str, expected: WriterState) -> crate::Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn finalize_error(&self, reason: impl Into<String>) -> Error {
        Error::Finalize {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    pub async fn init(&mut self) -> crate::Result<()> {
        self.expect_state("init", WriterState::Uninitialized)?;

        let unavailable = |source: std::io::Error| Error::StorageUnavailable {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(unavailable)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .await
            .map_err(unavailable)?;

        let mut sink = BufWriter::new(file);
        if let Err(e) = sink.write_all(&[0u8; WAV_HEADER_LEN]).await {
            self.state = WriterState::Aborted;
            return Err(Error::Write(e));
        }

        self.sink = Some(sink);
        self.appended = 0;
        self.state = WriterState::Open;

        tracing::debug!(path = %self.path.display(), "wav_writer_opened");
        Ok(())
    }

    pub async fn append_chunk(&mut self, bytes: &[u8]) -> crate::Result<()> {
        self.expect_state("append", WriterState::Open)?;
        let Some(sink) = self.sink.as_mut() else {
            return Err(Error::InvalidState {
                operation: "append",
                state: self.state,
            });
        };

        sink.write_all(bytes).await.map_err(Error::Write)?;
        self.appended += bytes.len() as u64;
        Ok(())
    }

    pub async fn finalize(&mut self) -> crate::Result<AudioBlob> {
        self.expect_state("finalize", WriterState::Open)?;

        match self.close_and_patch().await {
            Ok(blob) => {
                self.state = WriterState::Finalized;
                tracing::info!(
                    path = %self.path.display(),
                    bytes = blob.len(),
                    duration_secs = blob.duration(),
                    "wav_writer_finalized"
                );
                Ok(blob)
            }
            Err(e) => {
                self.state = WriterState::Aborted;
                Err(e)
            }
        }
    }

    async fn close_and_patch(&mut self) -> crate::Result<AudioBlob> {
        let Some(mut sink) = self.sink.take() else {
            return Err(self.finalize_error("stream already closed"));
        };

        sink.flush().await.map_err(Error::Write)?;
        let file = sink.into_inner();
        file.sync_all().await.map_err(Error::Write)?;
        drop(file);

        let total = self.patch_header().await?;
        Ok(AudioBlob::new(
            self.path.clone(),
            total,
            self.channels,
            self.sample_rate,
        ))
    }

    /// Reads the file length back from storage and writes the matching
    /// header. Returns the total file length.
    async fn patch_header(&self) -> crate::Result<u64> {
        let total = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.finalize_error(format!("reading back length: {e}")))?
            .len();
        let data_len = total
            .checked_sub(WAV_HEADER_LEN as u64)
            .ok_or_else(|| self.finalize_error(format!("{total} bytes is shorter than a header")))?;
        if data_len > MAX_DATA_LEN {
            return Err(self.finalize_error(format!("{data_len} data bytes exceed the RIFF limit")));
        }

        if data_len != self.appended {
            tracing::warn!(
                path = %self.path.display(),
                appended = self.appended,
                on_disk = data_len,
                "wav_writer_size_drift"
            );
        }

        let header = WavHeader::new(self.channels, self.sample_rate, data_len as u32);
        let patch_error = |e: std::io::Error| self.finalize_error(format!("patching header: {e}"));
        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .map_err(patch_error)?;
        file.seek(SeekFrom::Start(0)).await.map_err(patch_error)?;
        file.write_all(&header.to_bytes()).await.map_err(patch_error)?;
        file.sync_all().await.map_err(patch_error)?;

        Ok(total)
    }

    /// Drops the open stream without patching the header.
    pub fn abort(&mut self) {
        if self.state != WriterState::Open {
            return;
        }
        self.sink = None;
        self.state = WriterState::Aborted;
        tracing::debug!(path = %self.path.display(), "wav_writer_aborted");
    }

    /// Deletes the backing file. Never fails; problems are only logged.
    pub async fn cleanup(&mut self) {
        self.sink = None;
        if matches!(
            self.state,
            WriterState::Uninitialized | WriterState::Removed
        ) {
            return;
        }

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "wav_writer_removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "wav_writer_cleanup_failed")
            }
        }
        self.state = WriterState::Removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalStorage;
    use tempfile::tempdir;

    fn header_of(path: &Path) -> WavHeader {
        let bytes = std::fs::read(path).unwrap();
        WavHeader::parse(&bytes).unwrap()
    }

    #[tokio::test]
    async fn many_small_appends_are_counted_from_disk() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("small.wav");

        let mut writer = StreamingWavWriter::new(&path);
        writer.init().await.unwrap();
        for i in 0..1000u32 {
            writer.append_chunk(&[(i % 251) as u8; 38]).await.unwrap();
        }
        let blob = writer.finalize().await.unwrap();

        let total = std::fs::metadata(&path).unwrap().len();
        assert_eq!(total, 44 + 38_000);
        assert_eq!(blob.len(), total);

        let header = header_of(&path);
        assert_eq!(header.data_len, 38_000);
        assert_eq!(header.riff_len() as u64, total - 8);
        assert_eq!(header.sample_rate, 24_000);
        assert_eq!(header.channels, 1);
        assert_eq!(writer.state(), WriterState::Finalized);
    }

    #[tokio::test]
    async fn large_append_is_patched() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("large.wav");
        let payload = vec![7u8; 6 * 1024 * 1024];

        let mut writer = StreamingWavWriter::new(&path);
        writer.init().await.unwrap();
        writer.append_chunk(&payload).await.unwrap();
        let blob = writer.finalize().await.unwrap();

        assert_eq!(header_of(&path).data_len as usize, payload.len());
        assert_eq!(blob.data_len() as usize, payload.len());
    }

    #[tokio::test]
    async fn payload_order_is_preserved_and_readable() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("ordered.wav");

        let mut writer = StreamingWavWriter::new(&path);
        writer.init().await.unwrap();
        for sample in [1i16, -2, 3, -4] {
            writer.append_chunk(&sample.to_le_bytes()).await.unwrap();
        }
        let blob = writer.finalize().await.unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, -2, 3, -4]);

        let bytes = blob.read().await.unwrap();
        assert_eq!(bytes.len(), 52);
        assert_eq!(blob.read().await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn finalize_without_appends_yields_empty_wav() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("empty.wav");

        let mut writer = StreamingWavWriter::new(&path);
        writer.init().await.unwrap();
        let blob = writer.finalize().await.unwrap();

        assert!(blob.is_empty());
        assert_eq!(header_of(&path).data_len, 0);
    }

    #[tokio::test]
    async fn rejects_operations_outside_open_state() {
        let temp = tempdir().unwrap();
        let mut writer = StreamingWavWriter::new(temp.path().join("state.wav"));

        assert!(matches!(
            writer.append_chunk(&[0, 0]).await,
            Err(Error::InvalidState {
                operation: "append",
                state: WriterState::Uninitialized
            })
        ));
        assert!(writer.finalize().await.is_err());

        writer.init().await.unwrap();
        assert!(matches!(
            writer.init().await,
            Err(Error::InvalidState { .. })
        ));

        writer.finalize().await.unwrap();
        assert!(matches!(
            writer.finalize().await,
            Err(Error::InvalidState {
                state: WriterState::Finalized,
                ..
            })
        ));
        assert!(writer.append_chunk(&[0, 0]).await.is_err());
    }

    #[tokio::test]
    async fn directory_at_destination_is_unavailable() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("taken.wav");
        std::fs::create_dir(&path).unwrap();

        let mut writer = StreamingWavWriter::new(&path);
        assert!(matches!(
            writer.init().await,
            Err(Error::StorageUnavailable { .. })
        ));
        assert_eq!(writer.state(), WriterState::Uninitialized);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn vanished_file_fails_finalize() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vanished.wav");

        let mut writer = StreamingWavWriter::new(&path);
        writer.init().await.unwrap();
        writer.append_chunk(&[1, 2, 3, 4]).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            writer.finalize().await,
            Err(Error::Finalize { .. })
        ));
        assert_eq!(writer.state(), WriterState::Aborted);
    }

    #[tokio::test]
    async fn header_patch_errors_are_finalize_errors() {
        let temp = tempdir().unwrap();
        let writer = StreamingWavWriter::new(temp.path().join("never_opened.wav"));

        assert!(matches!(
            writer.patch_header().await,
            Err(Error::Finalize { .. })
        ));
    }

    #[tokio::test]
    async fn abort_then_cleanup_removes_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("aborted.wav");

        let mut writer = StreamingWavWriter::new(&path);
        writer.init().await.unwrap();
        writer.append_chunk(&[1, 2, 3, 4]).await.unwrap();
        writer.abort();

        assert_eq!(writer.state(), WriterState::Aborted);
        assert!(writer.finalize().await.is_err());

        writer.cleanup().await;
        assert_eq!(writer.state(), WriterState::Removed);
        assert!(!path.exists());

        writer.cleanup().await;
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gone.wav");

        let mut writer = StreamingWavWriter::new(&path);
        writer.init().await.unwrap();
        writer.finalize().await.unwrap();
        std::fs::remove_file(&path).unwrap();

        writer.cleanup().await;
        assert_eq!(writer.state(), WriterState::Removed);
    }

    #[tokio::test]
    async fn create_opens_under_runtime_base() {
        let temp = tempdir().unwrap();
        let runtime = LocalStorage::new(temp.path().join("audio"));

        let mut writer = StreamingWavWriter::create(&runtime, "session_longform_1.wav")
            .await
            .unwrap();
        writer.append_chunk(&[0; 4800]).await.unwrap();
        let blob = writer.finalize().await.unwrap();

        assert_eq!(blob.path(), temp.path().join("audio").join("session_longform_1.wav"));
        assert_eq!(blob.suggested_file_name(), "session_longform_1.wav");
        assert_eq!(blob.duration(), 0.1);
    }
}
