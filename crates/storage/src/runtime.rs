use std::path::PathBuf;

/// Supplies the directory that streaming destinations are created under.
pub trait StorageRuntime: Send + Sync + 'static {
    fn audio_base(&self) -> Result<PathBuf, crate::Error>;
}

/// A runtime rooted at a fixed directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base: PathBuf,
}

impl LocalStorage {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl StorageRuntime for LocalStorage {
    fn audio_base(&self) -> Result<PathBuf, crate::Error> {
        crate::global::ensure_base_dir(&self.base)?;
        Ok(self.base.clone())
    }
}
