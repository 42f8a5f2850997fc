use std::path::Path;

use tempfile::NamedTempFile;

fn parent_of(target: &Path) -> std::io::Result<&Path> {
    target.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no parent")
    })
}

pub async fn atomic_write_bytes_async(target: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = parent_of(target)?;
    tokio::fs::create_dir_all(parent).await?;

    let temp = NamedTempFile::new_in(parent)?;
    tokio::fs::write(temp.path(), content).await?;
    temp.persist(target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn atomic_write_creates_file() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("track.wav");

        atomic_write_bytes_async(&target, b"RIFF").await.unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"RIFF");
    }

    #[tokio::test]
    async fn atomic_write_creates_parent_dirs() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("nested").join("dir").join("track.wav");

        atomic_write_bytes_async(&target, &[1, 2, 3]).await.unwrap();

        assert_eq!(fs::read(&target).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn atomic_write_overwrites_existing() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("track.wav");
        fs::write(&target, "old").unwrap();

        atomic_write_bytes_async(&target, b"new").await.unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
        let leftovers = fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
