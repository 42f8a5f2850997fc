use std::path::{Path, PathBuf};

pub const APP_FOLDER: &str = "lumen";
pub const AUDIO_FOLDER: &str = "audio";

/// `<data dir>/lumen/audio`, or `None` when the platform has no data dir.
pub fn compute_default_base() -> Option<PathBuf> {
    let data_dir = dirs::data_dir()?;
    Some(data_dir.join(APP_FOLDER).join(AUDIO_FOLDER))
}

/// Expands `~` and `$VARS` in a user-supplied directory.
pub fn expand_path(path: &str) -> PathBuf {
    let home_dir = || dirs::home_dir().map(|p| p.to_string_lossy().into_owned());
    let context = |var: &str| std::env::var(var).ok();
    let expanded = shellexpand::full_with_context_no_errors(path, home_dir, context);
    PathBuf::from(expanded.into_owned())
}

pub fn validate_base_path(path: &Path) -> Result<(), crate::Error> {
    if !path.is_absolute() {
        return Err(crate::Error::PathNotAbsolute);
    }

    if path.exists() && !path.is_dir() {
        return Err(crate::Error::PathIsNotDirectory);
    }

    Ok(())
}

pub fn ensure_base_dir(path: &Path) -> Result<(), crate::Error> {
    validate_base_path(path)?;

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_ends_in_audio_folder() {
        if let Some(base) = compute_default_base() {
            assert!(base.ends_with(Path::new(APP_FOLDER).join(AUDIO_FOLDER)));
        }
    }

    #[test]
    fn relative_base_is_rejected() {
        assert!(matches!(
            validate_base_path(Path::new("relative/dir")),
            Err(crate::Error::PathNotAbsolute)
        ));
    }

    #[test]
    fn file_base_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("not_a_dir");
        std::fs::write(&file, "x").unwrap();

        assert!(matches!(
            ensure_base_dir(&file),
            Err(crate::Error::PathIsNotDirectory)
        ));
    }

    #[test]
    fn missing_base_is_created() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().join("a").join("b");

        ensure_base_dir(&base).unwrap();
        assert!(base.is_dir());
    }

    #[test]
    fn expands_environment_variables() {
        let expanded = expand_path("/tmp/$LUMEN_TEST_UNSET_VAR_XYZ/out");
        assert_eq!(expanded, PathBuf::from("/tmp/$LUMEN_TEST_UNSET_VAR_XYZ/out"));
    }
}
