// src/config/path_resolve.rs

use crate::errors::{io_error_with_path, ConfigError, Result};
use std::path::{Path, PathBuf};

/// Resolves a source directory to an absolute, canonicalized `PathBuf`.
///
/// # Errors
/// `NotFound`/`PermissionDenied` if the path cannot be resolved, or an
/// `InvalidValue` config error if it is not a directory.
pub fn resolve_source_dir(path: &Path) -> Result<PathBuf> {
    let resolved = path
        .canonicalize()
        .map_err(|e| io_error_with_path(e, path))?;
    if !resolved.is_dir() {
        return Err(ConfigError::InvalidValue {
            option: "--source".to_string(),
            reason: format!("'{}' is not a directory", path.display()),
        }
        .into());
    }
    Ok(resolved)
}

/// Makes `path` absolute against the current directory without requiring it to exist.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| io_error_with_path(e, "."))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_existing_dir() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let resolved = resolve_source_dir(temp.path())?;
        assert!(resolved.is_absolute());
        assert!(resolved.is_dir());
        Ok(())
    }

    #[test]
    fn test_resolve_file_is_rejected() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let file_path = temp.path().join("test.txt");
        fs::write(&file_path, "content")?;
        let err = resolve_source_dir(&file_path).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
        Ok(())
    }

    #[test]
    fn test_resolve_non_existent_path() {
        let err = resolve_source_dir(Path::new("non_existent_path_for_testing_dirbundle")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_absolutize_relative_path() -> anyhow::Result<()> {
        let resolved = absolutize(Path::new("some/out.txt"))?;
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/out.txt"));
        Ok(())
    }
}
