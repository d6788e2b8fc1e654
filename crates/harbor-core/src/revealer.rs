//! Reveal downloaded files in the platform file manager

use std::io;
use std::path::Path;

pub trait FileRevealer: Send + Sync {
    fn reveal(&self, path: &Path) -> io::Result<()>;
}

/// Hands the path to the desktop's file manager through `opener`, which
/// waits on the helper process it launches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRevealer;

impl FileRevealer for SystemRevealer {
    fn reveal(&self, path: &Path) -> io::Result<()> {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} no longer exists", path.display()),
            ));
        }

        opener::reveal(path).map_err(|e| match e {
            opener::OpenError::Io(e) => e,
            other => io::Error::other(other.to_string()),
        })?;

        tracing::debug!(path = %path.display(), "Revealed file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = SystemRevealer
            .reveal(&dir.path().join("gone.zip"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_removed_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = SystemRevealer.reveal(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("report.pdf"));
    }
}
