//! Scoped ownership of probe input and output files.
//!
//! A [`TempFile`] either creates its file up front (probe sources) or only
//! registers a path that a later command is expected to produce (objects,
//! executables). Either way the path is removed when the handle is released
//! or dropped, and a file that is already gone counts as cleaned up.

use crate::error::{ProbeError, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    /// Takes ownership of `path`, writing `content` to it if given.
    ///
    /// With content, the file must not already exist. Without content
    /// nothing is created; the path is only scheduled for removal.
    pub fn acquire(path: impl Into<PathBuf>, content: Option<&str>) -> Result<Self> {
        let path = path.into();
        let Some(content) = content else {
            return Ok(Self { path, armed: true });
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| ProbeError::Create {
                path: path.clone(),
                source,
            })?;
        // From here on the file is ours, so a failed write still removes it.
        let guard = Self { path, armed: true };
        file.write_all(content.as_bytes())
            .map_err(|source| ProbeError::Create {
                path: guard.path.clone(),
                source,
            })?;
        Ok(guard)
    }

    /// Runs `work` while `path` is held, releasing it afterwards whatever the outcome.
    ///
    /// A cleanup failure wins over an error returned by `work`.
    pub fn scope<T>(
        path: impl Into<PathBuf>,
        content: Option<&str>,
        work: impl FnOnce(&Path) -> Result<T>,
    ) -> Result<T> {
        let file = Self::acquire(path, content)?;
        let result = work(file.path());
        file.release()?;
        result
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file, reporting any failure other than it being absent.
    pub fn release(mut self) -> Result<()> {
        self.armed = false;
        remove(&self.path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed
            && let Err(e) = remove(&self.path)
        {
            warn!("{}", e);
        }
    }
}

fn remove(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ProbeError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_with_content_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probe.c");

        let file = TempFile::acquire(&path, Some("int main() {}\n")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "int main() {}\n");

        file.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_acquire_with_content_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probe.c");
        fs::write(&path, "keep me").unwrap();

        let err = TempFile::acquire(&path, Some("int main() {}\n")).unwrap_err();
        assert!(matches!(err, ProbeError::Create { .. }));
        // A rejected acquisition must not touch the existing file.
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn test_acquire_without_content_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probe.o");

        let file = TempFile::acquire(&path, None).unwrap();
        assert!(!path.exists());
        // Releasing a path that was never produced is fine.
        file.release().unwrap();
    }

    #[test]
    fn test_release_removes_produced_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probe.o");

        let file = TempFile::acquire(&path, None).unwrap();
        fs::write(&path, b"\x7fELF").unwrap();
        file.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probe.c");
        {
            let _file = TempFile::acquire(&path, Some("x")).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_scope_cleans_up_on_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probe.c");

        let result: Result<()> = TempFile::scope(&path, Some("x"), |p| {
            assert!(p.exists());
            Err(ProbeError::Failed {
                output: "error".into(),
            })
        });
        assert!(result.unwrap_err().is_probe_failure());
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_failure_propagates() {
        let dir = TempDir::new().unwrap();
        // A directory at the path makes remove_file fail with something other than NotFound.
        let path = dir.path().join("probe.o");
        fs::create_dir(&path).unwrap();

        let file = TempFile::acquire(&path, None).unwrap();
        let err = file.release().unwrap_err();
        assert!(matches!(err, ProbeError::Cleanup { .. }));
    }

    #[test]
    fn test_nested_scopes_release_inner_first() {
        let dir = TempDir::new().unwrap();
        let outer = dir.path().join("probe.o");
        let inner = dir.path().join("probe.c");

        TempFile::scope(&outer, None, |outer_path| {
            TempFile::scope(&inner, Some("x"), |_| {
                fs::write(outer_path, "obj").unwrap();
                Ok(())
            })?;
            assert!(!inner.exists());
            assert!(outer_path.exists());
            Ok(())
        })
        .unwrap();
        assert!(!outer.exists());
    }
}
