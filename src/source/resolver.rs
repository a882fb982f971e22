//! Source resolution for form PDFs

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::ChildStdout;

/// Input of a pdftk invocation
#[derive(Debug)]
pub enum FormSource {
    /// PDF on disk, passed to pdftk by path
    Path(PathBuf),
    /// PDF produced by an upstream pdftk stage, fed through stdin as `-`
    Piped(ChildStdout),
}

impl FormSource {
    /// Command-line argument naming this source.
    pub fn arg(&self) -> &std::ffi::OsStr {
        match self {
            FormSource::Path(path) => path.as_os_str(),
            FormSource::Piped(_) => std::ffi::OsStr::new("-"),
        }
    }

    /// Split into the argument and the stdin wiring the child needs.
    ///
    /// A piped source hands its descriptor over to the returned [`Stdio`]; the
    /// parent keeps no handle to it afterwards.
    pub fn into_parts(self) -> Result<(std::ffi::OsString, Stdio)> {
        let arg = self.arg().to_os_string();
        let stdin = match self {
            FormSource::Path(_) => Stdio::null(),
            FormSource::Piped(stdout) => stdout.try_into().map_err(Error::Io)?,
        };
        Ok((arg, stdin))
    }
}

/// Check that a PDF path is readable before any process is spawned.
pub async fn resolve_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

    let metadata = file.metadata().await.map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    if metadata.is_dir() {
        return Err(Error::FileAccess {
            path: path.to_path_buf(),
            source: std::io::Error::other("is a directory"),
        });
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_resolve_path_not_found() {
        let result = resolve_path("/nonexistent/path/form.pdf").await;
        assert!(matches!(result, Err(Error::FileAccess { .. })));
    }

    #[tokio::test]
    async fn test_resolve_path_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_path(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAccess);
    }

    #[tokio::test]
    async fn test_resolve_path_readable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = resolve_path(file.path()).await.unwrap();
        assert_eq!(resolved, file.path());
    }

    #[test]
    fn test_path_source_arg() {
        let source = FormSource::Path(PathBuf::from("/forms/w9.pdf"));
        assert_eq!(source.arg(), "/forms/w9.pdf");
    }
}
