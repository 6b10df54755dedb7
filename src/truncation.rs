//! Truncated byte-prefix copies and their scoped cleanup.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::MixError;
use crate::types::ByteCount;

/// A truncated copy on disk, removed when this handle is dropped.
///
/// Removal is best-effort: a failure is logged and never raised, so it cannot mask
/// the result of the step that used the file.
#[derive(Debug)]
pub struct TruncatedFile {
    path: PathBuf,
    len: ByteCount,
}

impl TruncatedFile {
    /// Write the first `len` bytes of `source` to `destination` and take ownership of it.
    pub fn create(source: &Path, destination: &Path, len: ByteCount) -> Result<Self, MixError> {
        write_prefix(source, destination, len)?;
        debug!(
            source = %source.display(),
            destination = %destination.display(),
            len,
            "[tokmix:select] created truncated file"
        );
        Ok(Self {
            path: destination.to_path_buf(),
            len,
        })
    }

    /// Path of the truncated copy.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the truncated copy in bytes.
    pub fn len(&self) -> ByteCount {
        self.len
    }

    /// True when the copy holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for TruncatedFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "[tokmix:select] removed truncated file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "[tokmix:select] failed to remove truncated file"
            ),
        }
    }
}

/// Copy exactly the first `len` bytes of `source` into a new file at `destination`.
///
/// Fails when `source` holds fewer than `len` bytes; a partially written
/// destination is removed before the error is returned.
pub fn write_prefix(source: &Path, destination: &Path, len: ByteCount) -> Result<(), MixError> {
    let result = copy_prefix(source, destination, len);
    if result.is_err() {
        let _ = fs::remove_file(destination);
    }
    result
}

fn copy_prefix(source: &Path, destination: &Path, len: ByteCount) -> Result<(), MixError> {
    let input = File::open(source).map_err(MixError::at(source))?;
    let output = File::create(destination).map_err(MixError::at(destination))?;
    let mut writer = BufWriter::new(output);
    let copied = io::copy(&mut input.take(len), &mut writer).map_err(MixError::at(destination))?;
    if copied < len {
        return Err(MixError::Filesystem {
            path: source.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected at least {len} bytes, found {copied}"),
            ),
        });
    }
    writer.flush().map_err(MixError::at(destination))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn prefix_copy_holds_exact_leading_bytes() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("doc.txt");
        let destination = temp.path().join("doc_trunc_4.txt");
        fs::write(&source, b"abcdefgh").unwrap();

        write_prefix(&source, &destination, 4).unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"abcd");
        assert_eq!(fs::read(&source).unwrap(), b"abcdefgh");
    }

    #[test]
    fn short_source_fails_and_leaves_nothing_behind() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("doc.txt");
        let destination = temp.path().join("doc_trunc_10.txt");
        fs::write(&source, b"abc").unwrap();

        let err = write_prefix(&source, &destination, 10).unwrap_err();
        assert!(matches!(err, MixError::Filesystem { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn missing_source_is_a_filesystem_error() {
        let temp = tempdir().unwrap();
        let err = write_prefix(
            &temp.path().join("gone.txt"),
            &temp.path().join("gone_trunc_1.txt"),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, MixError::Filesystem { .. }));
    }

    #[test]
    fn dropping_handle_removes_file() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("doc.txt");
        let destination = temp.path().join("doc_trunc_2.txt");
        fs::write(&source, b"hello").unwrap();

        let truncated = TruncatedFile::create(&source, &destination, 2).unwrap();
        assert_eq!(truncated.path(), destination.as_path());
        assert_eq!(truncated.len(), 2);
        assert!(destination.exists());
        drop(truncated);
        assert!(!destination.exists());
        assert!(source.exists());
    }

    #[test]
    fn drop_tolerates_already_removed_file() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("doc.txt");
        let destination = temp.path().join("doc_trunc_1.txt");
        fs::write(&source, b"x").unwrap();

        let truncated = TruncatedFile::create(&source, &destination, 1).unwrap();
        fs::remove_file(&destination).unwrap();
        drop(truncated);
    }
}
