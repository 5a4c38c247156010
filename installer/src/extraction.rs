//! Archive extraction for downloaded CPython releases.
//!
//! Linux and macOS builds ship as `.tar.gz`, Windows builds as `.zip`. Both
//! extractors reject entries that would land outside the destination
//! directory (zip-slip).

use crate::platform::ArchiveFormat;
use std::fs::File;
use std::path::{Component, Path};

/// Trait for extracting release archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use cpython_installer::extraction::{ArchiveExtractor, extractor_for};
/// use cpython_installer::platform::ArchiveFormat;
///
/// let extractor: &dyn ArchiveExtractor = extractor_for(ArchiveFormat::TarGz);
/// // Use extractor.extract(archive_path, dest_dir) in production
/// # let _ = extractor;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the relative paths of the files that were extracted.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory.
    /// Returns [`ExtractionError::EmptyArchive`] if no files are found.
    /// Returns [`ExtractionError::Io`] or [`ExtractionError::Zip`] on
    /// read or write failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<String>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container could not be read.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Extractor for gzip-compressed tarballs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzExtractor;

/// Extractor for zip archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

/// The extractor that handles `format`.
#[must_use]
pub fn extractor_for(format: ArchiveFormat) -> &'static dyn ArchiveExtractor {
    match format {
        ArchiveFormat::TarGz => &TarGzExtractor,
        ArchiveFormat::Zip => &ZipExtractor,
    }
}

impl ArchiveExtractor for TarGzExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let file = File::open(archive_path)?;
        let decoder = flate2::read::GzDecoder::new(file);
        let mut archive = tar::Archive::new(decoder);
        archive.set_preserve_permissions(true);
        let mut extracted = Vec::new();

        for entry_result in archive.entries()? {
            let mut entry = entry_result?;
            let entry_path = entry.path()?.into_owned();

            validate_entry_path(&entry_path)?;

            // `unpack_in` also refuses entries reached through symlinks or
            // hard links that point outside `dest_dir`.
            if !entry.unpack_in(dest_dir)? {
                return Err(ExtractionError::PathTraversal {
                    path: entry_path.display().to_string(),
                });
            }

            if !entry.header().entry_type().is_dir() {
                extracted.push(entry_path.to_string_lossy().into_owned());
            }
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        Ok(extracted)
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let file = File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut extracted = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let entry_path =
                entry
                    .enclosed_name()
                    .ok_or_else(|| ExtractionError::PathTraversal {
                        path: entry.name().to_owned(),
                    })?;

            let dest_path = dest_dir.join(&entry_path);
            if entry.is_dir() {
                std::fs::create_dir_all(&dest_path)?;
                continue;
            }
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let mut output = File::create(&dest_path)?;
            std::io::copy(&mut entry, &mut output)?;
            restore_unix_mode(&dest_path, entry.unix_mode())?;

            extracted.push(entry_path.to_string_lossy().into_owned());
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        Ok(extracted)
    }
}

#[cfg(unix)]
fn restore_unix_mode(path: &Path, mode: Option<u32>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn restore_unix_mode(_path: &Path, _mode: Option<u32>) -> std::io::Result<()> {
    Ok(())
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{tar_gz_archive, zip_archive};
    use rstest::rstest;
    use std::path::PathBuf;

    fn extract_into_temp(
        extractor: &dyn ArchiveExtractor,
        archive_name: &str,
        bytes: &[u8],
    ) -> (tempfile::TempDir, PathBuf, Result<Vec<String>, ExtractionError>) {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join(archive_name);
        std::fs::write(&archive_path, bytes).expect("write archive");
        let dest_dir = temp_dir.path().join("out");
        std::fs::create_dir_all(&dest_dir).expect("create dest");
        let result = extractor.extract(&archive_path, &dest_dir);
        (temp_dir, dest_dir, result)
    }

    #[test]
    fn extracts_tar_gz_with_nested_directories() {
        let bytes = tar_gz_archive(&[
            ("setup.sh", b"#!/bin/bash\necho ok\n".as_slice()),
            ("lib/libpython3.12.so", b"ELF".as_slice()),
        ])
        .expect("build archive");
        let (_temp, dest_dir, result) =
            extract_into_temp(&TarGzExtractor, "python.tar.gz", &bytes);

        let files = result.expect("extract");
        assert_eq!(files, vec!["setup.sh", "lib/libpython3.12.so"]);
        assert!(dest_dir.join("setup.sh").exists());
        assert!(dest_dir.join("lib").join("libpython3.12.so").exists());
    }

    #[test]
    fn extracts_zip() {
        let bytes = zip_archive(&[
            ("setup.ps1", b"Write-Host ok".as_slice()),
            ("Lib/os.py", b"# os".as_slice()),
        ])
        .expect("build archive");
        let (_temp, dest_dir, result) = extract_into_temp(&ZipExtractor, "python.zip", &bytes);

        let files = result.expect("extract");
        assert_eq!(files.len(), 2);
        assert_eq!(
            std::fs::read_to_string(dest_dir.join("setup.ps1")).expect("read"),
            "Write-Host ok"
        );
        assert!(dest_dir.join("Lib").join("os.py").exists());
    }

    #[test]
    fn empty_tar_gz_is_rejected() {
        let bytes = tar_gz_archive(&[]).expect("build archive");
        let (_temp, _dest, result) = extract_into_temp(&TarGzExtractor, "empty.tar.gz", &bytes);
        assert!(matches!(result, Err(ExtractionError::EmptyArchive)));
    }

    #[test]
    fn empty_zip_is_rejected() {
        let bytes = zip_archive(&[]).expect("build archive");
        let (_temp, _dest, result) = extract_into_temp(&ZipExtractor, "empty.zip", &bytes);
        assert!(matches!(result, Err(ExtractionError::EmptyArchive)));
    }

    #[test]
    fn corrupt_zip_is_reported() {
        let (_temp, _dest, result) =
            extract_into_temp(&ZipExtractor, "corrupt.zip", b"not a zip file");
        assert!(matches!(result, Err(ExtractionError::Zip(_))));
    }

    #[cfg(unix)]
    #[test]
    fn tar_entry_behind_escaping_symlink_is_refused() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let outside = temp_dir.path().join("outside");
        std::fs::create_dir_all(&outside).expect("create outside dir");

        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut link = tar::Header::new_gnu();
        link.set_entry_type(tar::EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        builder
            .append_link(&mut link, "lib", &outside)
            .expect("append symlink");
        let payload = b"escaped";
        let mut file = tar::Header::new_gnu();
        file.set_size(payload.len() as u64);
        file.set_mode(0o644);
        file.set_cksum();
        builder
            .append_data(&mut file, "lib/escaped.txt", payload.as_slice())
            .expect("append file");
        let bytes = builder
            .into_inner()
            .and_then(flate2::write::GzEncoder::finish)
            .expect("finish archive");

        let archive_path = temp_dir.path().join("python.tar.gz");
        std::fs::write(&archive_path, bytes).expect("write archive");
        let dest_dir = temp_dir.path().join("out");
        std::fs::create_dir_all(&dest_dir).expect("create dest");

        let result = TarGzExtractor.extract(&archive_path, &dest_dir);

        assert!(result.is_err(), "expected refusal, got {result:?}");
        assert!(!outside.join("escaped.txt").exists());
    }

    #[rstest]
    #[case::parent_dir("../escape.txt")]
    #[case::nested_parent("foo/../../escape.txt")]
    #[case::absolute("/etc/passwd")]
    fn rejects_path_traversal(#[case] bad_path: &str) {
        let path = PathBuf::from(bad_path);
        let result = validate_entry_path(&path);
        assert!(
            matches!(result, Err(ExtractionError::PathTraversal { .. })),
            "expected PathTraversal for {bad_path}"
        );
    }

    #[test]
    fn accepts_normal_paths() {
        let path = PathBuf::from("lib/python3.12/os.py");
        assert!(validate_entry_path(&path).is_ok());
    }

    #[rstest]
    #[case::tar(ArchiveFormat::TarGz, "python.tar.gz")]
    #[case::zip(ArchiveFormat::Zip, "python.zip")]
    fn extractor_for_handles_its_format(#[case] format: ArchiveFormat, #[case] name: &str) {
        let files = [("setup.sh", b"echo".as_slice())];
        let bytes = match format {
            ArchiveFormat::TarGz => tar_gz_archive(&files).expect("build archive"),
            ArchiveFormat::Zip => zip_archive(&files).expect("build archive"),
        };
        let (_temp, _dest, result) = extract_into_temp(extractor_for(format), name, &bytes);
        assert_eq!(result.expect("extract"), vec!["setup.sh"]);
    }
}
