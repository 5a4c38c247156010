//! Shared test utilities for the installer crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! behaviour tests under `tests/`.

use crate::error::{InstallerError, Result};
use crate::manifest::{ToolRelease, ToolReleaseFile};
use crate::script::{ScriptInvocation, ScriptRunner};
use std::cell::{Cell, RefCell};
use std::io::Write;

/// A setup script run observed by [`StubScriptRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    /// The invocation as handed to the runner.
    pub invocation: ScriptInvocation,
    /// Whether the first script argument existed inside the working
    /// directory when the runner was called.
    pub script_present: bool,
}

/// A [`ScriptRunner`] that records invocations instead of spawning
/// processes.
#[derive(Debug, Default)]
pub struct StubScriptRunner {
    runs: RefCell<Vec<RecordedRun>>,
    exit_code: Cell<Option<i32>>,
}

impl StubScriptRunner {
    /// A runner whose scripts succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner whose scripts exit with `code`.
    #[must_use]
    pub fn failing_with(code: i32) -> Self {
        let runner = Self::default();
        runner.exit_code.set(Some(code));
        runner
    }

    /// Invocations received so far.
    #[must_use]
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.borrow().clone()
    }

    /// The single invocation received.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::StubMismatch`] unless exactly one run was
    /// recorded.
    pub fn only_run(&self) -> Result<RecordedRun> {
        let runs = self.runs.borrow();
        match runs.as_slice() {
            [run] => Ok(run.clone()),
            other => Err(InstallerError::StubMismatch {
                message: format!("expected one script run, saw {}", other.len()),
            }),
        }
    }
}

impl ScriptRunner for StubScriptRunner {
    fn run(&self, invocation: &ScriptInvocation) -> Result<()> {
        let script_present = invocation
            .args
            .first()
            .is_some_and(|script| invocation.working_dir.join(script).is_file());
        self.runs.borrow_mut().push(RecordedRun {
            invocation: invocation.clone(),
            script_present,
        });
        match self.exit_code.get() {
            None => Ok(()),
            Some(code) => Err(InstallerError::ScriptFailed {
                program: invocation.program.clone(),
                code: Some(code),
            }),
        }
    }
}

/// Build an in-memory `.tar.gz` archive holding `files` (path, contents).
///
/// # Errors
///
/// Returns an error if writing to the in-memory buffer fails.
pub fn tar_gz_archive(files: &[(&str, &[u8])]) -> std::io::Result<Vec<u8>> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, *contents)?;
    }
    builder.into_inner()?.finish()
}

/// Build an in-memory `.zip` archive holding `files` (path, contents).
///
/// # Errors
///
/// Returns an error if writing to the in-memory buffer fails.
pub fn zip_archive(files: &[(&str, &[u8])]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (path, contents) in files {
        writer.start_file(*path, options)?;
        writer.write_all(contents)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// A manifest file entry for `platform`/`arch`.
#[must_use]
pub fn release_file(
    arch: &str,
    platform: &str,
    platform_version: Option<&str>,
    download_url: &str,
) -> ToolReleaseFile {
    let extension = if platform == "win32" { "zip" } else { "tar.gz" };
    let file_name = download_url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map_or_else(
            || format!("python-{platform}-{arch}.{extension}"),
            str::to_owned,
        );
    ToolReleaseFile {
        filename: file_name,
        arch: arch.to_owned(),
        platform: platform.to_owned(),
        platform_version: platform_version.map(str::to_owned),
        download_url: download_url.to_owned(),
    }
}

/// A stable release of `version` offering `files`.
#[must_use]
pub fn release(version: &str, files: Vec<ToolReleaseFile>) -> ToolRelease {
    ToolRelease {
        version: version.to_owned(),
        stable: true,
        release_url: Some(format!(
            "https://github.com/actions/python-versions/releases/tag/{version}"
        )),
        files,
    }
}

/// Serialise `releases` the way `versions-manifest.json` is laid out.
///
/// # Errors
///
/// Returns an error if a release cannot be serialised.
pub fn manifest_json(releases: &[ToolRelease]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(releases)
}
