//! Release resolution and installation.
//!
//! [`Installer`] ties the collaborators together: it fetches the versions
//! manifest from the configured repository reference, asks the matcher for a
//! release, then downloads the release archive, extracts it into a scratch
//! directory, and runs the bundled setup script there.
//!
//! Failures propagate unchanged. When a transfer fails with an HTTP status,
//! an operator-facing hint is logged before the error is returned; 403 and
//! 429 responses usually mean the GitHub rate limit was hit.

use crate::config::InstallerConfig;
use crate::download::ArtefactDownloader;
use crate::error::{InstallerError, Result};
use crate::extraction::ArchiveExtractor;
use crate::manifest::{ToolRelease, ToolReleaseFile, parse_manifest};
use crate::matcher::{MatchCriteria, ReleaseMatcher};
use crate::script::{ScriptInvocation, ScriptRunner};
use log::{debug, info};
use std::ffi::OsString;
use std::path::Path;

/// Prefix of the scratch directory holding the archive and its contents.
const SCRATCH_PREFIX: &str = "cpython-installer-";

/// Name used for the downloaded archive when the manifest gives none.
const FALLBACK_ARCHIVE_NAME: &str = "python-archive";

/// Resolves and installs CPython releases.
pub struct Installer<'a> {
    config: &'a InstallerConfig,
    downloader: &'a dyn ArtefactDownloader,
    extractor: &'a dyn ArchiveExtractor,
    runner: &'a dyn ScriptRunner,
    matcher: &'a dyn ReleaseMatcher,
}

impl<'a> Installer<'a> {
    /// Create an installer from its configuration and collaborators.
    ///
    /// `extractor` must handle the archive format of `config.platform`.
    #[must_use]
    pub fn new(
        config: &'a InstallerConfig,
        downloader: &'a dyn ArtefactDownloader,
        extractor: &'a dyn ArchiveExtractor,
        runner: &'a dyn ScriptRunner,
        matcher: &'a dyn ReleaseMatcher,
    ) -> Self {
        Self {
            config,
            downloader,
            extractor,
            runner,
            matcher,
        }
    }

    /// Fetch and parse the manifest at the configured reference.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Download`] if the fetch fails and
    /// [`InstallerError::ManifestParse`] if the content is not a manifest.
    pub fn fetch_manifest(&self) -> Result<Vec<ToolRelease>> {
        let reference = &self.config.manifest_reference;
        debug!("Getting manifest from {}", reference.manifest_raw_url());
        let json = self.downloader.fetch_manifest(reference)?;
        let releases = parse_manifest(&json)?;
        debug!("Manifest lists {} releases", releases.len());
        Ok(releases)
    }

    /// Find the release matching `version_spec` for `architecture`.
    ///
    /// Uses `manifest` when given; otherwise fetches one first. The returned
    /// release carries only the file selected for this host.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be fetched or parsed, or the
    /// version range is invalid. No match is `Ok(None)`.
    pub fn resolve_release(
        &self,
        version_spec: &str,
        architecture: &str,
        manifest: Option<&[ToolRelease]>,
    ) -> Result<Option<ToolRelease>> {
        let fetched;
        let releases = match manifest {
            Some(releases) => releases,
            None => {
                fetched = self.fetch_manifest()?;
                fetched.as_slice()
            }
        };
        let criteria = MatchCriteria {
            version_spec,
            architecture,
            platform: self.config.platform,
            os_version: self.config.os_version.as_deref(),
            stable_only: self.config.stable_only,
        };
        Ok(self.matcher.find_release(&criteria, releases)?)
    }

    /// Like [`Installer::resolve_release`], but no match is an error.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::NoMatchingRelease`] when nothing matches, or
    /// any error from [`Installer::resolve_release`].
    pub fn require_release(
        &self,
        version_spec: &str,
        architecture: &str,
        manifest: Option<&[ToolRelease]>,
    ) -> Result<ToolRelease> {
        self.resolve_release(version_spec, architecture, manifest)?
            .ok_or_else(|| InstallerError::NoMatchingRelease {
                version_spec: version_spec.to_owned(),
                architecture: architecture.to_owned(),
                platform: self.config.platform.manifest_tag().to_owned(),
            })
    }

    /// Download, extract, and run the setup script of `release`'s primary
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ReleaseHasNoFiles`] for a release without
    /// files; download, extraction, and script failures propagate unchanged.
    pub fn install_from_release(&self, release: &ToolRelease) -> Result<()> {
        let file = release
            .primary_file()
            .ok_or_else(|| InstallerError::ReleaseHasNoFiles {
                version: release.version.clone(),
            })?;

        info!("Download from \"{}\"", file.download_url);
        self.download_and_run_setup(file)
            .inspect_err(report_transfer_failure)
    }

    /// Resolve `version_spec` against the fetched manifest and install the
    /// result, returning the installed release.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::NoMatchingRelease`] when nothing matches;
    /// otherwise as [`Installer::resolve_release`] and
    /// [`Installer::install_from_release`].
    pub fn install(&self, version_spec: &str, architecture: &str) -> Result<ToolRelease> {
        let release = self.require_release(version_spec, architecture, None)?;
        info!("Installing Python {} ({architecture})", release.version);
        self.install_from_release(&release)?;
        Ok(release)
    }

    fn download_and_run_setup(&self, file: &ToolReleaseFile) -> Result<()> {
        let scratch = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
        let archive_path = scratch.path().join(archive_name(file));
        self.downloader.download(&file.download_url, &archive_path)?;

        info!("Extract downloaded archive");
        let extracted_dir = scratch.path().join("extracted");
        std::fs::create_dir_all(&extracted_dir)?;
        let entries = self.extractor.extract(&archive_path, &extracted_dir)?;
        debug!(
            "Extracted {} files into {}",
            entries.len(),
            extracted_dir.display()
        );

        info!("Execute installation script");
        let invocation = ScriptInvocation::for_platform(self.config.platform, &extracted_dir);
        self.runner.run(&invocation)
    }
}

/// Local file name for the downloaded archive of `file`.
fn archive_name(file: &ToolReleaseFile) -> OsString {
    Path::new(&file.filename)
        .file_name()
        .map_or_else(|| OsString::from(FALLBACK_ARCHIVE_NAME), ToOwned::to_owned)
}

/// The line logged for a transfer that failed with an HTTP status, if `err`
/// is one.
///
/// # Examples
///
/// ```
/// use cpython_installer::download::DownloadError;
/// use cpython_installer::error::InstallerError;
/// use cpython_installer::install::transfer_failure_hint;
///
/// let err = InstallerError::from(DownloadError::HttpStatus {
///     url: "https://example.test/python.tar.gz".to_owned(),
///     status: 429,
/// });
/// let hint = transfer_failure_hint(&err).expect("HTTP failure");
/// assert!(hint.contains("rate limit"));
/// ```
#[must_use]
pub fn transfer_failure_hint(err: &InstallerError) -> Option<String> {
    let status = err.http_status()?;
    Some(if matches!(status, 403 | 429) {
        format!(
            "Received HTTP status code {status}.  This usually indicates the rate limit has been exceeded"
        )
    } else {
        err.to_string()
    })
}

fn report_transfer_failure(err: &InstallerError) {
    if let Some(hint) = transfer_failure_hint(err) {
        info!("{hint}");
        debug!("{err:?}");
    }
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
