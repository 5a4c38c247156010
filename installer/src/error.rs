//! Error types for the CPython installer.
//!
//! Each stage (reference parsing, manifest retrieval, matching, download,
//! extraction, setup script) has its own error type; [`InstallerError`]
//! aggregates them so that the orchestrator can propagate failures unchanged
//! with `?`.

use crate::download::DownloadError;
use crate::extraction::ExtractionError;
use crate::manifest::ManifestParseError;
use crate::matcher::MatchError;
use crate::reference::ReferenceFormatError;
use thiserror::Error;

/// Errors that can occur while resolving or installing a release.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The manifest reference is not `owner/repo@ref`.
    #[error(transparent)]
    ReferenceFormat(#[from] ReferenceFormatError),

    /// A manifest fetch or archive download failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The manifest could not be read or parsed.
    #[error(transparent)]
    ManifestParse(#[from] ManifestParseError),

    /// The requested version range is invalid.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// The downloaded archive could not be extracted.
    #[error("failed to extract archive: {0}")]
    Extraction(#[from] ExtractionError),

    /// No release in the manifest satisfies the request.
    #[error(
        "no Python release matching {version_spec} for {architecture} on {platform} \
         found in the versions manifest"
    )]
    NoMatchingRelease {
        /// The requested version range.
        version_spec: String,
        /// The requested architecture tag.
        architecture: String,
        /// The platform tag searched.
        platform: String,
    },

    /// A matched release lists no downloadable files.
    #[error("Python {version} lists no downloadable files")]
    ReleaseHasNoFiles {
        /// Version of the offending release.
        version: String,
    },

    /// The setup script could not be started.
    #[error("failed to start {program}")]
    ScriptSpawn {
        /// The program that failed to start.
        program: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The setup script exited unsuccessfully.
    #[error("{program} exited with {}", describe_exit(*code))]
    ScriptFailed {
        /// The program that ran the script.
        program: String,
        /// The exit code, if the process exited normally.
        code: Option<i32>,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

fn describe_exit(code: Option<i32>) -> String {
    code.map_or_else(
        || "no exit code (terminated by signal)".to_owned(),
        |code| format!("exit code {code}"),
    )
}

impl InstallerError {
    /// The HTTP status code of a failed transfer, if this error carries one.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Download(err) => err.status_code(),
            _ => None,
        }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
