//! Manifest retrieval and artefact downloads over HTTP.
//!
//! Provides a trait-based abstraction so that the orchestrator can be tested
//! without network access. The production implementation talks to GitHub
//! with `ureq`, authenticating when a token is configured.

use crate::config::AuthToken;
use crate::reference::{MANIFEST_FILENAME, RepositoryReference};
use log::debug;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Base URL of the GitHub REST API.
const GITHUB_API: &str = "https://api.github.com";

/// Media type that makes the blob endpoint return raw file content.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.VERSION.raw";

/// Upper bound on a downloaded manifest; the upstream manifest is a few MiB.
const MAX_MANIFEST_BYTES: u64 = 64 * 1024 * 1024;

/// Network timeout for a single request, including the body transfer.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Trait for fetching the versions manifest and release archives.
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Fetch the raw manifest JSON stored at `reference`.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or the repository has no manifest
    /// at that ref.
    fn fetch_manifest(&self, reference: &RepositoryReference) -> Result<String, DownloadError>;

    /// Download `url` into the file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the file write fails.
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from HTTP transfers.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The server answered with a non-success status code.
    #[error("unexpected HTTP response: {status} from {url}")]
    HttpStatus {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request failed before a response was received, or the body could
    /// not be read.
    #[error("download failed for {url}: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The repository tree at the requested ref has no manifest file.
    #[error("{MANIFEST_FILENAME} not found in {tree_url}")]
    ManifestMissing {
        /// The git tree that was searched.
        tree_url: String,
    },

    /// A response body did not have the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    InvalidResponse {
        /// The URL that was requested.
        url: String,
        /// Description of the mismatch.
        reason: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// The HTTP status code, when the failure carries one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone, Default)]
pub struct HttpDownloader {
    auth: Option<AuthToken>,
}

impl HttpDownloader {
    /// Create a downloader, sending `auth` with every request when present.
    #[must_use]
    pub fn new(auth: Option<AuthToken>) -> Self {
        Self { auth }
    }

    /// GitHub API URL of the git tree at the reference's ref.
    ///
    /// # Examples
    ///
    /// ```
    /// use cpython_installer::download::HttpDownloader;
    /// use cpython_installer::reference::parse_manifest_reference;
    ///
    /// let reference = parse_manifest_reference("actions/python-versions@main").expect("valid");
    /// assert_eq!(
    ///     HttpDownloader::tree_url(&reference),
    ///     "https://api.github.com/repos/actions/python-versions/git/trees/main",
    /// );
    /// ```
    #[must_use]
    pub fn tree_url(reference: &RepositoryReference) -> String {
        format!(
            "{GITHUB_API}/repos/{}/{}/git/trees/{}",
            reference.owner(),
            reference.repo(),
            reference.git_ref()
        )
    }

    fn get(
        &self,
        url: &str,
        accept: Option<&str>,
    ) -> Result<ureq::http::Response<ureq::Body>, DownloadError> {
        let mut request = http_agent().get(url);
        if let Some(auth) = &self.auth {
            request = request.header("Authorization", auth.authorization_header());
        }
        if let Some(accept) = accept {
            request = request.header("Accept", accept);
        }
        request.call().map_err(|e| map_ureq_error(url, &e))
    }

    fn get_text(&self, url: &str, accept: Option<&str>) -> Result<String, DownloadError> {
        self.get(url, accept)?
            .into_body()
            .with_config()
            .limit(MAX_MANIFEST_BYTES)
            .read_to_string()
            .map_err(|e| DownloadError::Transport {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }
}

impl ArtefactDownloader for HttpDownloader {
    fn fetch_manifest(&self, reference: &RepositoryReference) -> Result<String, DownloadError> {
        let tree_url = Self::tree_url(reference);
        debug!("Listing {tree_url}");
        let tree_json = self.get_text(&tree_url, None)?;
        let blob_url = locate_manifest_blob(&tree_url, &tree_json)?;
        debug!("Fetching manifest blob {blob_url}");
        self.get_text(&blob_url, Some(RAW_MEDIA_TYPE))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        let response = self.get(url, None)?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(DownloadError::Io)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct GitTree {
    tree: Vec<GitTreeEntry>,
}

#[derive(Debug, Deserialize)]
struct GitTreeEntry {
    path: String,
    url: String,
}

/// Find the blob URL of the manifest in a git tree listing.
fn locate_manifest_blob(tree_url: &str, tree_json: &str) -> Result<String, DownloadError> {
    let tree: GitTree =
        serde_json::from_str(tree_json).map_err(|e| DownloadError::InvalidResponse {
            url: tree_url.to_owned(),
            reason: e.to_string(),
        })?;
    tree.tree
        .into_iter()
        .find(|entry| entry.path == MANIFEST_FILENAME)
        .map(|entry| entry.url)
        .ok_or_else(|| DownloadError::ManifestMissing {
            tree_url: tree_url.to_owned(),
        })
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(status) => DownloadError::HttpStatus {
            url: url.to_owned(),
            status: *status,
        },
        other => DownloadError::Transport {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
