//! Versions manifest model and parsing.
//!
//! The manifest is a JSON array of releases, newest first. Each release lists
//! one file per supported platform and architecture:
//!
//! ```json
//! [
//!   {
//!     "version": "3.12.4",
//!     "stable": true,
//!     "release_url": "https://github.com/actions/python-versions/releases/tag/3.12.4-9947065640",
//!     "files": [
//!       {
//!         "filename": "python-3.12.4-linux-22.04-x64.tar.gz",
//!         "arch": "x64",
//!         "platform": "linux",
//!         "platform_version": "22.04",
//!         "download_url": "https://github.com/actions/python-versions/releases/download/3.12.4-9947065640/python-3.12.4-linux-22.04-x64.tar.gz"
//!       }
//!     ]
//!   }
//! ]
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// One downloadable artefact of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReleaseFile {
    /// Archive file name.
    pub filename: String,
    /// Architecture tag (`x64`, `arm64`, `x86`, ...).
    pub arch: String,
    /// Platform tag (`linux`, `darwin`, `win32`).
    pub platform: String,
    /// OS version the build targets, when the build is OS-version specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    /// Where the archive can be downloaded from.
    pub download_url: String,
}

/// One interpreter release listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRelease {
    /// Semantic version of the interpreter.
    pub version: String,
    /// Whether this is a stable (non pre-release) build.
    #[serde(default)]
    pub stable: bool,
    /// Release page, if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_url: Option<String>,
    /// Downloadable artefacts.
    #[serde(default)]
    pub files: Vec<ToolReleaseFile>,
}

impl ToolRelease {
    /// The artefact to install: the first file entry.
    ///
    /// After matching, a release carries exactly the file selected for the
    /// host, so this is the one that applies.
    #[must_use]
    pub fn primary_file(&self) -> Option<&ToolReleaseFile> {
        self.files.first()
    }
}

/// Errors arising from manifest loading and parsing.
#[derive(Debug, thiserror::Error)]
pub enum ManifestParseError {
    /// JSON deserialization failed.
    #[error("manifest parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A local manifest file could not be read.
    #[error("failed to read manifest file {path}")]
    Read {
        /// Path of the manifest file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Parse manifest JSON into its list of releases, preserving order.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or a required field is missing.
///
/// # Examples
///
/// ```
/// use cpython_installer::manifest::parse_manifest;
///
/// let json = concat!(
///     r#"[{"version":"3.12.4","stable":true,"files":[{"#,
///     r#""filename":"python-3.12.4-darwin-arm64.tar.gz","arch":"arm64","#,
///     r#""platform":"darwin","download_url":"https://example.test/py.tar.gz"}]}]"#,
/// );
/// let releases = parse_manifest(json).expect("valid manifest");
/// assert_eq!(releases[0].version, "3.12.4");
/// assert_eq!(releases[0].files[0].platform_version, None);
/// ```
pub fn parse_manifest(json: &str) -> Result<Vec<ToolRelease>, ManifestParseError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a manifest stored on the local filesystem.
///
/// # Errors
///
/// Returns [`ManifestParseError::Read`] if the file cannot be read and
/// [`ManifestParseError::Json`] if its contents are not a valid manifest.
pub fn read_manifest_file(path: &Utf8Path) -> Result<Vec<ToolRelease>, ManifestParseError> {
    let contents =
        std::fs::read_to_string(path.as_std_path()).map_err(|source| ManifestParseError::Read {
            path: path.to_owned(),
            source,
        })?;
    parse_manifest(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest_json() -> &'static str {
        concat!(
            r#"[{"version":"3.13.0-rc.1","stable":false,"#,
            r#""release_url":"https://example.test/3.13.0-rc.1","files":["#,
            r#"{"filename":"python-3.13.0-rc.1-linux-22.04-x64.tar.gz","arch":"x64","#,
            r#""platform":"linux","platform_version":"22.04","#,
            r#""download_url":"https://example.test/rc.tar.gz"}]},"#,
            r#"{"version":"3.12.4","stable":true,"files":["#,
            r#"{"filename":"python-3.12.4-win32-x64.zip","arch":"x64","#,
            r#""platform":"win32","download_url":"https://example.test/win.zip"},"#,
            r#"{"filename":"python-3.12.4-darwin-arm64.tar.gz","arch":"arm64","#,
            r#""platform":"darwin","download_url":"https://example.test/mac.tar.gz"}]}]"#,
        )
    }

    #[test]
    fn parses_releases_in_order() {
        let releases = parse_manifest(sample_manifest_json()).expect("valid");
        let versions: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, ["3.13.0-rc.1", "3.12.4"]);
        assert!(!releases[0].stable);
        assert_eq!(
            releases[0].release_url.as_deref(),
            Some("https://example.test/3.13.0-rc.1")
        );
        assert_eq!(
            releases[0].files[0].platform_version.as_deref(),
            Some("22.04")
        );
        assert_eq!(releases[1].files.len(), 2);
    }

    #[test]
    fn primary_file_is_first_entry() {
        let releases = parse_manifest(sample_manifest_json()).expect("valid");
        let primary = releases[1].primary_file().expect("has files");
        assert_eq!(primary.filename, "python-3.12.4-win32-x64.zip");
    }

    #[test]
    fn release_without_files_has_no_primary_file() {
        let releases = parse_manifest(r#"[{"version":"3.12.4"}]"#).expect("valid");
        assert!(releases[0].primary_file().is_none());
        assert!(!releases[0].stable);
    }

    #[test]
    fn rejects_invalid_json_syntax() {
        assert!(parse_manifest("[{not json").is_err());
    }

    #[test]
    fn rejects_file_without_download_url() {
        let json = r#"[{"version":"3.12.4","files":[{"filename":"a","arch":"x64","platform":"linux"}]}]"#;
        assert!(parse_manifest(json).is_err());
    }

    #[test]
    fn reads_manifest_from_disk() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().join("versions-manifest.json"))
            .expect("UTF-8 path");
        std::fs::write(path.as_std_path(), sample_manifest_json()).expect("write manifest");

        let releases = read_manifest_file(&path).expect("readable manifest");
        assert_eq!(releases.len(), 2);
    }

    #[test]
    fn missing_manifest_file_reports_path() {
        let err = read_manifest_file(Utf8Path::new("/nonexistent/versions-manifest.json"))
            .expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/versions-manifest.json"));
    }
}
