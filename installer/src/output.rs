//! Output formatting for the installer CLI.
//!
//! Builds the text reported on stdout after a dry run or a successful
//! installation. Progress is reported through the log instead.

use crate::manifest::ToolRelease;
use crate::reference::RepositoryReference;

/// Resolution details for dry-run output.
///
/// # Example
///
/// ```
/// use cpython_installer::manifest::ToolRelease;
/// use cpython_installer::output::DryRunInfo;
/// use cpython_installer::reference::parse_manifest_reference;
///
/// let reference = parse_manifest_reference("actions/python-versions@main").expect("valid");
/// let release = ToolRelease {
///     version: "3.12.4".to_owned(),
///     stable: true,
///     release_url: None,
///     files: Vec::new(),
/// };
/// let info = DryRunInfo {
///     manifest_reference: &reference,
///     version_spec: "3.12",
///     architecture: "x64",
///     release: &release,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("3.12.4"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Where the manifest came from.
    pub manifest_reference: &'a RepositoryReference,
    /// The requested version range.
    pub version_spec: &'a str,
    /// The requested architecture tag.
    pub architecture: &'a str,
    /// The release that would be installed.
    pub release: &'a ToolRelease,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - nothing will be downloaded or installed".to_owned(),
            String::new(),
            format!("Manifest: {}", self.manifest_reference),
            format!("Requested: {} ({})", self.version_spec, self.architecture),
            format!(
                "Resolved: Python {}{}",
                self.release.version,
                if self.release.stable { "" } else { " (pre-release)" }
            ),
        ];

        if let Some(file) = self.release.primary_file() {
            lines.push(format!("Archive: {}", file.filename));
            lines.push(format!("Download URL: {}", file.download_url));
            if let Some(platform_version) = &file.platform_version {
                lines.push(format!(
                    "Platform: {} {platform_version}",
                    file.platform
                ));
            } else {
                lines.push(format!("Platform: {}", file.platform));
            }
        }

        lines.join("\n")
    }
}

/// Format a success message after installation.
#[must_use]
pub fn success_message(release: &ToolRelease, architecture: &str) -> String {
    format!(
        "Successfully installed Python {} ({architecture})",
        release.version
    )
}
