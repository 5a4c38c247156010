//! Release selection by version range, architecture, and platform.
//!
//! Releases are scanned in manifest order (newest first) and the first one
//! that satisfies the requested version range and ships a file for the host
//! wins. Version ranges use npm-style syntax: a bare version means "exactly,
//! up to the precision given" (`3.12` accepts any `3.12.x`), comparators may
//! be separated by spaces or commas, `||` separates alternatives, and `x`
//! or `*` act as wildcards. Hyphen ranges (`3.10 - 3.12`) are inclusive at
//! both ends, and a leading `v` on a version is ignored.

use crate::manifest::{ToolRelease, ToolReleaseFile};
use crate::platform::PlatformKind;
use log::trace;
use semver::{Version, VersionReq};

/// Errors arising from release matching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The requested version range could not be parsed.
    #[error("invalid version specification \"{spec}\": {reason}")]
    InvalidVersionSpec {
        /// The rejected specification.
        spec: String,
        /// Description of the parse failure.
        reason: String,
    },
}

/// What the caller is looking for.
#[derive(Debug, Clone, Copy)]
pub struct MatchCriteria<'a> {
    /// Requested version range (e.g. `3.12`, `>=3.11 <3.13`).
    pub version_spec: &'a str,
    /// Manifest architecture tag (e.g. `x64`).
    pub architecture: &'a str,
    /// Platform whose files are eligible.
    pub platform: PlatformKind,
    /// Host OS version for files that declare a `platform_version`.
    pub os_version: Option<&'a str>,
    /// Skip releases not marked stable.
    pub stable_only: bool,
}

/// Picks the release to install from a manifest.
pub trait ReleaseMatcher {
    /// Return the best release for `criteria`, carrying only the file
    /// selected for the host, or `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] if the criteria themselves are invalid.
    fn find_release(
        &self,
        criteria: &MatchCriteria<'_>,
        releases: &[ToolRelease],
    ) -> Result<Option<ToolRelease>, MatchError>;
}

/// Default matcher using semantic version ranges.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverMatcher;

impl ReleaseMatcher for SemverMatcher {
    fn find_release(
        &self,
        criteria: &MatchCriteria<'_>,
        releases: &[ToolRelease],
    ) -> Result<Option<ToolRelease>, MatchError> {
        let spec = VersionSpec::parse(criteria.version_spec)?;

        for release in releases {
            let Ok(version) = Version::parse(&release.version) else {
                trace!("Skipping unparseable manifest version {}", release.version);
                continue;
            };
            if !spec.matches(&version) || (criteria.stable_only && !release.stable) {
                continue;
            }
            let Some(file) = release.files.iter().find(|file| file_matches(file, criteria)) else {
                trace!(
                    "Python {} has no {} build for {}",
                    release.version, criteria.architecture, criteria.platform
                );
                continue;
            };
            return Ok(Some(ToolRelease {
                files: vec![file.clone()],
                ..release.clone()
            }));
        }

        Ok(None)
    }
}

fn file_matches(file: &ToolReleaseFile, criteria: &MatchCriteria<'_>) -> bool {
    file.arch == criteria.architecture
        && file.platform == criteria.platform.manifest_tag()
        && platform_version_matches(file.platform_version.as_deref(), criteria.os_version)
}

/// Files without a `platform_version` suit any host; otherwise the host
/// version must equal it or satisfy it as a range.
fn platform_version_matches(required: Option<&str>, host: Option<&str>) -> bool {
    let Some(required) = required else {
        return true;
    };
    let Some(host) = host else {
        return false;
    };
    host == required
        || Version::parse(host)
            .ok()
            .zip(VersionSpec::parse(required).ok())
            .is_some_and(|(version, spec)| spec.matches(&version))
}

/// A parsed npm-style version range.
///
/// # Examples
///
/// ```
/// use cpython_installer::matcher::VersionSpec;
/// use semver::Version;
///
/// let spec = VersionSpec::parse("3.12").expect("valid range");
/// assert!(spec.matches(&Version::new(3, 12, 4)));
/// assert!(!spec.matches(&Version::new(3, 13, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    alternatives: Vec<VersionReq>,
}

impl VersionSpec {
    /// Parse a range expression.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidVersionSpec`] for empty or malformed
    /// ranges.
    pub fn parse(spec: &str) -> Result<Self, MatchError> {
        let invalid = |reason: String| MatchError::InvalidVersionSpec {
            spec: spec.to_owned(),
            reason,
        };
        if spec.trim().is_empty() {
            return Err(invalid("version specification is empty".to_owned()));
        }
        let alternatives = spec
            .split("||")
            .map(|alternative| parse_alternative(alternative).map_err(invalid))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    /// Whether `version` satisfies any alternative of the range.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

fn parse_alternative(alternative: &str) -> Result<VersionReq, String> {
    let comparators = expand_hyphen_ranges(split_comparators(alternative))?;
    if comparators.is_empty() {
        return Err("empty alternative".to_owned());
    }
    let normalised = comparators
        .iter()
        .map(|comparator| normalise_comparator(comparator))
        .collect::<Vec<_>>()
        .join(", ");
    VersionReq::parse(&normalised).map_err(|err| err.to_string())
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~' | '^')
}

/// Split on commas and whitespace, re-attaching detached operators such as
/// the `>=` in `>= 3.11`.
fn split_comparators(alternative: &str) -> Vec<String> {
    let mut comparators = Vec::new();
    let mut pending_operator = String::new();
    for token in alternative
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
    {
        if token.chars().all(is_operator_char) {
            pending_operator.push_str(token);
        } else {
            comparators.push(format!("{pending_operator}{token}"));
            pending_operator.clear();
        }
    }
    if !pending_operator.is_empty() {
        comparators.push(pending_operator);
    }
    comparators
}

/// Expand hyphen ranges: `3.10 - 3.12` becomes `>=3.10`, `<=3.12`.
///
/// A partial upper bound stays partial, so `<=3.12` still admits `3.12.x`.
fn expand_hyphen_ranges(tokens: Vec<String>) -> Result<Vec<String>, String> {
    let mut expanded: Vec<String> = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        if token != "-" {
            expanded.push(token);
            continue;
        }
        match (expanded.pop(), tokens.next()) {
            (Some(lower), Some(upper)) => {
                expanded.push(format!(">={lower}"));
                expanded.push(format!("<={upper}"));
            }
            _ => return Err("hyphen range needs a lower and an upper bound".to_owned()),
        }
    }
    Ok(expanded)
}

/// Rewrite one npm comparator into `semver` crate syntax.
fn normalise_comparator(comparator: &str) -> String {
    let bare = comparator.trim_start_matches(is_operator_char);
    let operator = comparator.strip_suffix(bare).unwrap_or_default();
    let version = bare
        .strip_prefix(['v', 'V'])
        .unwrap_or(bare)
        .split('.')
        .map(|part| if matches!(part, "x" | "X") { "*" } else { part })
        .collect::<Vec<_>>()
        .join(".");

    if operator.is_empty() && !version.contains('*') {
        format!("={version}")
    } else {
        format!("{operator}{version}")
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
