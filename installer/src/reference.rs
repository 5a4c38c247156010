//! Manifest repository references.
//!
//! A reference names the repository and git ref hosting the
//! `versions-manifest.json` that lists prebuilt CPython releases. It is
//! written as `owner/repo@ref`, the same shape a workflow `uses:` line takes.
//! The owner and repository are single path segments; the ref may contain
//! `/` (e.g. `releases/3.12`) but never `@`.

use std::fmt;
use std::str::FromStr;

/// Host serving raw repository content.
const RAW_CONTENT_HOST: &str = "https://raw.githubusercontent.com";

/// File name of the release manifest at the root of the repository.
pub const MANIFEST_FILENAME: &str = "versions-manifest.json";

/// The input did not match `owner/repo@ref`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid manifest reference \"{input}\": expected the format owner/repo@ref \
     ({{owner}}/{{repo}}@{{ref}})"
)]
pub struct ReferenceFormatError {
    input: String,
}

impl ReferenceFormatError {
    /// The rejected input string.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// A parsed `owner/repo@ref` triple.
///
/// # Examples
///
/// ```
/// use cpython_installer::reference::RepositoryReference;
///
/// let reference: RepositoryReference = "actions/python-versions@main"
///     .parse()
///     .expect("valid reference");
/// assert_eq!(reference.owner(), "actions");
/// assert_eq!(reference.repo(), "python-versions");
/// assert_eq!(reference.git_ref(), "main");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    owner: String,
    repo: String,
    git_ref: String,
}

impl RepositoryReference {
    /// Assemble a reference from segments already known to be well formed.
    pub(crate) fn from_parts(owner: &str, repo: &str, git_ref: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            git_ref: git_ref.to_owned(),
        }
    }

    /// Repository owner (user or organisation).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Branch, tag, or commit holding the manifest.
    #[must_use]
    pub fn git_ref(&self) -> &str {
        &self.git_ref
    }

    /// Raw-content URL of the versions manifest at this reference.
    ///
    /// Fields are substituted verbatim; the grammar already rules out `/`
    /// and `@` in the owner and repository segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use cpython_installer::reference::parse_manifest_reference;
    ///
    /// let reference = parse_manifest_reference("actions/python-versions@main")
    ///     .expect("valid reference");
    /// assert_eq!(
    ///     reference.manifest_raw_url(),
    ///     "https://raw.githubusercontent.com/actions/python-versions/main/versions-manifest.json",
    /// );
    /// ```
    #[must_use]
    pub fn manifest_raw_url(&self) -> String {
        format!(
            "{RAW_CONTENT_HOST}/{}/{}/{}/{MANIFEST_FILENAME}",
            self.owner, self.repo, self.git_ref
        )
    }
}

/// Parse an `owner/repo@ref` string.
///
/// The owner ends at the first `/`, the repository at the first `@`, and the
/// ref takes the rest. All three must be non-empty, the repository must not
/// contain `/`, and the ref must not contain `@`.
///
/// # Errors
///
/// Returns [`ReferenceFormatError`] when the input does not match the
/// grammar.
pub fn parse_manifest_reference(input: &str) -> Result<RepositoryReference, ReferenceFormatError> {
    let malformed = || ReferenceFormatError {
        input: input.to_owned(),
    };
    let (path, git_ref) = input.split_once('@').ok_or_else(malformed)?;
    let (owner, repo) = path.split_once('/').ok_or_else(malformed)?;

    let has_empty_segment = [owner, repo, git_ref].iter().any(|s| s.is_empty());
    if has_empty_segment || repo.contains('/') || git_ref.contains('@') {
        return Err(malformed());
    }

    Ok(RepositoryReference::from_parts(owner, repo, git_ref))
}

/// Raw-content URL of the versions manifest for `reference`.
#[must_use]
pub fn manifest_raw_url(reference: &RepositoryReference) -> String {
    reference.manifest_raw_url()
}

impl FromStr for RepositoryReference {
    type Err = ReferenceFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_manifest_reference(s)
    }
}

impl TryFrom<&str> for RepositoryReference {
    type Error = ReferenceFormatError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        parse_manifest_reference(value)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.git_ref)
    }
}
