//! Process-wide configuration, read once at startup.
//!
//! The authorization token and the manifest reference override arrive from
//! the command line or the environment exported by the workflow runner.
//! [`InstallerConfig`] captures them together with host facts so that the
//! rest of the installer never consults global state.

use crate::cli::Cli;
use crate::platform::{PlatformKind, os_version};
use crate::reference::{ReferenceFormatError, RepositoryReference, parse_manifest_reference};
use std::fmt;

/// Manifest source used when no override is configured.
pub const DEFAULT_MANIFEST_REFERENCE: &str = "actions/python-versions@main";

/// Environment variable carrying the authorization token.
pub const TOKEN_ENV: &str = "INPUT_TOKEN";

/// Environment variable carrying the manifest reference override.
pub const MANIFEST_REFERENCE_ENV: &str = "INPUT_USES-CPYTHON-MANIFEST";

/// Pick the manifest reference to use and parse it.
///
/// A present, non-blank override wins; otherwise
/// [`DEFAULT_MANIFEST_REFERENCE`] applies. Absence is not an error.
///
/// # Errors
///
/// Returns [`ReferenceFormatError`] when the chosen string is not
/// `owner/repo@ref`.
///
/// # Examples
///
/// ```
/// use cpython_installer::config::resolve_manifest_reference;
///
/// let default = resolve_manifest_reference(None).expect("default parses");
/// assert_eq!(default.to_string(), "actions/python-versions@main");
///
/// let custom = resolve_manifest_reference(Some("me/pythons@v2")).expect("valid");
/// assert_eq!(custom.owner(), "me");
/// ```
pub fn resolve_manifest_reference(
    override_value: Option<&str>,
) -> Result<RepositoryReference, ReferenceFormatError> {
    let raw = override_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_MANIFEST_REFERENCE);
    parse_manifest_reference(raw)
}

/// A secret token used to authenticate GitHub requests.
///
/// The `Debug` output never includes the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a token, treating blank input as no token.
    #[must_use]
    pub fn new(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Value for the `Authorization` request header.
    ///
    /// # Examples
    ///
    /// ```
    /// use cpython_installer::config::AuthToken;
    ///
    /// let token = AuthToken::new("ghs_abc").expect("non-blank");
    /// assert_eq!(token.authorization_header(), "token ghs_abc");
    /// assert!(AuthToken::new("  ").is_none());
    /// ```
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("token {}", self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Immutable configuration for one installer run.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Token for authenticated requests, if configured.
    pub auth: Option<AuthToken>,
    /// Where the versions manifest is fetched from.
    pub manifest_reference: RepositoryReference,
    /// Platform whose releases and installation behaviour apply.
    pub platform: PlatformKind,
    /// Host OS version used for `platform_version` matching.
    pub os_version: Option<String>,
    /// Only consider releases marked stable.
    pub stable_only: bool,
}

impl InstallerConfig {
    /// Configuration with the default manifest source and no token.
    #[must_use]
    pub fn for_platform(platform: PlatformKind) -> Self {
        Self {
            auth: None,
            manifest_reference: default_reference(),
            platform,
            os_version: None,
            stable_only: false,
        }
    }

    /// Build the configuration from parsed command-line arguments, probing
    /// the host platform and OS version.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceFormatError`] when the manifest reference override
    /// is malformed.
    pub fn from_cli(cli: &Cli) -> Result<Self, ReferenceFormatError> {
        let platform = PlatformKind::host();
        Ok(Self {
            auth: cli.token.as_deref().and_then(AuthToken::new),
            manifest_reference: resolve_manifest_reference(cli.manifest_reference.as_deref())?,
            platform,
            os_version: os_version(platform),
            stable_only: cli.stable_only,
        })
    }
}

fn default_reference() -> RepositoryReference {
    RepositoryReference::from_parts("actions", "python-versions", "main")
}
