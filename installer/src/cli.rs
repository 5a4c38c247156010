//! CLI argument definitions for the CPython installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::{MANIFEST_REFERENCE_ENV, TOKEN_ENV};
use crate::platform::host_architecture;
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Install a prebuilt CPython release from a versions manifest.
#[derive(Parser, Debug, Clone)]
#[command(name = "cpython-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install a prebuilt CPython release from a versions manifest.\n\n",
    "The installer fetches versions-manifest.json from a GitHub repository ",
    "(actions/python-versions@main unless overridden), picks the newest release ",
    "matching VERSION_SPEC for this platform and architecture, downloads and ",
    "extracts it, and runs the setup script bundled with the release.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the newest CPython 3.12:\n",
    "    $ cpython-installer 3.12\n\n",
    "  Install a range for 32-bit Windows:\n",
    "    $ cpython-installer \">=3.10, <3.12\" -a x86\n\n",
    "  Use a fork of the manifest repository:\n",
    "    $ cpython-installer 3.13 --manifest-reference me/python-versions@release/v2\n\n",
    "  Show the release that would be installed:\n",
    "    $ cpython-installer 3.11 --dry-run",
))]
pub struct Cli {
    /// Version range to install (e.g. 3.12, ">=3.11 <3.13", 3.13.0-beta.1).
    #[arg(value_name = "VERSION_SPEC")]
    pub version_spec: String,

    /// Architecture tag to install [default: host architecture].
    #[arg(short, long, value_name = "ARCH")]
    pub architecture: Option<String>,

    /// Token used to authenticate GitHub requests.
    #[arg(long, env = TOKEN_ENV, hide_env_values = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Manifest location as owner/repo@ref [default: actions/python-versions@main].
    #[arg(long, env = MANIFEST_REFERENCE_ENV, value_name = "OWNER/REPO@REF")]
    pub manifest_reference: Option<String>,

    /// Read the versions manifest from a local file instead of fetching it.
    #[arg(long, value_name = "PATH")]
    pub manifest_file: Option<Utf8PathBuf>,

    /// Only consider releases marked stable.
    #[arg(long)]
    pub stable_only: bool,

    /// Resolve and report the release without downloading it.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// The requested architecture, falling back to the host's manifest tag.
    #[must_use]
    pub fn architecture(&self) -> &str {
        match self.architecture.as_deref().map(str::trim) {
            Some(arch) if !arch.is_empty() => arch,
            _ => host_architecture(),
        }
    }

    /// Log level selected by `--verbose` and `--quiet`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use cpython_installer::cli::Cli;
    /// use log::LevelFilter;
    ///
    /// let cli = Cli::parse_from(["cpython-installer", "3.12", "-v"]);
    /// assert_eq!(cli.log_level(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
