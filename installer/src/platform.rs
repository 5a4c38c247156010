//! Host platform detection and per-platform installation behaviour.
//!
//! Everything that differs between operating systems (archive format, the
//! interpreter used to run the bundled setup script, and the dynamic library
//! search path handed to that script) lives in one [`PlatformProfile`] table
//! keyed by [`PlatformKind`].

use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Operating-system family of a CPython release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    /// Linux distributions.
    Linux,
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
}

/// Archive container used for release artefacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tarball.
    TarGz,
    /// Zip archive.
    Zip,
}

/// Installation behaviour for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    /// Format of the downloaded archive.
    pub archive_format: ArchiveFormat,
    /// Program that runs the setup script.
    pub installer_program: &'static str,
    /// Arguments passed to [`Self::installer_program`], relative to the
    /// extracted directory.
    pub installer_args: &'static [&'static str],
    /// Environment variable pointed at the extracted `lib` directory while
    /// the setup script runs, if any.
    pub library_path_var: Option<&'static str>,
}

const LINUX: PlatformProfile = PlatformProfile {
    archive_format: ArchiveFormat::TarGz,
    installer_program: "bash",
    installer_args: &["./setup.sh"],
    library_path_var: Some("LD_LIBRARY_PATH"),
};

const MACOS: PlatformProfile = PlatformProfile {
    archive_format: ArchiveFormat::TarGz,
    installer_program: "bash",
    installer_args: &["./setup.sh"],
    library_path_var: None,
};

const WINDOWS: PlatformProfile = PlatformProfile {
    archive_format: ArchiveFormat::Zip,
    installer_program: "powershell",
    installer_args: &["./setup.ps1"],
    library_path_var: None,
};

impl PlatformKind {
    /// The platform this binary was compiled for.
    ///
    /// Unix flavours other than macOS are treated as Linux.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    /// Platform tag used by `platform` fields in the versions manifest.
    ///
    /// # Examples
    ///
    /// ```
    /// use cpython_installer::platform::PlatformKind;
    ///
    /// assert_eq!(PlatformKind::MacOs.manifest_tag(), "darwin");
    /// assert_eq!(PlatformKind::Windows.manifest_tag(), "win32");
    /// ```
    #[must_use]
    pub const fn manifest_tag(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "darwin",
            Self::Windows => "win32",
        }
    }

    /// Installation behaviour for this platform.
    #[must_use]
    pub const fn profile(self) -> &'static PlatformProfile {
        match self {
            Self::Linux => &LINUX,
            Self::MacOs => &MACOS,
            Self::Windows => &WINDOWS,
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_tag())
    }
}

impl PlatformProfile {
    /// The library search path entry for a setup script running in
    /// `extracted_dir`, if this platform needs one.
    #[must_use]
    pub fn library_path_entry(&self, extracted_dir: &Path) -> Option<(&'static str, PathBuf)> {
        self.library_path_var
            .map(|var| (var, extracted_dir.join("lib")))
    }
}

/// Map a Rust architecture name to the tag used by the versions manifest.
///
/// Unknown names pass through unchanged.
///
/// # Examples
///
/// ```
/// use cpython_installer::platform::architecture_tag;
///
/// assert_eq!(architecture_tag("x86_64"), "x64");
/// assert_eq!(architecture_tag("aarch64"), "arm64");
/// assert_eq!(architecture_tag("riscv64"), "riscv64");
/// ```
#[must_use]
pub fn architecture_tag(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "x86",
        "arm" => "arm",
        other => other,
    }
}

/// Manifest architecture tag for the host.
#[must_use]
pub fn host_architecture() -> &'static str {
    architecture_tag(std::env::consts::ARCH)
}

/// Operating-system version used to match `platform_version` entries.
///
/// Linux reads `VERSION_ID` from `/etc/os-release`; macOS asks `sw_vers`.
/// Windows releases carry no platform version, so nothing is probed there.
/// Probe failures are logged and yield `None`.
#[must_use]
pub fn os_version(platform: PlatformKind) -> Option<String> {
    let version = match platform {
        PlatformKind::Linux => std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|contents| parse_os_release_version(&contents)),
        PlatformKind::MacOs => macos_product_version(),
        PlatformKind::Windows => None,
    };
    debug!("Detected {platform} OS version: {version:?}");
    version
}

/// Extract `VERSION_ID` from the contents of an `os-release` file.
///
/// # Examples
///
/// ```
/// use cpython_installer::platform::parse_os_release_version;
///
/// let contents = "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\n";
/// assert_eq!(parse_os_release_version(contents).as_deref(), Some("22.04"));
/// ```
#[must_use]
pub fn parse_os_release_version(contents: &str) -> Option<String> {
    contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("VERSION_ID="))
        .map(|value| value.trim().trim_matches(|c| c == '"' || c == '\'').to_owned())
        .find(|value| !value.is_empty())
}

fn macos_product_version() -> Option<String> {
    let output = Command::new("sw_vers")
        .arg("-productVersion")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    (!version.is_empty()).then_some(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::linux(PlatformKind::Linux, ArchiveFormat::TarGz, "bash", "./setup.sh")]
    #[case::macos(PlatformKind::MacOs, ArchiveFormat::TarGz, "bash", "./setup.sh")]
    #[case::windows(PlatformKind::Windows, ArchiveFormat::Zip, "powershell", "./setup.ps1")]
    fn profile_selects_archive_and_script(
        #[case] platform: PlatformKind,
        #[case] format: ArchiveFormat,
        #[case] program: &str,
        #[case] script: &str,
    ) {
        let profile = platform.profile();
        assert_eq!(profile.archive_format, format);
        assert_eq!(profile.installer_program, program);
        assert_eq!(profile.installer_args, &[script]);
    }

    #[test]
    fn only_linux_sets_library_path() {
        let dir = Path::new("/tmp/python");
        assert_eq!(
            PlatformKind::Linux.profile().library_path_entry(dir),
            Some(("LD_LIBRARY_PATH", PathBuf::from("/tmp/python/lib")))
        );
        assert_eq!(PlatformKind::MacOs.profile().library_path_entry(dir), None);
        assert_eq!(PlatformKind::Windows.profile().library_path_entry(dir), None);
    }

    #[rstest]
    #[case::quoted("VERSION_ID=\"24.04\"", Some("24.04"))]
    #[case::bare("ID=debian\nVERSION_ID=12", Some("12"))]
    #[case::single_quoted("VERSION_ID='9.4'", Some("9.4"))]
    #[case::missing("NAME=\"Arch Linux\"\nID=arch", None)]
    #[case::empty_value("VERSION_ID=\"\"", None)]
    fn parses_os_release(#[case] contents: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_os_release_version(contents).as_deref(), expected);
    }

    #[test]
    fn display_uses_manifest_tag() {
        assert_eq!(PlatformKind::Linux.to_string(), "linux");
    }

    #[test]
    fn host_architecture_is_never_empty() {
        assert!(!host_architecture().is_empty());
    }
}
