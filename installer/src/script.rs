//! Running the setup script bundled with each release.
//!
//! Every CPython archive carries a platform-specific setup script that copies
//! the interpreter into the tool cache. The script runs inside the extracted
//! directory with the inherited environment plus any platform-specific
//! overrides. Its output is forwarded line by line to the log: stdout at info
//! level, stderr at error level.

use crate::error::{InstallerError, Result};
use crate::platform::PlatformKind;
use log::{error, info, warn};
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// A fully described setup script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    /// Program to execute (e.g. `bash`).
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Directory the script runs in.
    pub working_dir: PathBuf,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(String, OsString)>,
}

impl ScriptInvocation {
    /// The setup script run for `platform` in `extracted_dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cpython_installer::platform::PlatformKind;
    /// use cpython_installer::script::ScriptInvocation;
    /// use std::path::Path;
    ///
    /// let run = ScriptInvocation::for_platform(PlatformKind::Windows, Path::new("C:/py"));
    /// assert_eq!(run.program, "powershell");
    /// assert_eq!(run.args, ["./setup.ps1"]);
    /// assert!(run.env.is_empty());
    /// ```
    #[must_use]
    pub fn for_platform(platform: PlatformKind, extracted_dir: &Path) -> Self {
        let profile = platform.profile();
        let env = profile
            .library_path_entry(extracted_dir)
            .map(|(var, path)| (var.to_owned(), path.into_os_string()))
            .into_iter()
            .collect();
        Self {
            program: profile.installer_program.to_owned(),
            args: profile
                .installer_args
                .iter()
                .map(|arg| (*arg).to_owned())
                .collect(),
            working_dir: extracted_dir.to_path_buf(),
            env,
        }
    }
}

/// Abstraction for running setup scripts.
pub trait ScriptRunner {
    /// Run `invocation` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ScriptSpawn`] if the program cannot be
    /// started and [`InstallerError::ScriptFailed`] if it exits unsuccessfully.
    fn run(&self, invocation: &ScriptInvocation) -> Result<()>;
}

/// Runs scripts as child processes of the installer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemScriptRunner;

impl ScriptRunner for SystemScriptRunner {
    fn run(&self, invocation: &ScriptInvocation) -> Result<()> {
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .envs(
                invocation
                    .env
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_os_str())),
            )
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InstallerError::ScriptSpawn {
                program: invocation.program.clone(),
                source,
            })?;

        let stderr_forwarder = child
            .stderr
            .take()
            .map(|pipe| thread::spawn(move || forward_lines(pipe, |line| error!("{line}"))));
        if let Some(pipe) = child.stdout.take() {
            forward_lines(pipe, |line| info!("{line}"));
        }
        if let Some(handle) = stderr_forwarder {
            if handle.join().is_err() {
                warn!("stderr forwarding thread panicked");
            }
        }

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(InstallerError::ScriptFailed {
                program: invocation.program.clone(),
                code: status.code(),
            })
        }
    }
}

/// Emit each non-blank line of `pipe`, trimmed and decoded lossily.
///
/// The pipe is drained until EOF so the child never blocks on a full pipe.
fn forward_lines(pipe: impl Read, mut emit: impl FnMut(&str)) {
    for chunk in BufReader::new(pipe).split(b'\n') {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("failed to read script output: {err}");
                break;
            }
        };
        let line = String::from_utf8_lossy(&bytes);
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            emit(trimmed);
        }
    }
}
