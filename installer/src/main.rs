//! CPython installer CLI entrypoint.
//!
//! This binary resolves a Python version range against a versions manifest,
//! then downloads, extracts, and installs the matching prebuilt release.
//! Progress is logged to stderr; the final summary is printed to stdout.

use clap::Parser;
use cpython_installer::cli::Cli;
use cpython_installer::config::InstallerConfig;
use cpython_installer::download::HttpDownloader;
use cpython_installer::error::{InstallerError, Result};
use cpython_installer::extraction::extractor_for;
use cpython_installer::install::Installer;
use cpython_installer::manifest::read_manifest_file;
use cpython_installer::matcher::SemverMatcher;
use cpython_installer::output::{DryRunInfo, success_message};
use cpython_installer::script::SystemScriptRunner;
use log::{LevelFilter, info};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Route `log` records to stderr; `RUST_LOG` refines the CLI-selected level.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write) -> Result<()> {
    let config = InstallerConfig::from_cli(cli)?;
    let downloader = HttpDownloader::new(config.auth.clone());
    let extractor = extractor_for(config.platform.profile().archive_format);
    let runner = SystemScriptRunner;
    let installer = Installer::new(&config, &downloader, extractor, &runner, &SemverMatcher);

    let architecture = cli.architecture();
    let local_manifest = cli
        .manifest_file
        .as_deref()
        .map(read_manifest_file)
        .transpose()?;

    info!(
        "Resolving Python {} for {architecture} on {}",
        cli.version_spec, config.platform
    );
    let release =
        installer.require_release(&cli.version_spec, architecture, local_manifest.as_deref())?;

    if cli.dry_run {
        let info = DryRunInfo {
            manifest_reference: &config.manifest_reference,
            version_spec: &cli.version_spec,
            architecture,
            release: &release,
        };
        return write_stdout_line(stdout, info.display_text());
    }

    info!("Found Python {} in manifest", release.version);
    installer.install_from_release(&release)?;
    write_stdout_line(stdout, success_message(&release, architecture))
}

fn write_stdout_line(stdout: &mut dyn Write, message: impl std::fmt::Display) -> Result<()> {
    writeln!(stdout, "{message}").map_err(|source| InstallerError::WriteFailed { source })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; nothing else to tell.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpython_installer::download::DownloadError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = InstallerError::from(DownloadError::HttpStatus {
            url: "https://example.test/python.tar.gz".to_owned(),
            status: 404,
        });

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("error: unexpected HTTP response: 404"));
    }

    #[test]
    fn malformed_reference_fails_before_any_request() {
        let cli = Cli::parse_from([
            "cpython-installer",
            "3.12",
            "--manifest-reference",
            "a/b@c@d",
        ]);
        let mut stdout = Vec::new();
        let err = run(&cli, &mut stdout).expect_err("malformed reference");
        assert!(matches!(err, InstallerError::ReferenceFormat(_)));
        assert!(stdout.is_empty());
    }

    #[test]
    fn dry_run_with_local_manifest_prints_resolution() {
        let temp = tempfile::tempdir().expect("temp dir");
        let manifest_path = temp.path().join("versions-manifest.json");
        std::fs::write(
            &manifest_path,
            concat!(
                r#"[{"version":"3.12.4","stable":true,"files":["#,
                r#"{"filename":"python-3.12.4-any.tar.gz","arch":"riscv-test","#,
                r#""platform":"linux","download_url":"https://example.test/a.tar.gz"},"#,
                r#"{"filename":"python-3.12.4-any.zip","arch":"riscv-test","#,
                r#""platform":"win32","download_url":"https://example.test/a.zip"},"#,
                r#"{"filename":"python-3.12.4-any-mac.tar.gz","arch":"riscv-test","#,
                r#""platform":"darwin","download_url":"https://example.test/m.tar.gz"}]}]"#,
            ),
        )
        .expect("write manifest");
        let manifest_arg = manifest_path.to_str().expect("UTF-8 path");
        let cli = Cli::parse_from([
            "cpython-installer",
            "3.12",
            "--architecture",
            "riscv-test",
            "--manifest-reference",
            "me/pythons@v1",
            "--manifest-file",
            manifest_arg,
            "--dry-run",
        ]);

        let mut stdout = Vec::new();
        run(&cli, &mut stdout).expect("dry run succeeds");

        let text = String::from_utf8(stdout).expect("UTF-8 output");
        assert!(text.contains("Resolved: Python 3.12.4"));
        assert!(text.contains("Manifest: me/pythons@v1"));
    }

    #[test]
    fn missing_local_manifest_is_reported() {
        let cli = Cli::parse_from([
            "cpython-installer",
            "3.12",
            "--manifest-file",
            "/nonexistent/versions-manifest.json",
        ]);
        let mut stdout = Vec::new();
        let err = run(&cli, &mut stdout).expect_err("missing file");
        assert!(matches!(err, InstallerError::ManifestParse(_)));
    }
}
