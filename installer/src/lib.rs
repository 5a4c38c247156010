//! CPython installer library.
//!
//! This crate resolves a Python version range against the
//! `versions-manifest.json` published in a GitHub repository, downloads the
//! matching prebuilt CPython archive for the host, extracts it, and runs the
//! setup script bundled with it. It is used by the `cpython-installer` CLI
//! binary and can be consumed programmatically for testing or custom
//! installation workflows.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Process-wide configuration and manifest reference resolution
//! - [`download`] - Manifest retrieval and archive downloads
//! - [`error`] - Error types
//! - [`extraction`] - Archive extraction with path traversal protection
//! - [`install`] - Release resolution and installation orchestration
//! - [`manifest`] - Versions manifest model and parsing
//! - [`matcher`] - Release selection by version range and platform
//! - [`output`] - Dry-run and completion messages
//! - [`platform`] - Host detection and per-platform behaviour
//! - [`reference`] - `owner/repo@ref` parsing and manifest URLs
//! - [`script`] - Running the bundled setup script

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod extraction;
pub mod install;
pub mod manifest;
pub mod matcher;
pub mod output;
pub mod platform;
pub mod reference;
pub mod script;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
