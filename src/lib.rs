//! terminal-utils: small interactive terminal helpers behind one binary, `tutils`.
//!
//! # Helpers
//!
//! - [`servers`]: a plain-text list of SSH servers, with host key repair on connect
//! - [`repos`]: a JSON registry of GitHub repositories and branch pairs, plus the
//!   `gh` based create-and-merge flow
//! - [`bump`]: semantic version bumps for `pyproject.toml` and `package.json` projects
//! - [`update`]: cached checks against the latest GitHub release
//! - [`installer`]: release download, extraction and shell profile setup
//!
//! # Shared modules
//!
//! - [`cli`]: clap definitions, menus and prompts
//! - [`config`]: `~/.tutils/config.toml` and the data directory layout
//! - [`core`]: error types and user-facing error formatting
//! - [`git`]: the handful of `git` invocations the helpers need
//! - [`utils`]: subprocess builder, file writes, platform lookups, progress bars
//!
//! Parsing and formatting live in plain functions next to the types they
//! operate on; everything that touches a subprocess, the network or the
//! terminal sits at the edges so it can be swapped in tests.

pub mod bump;
pub mod cli;
pub mod config;
pub mod core;
pub mod git;
pub mod installer;
pub mod repos;
pub mod servers;
pub mod update;
pub mod utils;
