// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! picoup - resolve and install Raspberry Pi Pico SDK toolchains.
//!
//! The binary is a thin layer over this library:
//!
//! - [`cli`] - argument parsing, [`cli::CliError`] and exit codes
//! - [`config`] - flag / settings file / default precedence
//! - [`commands`] - `detect`, `resolve`, `install`, `toolchains`, `plan-install`
//! - [`tracing`] - stderr logging with a per-run correlation id

pub mod cli;
pub mod commands;
pub mod config;
pub mod tracing;

pub use cli::{CliError, exit_code_for};
pub use config::{FileSettings, Settings};
