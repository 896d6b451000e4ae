// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! Core types for picoup.
//!
//! This crate holds the pure data model shared by the resolver, the metadata
//! providers and the installer:
//!
//! - [`HostEnvironment`], [`Os`], [`Arch`] - the closed set of supported hosts
//! - [`ComponentId`], [`InstallRequest`] - what the caller asked for
//! - [`Release`], [`ReleaseAsset`], [`ReleaseSource`] - upstream release metadata
//! - [`ToolchainIndex`], [`IndexSource`] - the toolchain version index
//! - [`ComponentPlan`], [`InstallPlan`] - the resolved, serializable plan
//! - [`Error`] - every failure kind with full diagnostic context

mod archive;
mod component;
mod error;
mod index;
mod plan;
mod platform;
mod release;

pub use archive::ArchiveType;
pub use component::{ComponentId, InstallRequest};
pub use error::{Error, Result};
pub use index::{IndexSource, PlatformKey, Provenance, ToolchainIndex};
pub use plan::{ComponentPlan, InstallPlan};
pub use platform::{Arch, HostEnvironment, Os};
pub use release::{Release, ReleaseAsset, ReleaseSource, Repository};

/// User agent sent with every upstream request.
pub const USER_AGENT: &str = concat!("picoup/", env!("CARGO_PKG_VERSION"));
