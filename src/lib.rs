//! profile-banner crate
//!
//! This crate is an implementation detail of the `profile-banner` tool. Its API is fluid and may change without warning
//! and in a semver-incompatible way.

pub type Result<T, E = anyhow::Error> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod commands;

#[doc(hidden)]
pub mod config;

#[doc(hidden)]
pub mod facts;

#[doc(hidden)]
pub mod misc;

#[doc(hidden)]
pub mod patch;

pub use crate::commands::{Host, run};
