//! faultline Common Library
//!
//! This crate provides shared constants and configuration loading utilities
//! for all faultline workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Default paths and names
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! faultline = { package = "faultline_common", path = "../faultline_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use faultline_common::config::{ConfigLoader, SharedConfig};
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
