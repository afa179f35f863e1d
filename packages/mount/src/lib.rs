//! # nsfs-mount
//!
//! Thin glue around `nsfs-engine`: the FUSE bridge (inode ↔ path
//! translation over the path-based session), the standard module catalog,
//! and the configuration file for the `nsfs` binary.

pub mod catalog;
pub mod config;
pub mod fs;

pub use catalog::{standard, DEFAULT_BOOTSTRAP};
pub use config::Config;
pub use fs::{mount, NsfsFs};
