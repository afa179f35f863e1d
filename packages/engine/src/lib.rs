//! # nsfs-engine
//!
//! The namespace-mapping engine: maps a reflected namespace onto a virtual
//! file hierarchy and adapts POSIX-style filesystem calls onto it.
//!
//! ## Hierarchy
//!
//! ```text
//! /
//!   .modules      # control file: read the registry, write a name to load it
//!   bin/          # one symlink per global-scope name, into lib/
//!   lib/          # loaded modules and their attribute trees
//!     json/       # a module is a directory
//!       encode    # a callable is a read+execute file (cat it for its text)
//! ```
//!
//! Two layers:
//!
//! - [`Resolver`] — pure query logic: path → [`Node`] classification,
//!   content generation, child enumeration. Fails with [`CannotResolve`],
//!   never guesses.
//! - [`Session`] — the filesystem-call adapter. Owns the mount's mutable
//!   state (the [`ModuleRegistry`] and the open-file-handle table) behind a
//!   single lock, and turns resolver outcomes and policy checks into
//!   [`FsError`] values with POSIX error codes.
//!
//! The engine reaches the live namespace through the `nsfs-reflect` seam
//! and never depends on any particular mount mechanism.

pub mod paths;
pub mod registry;
pub mod resolver;
pub mod session;

pub use registry::ModuleRegistry;
pub use resolver::{CannotResolve, Node, Resolver};
pub use session::{Attr, FileKind, FsError, Session};
