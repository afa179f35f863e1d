//! # nsfs-reflect
//!
//! The entity model and reflection seam for nsfs.
//!
//! A reflected namespace is a directed graph of *entities*: modules,
//! namespace-like containers (classes, nested scopes), callables, and plain
//! values. This crate defines the closed classification of those kinds
//! ([`EntityKind`]), the object-safe trait every reflected entity implements
//! ([`Reflect`]), and the seam through which an engine reaches a live
//! runtime ([`Runtime`]: import modules by name, find the global scope).
//!
//! It also ships in-memory implementations sufficient to host a namespace
//! inside the current process:
//!
//! - [`ModuleEntity`] — a module with mutable attributes (so module graphs
//!   may contain cycles, e.g. a module reachable from itself)
//! - [`NamespaceEntity`] — an immutable class-like container
//! - [`CallableEntity`] — a function with an optional source text
//! - [`ValueEntity`] — a plain value carried as [`serde_json::Value`]
//! - [`CatalogRuntime`] — a runtime backed by a catalog of module factories,
//!   instantiating each module once on first import
//!
//! ## Example
//!
//! ```rust
//! use nsfs_reflect::{CatalogRuntime, ModuleEntity, Runtime, ValueEntity};
//! use serde_json::json;
//!
//! let mut runtime = CatalogRuntime::new("builtins");
//! runtime.register("math", || {
//!     let m = ModuleEntity::new("math");
//!     m.set_attr("pi", ValueEntity::new(json!(3.141592653589793)));
//!     Ok(m)
//! });
//!
//! let math = runtime.load("math").unwrap();
//! assert!(math.attr("pi").is_some());
//! ```

pub mod entity;
pub mod module;
pub mod runtime;

pub use entity::{Entity, EntityKind, Reflect};
pub use module::{CallableEntity, ModuleEntity, NamespaceEntity, ValueEntity};
pub use runtime::{CatalogRuntime, LoadError, Runtime};
