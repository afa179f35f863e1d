//! Entity classification and the `Reflect` trait.

use std::fmt;
use std::sync::Arc;

/// A reflected entity, shared across the resolver and the runtime.
///
/// Entities form a directed graph through attribute references; the graph
/// may contain cycles. `Arc` keeps the graph alive for the duration of a
/// mount session without any ownership gymnastics.
pub type Entity = Arc<dyn Reflect>;

/// The closed classification of reflected entities.
///
/// Structural decisions (directory vs. file, executable bit) key off this
/// variant rather than off ad-hoc string checks, so a new reflected kind
/// extends the enum instead of patching scattered conditionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A loaded module.
    Module,
    /// A class-like container: enumerable members, not itself a module.
    Namespace,
    /// A function or other callable object.
    Callable,
    /// A plain value.
    Value,
}

impl EntityKind {
    /// Whether entities of this kind have enumerable children.
    ///
    /// Container kinds map to directories; the rest map to regular files.
    pub fn has_members(&self) -> bool {
        matches!(self, EntityKind::Module | EntityKind::Namespace)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Module => "module",
            EntityKind::Namespace => "namespace",
            EntityKind::Callable => "callable",
            EntityKind::Value => "value",
        };
        write!(f, "{}", s)
    }
}

/// A reflectable value in the live namespace.
///
/// Implementations must be cheap to query: the resolver calls these methods
/// on every filesystem request and never caches the answers, so the view of
/// the namespace is always current.
///
/// # Object Safety
///
/// This trait is object-safe: entities are passed around as
/// `Arc<dyn Reflect>` (the [`Entity`] alias).
pub trait Reflect: Send + Sync {
    /// The structural kind of this entity.
    fn kind(&self) -> EntityKind;

    /// Look up a single attribute by name.
    ///
    /// Returns `None` when the attribute is absent (not an error condition).
    /// Leaf kinds (callables, values) have no attributes.
    fn attr(&self, name: &str) -> Option<Entity>;

    /// Enumerate member names.
    ///
    /// The order must be stable across two calls on an unchanged entity.
    /// Leaf kinds return an empty vector.
    fn members(&self) -> Vec<String>;

    /// A textual representation of this entity.
    ///
    /// For callables this is the source text when available, otherwise a
    /// generic descriptive form. Re-derived on every call.
    fn render(&self) -> String;
}

impl<T: Reflect + ?Sized> Reflect for Arc<T> {
    fn kind(&self) -> EntityKind {
        self.as_ref().kind()
    }

    fn attr(&self, name: &str) -> Option<Entity> {
        self.as_ref().attr(name)
    }

    fn members(&self) -> Vec<String> {
        self.as_ref().members()
    }

    fn render(&self) -> String {
        self.as_ref().render()
    }
}
