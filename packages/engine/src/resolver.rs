//! Path resolution over the reflected namespace.
//!
//! The resolver is pure query logic: given a path and the registry's current
//! membership, it decides what the path denotes ([`Resolver::classify`]),
//! what bytes it contains ([`Resolver::content`]), and what children it
//! lists ([`Resolver::children`]). Nothing is cached; every call re-derives
//! its answer from the live namespace, so the view never goes stale.
//!
//! Resolution is a left-to-right fold over path segments with one reflective
//! lookup per segment. Because it never expands more than one segment at a
//! time, cyclic attribute graphs cost one lookup per step and cannot cause
//! unbounded work.

use nsfs_reflect::{Entity, EntityKind, Runtime};

use crate::paths;
use crate::registry::ModuleRegistry;

/// The resolver's only failure: the path denotes nothing.
#[derive(Debug, Clone, thiserror::Error)]
#[error("cannot resolve path '{path}'")]
pub struct CannotResolve {
    pub path: String,
}

impl CannotResolve {
    fn at(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

/// The outcome of resolving a path.
#[derive(Clone)]
pub enum Node {
    /// The hierarchy root (also `/.` and `/..`).
    Root,
    /// The library area root; children are the registry's members.
    LibRoot,
    /// The built-ins area root; children are the global-scope names.
    BinRoot,
    /// A module or namespace-like entity.
    Dir(Entity),
    /// A leaf entity; executable when the entity is callable.
    File { entity: Entity, executable: bool },
    /// A built-ins alias; the target is computed structurally.
    Symlink { target: String },
    /// The module registry control file.
    Control,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Node::Root => "Root",
            Node::LibRoot => "LibRoot",
            Node::BinRoot => "BinRoot",
            Node::Dir(_) => "Dir",
            Node::File { .. } => "File",
            Node::Symlink { .. } => "Symlink",
            Node::Control => "Control",
        };
        write!(f, "{}", name)
    }
}

/// Maps paths onto the reflected namespace.
///
/// Borrows the runtime and the registry's current membership; construct one
/// per call.
pub struct Resolver<'a> {
    runtime: &'a dyn Runtime,
    registry: &'a ModuleRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(runtime: &'a dyn Runtime, registry: &'a ModuleRegistry) -> Self {
        Self { runtime, registry }
    }

    /// Classify a path as a node of the hierarchy.
    pub fn classify(&self, path: &str) -> Result<Node, CannotResolve> {
        if paths::is_root(path) {
            return Ok(Node::Root);
        }
        let segs = paths::segments(path);
        match segs.as_slice() {
            [name] if *name == paths::CONTROL_NAME => Ok(Node::Control),
            // Dot-prefixed root names are reserved for control files; only
            // one exists.
            [name] if name.starts_with('.') => Err(CannotResolve::at(path)),
            ["bin"] => Ok(Node::BinRoot),
            ["bin", name] => {
                let globals = self
                    .runtime
                    .globals()
                    .ok_or_else(|| CannotResolve::at(path))?;
                if globals.attr(name).is_none() {
                    return Err(CannotResolve::at(path));
                }
                Ok(Node::Symlink {
                    target: paths::builtin_link_target(path, self.runtime.globals_name(), name),
                })
            }
            ["lib"] => Ok(Node::LibRoot),
            ["lib", module, rest @ ..] => {
                if !self.registry.contains(module) {
                    return Err(CannotResolve::at(path));
                }
                let mut entity = self
                    .runtime
                    .module(module)
                    .ok_or_else(|| CannotResolve::at(path))?;
                for seg in rest {
                    entity = entity.attr(seg).ok_or_else(|| CannotResolve::at(path))?;
                }
                if entity.kind().has_members() {
                    Ok(Node::Dir(entity))
                } else {
                    let executable = entity.kind() == EntityKind::Callable;
                    Ok(Node::File { entity, executable })
                }
            }
            _ => Err(CannotResolve::at(path)),
        }
    }

    /// Byte content of a path.
    ///
    /// Control file: the newline-joined registry. Regular file: the entity's
    /// textual rendering. Symlink: the target string. Directories have no
    /// byte content.
    pub fn content(&self, path: &str) -> Result<Vec<u8>, CannotResolve> {
        match self.classify(path)? {
            Node::Control => Ok(self.registry.content().into_bytes()),
            Node::Symlink { target } => Ok(target.into_bytes()),
            Node::File { entity, .. } => Ok(entity.render().into_bytes()),
            Node::Root | Node::LibRoot | Node::BinRoot | Node::Dir(_) => {
                Err(CannotResolve::at(path))
            }
        }
    }

    /// Child names of a directory node.
    ///
    /// A member whose entity is an ancestor of itself is listed once, as an
    /// ordinary directory; descending through it re-resolves one segment at
    /// a time, so the walk stays bounded per call.
    pub fn children(&self, path: &str) -> Result<Vec<String>, CannotResolve> {
        match self.classify(path)? {
            Node::Root => Ok(vec![
                paths::CONTROL_NAME.to_string(),
                "bin".to_string(),
                "lib".to_string(),
            ]),
            Node::LibRoot => Ok(self.registry.names().to_vec()),
            Node::BinRoot => Ok(self
                .runtime
                .globals()
                .map(|globals| globals.members())
                .unwrap_or_default()),
            Node::Dir(entity) => Ok(entity.members()),
            Node::Control | Node::File { .. } | Node::Symlink { .. } => {
                Err(CannotResolve::at(path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsfs_reflect::{CallableEntity, CatalogRuntime, ModuleEntity, ValueEntity};
    use serde_json::json;

    fn fixture() -> (CatalogRuntime, ModuleRegistry) {
        let mut rt = CatalogRuntime::new("builtins");
        rt.register("builtins", || {
            let m = ModuleEntity::new("builtins");
            m.set_attr("len", CallableEntity::new("len", "container"));
            m.set_attr("nil", ValueEntity::new(json!(null)));
            Ok(m)
        });
        rt.register("json", || {
            let m = ModuleEntity::new("json");
            m.set_attr("encode", CallableEntity::new("encode", "value"));
            m.set_attr("indent", ValueEntity::new(json!(2)));
            Ok(m)
        });
        let mut reg = ModuleRegistry::new();
        reg.load(&rt, "builtins").unwrap();
        reg.load(&rt, "json").unwrap();
        (rt, reg)
    }

    #[test]
    fn root_forms_resolve_to_root() {
        let (rt, reg) = fixture();
        let resolver = Resolver::new(&rt, &reg);
        for path in ["/", "/.", "/.."] {
            assert!(matches!(resolver.classify(path), Ok(Node::Root)));
        }
    }

    #[test]
    fn control_file_resolves() {
        let (rt, reg) = fixture();
        let resolver = Resolver::new(&rt, &reg);
        assert!(matches!(resolver.classify("/.modules"), Ok(Node::Control)));
        assert!(resolver.classify("/.other").is_err());
    }

    #[test]
    fn registered_module_is_a_directory() {
        let (rt, reg) = fixture();
        let resolver = Resolver::new(&rt, &reg);
        assert!(matches!(resolver.classify("/lib/json"), Ok(Node::Dir(_))));
        assert!(resolver.classify("/lib/does_not_exist").is_err());
    }

    #[test]
    fn unregistered_module_does_not_resolve_even_if_imported() {
        let (rt, _) = fixture();
        // Imported in the runtime but absent from the registry.
        rt.load("json").unwrap();
        let empty = ModuleRegistry::new();
        let resolver = Resolver::new(&rt, &empty);
        assert!(resolver.classify("/lib/json").is_err());
    }

    #[test]
    fn callable_is_executable_file() {
        let (rt, reg) = fixture();
        let resolver = Resolver::new(&rt, &reg);
        match resolver.classify("/lib/json/encode") {
            Ok(Node::File { executable, .. }) => assert!(executable),
            other => panic!("expected file, got {:?}", other),
        }
        match resolver.classify("/lib/json/indent") {
            Ok(Node::File { executable, .. }) => assert!(!executable),
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[test]
    fn resolution_fails_at_first_missing_segment() {
        let (rt, reg) = fixture();
        let resolver = Resolver::new(&rt, &reg);
        assert!(resolver.classify("/lib/json/nope").is_err());
        assert!(resolver.classify("/lib/json/encode/deeper").is_err());
    }

    #[test]
    fn builtin_symlink_target_re_resolves() {
        let (rt, reg) = fixture();
        let resolver = Resolver::new(&rt, &reg);
        match resolver.classify("/bin/len") {
            Ok(Node::Symlink { target }) => {
                assert_eq!(target, "../lib/builtins/len");
                // Following the link from /bin lands on a resolvable path.
                assert!(matches!(
                    resolver.classify("/lib/builtins/len"),
                    Ok(Node::File { .. })
                ));
            }
            other => panic!("expected symlink, got {:?}", other),
        }
        assert!(resolver.classify("/bin/unknown_global").is_err());
    }

    #[test]
    fn children_of_root_and_areas() {
        let (rt, reg) = fixture();
        let resolver = Resolver::new(&rt, &reg);
        assert_eq!(resolver.children("/").unwrap(), [".modules", "bin", "lib"]);
        assert_eq!(resolver.children("/lib").unwrap(), ["builtins", "json"]);
        let bin = resolver.children("/bin").unwrap();
        assert!(bin.contains(&"len".to_string()));
        assert!(resolver.children("/lib/json/indent").is_err());
    }

    #[test]
    fn cyclic_module_lists_once_and_descends() {
        let mut rt = CatalogRuntime::new("builtins");
        rt.register("loops", || {
            let m = ModuleEntity::new("loops");
            m.set_attr("loops", m.clone());
            Ok(m)
        });
        let mut reg = ModuleRegistry::new();
        reg.load(&rt, "loops").unwrap();
        let resolver = Resolver::new(&rt, &reg);

        let names = resolver.children("/lib/loops").unwrap();
        assert_eq!(names, ["loops"]);
        // Each descent step is one lazy lookup; arbitrary depth resolves.
        assert!(matches!(
            resolver.classify("/lib/loops/loops/loops/loops"),
            Ok(Node::Dir(_))
        ));
    }

    #[test]
    fn control_content_tracks_registry() {
        let (rt, mut reg) = fixture();
        {
            let resolver = Resolver::new(&rt, &reg);
            assert_eq!(resolver.content("/.modules").unwrap(), b"builtins\njson\n");
        }
        reg.reset();
        let resolver = Resolver::new(&rt, &reg);
        assert!(resolver.content("/.modules").unwrap().is_empty());
    }
}
