//! The runtime seam: importing modules by name.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::entity::Entity;

/// Failure to import a module.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no module named '{name}'")]
    NoSuchModule { name: String },

    #[error("module '{name}' failed to initialize: {message}")]
    Init { name: String, message: String },
}

/// Access to a live runtime's module graph and global scope.
///
/// The engine is generic over this seam; any provider that can import
/// modules by name and designate a global-scope module will do. Rust has no
/// ambient reflection, so the shipped provider is [`CatalogRuntime`], which
/// hosts the namespace in-process.
pub trait Runtime: Send + Sync {
    /// Name of the module that backs the global scope.
    fn globals_name(&self) -> &str;

    /// An already-imported module, if any. Never triggers an import.
    fn module(&self, name: &str) -> Option<Entity>;

    /// Import a module by name, instantiating it on first use.
    ///
    /// Importing an already-imported module returns the same entity.
    fn load(&self, name: &str) -> Result<Entity, LoadError>;

    /// The global-scope module, if it has been imported.
    fn globals(&self) -> Option<Entity> {
        self.module(self.globals_name())
    }
}

/// Factory producing a module entity on first import.
pub type ModuleFactory = Box<dyn Fn() -> Result<Entity, LoadError> + Send + Sync>;

/// A runtime backed by a catalog of module factories.
///
/// Each registered name is importable; the factory runs once and the
/// resulting entity is cached, so repeated imports observe the same module
/// (attribute mutations included).
pub struct CatalogRuntime {
    globals_name: String,
    factories: BTreeMap<String, ModuleFactory>,
    loaded: RwLock<BTreeMap<String, Entity>>,
}

impl CatalogRuntime {
    pub fn new(globals_name: &str) -> Self {
        Self {
            globals_name: globals_name.to_string(),
            factories: BTreeMap::new(),
            loaded: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a module factory under a name.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Result<Entity, LoadError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Register a pre-built module entity.
    pub fn register_entity(&mut self, name: &str, entity: Entity) {
        self.register(name, move || Ok(entity.clone()));
    }

    /// Names of every importable module, loaded or not.
    pub fn catalog(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl Runtime for CatalogRuntime {
    fn globals_name(&self) -> &str {
        &self.globals_name
    }

    fn module(&self, name: &str) -> Option<Entity> {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn load(&self, name: &str) -> Result<Entity, LoadError> {
        if let Some(entity) = self.module(name) {
            return Ok(entity);
        }
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| LoadError::NoSuchModule {
                name: name.to_string(),
            })?;
        let entity = factory()?;
        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), entity.clone());
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleEntity, ValueEntity};
    use serde_json::json;

    fn runtime_with_math() -> CatalogRuntime {
        let mut runtime = CatalogRuntime::new("builtins");
        runtime.register("math", || {
            let m = ModuleEntity::new("math");
            m.set_attr("pi", ValueEntity::new(json!(3.141592653589793)));
            Ok(m)
        });
        runtime
    }

    #[test]
    fn load_instantiates_once() {
        let runtime = runtime_with_math();
        let first = runtime.load("math").unwrap();
        first
            .attr("pi")
            .expect("registered attribute should be present");

        // Second import observes the same entity.
        let m = runtime.load("math").unwrap();
        assert!(std::sync::Arc::ptr_eq(&first, &m));
    }

    #[test]
    fn module_never_imports() {
        let runtime = runtime_with_math();
        assert!(runtime.module("math").is_none());
        runtime.load("math").unwrap();
        assert!(runtime.module("math").is_some());
    }

    #[test]
    fn unknown_module_fails() {
        let runtime = runtime_with_math();
        // `unwrap_err` would need `Debug` on the Ok side, which trait-object
        // entities do not have.
        assert!(matches!(
            runtime.load("nope"),
            Err(LoadError::NoSuchModule { .. })
        ));
    }

    #[test]
    fn globals_resolves_after_import() {
        let mut runtime = CatalogRuntime::new("builtins");
        runtime.register_entity("builtins", ModuleEntity::new("builtins"));
        assert!(runtime.globals().is_none());
        runtime.load("builtins").unwrap();
        assert!(runtime.globals().is_some());
    }
}
