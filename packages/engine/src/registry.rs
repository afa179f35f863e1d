//! The module registry backing the control file.

use nsfs_reflect::{LoadError, Runtime};

/// Ordered, duplicate-free record of the modules loaded through the control
/// file (plus the bootstrap set loaded at session start).
///
/// This is the only explicit state the resolver consults; everything else is
/// re-derived from the live namespace on every call.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    names: Vec<String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a module and record its name.
    ///
    /// Idempotent: a name already present is left alone. The name is only
    /// appended after the import succeeds, so the registry never lists a
    /// module the resolver cannot reach.
    pub fn load(&mut self, runtime: &dyn Runtime, name: &str) -> Result<(), LoadError> {
        if self.contains(name) {
            return Ok(());
        }
        runtime.load(name)?;
        self.names.push(name.to_string());
        tracing::debug!(module = name, "module registered");
        Ok(())
    }

    /// Clear the registry to genuinely empty.
    ///
    /// The bootstrap set is not re-added; the registry stays empty until new
    /// names are written.
    pub fn reset(&mut self) {
        tracing::debug!(count = self.names.len(), "registry reset");
        self.names.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The control file's readable content: newline-separated names, in
    /// load order, with a trailing newline when non-empty.
    pub fn content(&self) -> String {
        if self.names.is_empty() {
            String::new()
        } else {
            let mut out = self.names.join("\n");
            out.push('\n');
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsfs_reflect::{CatalogRuntime, ModuleEntity};

    fn runtime() -> CatalogRuntime {
        let mut rt = CatalogRuntime::new("builtins");
        for name in ["builtins", "json", "os"] {
            rt.register_entity(name, ModuleEntity::new(name));
        }
        rt
    }

    #[test]
    fn load_is_idempotent() {
        let rt = runtime();
        let mut reg = ModuleRegistry::new();
        reg.load(&rt, "json").unwrap();
        reg.load(&rt, "json").unwrap();
        assert_eq!(reg.names(), ["json".to_string()]);
    }

    #[test]
    fn failed_import_leaves_registry_unchanged() {
        let rt = runtime();
        let mut reg = ModuleRegistry::new();
        assert!(reg.load(&rt, "missing").is_err());
        assert!(reg.names().is_empty());
        assert_eq!(reg.content(), "");
    }

    #[test]
    fn content_preserves_load_order() {
        let rt = runtime();
        let mut reg = ModuleRegistry::new();
        reg.load(&rt, "os").unwrap();
        reg.load(&rt, "json").unwrap();
        assert_eq!(reg.content(), "os\njson\n");
    }

    #[test]
    fn reset_is_genuinely_empty() {
        let rt = runtime();
        let mut reg = ModuleRegistry::new();
        reg.load(&rt, "builtins").unwrap();
        reg.reset();
        assert!(reg.names().is_empty());
        assert_eq!(reg.content(), "");
    }
}
