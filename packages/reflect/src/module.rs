//! In-memory entity implementations.
//!
//! These are enough to host a reflected namespace inside the current
//! process: modules with mutable attribute tables, immutable class-like
//! namespaces, callables, and plain JSON-carried values. Attribute tables
//! are `BTreeMap`s so member enumeration is sorted and stable.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value as JsonValue;

use crate::entity::{Entity, EntityKind, Reflect};

/// A module with a mutable attribute table.
///
/// Attributes can be added after construction (and after the module is
/// shared as an [`Entity`]), which is what allows module graphs to contain
/// cycles: build both modules, then wire the references.
pub struct ModuleEntity {
    name: String,
    doc: Option<String>,
    attrs: RwLock<BTreeMap<String, Entity>>,
}

impl ModuleEntity {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            doc: None,
            attrs: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn with_doc(name: &str, doc: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            doc: Some(doc.to_string()),
            attrs: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace an attribute.
    pub fn set_attr(&self, name: &str, entity: Entity) {
        self.attrs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), entity);
    }
}

impl Reflect for ModuleEntity {
    fn kind(&self) -> EntityKind {
        EntityKind::Module
    }

    fn attr(&self, name: &str) -> Option<Entity> {
        self.attrs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn members(&self) -> Vec<String> {
        self.attrs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn render(&self) -> String {
        match &self.doc {
            Some(doc) => format!("<module {}>\n{}\n", self.name, doc),
            None => format!("<module {}>\n", self.name),
        }
    }
}

/// An immutable class-like container.
pub struct NamespaceEntity {
    name: String,
    attrs: BTreeMap<String, Entity>,
}

impl NamespaceEntity {
    pub fn new(name: &str, attrs: BTreeMap<String, Entity>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            attrs,
        })
    }

    /// Build a namespace from `(name, entity)` pairs.
    pub fn from_pairs<I>(name: &str, pairs: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (String, Entity)>,
    {
        Self::new(name, pairs.into_iter().collect())
    }
}

impl Reflect for NamespaceEntity {
    fn kind(&self) -> EntityKind {
        EntityKind::Namespace
    }

    fn attr(&self, name: &str) -> Option<Entity> {
        self.attrs.get(name).cloned()
    }

    fn members(&self) -> Vec<String> {
        self.attrs.keys().cloned().collect()
    }

    fn render(&self) -> String {
        format!("<namespace {}>\n", self.name)
    }
}

/// A callable with an optional source text.
pub struct CallableEntity {
    name: String,
    signature: String,
    source: Option<String>,
}

impl CallableEntity {
    pub fn new(name: &str, signature: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            signature: signature.to_string(),
            source: None,
        })
    }

    pub fn with_source(name: &str, signature: &str, source: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            signature: signature.to_string(),
            source: Some(source.to_string()),
        })
    }
}

impl Reflect for CallableEntity {
    fn kind(&self) -> EntityKind {
        EntityKind::Callable
    }

    fn attr(&self, _name: &str) -> Option<Entity> {
        None
    }

    fn members(&self) -> Vec<String> {
        Vec::new()
    }

    fn render(&self) -> String {
        match &self.source {
            Some(source) => source.clone(),
            None => format!("<callable {}({})>\n", self.name, self.signature),
        }
    }
}

/// A plain value, carried as JSON.
pub struct ValueEntity {
    value: JsonValue,
}

impl ValueEntity {
    pub fn new(value: JsonValue) -> Arc<Self> {
        Arc::new(Self { value })
    }
}

impl Reflect for ValueEntity {
    fn kind(&self) -> EntityKind {
        EntityKind::Value
    }

    fn attr(&self, _name: &str) -> Option<Entity> {
        None
    }

    fn members(&self) -> Vec<String> {
        Vec::new()
    }

    fn render(&self) -> String {
        // `{:#}` is serde_json's pretty form and cannot fail, unlike
        // `to_string_pretty`.
        format!("{:#}\n", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn module_attrs_are_sorted() {
        let m = ModuleEntity::new("m");
        m.set_attr("zeta", ValueEntity::new(json!(1)));
        m.set_attr("alpha", ValueEntity::new(json!(2)));
        assert_eq!(m.members(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn module_attr_lookup() {
        let m = ModuleEntity::new("m");
        m.set_attr("x", ValueEntity::new(json!("hello")));
        let x = m.attr("x").unwrap();
        assert_eq!(x.kind(), EntityKind::Value);
        assert!(m.attr("y").is_none());
    }

    #[test]
    fn module_graph_may_cycle() {
        let m = ModuleEntity::new("selfish");
        m.set_attr("selfish", m.clone());
        // One lazy hop at a time: following the cycle terminates per step.
        let inner = m.attr("selfish").unwrap();
        assert_eq!(inner.kind(), EntityKind::Module);
        let deeper = inner.attr("selfish").unwrap();
        assert!(deeper.members().contains(&"selfish".to_string()));
    }

    #[test]
    fn callable_renders_source_when_available() {
        let with = CallableEntity::with_source("f", "x", "def f(x):\n    return x\n");
        assert!(with.render().starts_with("def f"));
        let without = CallableEntity::new("g", "a, b");
        assert_eq!(without.render(), "<callable g(a, b)>\n");
    }

    #[test]
    fn value_renders_pretty_json() {
        let v = ValueEntity::new(json!({"a": 1}));
        let text = v.render();
        assert!(text.contains("\"a\""));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn namespace_members_and_render() {
        let ns = NamespaceEntity::from_pairs(
            "Point",
            vec![
                ("x".to_string(), ValueEntity::new(json!(0)) as Entity),
                ("y".to_string(), ValueEntity::new(json!(0)) as Entity),
            ],
        );
        assert_eq!(ns.kind(), EntityKind::Namespace);
        assert_eq!(ns.members(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(ns.render(), "<namespace Point>\n");
    }
}
