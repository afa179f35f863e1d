//! The standard module catalog.
//!
//! A small namespace reflecting the hosting process, enough to make a
//! mounted hierarchy worth exploring:
//!
//! ```text
//! builtins/    # the global scope: common constants and callables
//! json/        # encode/decode callables and a Decoder class
//! os/          # live environment reflection, plus `os` importing itself
//! re/          # pattern helpers
//! string/      # character-class constants
//! sys/         # host process info: pid, platform, argv
//! ```
//!
//! Everything except `os.environ` is built once at import. `environ` is a
//! live view: each lookup re-reads the process environment, so `cat
//! /lib/os/environ/HOME` is always current.

use std::sync::Arc;

use nsfs_reflect::{
    CallableEntity, CatalogRuntime, Entity, EntityKind, ModuleEntity, NamespaceEntity, Reflect,
    ValueEntity,
};
use serde_json::json;

/// Name of the global-scope module.
pub const GLOBALS: &str = "builtins";

/// The default bootstrap set: the global scope plus commonly used modules.
pub const DEFAULT_BOOTSTRAP: &[&str] = &["builtins", "json", "os", "re", "string", "sys"];

/// Live view of the process environment as a namespace entity.
///
/// Members and attribute values are re-derived from `std::env` on every
/// call; nothing is snapshotted.
struct EnvNamespace;

impl Reflect for EnvNamespace {
    fn kind(&self) -> EntityKind {
        EntityKind::Namespace
    }

    fn attr(&self, name: &str) -> Option<Entity> {
        std::env::var(name)
            .ok()
            .map(|value| ValueEntity::new(json!(value)) as Entity)
    }

    fn members(&self) -> Vec<String> {
        let mut names: Vec<String> = std::env::vars().map(|(k, _)| k).collect();
        names.sort();
        names
    }

    fn render(&self) -> String {
        "<namespace environ>\n".to_string()
    }
}

fn builtins() -> Arc<ModuleEntity> {
    let m = ModuleEntity::with_doc("builtins", "The global scope.");
    m.set_attr("nil", ValueEntity::new(json!(null)));
    m.set_attr("true", ValueEntity::new(json!(true)));
    m.set_attr("false", ValueEntity::new(json!(false)));
    m.set_attr("len", CallableEntity::new("len", "container"));
    m.set_attr("print", CallableEntity::new("print", "value"));
    m.set_attr("type", CallableEntity::new("type", "value"));
    m.set_attr("id", CallableEntity::new("id", "value"));
    m.set_attr(
        "help",
        CallableEntity::with_source(
            "help",
            "topic",
            "def help(topic):\n    \"\"\"Print the documentation for a topic.\"\"\"\n    print(doc_of(topic))\n",
        ),
    );
    m
}

fn json_module() -> Arc<ModuleEntity> {
    let m = ModuleEntity::with_doc("json", "Encode and decode JSON text.");
    m.set_attr("encode", CallableEntity::new("encode", "value"));
    m.set_attr("decode", CallableEntity::new("decode", "text"));
    m.set_attr("indent", ValueEntity::new(json!(2)));
    m.set_attr(
        "Decoder",
        NamespaceEntity::from_pairs(
            "Decoder",
            vec![
                (
                    "decode".to_string(),
                    CallableEntity::new("decode", "self, text") as Entity,
                ),
                (
                    "strict".to_string(),
                    ValueEntity::new(json!(true)) as Entity,
                ),
            ],
        ),
    );
    m
}

fn os_module() -> Arc<ModuleEntity> {
    let m = ModuleEntity::with_doc("os", "Operating system interface.");
    m.set_attr("environ", Arc::new(EnvNamespace));
    m.set_attr("getenv", CallableEntity::new("getenv", "name"));
    m.set_attr("getcwd", CallableEntity::new("getcwd", ""));
    m.set_attr("name", ValueEntity::new(json!(std::env::consts::OS)));
    // A module reaching itself through an attribute; resolution is lazy, so
    // the cycle is harmless.
    m.set_attr("os", m.clone());
    m
}

fn re_module() -> Arc<ModuleEntity> {
    let m = ModuleEntity::with_doc("re", "Regular expression helpers.");
    m.set_attr("compile", CallableEntity::new("compile", "pattern"));
    m.set_attr("matches", CallableEntity::new("matches", "pattern, text"));
    m.set_attr(
        "classes",
        ValueEntity::new(json!(["\\d", "\\s", "\\w", "\\b"])),
    );
    m
}

fn string_module() -> Arc<ModuleEntity> {
    let m = ModuleEntity::with_doc("string", "Common string constants.");
    m.set_attr(
        "ascii_lowercase",
        ValueEntity::new(json!("abcdefghijklmnopqrstuvwxyz")),
    );
    m.set_attr(
        "ascii_uppercase",
        ValueEntity::new(json!("ABCDEFGHIJKLMNOPQRSTUVWXYZ")),
    );
    m.set_attr("digits", ValueEntity::new(json!("0123456789")));
    m.set_attr("capitalize", CallableEntity::new("capitalize", "text"));
    m
}

fn sys_module() -> Arc<ModuleEntity> {
    let m = ModuleEntity::with_doc("sys", "Host process information.");
    m.set_attr("pid", ValueEntity::new(json!(std::process::id())));
    m.set_attr("platform", ValueEntity::new(json!(std::env::consts::OS)));
    m.set_attr("arch", ValueEntity::new(json!(std::env::consts::ARCH)));
    let argv: Vec<String> = std::env::args().collect();
    m.set_attr("argv", ValueEntity::new(json!(argv)));
    if let Ok(exe) = std::env::current_exe() {
        m.set_attr(
            "executable",
            ValueEntity::new(json!(exe.to_string_lossy())),
        );
    }
    m
}

/// Build the standard catalog runtime.
pub fn standard() -> CatalogRuntime {
    let mut runtime = CatalogRuntime::new(GLOBALS);
    runtime.register("builtins", || Ok(builtins() as Entity));
    runtime.register("json", || Ok(json_module() as Entity));
    runtime.register("os", || Ok(os_module() as Entity));
    runtime.register("re", || Ok(re_module() as Entity));
    runtime.register("string", || Ok(string_module() as Entity));
    runtime.register("sys", || Ok(sys_module() as Entity));
    runtime
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsfs_reflect::Runtime;
    use std::sync::{Mutex, PoisonError};

    // The test harness is multi-threaded and the process environment is
    // global; every test that mutates or enumerates it takes this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn bootstrap_set_is_importable() {
        let runtime = standard();
        for name in DEFAULT_BOOTSTRAP {
            let module = runtime.load(name).unwrap();
            assert_eq!(module.kind(), EntityKind::Module, "{}", name);
            assert!(!module.members().is_empty(), "{}", name);
        }
    }

    #[test]
    fn environ_is_live() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        std::env::set_var("NSFS_CATALOG_TEST", "first");
        let runtime = standard();
        let os = runtime.load("os").unwrap();
        let environ = os.attr("environ").unwrap();
        assert_eq!(environ.attr("NSFS_CATALOG_TEST").unwrap().render().trim(), "\"first\"");

        // Not a snapshot: a mutation after import is visible on re-read.
        std::env::set_var("NSFS_CATALOG_TEST", "second");
        assert_eq!(environ.attr("NSFS_CATALOG_TEST").unwrap().render().trim(), "\"second\"");
        std::env::remove_var("NSFS_CATALOG_TEST");
    }

    #[test]
    fn environ_members_are_sorted() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let names = EnvNamespace.members();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn os_reaches_itself() {
        let runtime = standard();
        let os = runtime.load("os").unwrap();
        let inner = os.attr("os").unwrap();
        assert!(inner.members().contains(&"environ".to_string()));
    }

    #[test]
    fn help_renders_source() {
        let runtime = standard();
        let builtins = runtime.load("builtins").unwrap();
        assert!(builtins.attr("help").unwrap().render().starts_with("def help"));
    }
}
