//! Reserved paths and path splitting.
//!
//! The virtual hierarchy partitions into three reserved areas:
//!
//! ```text
//! /.modules    # control file: read the registry, write to load modules
//! /bin/        # one symlink per global-scope name
//! /lib/        # loaded modules and their attribute trees
//! ```
//!
//! Paths are opaque slash-delimited strings; nothing here touches the
//! reflected namespace.

/// The built-ins aliasing area.
pub const BIN_PREFIX: &str = "/bin";

/// The module/attribute tree.
pub const LIB_PREFIX: &str = "/lib";

/// The module registry control file.
pub const CONTROL_FILE: &str = "/.modules";

/// Name of the control file as a root directory entry.
pub const CONTROL_NAME: &str = ".modules";

/// Split a path into its non-empty segments.
///
/// Normalizes repeated and trailing slashes, so `"/lib//json/"` and
/// `"/lib/json"` split identically.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Whether a path denotes the root directory.
pub fn is_root(path: &str) -> bool {
    matches!(path, "/" | "/." | "/..")
}

/// Compute the relative target for a built-ins symlink.
///
/// The target is derived structurally from the source path alone: climb out
/// of the built-ins area back to the root, then descend into the library
/// area's global-scope module. For `/bin/len` with globals `builtins` this
/// yields `../lib/builtins/len`.
pub fn builtin_link_target(source: &str, globals: &str, name: &str) -> String {
    let ups = source.matches('/').count().saturating_sub(1);
    format!(
        "{}{}/{}/{}",
        "../".repeat(ups),
        &LIB_PREFIX[1..],
        globals,
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_normalize_slashes() {
        assert_eq!(segments("/lib/json"), vec!["lib", "json"]);
        assert_eq!(segments("/lib//json/"), vec!["lib", "json"]);
        assert!(segments("/").is_empty());
    }

    #[test]
    fn root_forms() {
        assert!(is_root("/"));
        assert!(is_root("/."));
        assert!(is_root("/.."));
        assert!(!is_root("/lib"));
    }

    #[test]
    fn link_target_climbs_to_lib() {
        assert_eq!(
            builtin_link_target("/bin/len", "builtins", "len"),
            "../lib/builtins/len"
        );
    }
}
