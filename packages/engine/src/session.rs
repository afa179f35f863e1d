//! The filesystem-call adapter.
//!
//! [`Session`] owns the process-wide mutable state of a mount — the module
//! registry and the open-file-handle table — and exposes the conventional
//! filesystem-call surface over the resolver. Errors map onto POSIX codes
//! via [`FsError::errno`]; nothing is retried and nothing is swallowed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nsfs_reflect::{LoadError, Runtime};

use crate::paths;
use crate::registry::ModuleRegistry;
use crate::resolver::{CannotResolve, Node, Resolver};

#[cfg(target_os = "linux")]
const BAD_HANDLE_ERRNO: i32 = libc::EBADFD;
#[cfg(not(target_os = "linux"))]
const BAD_HANDLE_ERRNO: i32 = libc::EBADF;

/// Failure of a filesystem call.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("no such entry: {path}")]
    NotFound { path: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("bad file handle: {fh}")]
    BadHandle { fh: u64 },

    #[error("i/o error: {message}")]
    Io { message: String },
}

impl FsError {
    /// The POSIX error code to report for this failure.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound { .. } => libc::ENOENT,
            FsError::PermissionDenied { .. } => libc::EPERM,
            FsError::BadHandle { .. } => BAD_HANDLE_ERRNO,
            FsError::Io { .. } => libc::EIO,
        }
    }
}

impl From<CannotResolve> for FsError {
    fn from(err: CannotResolve) -> Self {
        FsError::NotFound { path: err.path }
    }
}

/// Structural kind of a resolved filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    RegularFile,
    Symlink,
}

/// POSIX-style metadata for `getattr`.
#[derive(Debug, Clone, Copy)]
pub struct Attr {
    pub kind: FileKind,
    pub perm: u16,
    pub nlink: u32,
    pub size: u64,
}

impl Attr {
    fn dir(nlink: u32) -> Self {
        Self {
            kind: FileKind::Directory,
            perm: 0o555,
            nlink,
            size: 0,
        }
    }

    fn file(perm: u16, size: u64) -> Self {
        Self {
            kind: FileKind::RegularFile,
            perm,
            nlink: 1,
            size,
        }
    }

    fn symlink(size: u64) -> Self {
        Self {
            kind: FileKind::Symlink,
            perm: 0o777,
            nlink: 1,
            size,
        }
    }
}

#[derive(Default)]
struct HandleTable {
    next: u64,
    open: HashMap<u64, i32>,
}

impl HandleTable {
    fn insert(&mut self, flags: i32) -> u64 {
        let fh = self.next;
        self.next += 1;
        self.open.insert(fh, flags);
        fh
    }

    fn flags(&self, fh: u64) -> Result<i32, FsError> {
        self.open
            .get(&fh)
            .copied()
            .ok_or(FsError::BadHandle { fh })
    }

    fn remove(&mut self, fh: u64) -> Result<(), FsError> {
        self.open
            .remove(&fh)
            .map(|_| ())
            .ok_or(FsError::BadHandle { fh })
    }
}

struct SessionState {
    registry: ModuleRegistry,
    handles: HandleTable,
}

/// A mount session: the adapter plus its mutable state.
///
/// One lock guards both the registry and the handle table; critical
/// sections are short and contention is low, so finer grain buys nothing.
pub struct Session {
    runtime: Arc<dyn Runtime>,
    state: Mutex<SessionState>,
}

impl Session {
    /// Create a session, loading the bootstrap set before the filesystem
    /// becomes available.
    pub fn new(runtime: Arc<dyn Runtime>, bootstrap: &[&str]) -> Result<Self, LoadError> {
        let mut registry = ModuleRegistry::new();
        for name in bootstrap {
            registry.load(runtime.as_ref(), name)?;
        }
        Ok(Self {
            runtime,
            state: Mutex::new(SessionState {
                registry,
                handles: HandleTable::default(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Metadata for a path. Side-effect-free.
    pub fn getattr(&self, path: &str) -> Result<Attr, FsError> {
        let state = self.lock();
        let resolver = Resolver::new(self.runtime.as_ref(), &state.registry);
        let attr = match resolver.classify(path)? {
            Node::Root => Attr::dir(2),
            Node::LibRoot | Node::BinRoot | Node::Dir(_) => Attr::dir(3),
            Node::Control => Attr::file(0o666, state.registry.content().len() as u64),
            Node::Symlink { target } => Attr::symlink(target.len() as u64),
            Node::File { entity, executable } => {
                let perm = if executable { 0o555 } else { 0o444 };
                Attr::file(perm, entity.render().len() as u64)
            }
        };
        tracing::trace!(path, ?attr, "getattr");
        Ok(attr)
    }

    /// Directory listing, dot-entries included.
    pub fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let state = self.lock();
        let resolver = Resolver::new(self.runtime.as_ref(), &state.registry);
        let mut entries = vec![".".to_string(), "..".to_string()];
        entries.extend(resolver.children(path)?);
        tracing::trace!(path, count = entries.len(), "readdir");
        Ok(entries)
    }

    /// Target of a symlink.
    pub fn readlink(&self, path: &str) -> Result<String, FsError> {
        let state = self.lock();
        let resolver = Resolver::new(self.runtime.as_ref(), &state.registry);
        match resolver.classify(path)? {
            Node::Symlink { target } => Ok(target),
            _ => Err(FsError::Io {
                message: format!("not a symlink: {}", path),
            }),
        }
    }

    /// Read up to `size` bytes of content starting at `offset`.
    ///
    /// Reads past end-of-content return an empty result; a resolvable
    /// regular file or symlink never fails here.
    pub fn read(&self, path: &str, size: usize, offset: u64) -> Result<Vec<u8>, FsError> {
        let state = self.lock();
        let resolver = Resolver::new(self.runtime.as_ref(), &state.registry);
        let content = resolver.content(path)?;
        let start = offset.min(content.len() as u64) as usize;
        let end = content.len().min(start.saturating_add(size));
        tracing::trace!(path, offset, len = end - start, "read");
        Ok(content[start..end].to_vec())
    }

    /// Policy-gate an open and issue a handle.
    ///
    /// The control file rejects combined read-write access and treats a
    /// truncate flag as an immediate registry reset. Every other path is
    /// immutable through this interface and rejects any write intent.
    pub fn open(&self, path: &str, flags: i32) -> Result<u64, FsError> {
        let mut state = self.lock();
        let accmode = flags & libc::O_ACCMODE;
        if path == paths::CONTROL_FILE {
            if accmode == libc::O_RDWR {
                tracing::debug!(path, flags, "rejecting read-write open of control file");
                return Err(FsError::PermissionDenied {
                    path: path.to_string(),
                });
            }
            if flags & libc::O_TRUNC != 0 {
                state.registry.reset();
            }
        } else {
            if accmode == libc::O_WRONLY || accmode == libc::O_RDWR {
                tracing::debug!(path, flags, "rejecting write-intent open");
                return Err(FsError::PermissionDenied {
                    path: path.to_string(),
                });
            }
            let resolver = Resolver::new(self.runtime.as_ref(), &state.registry);
            resolver.classify(path)?;
        }
        let fh = state.handles.insert(flags);
        tracing::trace!(path, fh, flags, "open");
        Ok(fh)
    }

    /// Truncate: permitted only for the control file at length zero, where
    /// it resets the registry.
    pub fn truncate(&self, path: &str, length: u64, _fh: Option<u64>) -> Result<(), FsError> {
        if path != paths::CONTROL_FILE {
            return Err(FsError::PermissionDenied {
                path: path.to_string(),
            });
        }
        if length != 0 {
            return Err(FsError::Io {
                message: "control file only truncates to zero".to_string(),
            });
        }
        self.lock().registry.reset();
        tracing::trace!(path, "truncate");
        Ok(())
    }

    /// Accept written bytes as a module name to load.
    ///
    /// Requires an open handle and either append mode or a zero offset —
    /// partial in-place edits are not supported. The full input length is
    /// reported as accepted even though the payload is interpreted as a
    /// command rather than stored; an import failure is logged and does not
    /// fail the write.
    pub fn write(&self, path: &str, data: &[u8], offset: u64, fh: u64) -> Result<u32, FsError> {
        let mut state = self.lock();
        let flags = state.handles.flags(fh)?;
        if flags & libc::O_APPEND == 0 && offset != 0 {
            tracing::debug!(path, offset, "rejecting in-place write");
            return Err(FsError::PermissionDenied {
                path: path.to_string(),
            });
        }
        let text = String::from_utf8_lossy(data);
        let name = text.trim();
        if !name.is_empty() {
            if let Err(err) = state.registry.load(self.runtime.as_ref(), name) {
                tracing::debug!(module = name, %err, "module load via control file failed");
            }
        }
        tracing::trace!(path, fh, len = data.len(), "write");
        Ok(data.len() as u32)
    }

    /// Close a handle. Returns the handle id.
    pub fn release(&self, path: &str, fh: u64) -> Result<u64, FsError> {
        self.lock().handles.remove(fh)?;
        tracing::trace!(path, fh, "release");
        Ok(fh)
    }

    /// Session teardown: drop every outstanding handle.
    pub fn destroy(&self) {
        let mut state = self.lock();
        let outstanding = state.handles.open.len();
        if outstanding > 0 {
            tracing::debug!(outstanding, "releasing handles at teardown");
        }
        state.handles.open.clear();
    }
}
