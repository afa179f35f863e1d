//! FUSE bridge over the path-based session.
//!
//! The engine speaks paths; the kernel speaks inodes. This module keeps the
//! translation table (inode ↔ path, root pinned at 1, ids assigned on first
//! lookup) and forwards every FUSE callback to the corresponding
//! [`Session`] call, mapping [`FsError`] onto errno replies.
//!
//! Attribute entries are served with a zero TTL: content is regenerated
//! from the live namespace on every call, so the kernel must not cache.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fuser::{
    FileType, Filesystem, MountOption, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use nsfs_engine::{Attr, FileKind, Session};

const TTL: Duration = Duration::ZERO;
const ROOT_INO: u64 = 1;

/// Inode ↔ path translation table.
///
/// Paths are canonical (no trailing slash, root is `/`); an inode, once
/// assigned, stays bound to its path for the life of the mount. The table
/// only grows: `forget` is left at its default no-op, since an entry is a
/// short string pair and the hierarchy is bounded by the loaded modules, so
/// reclaiming ids buys nothing here.
struct InodeTable {
    paths: HashMap<u64, String>,
    inos: HashMap<String, u64>,
    next: u64,
}

impl InodeTable {
    fn new() -> Self {
        let mut table = Self {
            paths: HashMap::new(),
            inos: HashMap::new(),
            next: ROOT_INO + 1,
        };
        table.paths.insert(ROOT_INO, "/".to_string());
        table.inos.insert("/".to_string(), ROOT_INO);
        table
    }

    fn path(&self, ino: u64) -> Option<&str> {
        self.paths.get(&ino).map(String::as_str)
    }

    fn assign(&mut self, path: &str) -> u64 {
        if let Some(ino) = self.inos.get(path) {
            return *ino;
        }
        let ino = self.next;
        self.next += 1;
        self.paths.insert(ino, path.to_string());
        self.inos.insert(path.to_string(), ino);
        ino
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn file_type(kind: FileKind) -> FileType {
    match kind {
        FileKind::Directory => FileType::Directory,
        FileKind::RegularFile => FileType::RegularFile,
        FileKind::Symlink => FileType::Symlink,
    }
}

fn file_attr(ino: u64, attr: &Attr, uid: u32, gid: u32) -> fuser::FileAttr {
    fuser::FileAttr {
        ino,
        size: attr.size,
        blocks: 0,
        atime: UNIX_EPOCH,
        mtime: UNIX_EPOCH,
        ctime: UNIX_EPOCH,
        crtime: UNIX_EPOCH,
        kind: file_type(attr.kind),
        perm: attr.perm,
        nlink: attr.nlink,
        uid,
        gid,
        rdev: 0,
        blksize: 512,
        flags: 0,
    }
}

/// The mounted filesystem: a session plus the inode table.
pub struct NsfsFs {
    session: Session,
    inodes: InodeTable,
}

impl NsfsFs {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            inodes: InodeTable::new(),
        }
    }
}

impl Filesystem for NsfsFs {
    fn destroy(&mut self) {
        self.session.destroy();
    }

    fn lookup(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(base) = self.inodes.path(parent) else {
            reply.error(libc::ENOENT);
            return;
        };
        let path = child_path(base, &name.to_string_lossy());
        match self.session.getattr(&path) {
            Ok(attr) => {
                let ino = self.inodes.assign(&path);
                reply.entry(&TTL, &file_attr(ino, &attr, req.uid(), req.gid()), 0);
            }
            Err(err) => reply.error(err.errno()),
        }
    }

    fn getattr(&mut self, req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.session.getattr(path) {
            Ok(attr) => reply.attr(&TTL, &file_attr(ino, &attr, req.uid(), req.gid())),
            Err(err) => reply.error(err.errno()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let Some(path) = self.inodes.path(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };
        if let Some(length) = size {
            if let Err(err) = self.session.truncate(&path, length, fh) {
                reply.error(err.errno());
                return;
            }
        }
        match self.session.getattr(&path) {
            Ok(attr) => reply.attr(&TTL, &file_attr(ino, &attr, req.uid(), req.gid())),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn readlink(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyData) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.session.readlink(path) {
            Ok(target) => reply.data(target.as_bytes()),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.session.open(path, flags) {
            Ok(fh) => reply.opened(fh, 0),
            Err(err) => reply.error(err.errno()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self
            .session
            .read(path, size as usize, offset.max(0) as u64)
        {
            Ok(bytes) => reply.data(&bytes),
            Err(err) => reply.error(err.errno()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.session.write(path, data, offset.max(0) as u64, fh) {
            Ok(written) => reply.written(written),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.session.release(path, fh) {
            Ok(_) => reply.ok(),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let Some(path) = self.inodes.path(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };
        let entries = match self.session.readdir(&path) {
            Ok(entries) => entries,
            Err(err) => {
                reply.error(err.errno());
                return;
            }
        };
        for (i, name) in entries.iter().enumerate().skip(offset.max(0) as usize) {
            let (child_ino, kind) = match name.as_str() {
                "." => (ino, FileType::Directory),
                ".." => {
                    let parent = parent_path(&path).to_string();
                    (self.inodes.assign(&parent), FileType::Directory)
                }
                other => {
                    let child = child_path(&path, other);
                    // A member may vanish between listing and stat; skip it.
                    let Ok(attr) = self.session.getattr(&child) else {
                        continue;
                    };
                    (self.inodes.assign(&child), file_type(attr.kind))
                }
            };
            if reply.add(child_ino, (i + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }
}

/// Mount a session and serve until unmounted.
pub fn mount(session: Session, mountpoint: &Path, allow_other: bool) -> std::io::Result<()> {
    let mut options = vec![
        MountOption::FSName("nsfs".to_string()),
        MountOption::AutoUnmount,
    ];
    if allow_other {
        options.push(MountOption::AllowOther);
    }
    tracing::info!(mountpoint = %mountpoint.display(), "mounting");
    fuser::mount2(NsfsFs::new(session), mountpoint, &options)
}
