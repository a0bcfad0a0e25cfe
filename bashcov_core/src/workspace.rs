//! Source tree collaborators
//!
//! The aggregator never touches the filesystem directly. It asks a
//! [`SourceTree`] where relative captures are rooted, what a path currently
//! names, and how many lines a file has.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// What a resolved trace path names at aggregation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Directory,
    File,
    /// Missing, or something that is neither a file nor a directory.
    Other,
}

pub trait SourceTree {
    /// Directory relative trace captures are resolved against.
    fn root_directory(&self) -> &Path;

    fn path_kind(&self, path: &Path) -> PathKind;

    /// Number of lines in `path`, used to size its counter array.
    fn line_count(&self, path: &Path) -> io::Result<usize>;
}

impl<T: SourceTree + ?Sized> SourceTree for &T {
    fn root_directory(&self) -> &Path {
        (**self).root_directory()
    }

    fn path_kind(&self, path: &Path) -> PathKind {
        (**self).path_kind(path)
    }

    fn line_count(&self, path: &Path) -> io::Result<usize> {
        (**self).line_count(path)
    }
}

/// [`SourceTree`] backed by the real filesystem.
#[derive(Debug, Clone)]
pub struct FsSourceTree {
    root: PathBuf,
}

impl FsSourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Rooted at the process working directory.
    pub fn current_dir() -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }
}

impl SourceTree for FsSourceTree {
    fn root_directory(&self) -> &Path {
        &self.root
    }

    fn path_kind(&self, path: &Path) -> PathKind {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => PathKind::Directory,
            Ok(meta) if meta.is_file() => PathKind::File,
            _ => PathKind::Other,
        }
    }

    fn line_count(&self, path: &Path) -> io::Result<usize> {
        Ok(count_lines(&fs::read(path)?))
    }
}

/// Counts lines the way a line reader would: every `\n` ends one, and a
/// non-empty unterminated tail is one more.
pub(crate) fn count_lines(content: &[u8]) -> usize {
    let newlines = content.iter().filter(|&&b| b == b'\n').count();
    match content.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

/// Resolve `name` against `root` and normalise `.` and `..` lexically.
///
/// A relative `root` is itself taken against the working directory, so the
/// result is always absolute. Symlinks are left alone; `..` at the
/// filesystem root stays at the root.
pub fn expand_path(name: &Path, root: &Path) -> io::Result<PathBuf> {
    let mut joined = if name.is_absolute() {
        name.to_path_buf()
    } else {
        root.join(name)
    };
    if joined.is_relative() {
        joined = std::env::current_dir()?.join(joined);
    }

    let mut expanded = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                expanded.pop();
            }
            other => expanded.push(other.as_os_str()),
        }
    }
    Ok(expanded)
}
