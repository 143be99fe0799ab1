// src/target/mod.rs

//! Durable completion markers.
//!
//! A target is the artifact whose existence means "this task's output is
//! ready". The scheduler only ever asks three things of it: does it exist,
//! make room for it (parent directory), and hand out read/write handles.
//! Nothing here creates the marker itself; only a work routine does that.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::fs::FileSystem;

/// A durable completion marker.
pub trait Target: Send + Sync {
    /// Path identifying the marker, for logs and error messages.
    fn locator(&self) -> &Path;

    /// Whether the marker exists. Side-effect-free and cheap; the scheduler
    /// may call it before and after work.
    fn exists(&self) -> bool;

    /// Create the marker's parent directory if missing. Idempotent, and the
    /// only mutation a target performs on its own.
    fn ensure_parent_exists(&self) -> Result<()>;

    fn open_read(&self) -> Result<Box<dyn Read + Send>>;

    fn open_write(&self) -> Result<Box<dyn Write + Send>>;
}

/// Target backed by a single regular file.
#[derive(Debug, Clone)]
pub struct FileTarget {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileTarget {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }
}

impl Target for FileTarget {
    fn locator(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        self.fs.is_file(&self.path)
    }

    fn ensure_parent_exists(&self) -> Result<()> {
        ensure_parent(&*self.fs, &self.path)
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        self.fs
            .open_read(&self.path)
            .with_context(|| format!("opening target {:?} for read", self.path))
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        self.fs
            .open_write(&self.path)
            .with_context(|| format!("opening target {:?} for write", self.path))
    }
}

/// Target backed by a directory (e.g. an extracted dataset).
#[derive(Debug, Clone)]
pub struct DirTarget {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl DirTarget {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }
}

impl Target for DirTarget {
    fn locator(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        self.fs.is_dir(&self.path)
    }

    fn ensure_parent_exists(&self) -> Result<()> {
        ensure_parent(&*self.fs, &self.path)
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        bail!("directory target {:?} has no byte stream", self.path)
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        bail!("directory target {:?} has no byte stream", self.path)
    }
}

/// Target composed of several parts; exists only when every part does.
///
/// Used where one task produces more than one artifact (e.g. an exported
/// model plus its manifest). Read/write handles go through the parts, not
/// the composite.
pub struct CompositeTarget {
    parts: Vec<Arc<dyn Target>>,
}

impl CompositeTarget {
    /// Panics if `parts` is empty; a task always declares at least one marker.
    pub fn new(parts: Vec<Arc<dyn Target>>) -> Self {
        assert!(!parts.is_empty(), "composite target needs at least one part");
        Self { parts }
    }

    pub fn parts(&self) -> &[Arc<dyn Target>] {
        &self.parts
    }
}

impl Target for CompositeTarget {
    /// Locator of the first part; diagnostics name the part that is missing.
    fn locator(&self) -> &Path {
        self.parts[0].locator()
    }

    fn exists(&self) -> bool {
        self.parts.iter().all(|p| p.exists())
    }

    fn ensure_parent_exists(&self) -> Result<()> {
        for part in &self.parts {
            part.ensure_parent_exists()?;
        }
        Ok(())
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        bail!("composite target has no byte stream; open a part instead")
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        bail!("composite target has no byte stream; open a part instead")
    }
}

fn ensure_parent(fs: &dyn FileSystem, path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs
            .create_dir_all(parent)
            .with_context(|| format!("creating parent of target {:?}", path)),
        _ => Ok(()),
    }
}
