//! Include-path loading for handlers registered with a resource path.
//!
//! A path is loaded at most once per dispatcher, right before the first
//! handler that names it is invoked. A failed load is logged and not
//! recorded, so the next fire tries again.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use hookwire_core::error::AppError;
use hookwire_core::result::AppResult;

/// Makes a handler's resource available before the handler runs.
pub trait IncludeLoader {
    /// Loads `path`.
    fn load(&self, path: &Path) -> AppResult<()>;
}

impl<F> IncludeLoader for F
where
    F: Fn(&Path) -> AppResult<()>,
{
    fn load(&self, path: &Path) -> AppResult<()> {
        self(path)
    }
}

/// Loader that only checks that the file exists, resolving relative paths
/// against an optional root.
#[derive(Debug, Clone, Default)]
pub struct FsIncludeLoader {
    root: Option<PathBuf>,
}

impl FsIncludeLoader {
    /// Creates a loader resolving relative paths against `root`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Returns the path that would be loaded for `path`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl IncludeLoader for FsIncludeLoader {
    fn load(&self, path: &Path) -> AppResult<()> {
        let resolved = self.resolve(path);
        let metadata = std::fs::metadata(&resolved).map_err(|e| {
            AppError::with_source(
                hookwire_core::error::ErrorKind::Include,
                format!("Cannot include '{}': {e}", resolved.display()),
                e,
            )
        })?;
        if !metadata.is_file() {
            return Err(AppError::include(format!(
                "Cannot include '{}': not a file",
                resolved.display()
            )));
        }
        Ok(())
    }
}

/// Loader that accepts every path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIncludeLoader;

impl IncludeLoader for NoopIncludeLoader {
    fn load(&self, _path: &Path) -> AppResult<()> {
        Ok(())
    }
}

/// Tracks which include paths have been loaded.
pub(crate) struct IncludeTracker {
    loader: Box<dyn IncludeLoader>,
    loaded: RefCell<HashSet<PathBuf>>,
}

impl IncludeTracker {
    pub(crate) fn new(loader: Box<dyn IncludeLoader>) -> Self {
        Self {
            loader,
            loaded: RefCell::new(HashSet::new()),
        }
    }

    /// Loads `path` unless it was loaded before.
    pub(crate) fn include_once(&self, path: &Path) {
        if self.loaded.borrow().contains(path) {
            return;
        }

        match self.loader.load(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Handler include loaded");
                self.loaded.borrow_mut().insert(path.to_path_buf());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Handler include failed");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_loaded(&self, path: &Path) -> bool {
        self.loaded.borrow().contains(path)
    }
}

impl fmt::Debug for IncludeTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncludeTracker")
            .field("loaded", &self.loaded.borrow().len())
            .finish()
    }
}
