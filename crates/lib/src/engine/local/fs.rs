//! Filesystem helpers for moving part files between lifecycle directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use ignore::overrides::{Override, OverrideBuilder};
use walkdir::{DirEntry, WalkDir};

use crate::engine::EngineError;

/// Remove `dir` if present and recreate it empty.
pub fn reset_dir(dir: &Path) -> Result<(), EngineError> {
  if dir.exists() {
    fs::remove_dir_all(dir).map_err(|e| EngineError::io(format!("failed to remove {}", dir.display()), e))?;
  }
  ensure_dir(dir)
}

pub fn ensure_dir(dir: &Path) -> Result<(), EngineError> {
  fs::create_dir_all(dir).map_err(|e| EngineError::io(format!("failed to create {}", dir.display()), e))
}

pub fn remove_dir(dir: &Path) -> Result<(), EngineError> {
  if dir.exists() {
    fs::remove_dir_all(dir).map_err(|e| EngineError::io(format!("failed to remove {}", dir.display()), e))?;
  }
  Ok(())
}

/// Source entries excluded by gitignore-style glob patterns.
///
/// A pattern without a slash matches an entry name at any depth. Patterns
/// with a slash are anchored at the root of the walked tree.
#[derive(Debug, Clone)]
pub struct IgnoreRules(Override);

impl IgnoreRules {
  pub fn new(patterns: &[String]) -> Result<Self, EngineError> {
    let mut builder = OverrideBuilder::new(".");
    for pattern in patterns {
      builder
        .add(&format!("!{}", pattern))
        .map_err(|e| EngineError::Internal(format!("invalid source ignore pattern '{}': {}", pattern, e)))?;
    }
    let overrides = builder
      .build()
      .map_err(|e| EngineError::Internal(format!("invalid source ignore patterns: {}", e)))?;
    Ok(Self(overrides))
  }

  /// Rules that keep every entry.
  pub fn none() -> Self {
    Self(Override::empty())
  }

  /// Whether `relative` (a path under the walked root) is excluded.
  pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
    self.0.matched(relative, is_dir).is_ignore()
  }

  fn excludes(&self, root: &Path, entry: &DirEntry) -> bool {
    entry
      .path()
      .strip_prefix(root)
      .is_ok_and(|relative| self.is_ignored(relative, entry.file_type().is_dir()))
  }
}

/// Copy the tree under `src` into `dst`, overwriting existing files.
///
/// Entries excluded by `ignore` are skipped along with
/// their contents. Returns the copied files and symlinks relative to `dst`,
/// sorted.
pub fn copy_tree(src: &Path, dst: &Path, ignore: &IgnoreRules) -> Result<Vec<PathBuf>, EngineError> {
  ensure_dir(dst)?;
  let mut copied = Vec::new();

  let walker = WalkDir::new(src)
    .min_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| !ignore.excludes(src, entry));

  for entry in walker {
    let entry = entry.map_err(|e| {
      let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
      EngineError::io(format!("failed to walk {}", path), e.into())
    })?;
    let relative = entry
      .path()
      .strip_prefix(src)
      .map_err(|e| EngineError::Internal(format!("path outside copy root: {}", e)))?
      .to_path_buf();
    let target = dst.join(&relative);
    let file_type = entry.file_type();

    if file_type.is_dir() {
      ensure_dir(&target)?;
      continue;
    }

    if let Some(parent) = target.parent() {
      ensure_dir(parent)?;
    }
    if target.symlink_metadata().is_ok() {
      fs::remove_file(&target).map_err(|e| EngineError::io(format!("failed to replace {}", target.display()), e))?;
    }

    if file_type.is_symlink() {
      copy_symlink(entry.path(), &target)?;
    } else {
      fs::copy(entry.path(), &target).map_err(|e| {
        EngineError::io(
          format!("failed to copy {} to {}", entry.path().display(), target.display()),
          e,
        )
      })?;
    }
    copied.push(relative);
  }

  copied.sort();
  Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), EngineError> {
  let link = fs::read_link(src).map_err(|e| EngineError::io(format!("failed to read link {}", src.display()), e))?;
  std::os::unix::fs::symlink(&link, dst)
    .map_err(|e| EngineError::io(format!("failed to create link {}", dst.display()), e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), EngineError> {
  fs::copy(src, dst)
    .map(|_| ())
    .map_err(|e| EngineError::io(format!("failed to copy {}", src.display()), e))
}

/// Copy the listed files (relative paths) from `src` to `dst`.
pub fn copy_files(src: &Path, dst: &Path, files: &[PathBuf]) -> Result<(), EngineError> {
  for relative in files {
    let from = src.join(relative);
    let to = dst.join(relative);
    if let Some(parent) = to.parent() {
      ensure_dir(parent)?;
    }
    if to.symlink_metadata().is_ok() {
      fs::remove_file(&to).map_err(|e| EngineError::io(format!("failed to replace {}", to.display()), e))?;
    }
    if from.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink()) {
      copy_symlink(&from, &to)?;
    } else {
      fs::copy(&from, &to)
        .map_err(|e| EngineError::io(format!("failed to copy {} to {}", from.display(), to.display()), e))?;
    }
  }
  Ok(())
}

/// Remove the listed files under `root`, then prune directories left empty.
pub fn remove_files(root: &Path, files: &[PathBuf]) -> Result<(), EngineError> {
  for relative in files {
    let path = root.join(relative);
    if path.symlink_metadata().is_ok() {
      fs::remove_file(&path).map_err(|e| EngineError::io(format!("failed to remove {}", path.display()), e))?;
    }

    let mut parent = path.parent();
    while let Some(dir) = parent {
      if dir == root || !dir.starts_with(root) {
        break;
      }
      let empty = fs::read_dir(dir).map(|mut it| it.next().is_none()).unwrap_or(false);
      if !empty {
        break;
      }
      fs::remove_dir(dir).map_err(|e| EngineError::io(format!("failed to remove {}", dir.display()), e))?;
      parent = dir.parent();
    }
  }
  Ok(())
}

/// Most recent modification time under `path`, in milliseconds since the epoch.
pub fn newest_mtime(path: &Path, ignore: &IgnoreRules) -> Option<u64> {
  WalkDir::new(path)
    .into_iter()
    .filter_entry(|entry| entry.depth() == 0 || !ignore.excludes(path, entry))
    .filter_map(Result::ok)
    .filter_map(|entry| entry.metadata().ok()?.modified().ok())
    .filter_map(|time| time.duration_since(UNIX_EPOCH).ok())
    .map(|d| d.as_millis() as u64)
    .max()
}
