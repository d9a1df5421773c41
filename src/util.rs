#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::glob;
use which::which;

/// Finds and returns the path to the container runtime binary
pub fn docker_path() -> Result<OsString> {
    which("docker")
        .map(PathBuf::into_os_string)
        .context("Cannot find a container runtime on path (docker)")
}

/// Finds and returns the path to the mkdocs binary
pub fn mkdocs_path() -> Result<OsString> {
    which("mkdocs")
        .map(PathBuf::into_os_string)
        .context("Cannot find mkdocs on path")
}

/// A glob utility function to find paths matching a pattern under a root
///
/// * `root_dir`: the directory where matching starts
/// * `pattern`: a glob pattern relative to `root_dir`, e.g. `**/*.pdf`
pub fn glob_files(root_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = root_dir.join(pattern);
    let pattern = pattern
        .to_str()
        .context("Could not convert glob pattern to string")?
        .to_string();

    Ok(glob(&pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .collect())
}

/// Copies (or moves) every file matching `pattern` under `src_dir` into the
/// build tree.
///
/// With `dest_subdir` set, matches land under `dest_root/<dest_subdir>/`
/// keeping their path relative to `src_dir`; without it, they keep their
/// path relative to `src_dir`'s parent, so the source directory name itself
/// is preserved in the destination.
pub fn copy_files(
    src_dir: &Path,
    pattern: &str,
    dest_root: &Path,
    move_files: bool,
    dest_subdir: Option<&str>,
) -> Result<()> {
    for src_path in glob_files(src_dir, pattern)? {
        let dest_path = match dest_subdir {
            Some(sub) => dest_root.join(sub).join(
                src_path
                    .strip_prefix(src_dir)
                    .context("glob match escaped its root")?,
            ),
            None => dest_root.join(
                src_path
                    .strip_prefix(src_dir.parent().unwrap_or(src_dir))
                    .context("glob match escaped its root")?,
            ),
        };
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else if move_files {
            // Rename when possible, fall back to copy+remove across devices.
            if std::fs::rename(&src_path, &dest_path).is_err() {
                std::fs::copy(&src_path, &dest_path).with_context(|| {
                    format!("Could not copy {} to {}", src_path.display(), dest_path.display())
                })?;
                std::fs::remove_file(&src_path)
                    .with_context(|| format!("Could not remove {}", src_path.display()))?;
            }
        } else {
            std::fs::copy(&src_path, &dest_path).with_context(|| {
                format!("Could not copy {} to {}", src_path.display(), dest_path.display())
            })?;
        }
    }
    Ok(())
}

/// Recursively copies a directory tree.
pub fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest).with_context(|| format!("Could not create {}", dest.display()))?;
    for entry in std::fs::read_dir(src).with_context(|| format!("Could not read {}", src.display()))? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!("Could not copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}
