//! Superproject context discovery and path/URL resolution

use crate::error::SubmoduleError;
use anyhow::Result;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Where the superproject lives: worktree root, repository directory, and
/// the origin url/branch needed to resolve relative submodule urls and the
/// `branch = .` shorthand.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub worktree_root: PathBuf,
    pub git_dir: PathBuf,
    pub origin_url: Option<String>,
    pub current_branch: String,
}

impl RepoContext {
    /// Discover the enclosing superproject from the current directory
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory is not inside a git
    /// working tree.
    pub fn discover() -> Result<Self> {
        let worktree_root = PathBuf::from(read_git_output(&["rev-parse", "--show-toplevel"])?);
        let git_dir_raw = PathBuf::from(read_git_output(&["rev-parse", "--git-dir"])?);
        // --git-dir may be relative to the invocation directory
        let git_dir = if git_dir_raw.is_absolute() {
            git_dir_raw
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&git_dir_raw))
                .unwrap_or(git_dir_raw)
        };
        let origin_url = read_git_output(&["config", "--get", "remote.origin.url"]).ok();
        let current_branch = read_git_output(&["rev-parse", "--abbrev-ref", "HEAD"])?;

        debug!(
            "worktree root: {}, repo root: {}, origin: {:?}, branch: {}",
            worktree_root.display(),
            git_dir.display(),
            origin_url,
            current_branch
        );

        Ok(Self {
            worktree_root,
            git_dir,
            origin_url,
            current_branch,
        })
    }

    /// Path of the superproject's `.gitmodules` manifest
    #[must_use]
    #[inline]
    pub fn manifest_path(&self) -> PathBuf {
        self.worktree_root.join(".gitmodules")
    }

    /// Repository metadata directory for a submodule name
    #[must_use]
    #[inline]
    pub fn module_dir(&self, name: &str) -> PathBuf {
        self.git_dir.join("modules").join(name)
    }

    /// Absolute worktree directory for a submodule path
    #[must_use]
    #[inline]
    pub fn submodule_worktree(&self, path: &str) -> PathBuf {
        self.worktree_root.join(path)
    }

    /// Resolve `branch = .` to the superproject's current branch
    #[must_use]
    #[inline]
    pub fn resolve_branch<'b>(&'b self, branch: &'b str) -> &'b str {
        if branch == "." {
            &self.current_branch
        } else {
            branch
        }
    }

    /// Resolve a possibly-relative submodule url (`./x`, `../x`) against
    /// the superproject's origin url
    ///
    /// # Errors
    ///
    /// Returns an error if the url is relative and the superproject has no
    /// origin remote.
    pub fn resolve_url(&self, url: &str) -> Result<String> {
        if !url.starts_with("./") && !url.starts_with("../") {
            return Ok(url.to_owned());
        }

        let mut base = self
            .origin_url
            .as_deref()
            .ok_or_else(|| {
                SubmoduleError::git(format!(
                    "cannot resolve relative submodule url '{url}': superproject has no origin remote"
                ))
            })?
            .trim_end_matches('/')
            .to_owned();

        let mut rest = url;
        loop {
            if let Some(stripped) = rest.strip_prefix("./") {
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix("../") {
                rest = stripped;
                if let Some(cut) = base.rfind('/') {
                    base.truncate(cut);
                }
            } else {
                break;
            }
        }

        Ok(format!("{base}/{rest}"))
    }

    /// Convert a user-supplied submodule path into the worktree-relative,
    /// forward-slash form used as the manifest key
    ///
    /// # Errors
    ///
    /// Returns an error if the path lies outside the superproject worktree.
    pub fn relativize(&self, path: &str) -> Result<String> {
        let raw = Path::new(path);
        let absolute = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| SubmoduleError::git(format!("cannot get current directory: {e}")))?
                .join(raw)
        };
        let normalized = normalize_path(&absolute);

        let relative = normalized.strip_prefix(&self.worktree_root).map_err(|_| {
            SubmoduleError::git(format!(
                "path '{path}' is not inside the superproject worktree '{}'",
                self.worktree_root.display()
            ))
        })?;

        // Git always uses forward slashes
        let mut out = String::new();
        for component in relative.components() {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&component.as_os_str().to_string_lossy());
        }

        if out.is_empty() {
            return Err(SubmoduleError::git(format!(
                "path '{path}' is the superproject root, not a submodule path"
            ))
            .into());
        }

        Ok(out)
    }
}

/// Normalize a path by resolving `.` and `..` components without touching
/// the filesystem (the target may not exist yet)
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if components.is_empty() {
                    components.push(component);
                } else {
                    components.pop();
                }
            }
            _ => {
                components.push(component);
            }
        }
    }

    components.iter().collect()
}

fn read_git_output(args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .output()
        .map_err(|e| SubmoduleError::git(format!("failed to execute git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SubmoduleError::git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        ))
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}
