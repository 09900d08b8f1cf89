//! Production gateway implementation shelling out to git

use crate::error::SubmoduleError;
use crate::git::{RepoContext, VcsGateway};
use crate::sparse;
use anyhow::{Context as _, Result, anyhow};
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Gateway backed by the git command line
///
/// Mutating operations honor `--dry-run`: the git command line is logged and
/// nothing is executed. Queries always run; they modify nothing.
pub struct GitCli {
    ctx: RepoContext,
    dry_run: bool,
}

impl GitCli {
    #[must_use]
    #[inline]
    pub const fn new(ctx: RepoContext, dry_run: bool) -> Self {
        Self { ctx, dry_run }
    }

    /// The discovered superproject context
    #[must_use]
    #[inline]
    pub const fn context(&self) -> &RepoContext {
        &self.ctx
    }

    /// Run a state-changing git command; the error carries git's stderr.
    fn effect(&self, args: &[String]) -> Result<()> {
        if self.dry_run {
            info!("git {}", args.join(" "));
            return Ok(());
        }
        debug!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.ctx.worktree_root)
            .output()
            .context("Failed to execute git")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                format!("exit code {}", output.status.code().unwrap_or(-1))
            } else {
                stderr.trim().to_owned()
            };
            return Err(anyhow!("git {} failed: {detail}", args.join(" ")));
        }

        Ok(())
    }

    /// Run a read-only git command, tolerating the listed exit codes.
    /// Queries run even under `--dry-run`.
    fn query(&self, args: &[String], ok_codes: &[i32]) -> Result<(i32, String)> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.ctx.worktree_root)
            .output()
            .context("Failed to execute git")?;

        let code = output.status.code().unwrap_or(-1);
        if !ok_codes.contains(&code) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubmoduleError::git(format!(
                "git {} failed ({}): {}",
                args.join(" "),
                code,
                stderr.trim()
            ))
            .into());
        }

        Ok((code, String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    fn worktree_arg(&self, path: &str) -> String {
        self.ctx.submodule_worktree(path).to_string_lossy().into_owned()
    }
}

fn args_of(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_owned()).collect()
}

impl VcsGateway for GitCli {
    fn clone_blobless(
        &self,
        url: &str,
        name: &str,
        path: &str,
        branch: Option<&str>,
        sparse: bool,
    ) -> Result<()> {
        let resolved_url = self.ctx.resolve_url(url)?;
        let module_dir = self.ctx.module_dir(name);
        let worktree = self.ctx.submodule_worktree(path);

        if !self.dry_run {
            if let Some(parent) = module_dir.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create '{}'", parent.display()))?;
            }
            fs::create_dir_all(&worktree)
                .with_context(|| format!("Failed to create '{}'", worktree.display()))?;
        }

        let mut args = args_of(&["clone", "--filter=blob:none", "--no-checkout"]);
        args.push("--separate-git-dir".to_owned());
        args.push(module_dir.to_string_lossy().into_owned());
        if let Some(branch) = branch {
            args.push("--branch".to_owned());
            args.push(self.ctx.resolve_branch(branch).to_owned());
        }
        if sparse {
            args.push("--sparse".to_owned());
        }
        args.push(resolved_url);
        args.push(worktree.to_string_lossy().into_owned());

        self.effect(&args)
            .map_err(|e| SubmoduleError::clone_failed(path, e.to_string()))?;

        // Neither the clone nor the later checkout sets core.worktree on the
        // submodule, so set it here. Git always uses forward slashes.
        let worktree_cfg = worktree.to_string_lossy().replace('\\', "/");
        self.effect(&args_of(&[
            "-C",
            &self.worktree_arg(path),
            "config",
            "core.worktree",
            &worktree_cfg,
        ]))
        .map_err(|e| SubmoduleError::clone_failed(path, e.to_string()))?;

        Ok(())
    }

    fn checkout(&self, path: &str, rev: Option<&str>) -> Result<()> {
        let wt = self.worktree_arg(path);
        let mut args = args_of(&["-C", &wt, "checkout"]);
        if let Some(rev) = rev {
            args.push(self.ctx.resolve_branch(rev).to_owned());
        }
        self.effect(&args)
            .map_err(|e| SubmoduleError::checkout_failed(path, e.to_string()))?;
        Ok(())
    }

    fn fetch_and_checkout(&self, path: &str, commit: &str) -> Result<()> {
        let wt = self.worktree_arg(path);
        let checkout = args_of(&["-C", &wt, "checkout", "--detach", commit]);

        if self.effect(&checkout).is_ok() {
            return Ok(());
        }

        // The commit may not be on any fetched branch; fetch it directly,
        // then try once more.
        self.effect(&args_of(&["-C", &wt, "fetch", "origin", commit]))
            .map_err(|e| SubmoduleError::checkout_failed(path, e.to_string()))?;
        self.effect(&checkout)
            .map_err(|e| SubmoduleError::checkout_failed(path, e.to_string()))?;
        Ok(())
    }

    fn branch_head(&self, path: &str, branch: &str) -> Result<Option<String>> {
        let wt = self.worktree_arg(path);
        let branch = self.ctx.resolve_branch(branch);
        let (code, stdout) = self.query(
            &args_of(&["-C", &wt, "rev-parse", "--verify", "--quiet", branch]),
            &[0, 1, 128],
        )?;
        if code == 0 {
            Ok(Some(stdout.trim().to_owned()))
        } else {
            Ok(None)
        }
    }

    fn read_sparse_patterns(&self, path: &str) -> Result<Option<Vec<String>>> {
        if !self.is_cloned(path) {
            return Ok(None);
        }

        let wt = self.worktree_arg(path);
        // Exit code 1 = key missing, which means sparse checkout is off.
        let (_, enabled) = self.query(
            &args_of(&["-C", &wt, "config", "--get", "core.sparseCheckout"]),
            &[0, 1],
        )?;
        if enabled.trim() != "true" {
            return Ok(None);
        }

        let (_, listing) = self.query(&args_of(&["-C", &wt, "sparse-checkout", "list"]), &[0])?;
        Ok(Some(sparse::parse_pattern_file(&listing)))
    }

    fn write_sparse_patterns(&self, path: &str, patterns: &[String]) -> Result<()> {
        let wt = self.worktree_arg(path);
        self.effect(&args_of(&["-C", &wt, "sparse-checkout", "init", "--no-cone"]))
            .map_err(|e| SubmoduleError::sparse_apply_failed(path, e.to_string()))?;

        let mut args = args_of(&["-C", &wt, "sparse-checkout", "set", "--no-cone"]);
        args.extend(patterns.iter().cloned());
        self.effect(&args)
            .map_err(|e| SubmoduleError::sparse_apply_failed(path, e.to_string()))?;
        Ok(())
    }

    fn disable_sparse(&self, path: &str) -> Result<()> {
        let wt = self.worktree_arg(path);
        self.effect(&args_of(&["-C", &wt, "sparse-checkout", "disable"]))
            .map_err(|e| SubmoduleError::sparse_apply_failed(path, e.to_string()))?;
        Ok(())
    }

    fn gitlink_commit(&self, path: &str) -> Result<Option<String>> {
        let (_, stdout) = self.query(&args_of(&["ls-tree", "HEAD", "--", path]), &[0])?;
        let fields: Vec<&str> = stdout.split_whitespace().collect();
        if fields.len() != 4 {
            return Ok(None);
        }
        // <mode> <type> <object>\t<path>; 160000 commit marks a gitlink
        if fields[0] == "160000" && fields[1] == "commit" {
            Ok(Some(fields[2].to_owned()))
        } else {
            Ok(None)
        }
    }

    fn checked_out_commit(&self, path: &str) -> Result<Option<String>> {
        if !self.is_cloned(path) {
            return Ok(None);
        }
        let wt = self.worktree_arg(path);
        let (code, stdout) = self.query(
            &args_of(&["-C", &wt, "rev-parse", "--verify", "--quiet", "HEAD"]),
            &[0, 1, 128],
        )?;
        if code == 0 {
            Ok(Some(stdout.trim().to_owned()))
        } else {
            Ok(None)
        }
    }

    fn is_cloned(&self, path: &str) -> bool {
        // A worktree with metadata attached carries either a .git directory
        // or a .git file pointing at the module directory.
        self.ctx.submodule_worktree(path).join(".git").exists()
    }

    fn is_partial_clone(&self, path: &str) -> Result<bool> {
        if !self.is_cloned(path) {
            return Ok(false);
        }
        let wt = self.worktree_arg(path);
        let (_, filter) = self.query(
            &args_of(&[
                "-C",
                &wt,
                "config",
                "--get",
                "remote.origin.partialCloneFilter",
            ]),
            &[0, 1],
        )?;
        Ok(!filter.trim().is_empty())
    }

    fn worktree_populated(&self, path: &str) -> bool {
        dir_populated(&self.ctx.submodule_worktree(path))
    }

    fn module_dir_exists(&self, name: &str) -> bool {
        dir_populated(&self.ctx.module_dir(name))
    }

    fn init_submodule_config(&self, paths: &[String]) -> Result<()> {
        let mut args = args_of(&["submodule", "init"]);
        args.extend(paths.iter().cloned());
        self.effect(&args)
            .map_err(|e| SubmoduleError::git(format!("submodule init failed: {e}")))?;
        Ok(())
    }

    fn stage_paths(&self, paths: &[String]) -> Result<()> {
        let mut args = args_of(&["add", "--"]);
        args.extend(paths.iter().cloned());
        self.effect(&args)
            .map_err(|e| SubmoduleError::git(format!("git add failed: {e}")))?;
        Ok(())
    }
}

fn dir_populated(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

/// Check that git is available and new enough
///
/// Version 2.27.0 introduced the `--filter` and `--sparse` options on
/// `git clone`.
///
/// # Errors
///
/// Returns an error if:
/// - The git command is not found
/// - The git command failed to execute properly
/// - The git version is too old
#[inline]
pub fn check_git_availability() -> Result<()> {
    let output = Command::new("git")
        .args(["--version"])
        .output()
        .context("Git command not found. Please ensure Git is installed and available in PATH")?;

    if !output.status.success() {
        return Err(SubmoduleError::git("Git command failed to execute properly".to_owned()).into());
    }

    let version_output = String::from_utf8_lossy(&output.stdout);

    if let Some(version_part) = version_output.split_whitespace().nth(2)
        && let Ok(version) = parse_git_version(version_part)
        && version < (2, 27, 0)
    {
        return Err(SubmoduleError::git(format!(
            "Git version {version_part} is too old. Partial submodule clones require Git 2.27.0 or later"
        ))
        .into());
    }

    Ok(())
}

/// Parse a git version string into a (major, minor, patch) tuple
///
/// # Errors
///
/// Returns an error if the version string is invalid.
#[inline]
pub fn parse_git_version(version: &str) -> Result<(u32, u32, u32)> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() >= 3 {
        let major = parts[0].parse().context("Invalid major version")?;
        let minor = parts[1].parse().context("Invalid minor version")?;
        let patch = parts[2].parse().context("Invalid patch version")?;
        Ok((major, minor, patch))
    } else {
        Err(anyhow!("Invalid version format"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_git_version() {
        assert_eq!(parse_git_version("2.39.2").unwrap(), (2, 39, 2));
        assert_eq!(parse_git_version("2.27.0").unwrap(), (2, 27, 0));
        assert!(parse_git_version("2.39").is_err());
        assert!(parse_git_version("not-a-version").is_err());
    }
}
