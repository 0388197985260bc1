//! Disposable copy of a configuration directory where Terraform may write its
//! lock file, provider cache and plan without touching the caller's tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use walkdir::WalkDir;

use super::TerraformError;
use crate::runner::Runner;

/// File name of the binary plan written inside the workspace.
pub const PLAN_FILE: &str = "plan.tfplan";

const TEMP_PREFIX: &str = "policygen-";

/// A uniquely named temporary directory holding a copy of a configuration.
///
/// The directory is deleted when the value is dropped, including on early
/// returns and unwinding.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Copies `source` recursively into a fresh temporary directory.
    pub fn create(source: &Path) -> Result<Self, TerraformError> {
        let metadata = fs::metadata(source).map_err(|e| workspace_err(source, "read", e))?;
        if !metadata.is_dir() {
            return Err(workspace_err(
                source,
                "read",
                io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }

        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .map_err(|e| TerraformError::Workspace {
                message: "create temporary directory".to_string(),
                source: e,
            })?;

        tracing::debug!(source = %source.display(), workspace = %dir.path().display(), "created workspace");

        copy_tree(source, dir.path())?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn plan_path(&self) -> PathBuf {
        self.path().join(PLAN_FILE)
    }

    pub fn init<R: Runner + ?Sized>(
        &self,
        runner: &R,
        terraform: &str,
    ) -> Result<(), TerraformError> {
        let mut cmd = self.command(terraform);
        cmd.arg("init");
        runner.run(&mut cmd).map_err(TerraformError::Initialization)
    }

    pub fn plan<R: Runner + ?Sized>(
        &self,
        runner: &R,
        terraform: &str,
    ) -> Result<(), TerraformError> {
        let mut cmd = self.command(terraform);
        cmd.arg("plan").arg("-out").arg(self.plan_path());
        runner.run(&mut cmd).map_err(TerraformError::Plan)
    }

    pub fn show_json<R: Runner + ?Sized>(
        &self,
        runner: &R,
        terraform: &str,
    ) -> Result<Vec<u8>, TerraformError> {
        let mut cmd = self.command(terraform);
        cmd.arg("show").arg("-json").arg(self.plan_path());
        runner.output(&mut cmd).map_err(TerraformError::Extraction)
    }

    fn command(&self, terraform: &str) -> Command {
        let mut cmd = Command::new(terraform);
        cmd.current_dir(self.path())
            .env("TF_INPUT", "0")
            .env("TF_IN_AUTOMATION", "1");
        cmd
    }
}

/// Plans the configuration in `dir` inside a throwaway workspace and returns
/// the plan as JSON.
///
/// Runs `init`, `plan -out` and `show -json` in sequence, stopping at the
/// first failure. The workspace is gone by the time this returns.
pub fn plan_json<R: Runner + ?Sized>(
    runner: &R,
    terraform: &str,
    dir: &Path,
) -> Result<Vec<u8>, TerraformError> {
    let workspace = Workspace::create(dir)?;

    workspace.init(runner, terraform)?;
    workspace.plan(runner, terraform)?;
    let json = workspace.show_json(runner, terraform)?;

    let path = workspace.path().to_path_buf();
    if let Err(e) = workspace.dir.close() {
        tracing::warn!(workspace = %path.display(), error = %e, "failed to remove workspace");
    }

    Ok(json)
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), TerraformError> {
    let mut copied = 0usize;

    // the workspace may live under the source (TMPDIR inside the configs)
    let entries = WalkDir::new(from)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !entry.path().starts_with(to));

    for entry in entries {
        let entry = entry.map_err(|e| workspace_err(from, "walk", e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| workspace_err(entry.path(), "relativize", io::Error::other(e)))?;
        let target = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| workspace_err(&target, "create", e))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| workspace_err(entry.path(), "copy", e))?;
            copied += 1;
        }
    }

    tracing::debug!(files = copied, "copied configuration into workspace");
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), TerraformError> {
    let points_to = fs::read_link(link).map_err(|e| workspace_err(link, "read link", e))?;
    std::os::unix::fs::symlink(&points_to, target).map_err(|e| workspace_err(target, "create link", e))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), TerraformError> {
    tracing::warn!(path = %link.display(), "copying symlink target instead of the link");
    fs::copy(link, target)
        .map(|_| ())
        .map_err(|e| workspace_err(link, "copy", e))
}

fn workspace_err(path: &Path, action: &str, source: io::Error) -> TerraformError {
    TerraformError::Workspace {
        message: format!("{action} {}", path.display()),
        source,
    }
}
