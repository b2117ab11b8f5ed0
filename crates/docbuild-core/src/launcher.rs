//! Build tool invocation.
//!
//! The launcher starts the build tool with the descriptor file name as its
//! only argument, waits for it to exit, and then asks the platform to open
//! the produced artifact. The open request is issued whatever the exit
//! status was, as long as the artifact exists; the status is recorded in
//! [`BuildOutcome`] so callers can decide afterwards with
//! [`BuildOutcome::into_result`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{DocbuildError, Result};
use crate::paths;

// ---------------------------------------------------------------------------
// ArtifactOpener
// ---------------------------------------------------------------------------

/// Opens a build artifact with whatever the platform associates with it.
pub trait ArtifactOpener: Send + Sync {
    fn open(&self, path: &Path) -> std::io::Result<()>;
}

/// Uses the OS default handler (`open` on macOS, `xdg-open` on Linux,
/// `ShellExecute` on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl ArtifactOpener for SystemOpener {
    fn open(&self, path: &Path) -> std::io::Result<()> {
        open::that(path)
    }
}

// ---------------------------------------------------------------------------
// BuildPlan
// ---------------------------------------------------------------------------

/// Everything the launcher needs, fixed before the build starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Build tool as configured; resolved when the build starts.
    pub tool: PathBuf,
    /// Descriptor file name, passed as the sole argument.
    pub descriptor: String,
    /// Working directory for the build tool. Relative paths resolve here.
    pub working_dir: PathBuf,
    /// Artifact to open afterwards, or `None` to skip the open request.
    pub artifact: Option<PathBuf>,
}

impl BuildPlan {
    pub fn from_config(root: &Path, config: &Config) -> Self {
        Self {
            tool: config.build.tool.clone(),
            descriptor: config.build.descriptor.clone(),
            working_dir: root.to_path_buf(),
            artifact: config
                .build
                .open_artifact
                .then(|| config.artifact_path()),
        }
    }
}

// ---------------------------------------------------------------------------
// BuildOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    /// Resolved build tool path.
    pub tool: PathBuf,
    pub descriptor: String,
    /// `None` when the tool was terminated by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    pub artifact: Option<PathBuf>,
    pub artifact_opened: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BuildOutcome {
    /// Turn a nonzero exit into [`DocbuildError::BuildFailed`].
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(DocbuildError::BuildFailed {
                code: self.exit_code,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Launcher
// ---------------------------------------------------------------------------

pub struct Launcher {
    plan: BuildPlan,
    opener: Arc<dyn ArtifactOpener>,
}

impl Launcher {
    pub fn new(plan: BuildPlan, opener: Arc<dyn ArtifactOpener>) -> Self {
        Self { plan, opener }
    }

    /// Run the build tool to completion, then issue the artifact open request.
    /// There is no timeout.
    pub async fn run(&self) -> Result<BuildOutcome> {
        let tool = resolve_tool(&self.plan.tool, &self.plan.working_dir)?;
        let started_at = Utc::now();

        tracing::info!(
            tool = %tool.display(),
            descriptor = %self.plan.descriptor,
            cwd = %self.plan.working_dir.display(),
            "starting build tool"
        );

        // Inherited stdio keeps the tool's console output visible.
        let mut cmd = Command::new(&tool);
        cmd.arg(&self.plan.descriptor)
            .current_dir(&self.plan.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|source| DocbuildError::Spawn {
            tool: tool.clone(),
            source,
        })?;
        let status = child.wait().await?;

        let exit_code = status.code();
        if status.success() {
            tracing::info!("build tool finished");
        } else {
            tracing::warn!(code = ?exit_code, "build tool exited unsuccessfully");
        }

        let artifact = self
            .plan
            .artifact
            .as_deref()
            .map(|a| paths::under_root(&self.plan.working_dir, a));
        let artifact_opened = match &artifact {
            // A failed build usually leaves no artifact; keep the exit status
            // as the reported failure.
            Some(path) if !status.success() && !path.exists() => {
                tracing::warn!(artifact = %path.display(), "no artifact after failed build");
                false
            }
            Some(path) => {
                self.open_artifact(path).await?;
                true
            }
            None => false,
        };

        Ok(BuildOutcome {
            tool,
            descriptor: self.plan.descriptor.clone(),
            exit_code,
            success: status.success(),
            artifact,
            artifact_opened,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Run on a background task. Dropping the handle detaches the build.
    pub fn spawn(self) -> JoinHandle<Result<BuildOutcome>> {
        tokio::spawn(async move { self.run().await })
    }

    async fn open_artifact(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(DocbuildError::ArtifactMissing(path.to_path_buf()));
        }
        tracing::info!(artifact = %path.display(), "opening artifact");

        let opener = Arc::clone(&self.opener);
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || opener.open(&target))
            .await
            .map_err(|e| DocbuildError::TaskAborted(e.to_string()))?
            .map_err(|source| DocbuildError::ArtifactOpen {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Resolve the configured build tool to an executable path.
///
/// Anything with a directory component is taken relative to `working_dir`
/// and must exist; a bare name is looked up on `PATH`.
pub fn resolve_tool(tool: &Path, working_dir: &Path) -> Result<PathBuf> {
    if tool.as_os_str().is_empty() {
        return Err(DocbuildError::BuildToolNotFound("(empty)".to_string()));
    }
    if tool.is_absolute() || tool.components().count() > 1 {
        let path = paths::under_root(working_dir, tool);
        if path.is_file() {
            return Ok(path);
        }
        return Err(DocbuildError::BuildToolNotFound(path.display().to_string()));
    }
    match which::which(tool) {
        Ok(path) => {
            tracing::debug!(
                tool = %tool.display(),
                resolved = %path.display(),
                "found build tool on PATH"
            );
            Ok(path)
        }
        Err(_) => Err(DocbuildError::BuildToolNotFound(format!(
            "{} (not on PATH)",
            tool.display()
        ))),
    }
}
