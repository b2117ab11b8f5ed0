//! The documentation build command: generate the descriptor, then launch
//! the build in the background.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::descriptor::{self, WrittenDescriptor};
use crate::error::{DocbuildError, Result};
use crate::launcher::{ArtifactOpener, BuildOutcome, BuildPlan, Launcher, SystemOpener};

pub struct BuildCommand {
    root: PathBuf,
    config: Config,
    opener: Arc<dyn ArtifactOpener>,
}

/// A build whose descriptor has been written and whose launcher is running.
pub struct PendingBuild {
    pub descriptor: WrittenDescriptor,
    pub task: JoinHandle<Result<BuildOutcome>>,
}

impl PendingBuild {
    pub async fn wait(self) -> Result<BuildOutcome> {
        self.task
            .await
            .map_err(|e| DocbuildError::TaskAborted(e.to_string()))?
    }
}

impl BuildCommand {
    /// Set up the command once for a project root. Fails if the config has
    /// error-level problems.
    pub fn initialize(root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        config.ensure_valid()?;
        Ok(Self {
            root: root.into(),
            config,
            opener: Arc::new(SystemOpener),
        })
    }

    pub fn with_opener(mut self, opener: Arc<dyn ArtifactOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Write the descriptor into the project root.
    pub fn generate(&self) -> Result<WrittenDescriptor> {
        descriptor::generate(
            &self.root,
            &self.config.build.descriptor,
            &self.config.sources.metadata,
            &self.config.sources.assembly,
            &self.config.descriptor,
        )
    }

    pub fn plan(&self) -> BuildPlan {
        BuildPlan::from_config(&self.root, &self.config)
    }

    /// Generate synchronously, then start the launcher on a Tokio task.
    ///
    /// Nothing serializes concurrent calls: a second `execute` overwrites
    /// the descriptor even while an earlier build is still reading it.
    pub fn execute(&self) -> Result<PendingBuild> {
        let descriptor = self.generate()?;
        let launcher = Launcher::new(self.plan(), Arc::clone(&self.opener));
        let task = launcher.spawn();
        Ok(PendingBuild { descriptor, task })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::testing::*;
    use tempfile::TempDir;

    #[test]
    fn initialize_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let err = BuildCommand::initialize(dir.path(), Config::default())
            .err()
            .unwrap();
        assert!(matches!(err, DocbuildError::InvalidConfig(_)));
    }

    #[test]
    fn generate_uses_configured_sources_and_name() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("meta.xml", "app.dll");
        cfg.build.descriptor = "Help.shfbproj".to_string();
        let cmd = BuildCommand::initialize(dir.path(), cfg).unwrap();

        let written = cmd.generate().unwrap();
        assert_eq!(written.path, dir.path().join("Help.shfbproj"));
        let xml = std::fs::read_to_string(&written.path).unwrap();
        let meta = xml.find(r#"sourceFile="meta.xml""#).unwrap();
        let dll = xml.find(r#"sourceFile="app.dll""#).unwrap();
        assert!(meta < dll);
    }

    #[cfg(unix)]
    fn command_with_tool(dir: &TempDir, body: &str) -> (BuildCommand, Arc<RecordingOpener>) {
        let tool = stub_tool(dir.path(), "build.sh", body);
        let mut cfg = Config::new("meta.xml", "app.dll");
        cfg.build.tool = tool;
        cfg.build.artifact = Some(PathBuf::from("out.chm"));
        let opener = Arc::new(RecordingOpener::default());
        let cmd = BuildCommand::initialize(dir.path(), cfg)
            .unwrap()
            .with_opener(opener.clone());
        (cmd, opener)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn execute_builds_and_opens() {
        let dir = TempDir::new().unwrap();
        let (cmd, opener) = command_with_tool(&dir, "grep -q meta.xml \"$1\" && : > out.chm");

        let pending = cmd.execute().unwrap();
        assert!(pending.descriptor.path.exists());
        let outcome = pending.wait().await.unwrap();
        assert!(outcome.success);
        assert_eq!(opener.calls().len(), 1);
        assert_eq!(opener.calls()[0].0, dir.path().join("out.chm"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn overlapping_builds_race_on_descriptor() {
        let dir = TempDir::new().unwrap();
        // Each build reads the descriptor only after a delay, long enough for
        // a second execute to overwrite it.
        let (cmd, _opener) = command_with_tool(
            &dir,
            "sleep 0.5\ngrep -o '<ProjectGuid>[^<]*' \"$1\" >> seen.log\n: > out.chm",
        );

        let first = cmd.execute().unwrap();
        let second = cmd.execute().unwrap();
        let first_guid = first.descriptor.project_guid.to_string();
        let second_guid = second.descriptor.project_guid.to_string();
        assert_ne!(first_guid, second_guid);

        first.wait().await.unwrap();
        second.wait().await.unwrap();

        let seen = std::fs::read_to_string(dir.path().join("seen.log")).unwrap();
        let lines: Vec<&str> = seen.lines().collect();
        assert_eq!(lines.len(), 2);
        // The first build never saw its own descriptor.
        assert!(!seen.contains(&first_guid));
        assert!(lines.iter().all(|l| l.contains(&second_guid)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dropped_handle_still_completes() {
        let dir = TempDir::new().unwrap();
        let (cmd, _opener) = command_with_tool(&dir, ": > done\n: > out.chm");

        let pending = cmd.execute().unwrap();
        drop(pending.task);

        let marker = dir.path().join("done");
        for _ in 0..100 {
            if marker.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(marker.exists());
    }
}
