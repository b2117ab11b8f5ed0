use crate::output::{print_fields, print_json};
use anyhow::Context;
use docbuild_core::{config::Config, BuildCommand};
use std::path::Path;

pub fn run(root: &Path, no_open: bool, json: bool) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    if no_open {
        config.build.open_artifact = false;
    }
    let command = BuildCommand::initialize(root, config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let pending = command.execute()?;
    tracing::info!(
        descriptor = %pending.descriptor.path.display(),
        guid = %pending.descriptor.project_guid,
        "descriptor ready"
    );
    let outcome = rt.block_on(pending.wait())?;

    if json {
        print_json(&outcome)?;
    } else {
        let exit = match outcome.exit_code {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        };
        let artifact = match (&outcome.artifact, outcome.artifact_opened) {
            (Some(path), true) => format!("{} (opened)", path.display()),
            _ => "-".to_string(),
        };
        print_fields(&[
            ("tool", outcome.tool.display().to_string()),
            ("descriptor", outcome.descriptor.clone()),
            ("exit", exit),
            ("artifact", artifact),
            (
                "elapsed",
                format!(
                    "{}ms",
                    (outcome.finished_at - outcome.started_at).num_milliseconds()
                ),
            ),
        ]);
    }

    outcome.into_result().context("documentation build failed")?;
    Ok(())
}
