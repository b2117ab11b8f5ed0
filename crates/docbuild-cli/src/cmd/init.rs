use crate::output::print_json;
use anyhow::Context;
use docbuild_core::{config::Config, paths};
use std::path::{Path, PathBuf};

pub struct InitArgs {
    pub metadata: Option<String>,
    pub assembly: Option<String>,
    pub tool: Option<PathBuf>,
    pub force: bool,
}

pub fn run(root: &Path, args: InitArgs, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    if path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let mut config = Config::new(
        args.metadata.unwrap_or_default(),
        args.assembly.unwrap_or_default(),
    );
    if let Some(tool) = args.tool {
        config.build.tool = tool;
    }
    config.save(root).context("failed to write config")?;

    let warnings = config.validate();
    if json {
        print_json(&serde_json::json!({
            "config": path,
            "warnings": warnings,
        }))?;
    } else {
        println!("Wrote {}", path.display());
        for w in &warnings {
            println!("  note: {}", w.message);
        }
    }
    Ok(())
}
