use crate::output::print_json;
use anyhow::Context;
use docbuild_core::{config::Config, BuildCommand};
use std::path::Path;

pub fn run(
    root: &Path,
    metadata: Option<String>,
    assembly: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    if let Some(m) = metadata {
        config.sources.metadata = m;
    }
    if let Some(a) = assembly {
        config.sources.assembly = a;
    }

    let command = BuildCommand::initialize(root, config)?;
    let written = command.generate()?;

    if json {
        print_json(&written)?;
    } else {
        println!("{}", written.path.display());
        println!("ProjectGuid {}", written.project_guid);
    }
    Ok(())
}
