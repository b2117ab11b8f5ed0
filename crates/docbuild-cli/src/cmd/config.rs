use crate::output::{print_fields, print_json};
use anyhow::Context;
use clap::Subcommand;
use docbuild_core::config::{Config, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }

    let d = &config.descriptor;
    print_fields(&[
        ("sources.metadata", config.sources.metadata.clone()),
        ("sources.assembly", config.sources.assembly.clone()),
        ("build.tool", config.build.tool.display().to_string()),
        ("build.descriptor", config.build.descriptor.clone()),
        ("build.artifact", config.artifact_path().display().to_string()),
        ("build.open_artifact", config.build.open_artifact.to_string()),
        ("descriptor.name", d.name.clone()),
        ("descriptor.language", d.language.clone()),
        ("descriptor.help_file_format", d.help_file_format.clone()),
        ("descriptor.presentation_style", d.presentation_style.clone()),
        ("descriptor.output_path", d.output_path.clone()),
    ]);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
