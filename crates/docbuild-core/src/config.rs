use crate::descriptor::DescriptorSettings;
use crate::error::{DocbuildError, Result};
use crate::paths;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SourcesConfig
// ---------------------------------------------------------------------------

/// The two documentation inputs: the compiler's XML doc comments file and
/// the assembly it describes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourcesConfig {
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub assembly: String,
}

// ---------------------------------------------------------------------------
// BuildConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildConfig {
    /// Build tool executable. Bare names are looked up on `PATH`.
    #[serde(default = "default_tool")]
    pub tool: PathBuf,
    /// Descriptor file name, written to the project root.
    #[serde(default = "default_descriptor")]
    pub descriptor: String,
    /// Artifact to open after the build. Defaults to the descriptor's
    /// output path and help name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    #[serde(default = "default_open_artifact")]
    pub open_artifact: bool,
}

fn default_tool() -> PathBuf {
    PathBuf::from(paths::DEFAULT_BUILD_TOOL)
}

fn default_descriptor() -> String {
    paths::DEFAULT_DESCRIPTOR.to_string()
}

fn default_open_artifact() -> bool {
    true
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            descriptor: default_descriptor(),
            artifact: None,
            open_artifact: default_open_artifact(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub descriptor: DescriptorSettings,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            sources: SourcesConfig::default(),
            build: BuildConfig::default(),
            descriptor: DescriptorSettings::default(),
        }
    }
}

impl Config {
    pub fn new(metadata: impl Into<String>, assembly: impl Into<String>) -> Self {
        Self {
            sources: SourcesConfig {
                metadata: metadata.into(),
                assembly: assembly.into(),
            },
            ..Self::default()
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(DocbuildError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Artifact path relative to the project root.
    pub fn artifact_path(&self) -> PathBuf {
        self.build
            .artifact
            .clone()
            .unwrap_or_else(|| self.descriptor.artifact_path())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.sources.metadata.trim().is_empty() {
            warnings.push(ConfigWarning::error("sources.metadata is empty"));
        }
        if self.sources.assembly.trim().is_empty() {
            warnings.push(ConfigWarning::error("sources.assembly is empty"));
        }

        if self.build.tool.as_os_str().is_empty() {
            warnings.push(ConfigWarning::error("build.tool is empty"));
        }

        let descriptor = Path::new(&self.build.descriptor);
        if self.build.descriptor.trim().is_empty() {
            warnings.push(ConfigWarning::error("build.descriptor is empty"));
        } else if descriptor.components().count() != 1 {
            warnings.push(ConfigWarning::error(format!(
                "build.descriptor '{}' must be a plain file name",
                self.build.descriptor
            )));
        } else if descriptor.extension().and_then(|e| e.to_str())
            != Some(paths::DESCRIPTOR_EXTENSION)
        {
            warnings.push(ConfigWarning::warning(format!(
                "build.descriptor '{}' does not end in .{}",
                self.build.descriptor,
                paths::DESCRIPTOR_EXTENSION
            )));
        }

        if !locale_re().is_match(&self.descriptor.language) {
            warnings.push(ConfigWarning::warning(format!(
                "descriptor.language '{}' is not a locale tag like 'en-US'",
                self.descriptor.language
            )));
        }

        if self.descriptor.save_component_cache_capacity == 0 {
            warnings.push(ConfigWarning::warning(
                "descriptor.save_component_cache_capacity is 0; component caches will not be saved",
            ));
        }

        if self.descriptor.html_help_name.trim().is_empty() {
            warnings.push(ConfigWarning::error("descriptor.html_help_name is empty"));
        }

        warnings
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(DocbuildError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}

static LOCALE_RE: OnceLock<Regex> = OnceLock::new();

fn locale_re() -> &'static Regex {
    LOCALE_RE.get_or_init(|| Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})*$").unwrap())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
