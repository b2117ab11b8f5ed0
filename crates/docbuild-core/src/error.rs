use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocbuildError {
    #[error("not initialized: run 'docbuild init'")]
    NotInitialized,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to write descriptor {}: {source}", .path.display())]
    DescriptorWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{field} contains a character XML cannot represent (U+{code:04X})")]
    UnrepresentableText { field: String, code: u32 },

    #[error("build tool not found: {0}")]
    BuildToolNotFound(String),

    #[error("failed to start build tool {}: {source}", .tool.display())]
    Spawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build tool exited with {}", describe_exit(.code))]
    BuildFailed { code: Option<i32> },

    #[error("artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("failed to open artifact {}: {source}", .path.display())]
    ArtifactOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build task aborted: {0}")]
    TaskAborted(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, DocbuildError>;
