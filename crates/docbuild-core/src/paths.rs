use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "docbuild.yaml";
pub const DEFAULT_DESCRIPTOR: &str = "Documentation.shfbproj";
pub const DESCRIPTOR_EXTENSION: &str = "shfbproj";
pub const DEFAULT_BUILD_TOOL: &str = "MSBuild.exe";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn under_root(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Turn a Windows-style relative path like `.\Help\` into one the host
/// filesystem understands.
pub fn normalize_separators(path: &str) -> PathBuf {
    if std::path::MAIN_SEPARATOR == '\\' {
        PathBuf::from(path)
    } else {
        PathBuf::from(path.replace('\\', "/"))
    }
}
