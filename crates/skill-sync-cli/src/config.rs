use std::path::{Path, PathBuf};

use skill_sync::Selection;

/// Manifest file name looked up under the repository root.
pub const DEFAULT_MANIFEST: &str = "skills-sync.json";

/// Everything a run needs, resolved from flags and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub manifest_path: PathBuf,
    pub root: PathBuf,
    pub selection: Selection,
    pub token: Option<String>,
    pub api_base_url: Option<String>,
}

impl SyncConfig {
    /// Build a config from command-line values, reading `GITHUB_TOKEN` and
    /// `GITHUB_API_URL` through `env`. Empty variables count as unset.
    pub fn resolve(
        manifest: Option<&Path>,
        root: &Path,
        new_only: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        Self {
            manifest_path: manifest
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.join(DEFAULT_MANIFEST)),
            root: root.to_path_buf(),
            selection: Selection::from_new_only(new_only),
            token: non_empty("GITHUB_TOKEN"),
            api_base_url: non_empty("GITHUB_API_URL"),
        }
    }
}
