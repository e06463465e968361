use std::path::PathBuf;

use crate::manifest::RepositoryId;

/// Errors that can occur while loading, syncing, or saving a manifest.
///
/// Only the manifest variants abort a run. Everything else is scoped to the
/// single tracked path or reference being processed.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("manifest unreadable at {path}: {reason}")]
    ManifestUnreadable { path: PathBuf, reason: String },

    #[error("failed to write manifest to {path}: {reason}")]
    ManifestWrite { path: PathBuf, reason: String },

    #[error("upstream unavailable: HTTP {status} {reason}")]
    UpstreamUnavailable { status: u16, reason: String },

    #[error("path not found: {path} in {repo}@{branch}")]
    PathNotFound {
        repo: RepositoryId,
        branch: String,
        path: String,
    },

    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("refusing to write outside destination: {0}")]
    UnsafePath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_unavailable_shows_status() {
        let unavailable = SyncError::UpstreamUnavailable {
            status: 503,
            reason: "Service Unavailable".into(),
        };
        assert_eq!(
            unavailable.to_string(),
            "upstream unavailable: HTTP 503 Service Unavailable"
        );
    }

    #[test]
    fn path_not_found_names_repo_and_branch() {
        let err = SyncError::PathNotFound {
            repo: "org/repo".parse().unwrap(),
            branch: "main".into(),
            path: "skills/missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "path not found: skills/missing in org/repo@main"
        );
    }
}
