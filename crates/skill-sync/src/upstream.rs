use crate::error::SyncError;
use crate::manifest::RepositoryId;
use crate::revision::RevisionTag;

/// A file materialized from a remote tree.
///
/// `path` is relative to the requested root. It is empty when the root
/// itself is a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub path: String,
    pub content: String,
}

/// A remote hosting service that can list, download, and identify content.
#[async_trait::async_trait]
pub trait Upstream: Send + Sync {
    /// Fetch every file under `path` as a flat list.
    async fn fetch_tree(
        &self,
        repo: &RepositoryId,
        branch: &str,
        path: &str,
    ) -> Result<Vec<FetchedFile>, SyncError>;

    /// Resolve the current content identifier of `path` without downloading it.
    async fn resolve_revision(
        &self,
        repo: &RepositoryId,
        branch: &str,
        path: &str,
    ) -> Result<RevisionTag, SyncError>;
}
