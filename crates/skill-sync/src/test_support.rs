use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{FetchedFile, RepositoryId, RevisionTag, SyncError, Upstream};

#[derive(Default)]
struct Branch {
    files: BTreeMap<String, String>,
    revisions: HashMap<String, RevisionTag>,
    unavailable: HashMap<String, u16>,
}

/// In-memory upstream for testing. Counts every request it serves.
#[derive(Default)]
pub struct InMemoryUpstream {
    branches: HashMap<String, Branch>,
    requests: AtomicUsize,
}

impl InMemoryUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    fn branch_mut(&mut self, repo: &str, branch: &str) -> &mut Branch {
        self.branches.entry(format!("{repo}@{branch}")).or_default()
    }

    fn branch(&self, repo: &RepositoryId, branch: &str) -> Option<&Branch> {
        self.branches.get(&format!("{repo}@{branch}"))
    }

    /// Add a file at its full path within the repository.
    pub fn with_file(mut self, repo: &str, branch: &str, path: &str, content: &str) -> Self {
        self.set_file(repo, branch, path, content);
        self
    }

    /// Register the content identifier reported for `path`.
    pub fn with_revision(mut self, repo: &str, branch: &str, path: &str, tag: &str) -> Self {
        self.set_revision(repo, branch, path, tag);
        self
    }

    /// Make every request touching `path` fail with `status`.
    pub fn with_unavailable(mut self, repo: &str, branch: &str, path: &str, status: u16) -> Self {
        self.branch_mut(repo, branch)
            .unavailable
            .insert(path.to_owned(), status);
        self
    }

    pub fn set_file(&mut self, repo: &str, branch: &str, path: &str, content: &str) {
        self.branch_mut(repo, branch)
            .files
            .insert(path.to_owned(), content.to_owned());
    }

    pub fn set_revision(&mut self, repo: &str, branch: &str, path: &str, tag: &str) {
        self.branch_mut(repo, branch)
            .revisions
            .insert(path.to_owned(), RevisionTag::new(tag));
    }

    /// Total number of fetch and resolve calls served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn check_available(branch: &Branch, path: &str) -> Result<(), SyncError> {
        match branch.unavailable.get(path) {
            Some(&status) => Err(SyncError::UpstreamUnavailable {
                status,
                reason: "injected failure".into(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Upstream for InMemoryUpstream {
    async fn fetch_tree(
        &self,
        repo: &RepositoryId,
        branch: &str,
        path: &str,
    ) -> Result<Vec<FetchedFile>, SyncError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let not_found = || SyncError::UpstreamUnavailable {
            status: 404,
            reason: "Not Found".into(),
        };

        let data = self.branch(repo, branch).ok_or_else(not_found)?;
        Self::check_available(data, path)?;

        if let Some(content) = data.files.get(path) {
            return Ok(vec![FetchedFile {
                path: String::new(),
                content: content.clone(),
            }]);
        }

        let prefix = format!("{path}/");
        let files: Vec<FetchedFile> = data
            .files
            .iter()
            .filter_map(|(full, content)| {
                Some(FetchedFile {
                    path: full.strip_prefix(&prefix)?.to_owned(),
                    content: content.clone(),
                })
            })
            .collect();

        if files.is_empty() && !data.revisions.contains_key(path) {
            return Err(not_found());
        }

        Ok(files)
    }

    async fn resolve_revision(
        &self,
        repo: &RepositoryId,
        branch: &str,
        path: &str,
    ) -> Result<RevisionTag, SyncError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let not_found = || SyncError::PathNotFound {
            repo: repo.clone(),
            branch: branch.to_owned(),
            path: path.to_owned(),
        };

        let data = self.branch(repo, branch).ok_or_else(not_found)?;
        Self::check_available(data, path)?;
        data.revisions.get(path).cloned().ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryId {
        "org/repo".parse().unwrap()
    }

    #[tokio::test]
    async fn fetch_tree_returns_relative_paths() {
        let upstream = InMemoryUpstream::new()
            .with_file("org/repo", "main", "skills/foo/a.md", "a")
            .with_file("org/repo", "main", "skills/foo/sub/b.md", "b")
            .with_file("org/repo", "main", "skills/other/c.md", "c");

        let files = upstream.fetch_tree(&repo(), "main", "skills/foo").await.unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "sub/b.md"]);
        assert_eq!(upstream.request_count(), 1);
    }

    #[tokio::test]
    async fn resolve_missing_path_is_not_found() {
        let upstream = InMemoryUpstream::new().with_revision("org/repo", "main", "skills/foo", "abc");
        let result = upstream.resolve_revision(&repo(), "main", "skills/bar").await;
        assert!(matches!(result, Err(SyncError::PathNotFound { .. })));
    }

    #[tokio::test]
    async fn injected_failures_surface_status() {
        let upstream = InMemoryUpstream::new()
            .with_revision("org/repo", "main", "skills/foo", "abc")
            .with_unavailable("org/repo", "main", "skills/foo", 503);
        let result = upstream.resolve_revision(&repo(), "main", "skills/foo").await;
        assert!(matches!(
            result,
            Err(SyncError::UpstreamUnavailable { status: 503, .. })
        ));
    }
}
