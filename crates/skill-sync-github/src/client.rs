use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use skill_sync::{FetchedFile, RepositoryId, RevisionTag, SyncError, Upstream};

use crate::contents::{ContentEntry, ContentsResponse, EntryType};

/// HTTP client for GitHub's Contents API.
///
/// Lists directories, downloads raw files through their `download_url`,
/// and resolves the `sha` of a path from its parent listing.
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    api_base_url: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>, api_base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            api_base_url,
        }
    }

    fn api_base(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or("https://api.github.com")
            .trim_end_matches('/')
    }

    fn build_request(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url).header("User-Agent", "skill-sync");

        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        req
    }

    /// `{api}/repos/{owner}/{name}/contents/{path}?ref={branch}` with every
    /// path segment and the branch percent-encoded.
    fn contents_url(
        &self,
        repo: &RepositoryId,
        branch: &str,
        path: &str,
    ) -> Result<reqwest::Url, SyncError> {
        let base = self.api_base();
        let mut url = reqwest::Url::parse(base)
            .map_err(|e| SyncError::Network(format!("invalid API base {base:?}: {e}")))?;

        url.path_segments_mut()
            .map_err(|_| SyncError::Network(format!("API base {base:?} cannot take a path")))?
            .pop_if_empty()
            .extend(["repos", repo.owner(), repo.name(), "contents"])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        url.query_pairs_mut().append_pair("ref", branch);

        Ok(url)
    }

    async fn get(&self, url: reqwest::Url) -> Result<reqwest::Response, SyncError> {
        tracing::debug!(url = %url, "GET");

        let response = self
            .build_request(url)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UpstreamUnavailable {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_owned(),
            });
        }

        Ok(response)
    }

    /// List the entries of `path` at `branch`. The repository root is
    /// listed when `path` is empty. A file path yields that one entry.
    pub async fn list(
        &self,
        repo: &RepositoryId,
        branch: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, SyncError> {
        let url = self.contents_url(repo, branch, path)?;

        let listing: ContentsResponse = self
            .get(url)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(format!("contents listing for {path:?}: {e}")))?;

        Ok(listing.into_entries())
    }

    /// Download a file as UTF-8 text. Binary files are a `Decode` error
    /// rather than being rewritten with replacement characters.
    pub async fn download(&self, url: &str) -> Result<String, SyncError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| SyncError::Decode(format!("invalid download_url {url:?}: {e}")))?;

        let bytes = self
            .get(parsed)
            .await?
            .bytes()
            .await
            .map_err(|e| SyncError::Network(format!("failed to read {url}: {e}")))?;

        String::from_utf8(bytes.to_vec())
            .map_err(|e| SyncError::Decode(format!("{url} is not UTF-8 text: {e}")))
    }

    fn fetch_dir<'a>(
        &'a self,
        repo: &'a RepositoryId,
        branch: &'a str,
        root: &'a str,
        path: String,
    ) -> BoxFuture<'a, Result<Vec<FetchedFile>, SyncError>> {
        async move {
            let entries = self.list(repo, branch, &path).await?;

            let tasks = entries.into_iter().filter_map(move |entry| match entry.entry_type {
                EntryType::File => Some(self.fetch_file(root, entry).boxed()),
                EntryType::Dir => Some(self.fetch_dir(repo, branch, root, entry.path)),
                EntryType::Symlink | EntryType::Submodule | EntryType::Other => {
                    tracing::debug!(path = %entry.path, kind = ?entry.entry_type, "skipping entry");
                    None
                }
            });

            let nested = try_join_all(tasks).await?;
            Ok(nested.into_iter().flatten().collect())
        }
        .boxed()
    }

    async fn fetch_file(
        &self,
        root: &str,
        entry: ContentEntry,
    ) -> Result<Vec<FetchedFile>, SyncError> {
        let url = entry
            .download_url
            .as_deref()
            .ok_or_else(|| SyncError::Decode(format!("no download_url for {}", entry.path)))?;

        let content = self.download(url).await?;

        Ok(vec![FetchedFile {
            path: relative_to(root, &entry.path)?,
            content,
        }])
    }
}

/// Path of `path` inside `root`, empty when they are the same.
fn relative_to(root: &str, path: &str) -> Result<String, SyncError> {
    if root.is_empty() {
        return Ok(path.to_owned());
    }
    if path == root {
        return Ok(String::new());
    }

    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(str::to_owned)
        .ok_or_else(|| SyncError::Decode(format!("{path} is outside {root}")))
}

#[async_trait::async_trait]
impl Upstream for GitHubClient {
    async fn fetch_tree(
        &self,
        repo: &RepositoryId,
        branch: &str,
        path: &str,
    ) -> Result<Vec<FetchedFile>, SyncError> {
        let root = path.trim_matches('/');
        let files = self.fetch_dir(repo, branch, root, root.to_owned()).await?;

        tracing::debug!(%repo, branch, path = root, files = files.len(), "fetched tree");
        Ok(files)
    }

    async fn resolve_revision(
        &self,
        repo: &RepositoryId,
        branch: &str,
        path: &str,
    ) -> Result<RevisionTag, SyncError> {
        let path = path.trim_matches('/');
        let (parent, leaf) = path.rsplit_once('/').unwrap_or(("", path));

        let entries = self.list(repo, branch, parent).await?;

        entries
            .into_iter()
            .find(|entry| entry.name == leaf)
            .map(|entry| RevisionTag::new(entry.sha))
            .ok_or_else(|| SyncError::PathNotFound {
                repo: repo.clone(),
                branch: branch.to_owned(),
                path: path.to_owned(),
            })
    }
}
