use std::path::{Component, Path, PathBuf};

use futures::future::join_all;

use crate::error::SyncError;
use crate::feedback::{Feedback, Location};
use crate::manifest::{Manifest, RepositoryId, TrackedPath, TrackedReference};
use crate::revision::{RevisionTag, SyncState};
use crate::select::{Selection, SourceWork, select_sources};
use crate::upstream::{FetchedFile, Upstream};

/// Whether an entry mirrors files or only records provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Path,
    Reference,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// What a successfully synced entry recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Updated {
    pub revision: RevisionTag,
    pub files_written: usize,
}

/// Result of processing one tracked path or reference.
#[derive(Debug)]
pub struct EntryOutcome {
    pub repo: RepositoryId,
    pub branch: String,
    pub remote_path: String,
    pub kind: EntryKind,
    pub result: Result<Updated, SyncError>,
}

impl EntryOutcome {
    pub fn location(&self) -> Location {
        Location::new(&self.repo, &self.branch, &self.remote_path)
    }

    pub fn feedback(&self) -> Feedback {
        let location = self.location();
        match &self.result {
            Ok(updated) if self.kind == EntryKind::Reference => Feedback::info(
                location,
                format!("recorded at {}", updated.revision.short()),
            ),
            Ok(updated) => Feedback::info(
                location,
                format!(
                    "synced at {} ({} files)",
                    updated.revision.short(),
                    updated.files_written
                ),
            ),
            Err(e) => Feedback::error(location, format!("{} sync failed: {e}", self.kind)),
        }
    }
}

/// Summary of all entries processed in a run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<EntryOutcome>,
}

impl SyncReport {
    pub fn updated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn feedback(&self) -> Vec<Feedback> {
        self.outcomes.iter().map(EntryOutcome::feedback).collect()
    }
}

/// Outcome of a full run: the per-entry report and whether the manifest
/// file was rewritten.
#[derive(Debug)]
pub struct RunSummary {
    pub report: SyncReport,
    pub manifest_updated: bool,
}

/// Load the manifest, sync the selected entries, and persist the result.
///
/// Only manifest load and save failures are returned as errors. Entry
/// failures are collected in the report and the entries that did succeed
/// are still persisted. When `selection` is [`Selection::NewOnly`] and
/// nothing qualifies, nothing is fetched or written.
pub async fn run(
    manifest_path: &Path,
    root: &Path,
    upstream: &dyn Upstream,
    selection: Selection,
) -> Result<RunSummary, SyncError> {
    let mut manifest = Manifest::load(manifest_path)?;

    let report = {
        let work = select_sources(&mut manifest.sources, selection);

        if selection == Selection::NewOnly && work.is_empty() {
            tracing::info!("no unsynced entries");
            return Ok(RunSummary {
                report: SyncReport::default(),
                manifest_updated: false,
            });
        }

        sync_sources(work, upstream, root).await
    };

    manifest.save(manifest_path)?;

    Ok(RunSummary {
        report,
        manifest_updated: true,
    })
}

/// Convenience wrapper that selects from `manifest` and syncs in place.
pub async fn sync_manifest(
    manifest: &mut Manifest,
    upstream: &dyn Upstream,
    root: &Path,
    selection: Selection,
) -> SyncReport {
    let work = select_sources(&mut manifest.sources, selection);
    sync_sources(work, upstream, root).await
}

/// Process every selected source concurrently.
pub async fn sync_sources(
    work: Vec<SourceWork<'_>>,
    upstream: &dyn Upstream,
    root: &Path,
) -> SyncReport {
    let per_source = join_all(
        work.into_iter()
            .map(|source| sync_source(source, upstream, root)),
    )
    .await;

    SyncReport {
        outcomes: per_source.into_iter().flatten().collect(),
    }
}

async fn sync_source(
    work: SourceWork<'_>,
    upstream: &dyn Upstream,
    root: &Path,
) -> Vec<EntryOutcome> {
    let SourceWork {
        repo,
        branch,
        paths,
        references,
    } = work;

    tracing::info!(
        %repo,
        branch,
        paths = paths.len(),
        references = references.len(),
        "syncing source"
    );

    let mut outcomes = join_all(
        paths
            .into_iter()
            .map(|entry| sync_path(repo, branch, entry, upstream, root)),
    )
    .await;

    for reference in references {
        outcomes.push(sync_reference(repo, branch, reference, upstream).await);
    }

    outcomes
}

async fn sync_path(
    repo: &RepositoryId,
    branch: &str,
    entry: &mut TrackedPath,
    upstream: &dyn Upstream,
    root: &Path,
) -> EntryOutcome {
    tracing::info!(%repo, branch, path = %entry.remote_path, "syncing path");

    let result = mirror_path(repo, branch, entry, upstream, root).await;
    log_result(repo, branch, &entry.remote_path, &result);

    EntryOutcome {
        repo: repo.clone(),
        branch: branch.to_owned(),
        remote_path: entry.remote_path.clone(),
        kind: EntryKind::Path,
        result,
    }
}

/// Resolve, fetch, write, then record. The entry is only touched once
/// every file has been written.
async fn mirror_path(
    repo: &RepositoryId,
    branch: &str,
    entry: &mut TrackedPath,
    upstream: &dyn Upstream,
    root: &Path,
) -> Result<Updated, SyncError> {
    let revision = upstream
        .resolve_revision(repo, branch, &entry.remote_path)
        .await?;

    let files = upstream
        .fetch_tree(repo, branch, &entry.remote_path)
        .await?;

    let dest_root = root.join(&entry.local_path);
    for file in &files {
        write_file(&dest_root, file).await?;
    }

    entry.sync = SyncState::synced_now(revision.clone());

    Ok(Updated {
        revision,
        files_written: files.len(),
    })
}

async fn sync_reference(
    repo: &RepositoryId,
    branch: &str,
    entry: &mut TrackedReference,
    upstream: &dyn Upstream,
) -> EntryOutcome {
    tracing::info!(%repo, branch, path = %entry.remote_path, "resolving reference");

    let resolved = upstream
        .resolve_revision(repo, branch, &entry.remote_path)
        .await;

    let result = resolved.map(|revision| {
        entry.sync = SyncState::synced_now(revision.clone());
        Updated {
            revision,
            files_written: 0,
        }
    });
    log_result(repo, branch, &entry.remote_path, &result);

    EntryOutcome {
        repo: repo.clone(),
        branch: branch.to_owned(),
        remote_path: entry.remote_path.clone(),
        kind: EntryKind::Reference,
        result,
    }
}

fn log_result(repo: &RepositoryId, branch: &str, path: &str, result: &Result<Updated, SyncError>) {
    match result {
        Ok(updated) => tracing::info!(
            %repo,
            branch,
            path,
            revision = updated.revision.short(),
            files = updated.files_written,
            "updated"
        ),
        Err(e) => tracing::warn!(%repo, branch, path, error = %e, "sync failed"),
    }
}

async fn write_file(dest_root: &Path, file: &FetchedFile) -> Result<(), SyncError> {
    let target = destination(dest_root, &file.path)?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| SyncError::WriteFailure {
                path: parent.to_owned(),
                source,
            })?;
    }

    tokio::fs::write(&target, &file.content)
        .await
        .map_err(|source| SyncError::WriteFailure {
            path: target.clone(),
            source,
        })?;

    tracing::debug!(path = %target.display(), bytes = file.content.len(), "wrote file");
    Ok(())
}

/// Join a fetched relative path onto its destination, refusing anything
/// that could land outside it.
fn destination(dest_root: &Path, relative: &str) -> Result<PathBuf, SyncError> {
    if relative.is_empty() {
        return Ok(dest_root.to_owned());
    }

    let rel = Path::new(relative);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(SyncError::UnsafePath(relative.to_owned()));
    }

    Ok(dest_root.join(rel))
}
