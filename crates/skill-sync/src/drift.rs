use futures::future::join_all;

use crate::error::SyncError;
use crate::feedback::{Feedback, Location};
use crate::manifest::{Manifest, RepositoryId};
use crate::revision::{RevisionTag, SyncState};
use crate::select::Selection;
use crate::sync::EntryKind;
use crate::upstream::Upstream;

/// How a recorded revision compares with the remote.
#[derive(Debug)]
pub enum DriftStatus {
    UpToDate(RevisionTag),
    Drifted {
        recorded: RevisionTag,
        current: RevisionTag,
    },
    NeverSynced {
        current: RevisionTag,
    },
    Failed(SyncError),
}

#[derive(Debug)]
pub struct DriftEntry {
    pub repo: RepositoryId,
    pub branch: String,
    pub remote_path: String,
    pub kind: EntryKind,
    pub status: DriftStatus,
}

impl DriftEntry {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, DriftStatus::Failed(_))
    }

    pub fn needs_sync(&self) -> bool {
        matches!(
            self.status,
            DriftStatus::Drifted { .. } | DriftStatus::NeverSynced { .. }
        )
    }

    pub fn location(&self) -> Location {
        Location::new(&self.repo, &self.branch, &self.remote_path)
    }

    pub fn feedback(&self) -> Feedback {
        let location = self.location();
        match &self.status {
            DriftStatus::UpToDate(rev) => {
                Feedback::info(location, format!("up to date at {}", rev.short()))
            }
            DriftStatus::Drifted { recorded, current } => Feedback::warning(
                location,
                format!("drifted {} -> {}", recorded.short(), current.short()),
            ),
            DriftStatus::NeverSynced { current } => Feedback::warning(
                location,
                format!("never synced (remote at {})", current.short()),
            ),
            DriftStatus::Failed(e) => Feedback::error(location, e.to_string()),
        }
    }
}

fn classify(recorded: &SyncState, current: Result<RevisionTag, SyncError>) -> DriftStatus {
    match (recorded.revision(), current) {
        (_, Err(e)) => DriftStatus::Failed(e),
        (None, Ok(current)) => DriftStatus::NeverSynced { current },
        (Some(recorded), Ok(current)) if *recorded == current => DriftStatus::UpToDate(current),
        (Some(recorded), Ok(current)) => DriftStatus::Drifted {
            recorded: recorded.clone(),
            current,
        },
    }
}

/// Resolve every selected entry and compare it against the manifest.
///
/// Read-only: nothing is fetched beyond the parent listings and the
/// manifest is not modified.
pub async fn check_drift(
    manifest: &Manifest,
    upstream: &dyn Upstream,
    selection: Selection,
) -> Vec<DriftEntry> {
    let mut targets = Vec::new();
    for source in &manifest.sources {
        for path in source.skills.iter().filter(|p| selection.includes(&p.sync)) {
            targets.push((source, path.remote_path.as_str(), &path.sync, EntryKind::Path));
        }
        for reference in source
            .references
            .iter()
            .filter(|r| selection.includes(&r.sync))
        {
            targets.push((
                source,
                reference.remote_path.as_str(),
                &reference.sync,
                EntryKind::Reference,
            ));
        }
    }

    join_all(
        targets
            .into_iter()
            .map(|(source, remote_path, recorded, kind)| async move {
                let current = upstream
                    .resolve_revision(&source.repo, &source.branch, remote_path)
                    .await;
                DriftEntry {
                    repo: source.repo.clone(),
                    branch: source.branch.clone(),
                    remote_path: remote_path.to_owned(),
                    kind,
                    status: classify(recorded, current),
                }
            }),
    )
    .await
}
