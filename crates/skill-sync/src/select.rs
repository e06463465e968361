use crate::manifest::{RepositoryId, TrackedPath, TrackedReference, UpstreamSource};
use crate::revision::SyncState;

/// Which entries a run acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every tracked path and reference.
    #[default]
    All,
    /// Only entries that have never been synced.
    NewOnly,
}

impl Selection {
    pub fn from_new_only(new_only: bool) -> Self {
        if new_only { Self::NewOnly } else { Self::All }
    }

    pub fn includes(self, state: &SyncState) -> bool {
        match self {
            Self::All => true,
            Self::NewOnly => !state.is_synced(),
        }
    }
}

/// The selected part of one source, borrowed mutably from the manifest.
///
/// Each entry is a disjoint borrow, so entries can be processed
/// concurrently while writing straight into the manifest.
#[derive(Debug)]
pub struct SourceWork<'a> {
    pub repo: &'a RepositoryId,
    pub branch: &'a str,
    pub paths: Vec<&'a mut TrackedPath>,
    pub references: Vec<&'a mut TrackedReference>,
}

impl SourceWork<'_> {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.references.is_empty()
    }
}

/// Narrow `sources` to the entries `selection` asks for.
///
/// Sources with nothing selected are dropped. Under [`Selection::All`]
/// every source is returned, even one with no entries.
pub fn select_sources(sources: &mut [UpstreamSource], selection: Selection) -> Vec<SourceWork<'_>> {
    sources
        .iter_mut()
        .filter_map(|source| {
            let UpstreamSource {
                repo,
                branch,
                skills,
                references,
            } = source;

            let work = SourceWork {
                repo: &*repo,
                branch: branch.as_str(),
                paths: skills
                    .iter_mut()
                    .filter(|p| selection.includes(&p.sync))
                    .collect(),
                references: references
                    .iter_mut()
                    .filter(|r| selection.includes(&r.sync))
                    .collect(),
            };

            match selection {
                Selection::All => Some(work),
                Selection::NewOnly if work.is_empty() => None,
                Selection::NewOnly => Some(work),
            }
        })
        .collect()
}
