pub mod drift;
pub mod error;
pub mod feedback;
pub mod manifest;
pub mod revision;
pub mod select;
pub mod sync;
pub mod upstream;

pub use drift::{DriftEntry, DriftStatus, check_drift};
pub use error::SyncError;
pub use feedback::{Feedback, Location, Severity};
pub use manifest::{Manifest, RepositoryId, TrackedPath, TrackedReference, UpstreamSource};
pub use revision::{RevisionTag, SyncState, Timestamp};
pub use select::{Selection, SourceWork, select_sources};
pub use sync::{
    EntryKind, EntryOutcome, RunSummary, SyncReport, Updated, run, sync_manifest, sync_sources,
};
pub use upstream::{FetchedFile, Upstream};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
