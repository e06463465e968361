use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::revision::{RevisionTag, SyncState, Timestamp};

/// The durable record of what to sync and what was last synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub sources: Vec<UpstreamSource>,
}

/// One upstream repository and the paths mirrored from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamSource {
    pub repo: RepositoryId,
    pub branch: String,
    #[serde(default)]
    pub skills: Vec<TrackedPath>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<TrackedReference>,
}

/// A remote directory (or file) mirrored into the local tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TrackedPathRecord", into = "TrackedPathRecord")]
pub struct TrackedPath {
    pub remote_path: String,
    pub local_path: String,
    pub sync: SyncState,
}

/// A remote path whose revision is recorded but whose files are not mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TrackedReferenceRecord", into = "TrackedReferenceRecord")]
pub struct TrackedReference {
    pub remote_path: String,
    pub description: Option<String>,
    pub sync: SyncState,
}

impl TrackedPath {
    pub fn new(remote_path: impl Into<String>, local_path: impl Into<String>) -> Self {
        Self {
            remote_path: remote_path.into(),
            local_path: local_path.into(),
            sync: SyncState::NotSynced,
        }
    }
}

impl TrackedReference {
    pub fn new(remote_path: impl Into<String>, description: Option<String>) -> Self {
        Self {
            remote_path: remote_path.into(),
            description,
            sync: SyncState::NotSynced,
        }
    }
}

/// An `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId {
    owner: String,
    name: String,
}

impl RepositoryId {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepositoryId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_owned(),
                    name: name.to_owned(),
                })
            }
            _ => Err(format!("invalid repository id {s:?}, expected owner/name")),
        }
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RepositoryId> for String {
    fn from(id: RepositoryId) -> Self {
        id.to_string()
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// On-disk shapes. The sync fields are flattened into optional pairs here and
// folded into `SyncState` on the way in.

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackedPathRecord {
    remote_path: String,
    local_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision_tag: Option<RevisionTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_synced_at: Option<Timestamp>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackedReferenceRecord {
    remote_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision_tag: Option<RevisionTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_synced_at: Option<Timestamp>,
}

impl TryFrom<TrackedPathRecord> for TrackedPath {
    type Error = String;

    fn try_from(record: TrackedPathRecord) -> Result<Self, Self::Error> {
        let sync = SyncState::from_parts(record.revision_tag, record.last_synced_at)
            .map_err(|e| format!("{}: {e}", record.remote_path))?;
        Ok(Self {
            remote_path: record.remote_path,
            local_path: record.local_path,
            sync,
        })
    }
}

impl From<TrackedPath> for TrackedPathRecord {
    fn from(path: TrackedPath) -> Self {
        let (revision_tag, last_synced_at) = path.sync.into_parts();
        Self {
            remote_path: path.remote_path,
            local_path: path.local_path,
            revision_tag,
            last_synced_at,
        }
    }
}

impl TryFrom<TrackedReferenceRecord> for TrackedReference {
    type Error = String;

    fn try_from(record: TrackedReferenceRecord) -> Result<Self, Self::Error> {
        let sync = SyncState::from_parts(record.revision_tag, record.last_synced_at)
            .map_err(|e| format!("{}: {e}", record.remote_path))?;
        Ok(Self {
            remote_path: record.remote_path,
            description: record.description,
            sync,
        })
    }
}

impl From<TrackedReference> for TrackedReferenceRecord {
    fn from(reference: TrackedReference) -> Self {
        let (revision_tag, last_synced_at) = reference.sync.into_parts();
        Self {
            remote_path: reference.remote_path,
            description: reference.description,
            revision_tag,
            last_synced_at,
        }
    }
}

impl Manifest {
    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| SyncError::ManifestUnreadable {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;

        Self::from_json(&contents).map_err(|reason| SyncError::ManifestUnreadable {
            path: path.to_owned(),
            reason,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, String> {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, String> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        json.push('\n');
        Ok(json)
    }

    /// Replace the file at `path` with this manifest.
    ///
    /// The content is written to a temporary file next to `path` and renamed
    /// over it, so readers never observe a half-written manifest.
    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        let write_err = |reason: String| SyncError::ManifestWrite {
            path: path.to_owned(),
            reason,
        };

        let json = self.to_json().map_err(write_err)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| write_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| write_err(e.error.to_string()))?;

        tracing::debug!(path = %path.display(), "manifest written");
        Ok(())
    }

    /// Number of tracked paths and references across all sources.
    pub fn entry_count(&self) -> usize {
        self.sources
            .iter()
            .map(|s| s.skills.len() + s.references.len())
            .sum()
    }
}
