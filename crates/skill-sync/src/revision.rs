use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Content identifier of a remote path, as reported by the hosting API.
///
/// Opaque: only compared for equality and shortened for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionTag(String);

impl RevisionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, for log lines.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for RevisionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An RFC 3339 timestamp that keeps the exact text it was loaded from.
///
/// Entries that are not touched by a run serialize back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    raw: String,
}

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            raw: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for Timestamp {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))?;
        Ok(Self { raw })
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.raw
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Provenance of a tracked path or reference.
///
/// The manifest stores this as two optional fields that are always present
/// or absent together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    NotSynced,
    Synced {
        revision: RevisionTag,
        synced_at: Timestamp,
    },
}

impl SyncState {
    /// Record a successful sync at the current time.
    pub fn synced_now(revision: RevisionTag) -> Self {
        Self::Synced {
            revision,
            synced_at: Timestamp::now(),
        }
    }

    /// Rebuild the state from its on-disk fields, rejecting one-sided pairs.
    pub fn from_parts(
        revision: Option<RevisionTag>,
        synced_at: Option<Timestamp>,
    ) -> Result<Self, String> {
        match (revision, synced_at) {
            (None, None) => Ok(Self::NotSynced),
            (Some(revision), Some(synced_at)) => Ok(Self::Synced {
                revision,
                synced_at,
            }),
            (Some(_), None) => Err("revisionTag is set without lastSyncedAt".into()),
            (None, Some(_)) => Err("lastSyncedAt is set without revisionTag".into()),
        }
    }

    pub fn into_parts(self) -> (Option<RevisionTag>, Option<Timestamp>) {
        match self {
            Self::NotSynced => (None, None),
            Self::Synced {
                revision,
                synced_at,
            } => (Some(revision), Some(synced_at)),
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }

    pub fn revision(&self) -> Option<&RevisionTag> {
        match self {
            Self::NotSynced => None,
            Self::Synced { revision, .. } => Some(revision),
        }
    }

    pub fn synced_at(&self) -> Option<&Timestamp> {
        match self {
            Self::NotSynced => None,
            Self::Synced { synced_at, .. } => Some(synced_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn short_truncates_to_seven_chars() {
        let tag = RevisionTag::new("abc123def456");
        assert_eq!(tag.short(), "abc123d");
        assert_eq!(RevisionTag::new("abc").short(), "abc");
    }

    #[test]
    fn timestamp_preserves_original_text() {
        let ts = Timestamp::try_from("2025-01-01T00:00:00+00:00".to_owned()).unwrap();
        assert_eq!(ts.as_str(), "2025-01-01T00:00:00+00:00");
        assert_eq!(String::from(ts), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn timestamp_rejects_garbage() {
        assert!(Timestamp::try_from("yesterday".to_owned()).is_err());
    }

    #[test]
    fn new_timestamps_use_millis_and_z_suffix() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        let ts = Timestamp::from_datetime(at);
        assert_eq!(ts.as_str(), "2025-06-01T12:30:00.000Z");
    }

    #[test]
    fn sync_state_parts_must_be_paired() {
        let ts = Timestamp::now();
        assert!(SyncState::from_parts(None, None).unwrap() == SyncState::NotSynced);
        assert!(
            SyncState::from_parts(Some(RevisionTag::new("abc")), Some(ts.clone()))
                .unwrap()
                .is_synced()
        );
        assert!(SyncState::from_parts(Some(RevisionTag::new("abc")), None).is_err());
        assert!(SyncState::from_parts(None, Some(ts)).is_err());
    }

    #[test]
    fn synced_now_records_revision() {
        let state = SyncState::synced_now(RevisionTag::new("deadbeef"));
        assert_eq!(state.revision().map(|r| r.as_str()), Some("deadbeef"));
        assert!(state.synced_at().is_some());
    }
}
