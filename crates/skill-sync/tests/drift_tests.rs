use skill_sync::test_support::InMemoryUpstream;
use skill_sync::{DriftEntry, DriftStatus, EntryKind, Manifest, Selection, check_drift};

const MANIFEST: &str = r#"{
  "sources": [
    {
      "repo": "org/repo",
      "branch": "main",
      "skills": [
        {
          "remotePath": "skills/current",
          "localPath": "skills/current",
          "revisionTag": "same",
          "lastSyncedAt": "2025-01-01T00:00:00.000Z"
        },
        {
          "remotePath": "skills/moved",
          "localPath": "skills/moved",
          "revisionTag": "old",
          "lastSyncedAt": "2025-01-01T00:00:00.000Z"
        },
        {
          "remotePath": "skills/new",
          "localPath": "skills/new"
        }
      ],
      "references": [
        {
          "remotePath": "docs/gone",
          "description": "Removed upstream"
        }
      ]
    }
  ]
}
"#;

fn upstream() -> InMemoryUpstream {
    InMemoryUpstream::new()
        .with_revision("org/repo", "main", "skills/current", "same")
        .with_revision("org/repo", "main", "skills/moved", "new")
        .with_revision("org/repo", "main", "skills/new", "fresh")
}

fn status<'a>(entries: &'a [DriftEntry], path: &str) -> &'a DriftStatus {
    &entries
        .iter()
        .find(|e| e.remote_path == path)
        .unwrap()
        .status
}

#[tokio::test]
async fn classifies_every_entry() {
    let manifest = Manifest::from_json(MANIFEST).unwrap();
    let upstream = upstream();

    let entries = check_drift(&manifest, &upstream, Selection::All).await;
    assert_eq!(entries.len(), 4);

    assert!(matches!(status(&entries, "skills/current"), DriftStatus::UpToDate(_)));
    match status(&entries, "skills/moved") {
        DriftStatus::Drifted { recorded, current } => {
            assert_eq!(recorded.as_str(), "old");
            assert_eq!(current.as_str(), "new");
        }
        other => panic!("expected drift, got {other:?}"),
    }
    assert!(matches!(status(&entries, "skills/new"), DriftStatus::NeverSynced { .. }));
    assert!(matches!(status(&entries, "docs/gone"), DriftStatus::Failed(_)));

    let gone = entries.iter().find(|e| e.remote_path == "docs/gone").unwrap();
    assert_eq!(gone.kind, EntryKind::Reference);
    assert!(gone.is_failed());
    let fb = gone.feedback();
    assert!(fb.is_error());
    assert_eq!(fb.location.path, "docs/gone");
}

#[tokio::test]
async fn new_only_checks_unsynced_entries() {
    let manifest = Manifest::from_json(MANIFEST).unwrap();
    let upstream = upstream();

    let entries = check_drift(&manifest, &upstream, Selection::NewOnly).await;
    let paths: Vec<&str> = entries.iter().map(|e| e.remote_path.as_str()).collect();

    assert_eq!(paths.len(), 2);
    assert!(paths.contains(&"skills/new"));
    assert!(paths.contains(&"docs/gone"));
    assert_eq!(upstream.request_count(), 2);
}

#[tokio::test]
async fn drift_check_does_not_modify_manifest() {
    let manifest = Manifest::from_json(MANIFEST).unwrap();
    let before = manifest.clone();

    let entries = check_drift(&manifest, &upstream(), Selection::All).await;

    assert!(entries.iter().any(|e| e.needs_sync()));
    assert_eq!(manifest, before);
}
