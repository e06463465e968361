use std::io::Write;

use anyhow::{Context, Result};
use skill_sync::Upstream;

use super::{RunStatus, print_feedback};
use crate::config::SyncConfig;

/// Sync the manifest's sources and print a per-entry summary.
///
/// Entry failures still persist the manifest but finish as
/// [`RunStatus::PartialFailure`]. The last line written to `out` always
/// says whether the manifest was updated.
pub async fn run(
    config: &SyncConfig,
    upstream: &dyn Upstream,
    out: &mut dyn Write,
) -> Result<RunStatus> {
    writeln!(out, "Syncing from {}...", config.manifest_path.display())?;

    let summary = skill_sync::run(
        &config.manifest_path,
        &config.root,
        upstream,
        config.selection,
    )
    .await
    .context("sync aborted, manifest not updated")?;

    if !summary.manifest_updated {
        writeln!(
            out,
            "Nothing to sync: every entry has been synced before. Manifest not updated."
        )?;
        return Ok(RunStatus::Clean);
    }

    let report = &summary.report;
    print_feedback(out, &report.feedback())?;

    if report.has_failures() {
        writeln!(
            out,
            "Manifest updated with {} entries ({} failed).",
            report.updated(),
            report.failed()
        )?;
        return Ok(RunStatus::PartialFailure);
    }

    writeln!(out, "Manifest updated with {} entries.", report.updated())?;
    Ok(RunStatus::Clean)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use skill_sync::Manifest;
    use skill_sync::test_support::InMemoryUpstream;

    use super::*;
    use crate::commands::last_line;

    const MANIFEST: &str = r#"{"sources":[{"repo":"org/repo","branch":"main","skills":[
        {"remotePath":"skills/foo","localPath":"skills/foo"},
        {"remotePath":"skills/ghost","localPath":"skills/ghost"}
    ]}]}"#;

    fn config_for(root: &Path, new_only: bool) -> SyncConfig {
        SyncConfig::resolve(None, root, new_only, |_| None)
    }

    fn upstream() -> InMemoryUpstream {
        InMemoryUpstream::new()
            .with_file("org/repo", "main", "skills/foo/SKILL.md", "# Foo")
            .with_revision("org/repo", "main", "skills/foo", "abc123")
    }

    #[tokio::test]
    async fn partial_failure_persists_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), false);
        std::fs::write(&config.manifest_path, MANIFEST).unwrap();

        let mut out = Vec::new();
        let status = run(&config, &upstream(), &mut out).await.unwrap();

        assert_eq!(status, RunStatus::PartialFailure);
        assert_eq!(last_line(&out), "Manifest updated with 1 entries (1 failed).");
        let manifest = Manifest::load(&config.manifest_path).unwrap();
        assert!(manifest.sources[0].skills[0].sync.is_synced());
        assert!(!manifest.sources[0].skills[1].sync.is_synced());
    }

    #[tokio::test]
    async fn new_only_twice_is_clean_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), true);
        std::fs::write(
            &config.manifest_path,
            r#"{"sources":[{"repo":"org/repo","branch":"main","skills":[
                {"remotePath":"skills/foo","localPath":"skills/foo"}
            ]}]}"#,
        )
        .unwrap();
        let upstream = upstream();

        let mut first = Vec::new();
        assert_eq!(run(&config, &upstream, &mut first).await.unwrap(), RunStatus::Clean);
        assert_eq!(last_line(&first), "Manifest updated with 1 entries.");
        let requests_after_first = upstream.request_count();
        assert!(requests_after_first > 0);

        let mut second = Vec::new();
        assert_eq!(run(&config, &upstream, &mut second).await.unwrap(), RunStatus::Clean);
        assert_eq!(upstream.request_count(), requests_after_first);
        assert!(last_line(&second).ends_with("Manifest not updated."));
    }

    #[tokio::test]
    async fn missing_manifest_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), false);

        let mut out = Vec::new();
        let err = run(&config, &upstream(), &mut out).await.unwrap_err();
        assert!(err.to_string().contains("manifest not updated"));
    }
}
