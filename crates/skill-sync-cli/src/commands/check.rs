use std::io::Write;

use anyhow::{Context, Result};
use skill_sync::{DriftEntry, Manifest, Upstream, check_drift};

use super::{RunStatus, print_feedback};
use crate::config::SyncConfig;

/// Compare recorded revisions with upstream without fetching or writing.
pub async fn run(
    config: &SyncConfig,
    upstream: &dyn Upstream,
    out: &mut dyn Write,
) -> Result<RunStatus> {
    let manifest = Manifest::load(&config.manifest_path).context("cannot check drift")?;

    let entries = check_drift(&manifest, upstream, config.selection).await;
    let feedback: Vec<_> = entries.iter().map(DriftEntry::feedback).collect();
    print_feedback(out, &feedback)?;

    let needs_sync = entries.iter().filter(|e| e.needs_sync()).count();
    let failed = entries.iter().filter(|e| e.is_failed()).count();

    writeln!(
        out,
        "Checked {} of {} entries: {needs_sync} need sync, {failed} failed. Manifest not updated.",
        entries.len(),
        manifest.entry_count()
    )?;

    if failed > 0 {
        Ok(RunStatus::PartialFailure)
    } else {
        Ok(RunStatus::Clean)
    }
}
