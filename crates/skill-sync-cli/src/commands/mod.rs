pub mod check;
pub mod sync;

use std::io::Write;
use std::process::ExitCode;

use skill_sync::Feedback;

/// How a command finished when it did not hit a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Clean,
    PartialFailure,
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Clean => ExitCode::SUCCESS,
            RunStatus::PartialFailure => ExitCode::FAILURE,
        }
    }
}

/// Write info lines to `out`, warnings and errors to stderr.
pub fn print_feedback(out: &mut dyn Write, feedback: &[Feedback]) -> std::io::Result<()> {
    for item in feedback {
        if item.needs_attention() {
            eprintln!("{item}");
        } else {
            writeln!(out, "{item}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn last_line(out: &[u8]) -> String {
    String::from_utf8_lossy(out)
        .lines()
        .last()
        .unwrap_or_default()
        .to_owned()
}
