use crate::manifest::RepositoryId;

/// The remote path a line of feedback is about: `owner/name@branch:path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub repo: RepositoryId,
    pub branch: String,
    pub path: String,
}

impl Location {
    pub fn new(repo: &RepositoryId, branch: &str, path: &str) -> Self {
        Self {
            repo: repo.clone(),
            branch: branch.to_owned(),
            path: path.to_owned(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.repo, self.branch, self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Synced, recorded, or up to date.
    Info,
    /// Drifted or never synced; nothing failed.
    Warning,
    /// The entry could not be resolved, fetched, or written.
    Error,
}

/// A user-facing line about one manifest entry, produced by a sync or
/// drift run.
///
/// Library code returns these instead of printing, so the CLI decides how
/// they are presented. Live progress goes through `tracing` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub severity: Severity,
    pub location: Location,
    pub message: String,
}

impl Feedback {
    pub fn info(location: Location, message: impl Into<String>) -> Self {
        Self::with(Severity::Info, location, message)
    }

    pub fn warning(location: Location, message: impl Into<String>) -> Self {
        Self::with(Severity::Warning, location, message)
    }

    pub fn error(location: Location, message: impl Into<String>) -> Self {
        Self::with(Severity::Error, location, message)
    }

    fn with(severity: Severity, location: Location, message: impl Into<String>) -> Self {
        Self {
            severity,
            location,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Lines that belong on stderr.
    pub fn needs_attention(&self) -> bool {
        self.severity != Severity::Info
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Info => {}
            Severity::Warning => write!(f, "warning: ")?,
            Severity::Error => write!(f, "error: ")?,
        }
        write!(f, "{}: {}", self.location, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Location {
        Location::new(&"org/repo".parse().unwrap(), "main", "skills/foo")
    }

    #[test]
    fn display_leads_with_location() {
        assert_eq!(
            Feedback::info(here(), "synced at abc123d (1 files)").to_string(),
            "org/repo@main:skills/foo: synced at abc123d (1 files)"
        );
        assert_eq!(
            Feedback::error(here(), "HTTP 404").to_string(),
            "error: org/repo@main:skills/foo: HTTP 404"
        );
    }

    #[test]
    fn warnings_and_errors_need_attention() {
        assert!(Feedback::warning(here(), "drifted").needs_attention());
        assert!(Feedback::error(here(), "boom").needs_attention());
        assert!(!Feedback::info(here(), "ok").needs_attention());
        assert!(!Feedback::warning(here(), "drifted").is_error());
    }
}
