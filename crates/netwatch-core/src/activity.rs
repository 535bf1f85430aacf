// ── Activity line ──
//
// The single user-visible status message: what the dashboard last did
// and whether it worked.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ActivityLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub level: ActivityLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Activity {
    pub fn new(level: ActivityLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Overall health, as of the last full refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SystemStatus {
    /// No refresh has completed yet.
    #[default]
    Starting,
    Operational,
    /// At least one part of the last refresh failed.
    Degraded(Vec<crate::FetchError>),
}

impl SystemStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Starting => "STARTING",
            Self::Operational => "OPERATIONAL",
            Self::Degraded(_) => "DEGRADED",
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}
