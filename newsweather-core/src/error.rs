use chrono::{DateTime, Utc};

/// Category of a non-fatal failure reported to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Location permission denied or unavailable; the fallback context is used.
    Permission,
    /// A provider call failed; prior state is kept and a refresh may retry.
    Network,
    /// Coordinates are usable but their labels could not be resolved.
    Geocode,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Permission => "permission",
            FailureKind::Network => "network",
            FailureKind::Geocode => "geocode",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(kind, message)` failure report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), at: Utc::now() }
    }

    /// Wrap a provider error, keeping its whole context chain in the message.
    pub fn from_error(kind: FailureKind, err: &anyhow::Error) -> Self {
        Self::new(kind, format!("{err:#}"))
    }
}
