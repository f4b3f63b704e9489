//! Session types: lifecycle states, configuration and counters.

use crate::error::Result;
use crate::membership::ReconcileSummary;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle of a conference subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Constructed, no transport resource held.
    Idle,
    /// Subscribed; documents are applied.
    Active,
    /// Termination requested, waiting for the transport to confirm.
    Terminating,
    /// Finished. The session cannot be reused.
    Terminated,
}

/// Configuration for a subscription session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Event package named in the subscription.
    /// Default: "Conference"
    pub event_package: String,

    /// Requested subscription lifetime in seconds.
    /// Default: 600
    pub expiry_secs: u64,

    /// Header carrying the session token to the peer.
    /// Default: "Conf-id"
    pub correlation_header: String,

    /// Mark the transport subscription as internal.
    pub internal: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_package: "Conference".to_string(),
            expiry_secs: 600,
            correlation_header: "Conf-id".to_string(),
            internal: true,
        }
    }
}

impl SessionConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn expires(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

/// Result of handing one raw document to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Parsed and reconciled against the roster.
    Applied(ReconcileSummary),
    /// Parsed, but it described another conference.
    OutOfScope,
    /// Not processed because the session was not active.
    Ignored(SessionState),
}

/// Per-session counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub documents_applied: u64,
    pub documents_out_of_scope: u64,
    pub documents_ignored: u64,
    pub parse_failures: u64,
    pub participants_added: u64,
    pub participants_removed: u64,
    pub admin_updates: u64,
}

impl SessionStats {
    pub(crate) fn record(&mut self, summary: &ReconcileSummary) {
        self.documents_applied += 1;
        self.participants_added += summary.added as u64;
        self.participants_removed += summary.removed as u64;
        self.admin_updates += summary.admin_updates as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.event_package, "Conference");
        assert_eq!(config.expires(), Duration::from_secs(600));
        assert_eq!(config.correlation_header, "Conf-id");
        assert!(config.internal);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = SessionConfig::from_json(r#"{"expiry_secs": 3600}"#).unwrap();
        assert_eq!(config.expiry_secs, 3600);
        assert_eq!(config.event_package, "Conference");
    }

    #[test]
    fn test_config_from_bad_json() {
        let result = SessionConfig::from_json(r#"{"expiry_secs": "soon"}"#);
        assert!(matches!(result, Err(crate::EventError::Config(_))));
    }
}
