//! Common types shared across modules

use serde::{Deserialize, Serialize};

// ============================================================================
// Backoff
// ============================================================================

/// Delay growth between HTTP retries
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Tenant failure handling
// ============================================================================

/// What a report run does when one tenant fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole run on the first failing tenant
    #[default]
    Abort,
    /// Log the failure, leave the tenant out, and keep going
    Skip,
}

impl FailurePolicy {
    /// Build from the `--skip-failed-tenants` flag
    pub fn from_skip_flag(skip: bool) -> Self {
        if skip {
            Self::Skip
        } else {
            Self::Abort
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(BackoffType::default(), BackoffType::Exponential);
        assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
    }

    #[test]
    fn test_failure_policy_from_flag() {
        assert_eq!(FailurePolicy::from_skip_flag(true), FailurePolicy::Skip);
        assert_eq!(FailurePolicy::from_skip_flag(false), FailurePolicy::Abort);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&FailurePolicy::Skip).unwrap();
        assert_eq!(json, "\"skip\"");
        let parsed: BackoffType = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(parsed, BackoffType::Linear);
    }
}
