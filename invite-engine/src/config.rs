/// Configuration management for the invite engine
///
/// Loads configuration from environment variables.
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Invite fan-out settings
    pub invite: InviteConfig,
    /// Aggregation settings
    pub aggregation: AggregationConfig,
}

/// Invite fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteConfig {
    /// Upper bound on invitees per event
    #[serde(default = "default_max_invitees")]
    pub max_invitees: usize,
}

/// Aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Per-participant fetch timeout in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

// Default values
fn default_max_invitees() -> usize {
    10
}

fn default_fetch_timeout_ms() -> u64 {
    5_000
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let invite = InviteConfig {
            max_invitees: std::env::var("INVITE_MAX_INVITEES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_invitees),
        };

        let aggregation = AggregationConfig {
            fetch_timeout_ms: std::env::var("AGGREGATION_FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_fetch_timeout_ms),
        };

        Ok(EngineConfig {
            invite,
            aggregation,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            invite: InviteConfig {
                max_invitees: default_max_invitees(),
            },
            aggregation: AggregationConfig {
                fetch_timeout_ms: default_fetch_timeout_ms(),
            },
        }
    }
}
