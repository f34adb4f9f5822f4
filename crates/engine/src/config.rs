//! Engine-wide configuration.
//!
//! Auction windows are configured once for the whole engine, not per
//! auction: every auction created gets `bidding_duration` seconds of
//! bidding followed by `reveal_duration` seconds of reveal.

use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Length of the bidding window in seconds
    pub bidding_duration: u64,
    /// Length of the reveal window in seconds
    pub reveal_duration: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bidding_duration: 3600, // 1 hour
            reveal_duration: 1800,  // 30 minutes
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.bidding_duration == 0 {
            return Err(ConfigValidationError::ZeroDuration("bidding_duration"));
        }
        if self.reveal_duration == 0 {
            return Err(ConfigValidationError::ZeroDuration("reveal_duration"));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("{0} cannot be zero")]
    ZeroDuration(&'static str),
}
