//! Configuration types for the grove storage engine.
//!
//! The engine carries no process-wide mutable state: tunables are held in a
//! [`TreeConfig`] threaded from the tree down through nodes into slices, so
//! each tree (and each test) can carry its own values.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};

/// Default gap-bridging ceiling, in points.
///
/// A write whose distance past the end of a slice exceeds this many points
/// starts a new slice instead of padding the hole with gap markers.
pub const DEFAULT_MAX_SLICE_GAP: u64 = 80;

/// Default seconds-per-point resolution for newly created nodes whose
/// caller-supplied metadata omits `timeStep`.
pub const DEFAULT_TIME_STEP: i64 = 60;

/// Engine tunables for one tree.
///
/// # Example
///
/// ```rust
/// use grove::TreeConfig;
///
/// let config = TreeConfig {
///     max_slice_gap: 10,
///     ..TreeConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum number of gap points a slice write may bridge before the
    /// node is forced to start a new slice.
    pub max_slice_gap: u64,

    /// Resolution assigned at node creation when the caller's metadata
    /// does not specify `timeStep`, in seconds per point.
    pub default_time_step: i64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_slice_gap: DEFAULT_MAX_SLICE_GAP,
            default_time_step: DEFAULT_TIME_STEP,
        }
    }
}

impl TreeConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidConfig`] if `default_time_step` is not
    /// positive.
    pub fn validate(&self) -> Result<()> {
        if self.default_time_step <= 0 {
            return Err(TreeError::InvalidConfig {
                reason: format!(
                    "default_time_step must be positive, got {}",
                    self.default_time_step
                ),
            }
            .into());
        }

        Ok(())
    }
}
