//! Configuration options which can alter the behavior of the pool.

use std::time::Duration;

/// How long a server is excluded from selection after it fails.
pub const DEFAULT_PENALTY: Duration = Duration::from_secs(60);

/// Policy which is applicable to a server pool.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Policy {
    /// The time a server is skipped after a failed connection attempt, or
    /// after a caller reports a failure on one of its connections.
    pub penalty: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_PENALTY,
        }
    }
}
