//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object (or no config at all) gives
//! the standard behavior: cancelled instances omitted, cancelled series shown,
//! wall-clock DST handling.

use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::generator::DEFAULT_MAX_CANDIDATES;

/// What to do with an occurrence that has a `cancelled` exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledInstancePolicy {
    /// Drop the occurrence from the output.
    #[default]
    Omit,
    /// Emit it with `is_cancelled` and `is_exception` set, for audit and undo views.
    Retain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on candidates scanned for a single series per query.
    pub max_candidates: usize,
    pub cancelled_instances: CancelledInstancePolicy,
    /// Leave out every occurrence of a template whose status is cancelled.
    pub hide_cancelled_series: bool,
    pub dst_policy: DstPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            cancelled_instances: CancelledInstancePolicy::default(),
            hide_cancelled_series: false,
            dst_policy: DstPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
