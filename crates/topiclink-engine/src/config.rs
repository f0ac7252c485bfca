//! Engine configuration.

use serde::Deserialize;

use crate::state::StateKey;

/// Per-call trace switches.
///
/// Each flag independently enables verbose logging of the corresponding
/// backend call's response at `debug` level.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Log function lookup results.
    pub lookup: bool,
    /// Log fetched policy statements.
    pub policy: bool,
    /// Log fetched subscription filter attributes.
    pub subscription: bool,
    /// Log topic subscription listings.
    pub list: bool,
}

/// Configuration for a [`Reconciler`](crate::Reconciler), fixed for the
/// run.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Service name; part of the state record key.
    pub service: String,
    /// Deployment stage; part of the state record key.
    pub stage: String,
    /// Region the functions and topics live in.
    pub region: String,
    /// Account the functions live in; used to synthesize function ARNs
    /// on the removal path, where no lookup is attempted.
    pub account_id: String,
    /// Bucket holding the deployment state record.
    pub state_bucket: String,
    /// Trace switches.
    pub trace: TraceConfig,
}

impl ReconcilerConfig {
    /// The state record key for this (service, stage, region) triple.
    pub fn state_key(&self) -> StateKey {
        StateKey {
            service: self.service.clone(),
            stage: self.stage.clone(),
            region: self.region.clone(),
        }
    }
}
