//! Durable deployment-state tracking and drift cleanup.
//!
//! The record is one text object per (service, stage, region): the
//! subscription ARNs of the last successful deploy joined by a fixed
//! separator. No escaping is performed; backend-issued ARNs never
//! contain the separator. The record has a single writer by operational
//! convention; concurrent runs against the same triple are unsupported.

use std::collections::HashSet;

use tracing::info;

use topiclink_core::Result;

use crate::backend::MessagingBackend;

/// Separator between subscription ARNs in the record body.
pub const STATE_SEPARATOR: &str = "__";

/// Identifies the state record of one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateKey {
    pub service: String,
    pub stage: String,
    pub region: String,
}

impl StateKey {
    /// Object key of the record within the state bucket.
    pub fn object_key(&self) -> String {
        format!(
            "{}-{}-{}-topiclink-state.txt",
            self.stage, self.service, self.region
        )
    }
}

/// Whether the record needed writing after a deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOutcome {
    /// No record existed; one was created.
    New,
    /// Record matches the deployment; nothing written.
    Sync,
    /// Record diverged; orphans were removed and the record rewritten.
    Update,
}

pub(crate) fn encode_record(arns: &[String]) -> String {
    arns.join(STATE_SEPARATOR)
}

pub(crate) fn decode_record(body: &str) -> Vec<String> {
    body.split(STATE_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Diffs the settled outcome set against the previous record, deletes
/// orphaned subscriptions, and writes the record when it changed.
///
/// Must only run after every binding has settled: an orphan computed
/// against a partial outcome set could delete a subscription a
/// still-inflight binding owns.
pub(crate) async fn reconcile_state(
    backend: &dyn MessagingBackend,
    bucket: &str,
    key: &StateKey,
    current: &[String],
) -> Result<StateOutcome> {
    let object_key = key.object_key();

    let previous = match backend.read_state_object(bucket, &object_key).await? {
        Some(body) => decode_record(&body),
        None => {
            backend
                .write_state_object(bucket, &object_key, &encode_record(current))
                .await?;
            info!(key = %object_key, "state record created");
            return Ok(StateOutcome::New);
        }
    };

    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let orphans: Vec<&String> = previous
        .iter()
        .filter(|prev| !current_set.contains(prev.as_str()))
        .collect();
    for orphan in &orphans {
        backend.delete_subscription(orphan).await?;
        info!(subscription = %orphan, "obsolete subscription removed");
    }

    let previous_set: HashSet<&str> = previous.iter().map(String::as_str).collect();
    if orphans.is_empty() && previous_set == current_set {
        info!(key = %object_key, "state record in sync");
        return Ok(StateOutcome::Sync);
    }

    backend
        .write_state_object(bucket, &object_key, &encode_record(current))
        .await?;
    info!(key = %object_key, "state record updated");
    Ok(StateOutcome::Update)
}

/// Deletes every subscription the record names, then the record itself.
///
/// A record that never existed is already clean; teardown proceeds
/// without error.
pub(crate) async fn teardown_state(
    backend: &dyn MessagingBackend,
    bucket: &str,
    key: &StateKey,
) -> Result<usize> {
    let object_key = key.object_key();

    let Some(body) = backend.read_state_object(bucket, &object_key).await? else {
        info!(key = %object_key, "no state record, nothing to tear down");
        return Ok(0);
    };

    let arns = decode_record(&body);
    for arn in &arns {
        backend.delete_subscription(arn).await?;
        info!(subscription = %arn, "removed");
    }
    backend.delete_state_object(bucket, &object_key).await?;
    info!(key = %object_key, count = arns.len(), "state record deleted");
    Ok(arns.len())
}
