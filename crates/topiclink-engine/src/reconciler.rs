//! Deploy/destroy orchestration over the declared binding set.

use std::sync::Arc;

use futures_util::future;
use tracing::info;

use topiclink_core::{Binding, Result};

use crate::backend::MessagingBackend;
use crate::classify;
use crate::config::ReconcilerConfig;
use crate::execute::{self, BindingOutcome};
use crate::state::{self, StateOutcome};

/// Result of a deploy run: one outcome per declared binding plus the
/// state record classification.
#[derive(Debug)]
pub struct DeploySummary {
    pub outcomes: Vec<BindingOutcome>,
    pub state: StateOutcome,
}

/// Orchestrates reconciliation runs against a backend.
///
/// Each run fans out over the declared bindings concurrently; bindings
/// operate on independent backend objects, so no ordering between them
/// is required. The only shared step is the state tracker, which runs
/// once after every binding has settled.
pub struct Reconciler {
    backend: Arc<dyn MessagingBackend>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Creates a reconciler over the given backend.
    pub fn new(backend: Arc<dyn MessagingBackend>, config: ReconcilerConfig) -> Self {
        Self { backend, config }
    }

    /// The configuration this reconciler runs under.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Converges the backend to the declared binding set, then settles
    /// the deployment state record.
    pub async fn deploy(&self, bindings: &[Binding]) -> Result<DeploySummary> {
        info!(
            service = %self.config.service,
            stage = %self.config.stage,
            count = bindings.len(),
            "reconciling declared bindings"
        );

        let results =
            future::join_all(bindings.iter().map(|binding| self.deploy_binding(binding))).await;

        // Barrier: every binding has settled before any state diff. The
        // tracker must never compute orphans from a partial outcome set,
        // and a failed sibling does not cancel in-flight work.
        let mut outcomes = Vec::with_capacity(results.len());
        for result in results {
            outcomes.push(result?);
        }

        let current: Vec<String> = outcomes
            .iter()
            .filter_map(|outcome| outcome.subscription_arn().map(str::to_string))
            .collect();
        let state = state::reconcile_state(
            self.backend.as_ref(),
            &self.config.state_bucket,
            &self.config.state_key(),
            &current,
        )
        .await?;

        Ok(DeploySummary { outcomes, state })
    }

    /// Explicit remove-all: unsubscribes every declared binding. No
    /// state diff is performed.
    pub async fn remove(&self, bindings: &[Binding]) -> Result<()> {
        info!(
            service = %self.config.service,
            stage = %self.config.stage,
            count = bindings.len(),
            "removing declared bindings"
        );

        let results =
            future::join_all(bindings.iter().map(|binding| self.remove_binding(binding))).await;
        for result in results {
            result?;
        }
        Ok(())
    }

    /// Deletes every subscription the state record names, then the
    /// record itself. Returns how many subscriptions were removed.
    pub async fn teardown(&self) -> Result<usize> {
        state::teardown_state(
            self.backend.as_ref(),
            &self.config.state_bucket,
            &self.config.state_key(),
        )
        .await
    }

    async fn deploy_binding(&self, binding: &Binding) -> Result<BindingOutcome> {
        let action =
            classify::classify_deploy(self.backend.as_ref(), binding, self.config.trace).await?;
        execute::execute_deploy(self.backend.as_ref(), binding, action).await
    }

    async fn remove_binding(&self, binding: &Binding) -> Result<()> {
        let action = classify::classify_remove(
            self.backend.as_ref(),
            binding,
            &self.config.region,
            &self.config.account_id,
            self.config.trace,
        )
        .await?;
        execute::execute_remove(self.backend.as_ref(), binding, action).await
    }
}
