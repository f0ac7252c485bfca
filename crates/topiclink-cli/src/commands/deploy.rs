use anyhow::Result;

use topiclink_engine::{BindingOutcome, StateOutcome};

use crate::manifest::Manifest;
use crate::output;

pub async fn run(manifest: &Manifest, endpoint: Option<&str>) -> Result<()> {
    let reconciler = super::make_reconciler(manifest, endpoint).await;
    let summary = reconciler.deploy(&manifest.bindings).await?;

    for outcome in &summary.outcomes {
        if let BindingOutcome::FunctionNotFound { function } = outcome {
            output::print_warning(&format!(
                "function '{function}' does not exist; binding skipped"
            ));
        }
    }

    let converged = summary
        .outcomes
        .iter()
        .filter(|outcome| outcome.subscription_arn().is_some())
        .count();
    output::print_success(&format!(
        "{converged} binding(s) converged, state record {}",
        describe(summary.state)
    ));
    Ok(())
}

fn describe(state: StateOutcome) -> &'static str {
    match state {
        StateOutcome::New => "created",
        StateOutcome::Sync => "already in sync",
        StateOutcome::Update => "updated",
    }
}
