//! Action execution: the one backend mutation each classified action
//! implies, plus the invoke-grant side channel.

use tracing::{info, warn};

use topiclink_core::{Binding, DeployAction, RemoveAction, Result, arn};

use crate::backend::MessagingBackend;

/// Per-binding deploy result, fed to the state tracker once every
/// binding has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingOutcome {
    /// The binding converged; the subscription ARN belongs in the state
    /// record whether it was created, updated, or already in sync.
    Converged {
        function: String,
        subscription_arn: String,
    },
    /// The declared function does not exist; the binding contributes
    /// nothing to the state record.
    FunctionNotFound { function: String },
}

impl BindingOutcome {
    /// The resulting subscription ARN, or `None` when the function was
    /// not found.
    pub fn subscription_arn(&self) -> Option<&str> {
        match self {
            Self::Converged {
                subscription_arn, ..
            } => Some(subscription_arn),
            Self::FunctionNotFound { .. } => None,
        }
    }
}

/// Executes the classified deploy action for one binding.
pub async fn execute_deploy(
    backend: &dyn MessagingBackend,
    binding: &Binding,
    action: DeployAction,
) -> Result<BindingOutcome> {
    match action {
        DeployAction::FunctionNotFound => {
            warn!(function = %binding.function, "function does not exist, binding skipped");
            Ok(BindingOutcome::FunctionNotFound {
                function: binding.function.clone(),
            })
        }
        DeployAction::CreateSubscription {
            function_arn,
            topic_arn,
            filter_policy,
            grant_needed,
        } => {
            let subscription_arn = backend
                .create_subscription(&topic_arn, &function_arn, filter_policy.as_deref())
                .await?;
            info!(
                function = %binding.function,
                topic = %arn::topic_name(&topic_arn),
                subscription = %subscription_arn,
                "subscribed"
            );
            if grant_needed {
                grant(backend, &binding.function, &function_arn, &topic_arn).await?;
            }
            Ok(BindingOutcome::Converged {
                function: binding.function.clone(),
                subscription_arn,
            })
        }
        DeployAction::UpdateFilter {
            function_arn,
            topic_arn,
            subscription_arn,
            new_value,
            grant_needed,
        } => {
            backend
                .set_subscription_filter(&subscription_arn, &new_value)
                .await?;
            info!(
                function = %binding.function,
                topic = %arn::topic_name(&topic_arn),
                "subscription filter updated"
            );
            if grant_needed {
                grant(backend, &binding.function, &function_arn, &topic_arn).await?;
            }
            Ok(BindingOutcome::Converged {
                function: binding.function.clone(),
                subscription_arn,
            })
        }
        DeployAction::NoOp { subscription_arn } => {
            info!(function = %binding.function, "already in sync");
            Ok(BindingOutcome::Converged {
                function: binding.function.clone(),
                subscription_arn,
            })
        }
    }
}

/// Executes the classified removal action for one binding.
pub async fn execute_remove(
    backend: &dyn MessagingBackend,
    binding: &Binding,
    action: RemoveAction,
) -> Result<()> {
    match action {
        RemoveAction::DeleteSubscription { subscription_arn } => {
            backend.delete_subscription(&subscription_arn).await?;
            info!(
                function = %binding.function,
                subscription = %subscription_arn,
                "removed"
            );
        }
        RemoveAction::NoOp => {
            info!(function = %binding.function, "no subscription to remove");
        }
    }
    Ok(())
}

async fn grant(
    backend: &dyn MessagingBackend,
    function_name: &str,
    function_arn: &str,
    topic_arn: &str,
) -> Result<()> {
    let statement_id = arn::invoke_statement_id(function_name, topic_arn);
    backend
        .grant_invoke_permission(function_arn, topic_arn, &statement_id)
        .await?;
    info!(
        function = %function_name,
        topic = %arn::topic_name(topic_arn),
        statement = %statement_id,
        "invoke permission granted"
    );
    Ok(())
}
