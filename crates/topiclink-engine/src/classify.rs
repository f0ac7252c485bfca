//! Action classification: one discrete action per binding, for deploy
//! and for removal.

use tracing::debug;

use topiclink_core::{Binding, DeployAction, RemoveAction, Result, arn, required_update};

use crate::backend::MessagingBackend;
use crate::config::TraceConfig;
use crate::permission;
use crate::resolve;

/// Classifies the deploy transition for one binding, in priority order:
/// function unresolved, no existing subscription, filter drift, in
/// sync.
pub async fn classify_deploy(
    backend: &dyn MessagingBackend,
    binding: &Binding,
    trace: TraceConfig,
) -> Result<DeployAction> {
    let Some(resolved) = resolve::resolve_deploy(backend, binding, trace).await? else {
        return Ok(DeployAction::FunctionNotFound);
    };

    let grant_needed =
        permission::grant_needed(backend, &resolved.function_arn, &resolved.topic_arn, trace)
            .await?;

    let Some(subscription) = resolved.existing else {
        return Ok(DeployAction::CreateSubscription {
            function_arn: resolved.function_arn,
            topic_arn: resolved.topic_arn,
            filter_policy: binding.filter_policy().map(|p| p.canonical()),
            grant_needed,
        });
    };

    let live = backend.subscription_filter(&subscription.arn).await?;
    if trace.subscription {
        debug!(subscription = %subscription.arn, filter = %live, "live filter attribute");
    }

    match required_update(binding.filter_policy(), &live) {
        Some(new_value) => Ok(DeployAction::UpdateFilter {
            function_arn: resolved.function_arn,
            topic_arn: resolved.topic_arn,
            subscription_arn: subscription.arn,
            new_value,
            grant_needed,
        }),
        None => Ok(DeployAction::NoOp {
            subscription_arn: subscription.arn,
        }),
    }
}

/// Classifies the removal transition for one binding.
///
/// No function lookup occurs: the function may already be gone, so its
/// identity is synthesized from the declared name, region, and account.
pub async fn classify_remove(
    backend: &dyn MessagingBackend,
    binding: &Binding,
    region: &str,
    account_id: &str,
    trace: TraceConfig,
) -> Result<RemoveAction> {
    let topic_arn = binding.topic_arn()?;
    let function_arn = arn::function_arn(region, account_id, &binding.function);

    match resolve::find_subscription(backend, topic_arn, &function_arn, trace).await? {
        Some(subscription) => Ok(RemoveAction::DeleteSubscription {
            subscription_arn: subscription.arn,
        }),
        None => Ok(RemoveAction::NoOp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use topiclink_core::{FilterPolicy, TopicTarget};

    use crate::backend::FUNCTION_PROTOCOL;
    use crate::memory::{BackendCall, MemoryBackend};

    const TOPIC: &str = "arn:aws:sns:eu-west-1:123456789012:orders";
    const FN_ARN: &str = "arn:aws:lambda:eu-west-1:123456789012:function:order-created";

    fn bare_binding() -> Binding {
        Binding::new("order-created", TopicTarget::Arn(TOPIC.into()))
    }

    fn filtered_binding(filter: serde_json::Value) -> Binding {
        Binding::new(
            "order-created",
            TopicTarget::Reference {
                arn: TOPIC.into(),
                filter_policy: Some(FilterPolicy::new(filter)),
            },
        )
    }

    #[tokio::test]
    async fn unresolved_function_short_circuits() {
        let backend = MemoryBackend::new();
        let action = classify_deploy(&backend, &bare_binding(), TraceConfig::default())
            .await
            .unwrap();
        assert_eq!(action, DeployAction::FunctionNotFound);
        // The short circuit must not touch the topic or the policy.
        assert_eq!(
            backend.calls(),
            vec![BackendCall::LookupFunction {
                name: "order-created".into()
            }]
        );
    }

    #[tokio::test]
    async fn missing_subscription_is_always_a_create() {
        let backend = MemoryBackend::new();
        backend.add_function("order-created", FN_ARN);
        let action = classify_deploy(
            &backend,
            &filtered_binding(json!({"kind": ["created"]})),
            TraceConfig::default(),
        )
        .await
        .unwrap();
        match action {
            DeployAction::CreateSubscription {
                filter_policy,
                grant_needed,
                ..
            } => {
                assert_eq!(filter_policy.as_deref(), Some(r#"{"kind":["created"]}"#));
                assert!(grant_needed);
            }
            other => panic!("expected CreateSubscription, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn matching_filter_is_a_noop() {
        let backend = MemoryBackend::new();
        backend.add_function("order-created", FN_ARN);
        let sub = backend.add_subscription(TOPIC, FUNCTION_PROTOCOL, FN_ARN, r#"{"kind":["created"]}"#);
        let action = classify_deploy(
            &backend,
            &filtered_binding(json!({"kind": ["created"]})),
            TraceConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(action, DeployAction::NoOp { subscription_arn: sub });
    }

    #[tokio::test]
    async fn dropped_filter_updates_to_the_empty_document() {
        let backend = MemoryBackend::new();
        backend.add_function("order-created", FN_ARN);
        let sub = backend.add_subscription(TOPIC, FUNCTION_PROTOCOL, FN_ARN, r#"{"a":1}"#);
        let action = classify_deploy(&backend, &bare_binding(), TraceConfig::default())
            .await
            .unwrap();
        match action {
            DeployAction::UpdateFilter {
                subscription_arn,
                new_value,
                ..
            } => {
                assert_eq!(subscription_arn, sub);
                assert_eq!(new_value, "{}");
            }
            other => panic!("expected UpdateFilter, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn foreign_protocol_subscriptions_are_ignored() {
        let backend = MemoryBackend::new();
        backend.add_function("order-created", FN_ARN);
        backend.add_subscription(TOPIC, "sqs", "arn:aws:sqs:eu-west-1:123456789012:q", "");
        let action = classify_deploy(&backend, &bare_binding(), TraceConfig::default())
            .await
            .unwrap();
        assert!(matches!(action, DeployAction::CreateSubscription { .. }));
    }

    #[tokio::test]
    async fn removal_synthesizes_the_function_identity() {
        let backend = MemoryBackend::new();
        let sub = backend.add_subscription(TOPIC, FUNCTION_PROTOCOL, FN_ARN, "");
        let action = classify_remove(
            &backend,
            &bare_binding(),
            "eu-west-1",
            "123456789012",
            TraceConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(action, RemoveAction::DeleteSubscription { subscription_arn: sub });
        // No lookup happened; the function was never seeded.
        assert!(
            !backend
                .calls()
                .iter()
                .any(|call| matches!(call, BackendCall::LookupFunction { .. }))
        );
    }

    #[tokio::test]
    async fn removal_without_a_subscription_is_a_noop() {
        let backend = MemoryBackend::new();
        let action = classify_remove(
            &backend,
            &bare_binding(),
            "eu-west-1",
            "123456789012",
            TraceConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(action, RemoveAction::NoOp);
    }
}
