//! Binding resolution: function identity and existing-subscription
//! lookup.

use tracing::debug;

use topiclink_core::{Binding, Result};

use crate::backend::{FUNCTION_PROTOCOL, MessagingBackend, SubscriptionSummary};
use crate::config::TraceConfig;

/// A binding with its identities resolved against the live backend.
pub(crate) struct ResolvedBinding {
    pub function_arn: String,
    pub topic_arn: String,
    /// The subscription already connecting the pair, if any. Absence is
    /// a normal outcome, not an error.
    pub existing: Option<SubscriptionSummary>,
}

/// Resolves the function's identity and locates any existing
/// subscription for the pair.
///
/// `Ok(None)` means the function does not exist; resolution
/// short-circuits without any further backend calls for this binding.
pub(crate) async fn resolve_deploy(
    backend: &dyn MessagingBackend,
    binding: &Binding,
    trace: TraceConfig,
) -> Result<Option<ResolvedBinding>> {
    let topic_arn = binding.topic_arn()?.to_string();

    let Some(function_arn) = backend.lookup_function(&binding.function).await? else {
        return Ok(None);
    };
    if trace.lookup {
        debug!(function = %binding.function, arn = %function_arn, "function lookup");
    }

    let existing = find_subscription(backend, &topic_arn, &function_arn, trace).await?;
    Ok(Some(ResolvedBinding {
        function_arn,
        topic_arn,
        existing,
    }))
}

/// Selects the subscription whose protocol is `lambda` and whose
/// endpoint equals the function ARN, out of everything subscribed to
/// the topic.
pub(crate) async fn find_subscription(
    backend: &dyn MessagingBackend,
    topic_arn: &str,
    function_arn: &str,
    trace: TraceConfig,
) -> Result<Option<SubscriptionSummary>> {
    let subscriptions = backend.list_subscriptions(topic_arn).await?;
    if trace.list {
        debug!(topic = %topic_arn, count = subscriptions.len(), ?subscriptions, "topic subscriptions");
    }
    Ok(subscriptions
        .into_iter()
        .find(|sub| sub.protocol == FUNCTION_PROTOCOL && sub.endpoint == function_arn))
}
