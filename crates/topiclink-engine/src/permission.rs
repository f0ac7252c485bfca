//! Permission audit: does the topic already hold a standing invoke
//! grant on the function?

use tracing::debug;

use topiclink_core::Result;

use crate::backend::MessagingBackend;
use crate::config::TraceConfig;

/// Service principal of the messaging backend.
pub const MESSAGING_PRINCIPAL: &str = "sns.amazonaws.com";

/// Checks whether the function's policy already grants the topic
/// permission to invoke it.
///
/// A function with no policy yet has no grant; that is an expected
/// absence, not an error. Any other policy-fetch failure is fatal for
/// the run.
pub(crate) async fn grant_needed(
    backend: &dyn MessagingBackend,
    function_arn: &str,
    topic_arn: &str,
    trace: TraceConfig,
) -> Result<bool> {
    let Some(statements) = backend.function_policy(function_arn).await? else {
        return Ok(true);
    };
    if trace.policy {
        debug!(function = %function_arn, count = statements.len(), ?statements, "function policy");
    }

    let granted = statements.iter().any(|st| {
        st.principal_service.as_deref() == Some(MESSAGING_PRINCIPAL)
            && st.resource.as_deref() == Some(function_arn)
            && st.source_arn.as_deref() == Some(topic_arn)
    });
    Ok(!granted)
}
