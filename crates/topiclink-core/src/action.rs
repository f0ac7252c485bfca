//! Classified actions, one per binding per run.

/// The single transition a deploy must apply for one binding, in
/// classification priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployAction {
    /// No subscription connects the pair yet. The filter, when
    /// declared, is attached atomically as a creation attribute.
    CreateSubscription {
        function_arn: String,
        topic_arn: String,
        /// Canonical filter document to attach at creation.
        filter_policy: Option<String>,
        /// Whether the invoke grant must be (re)issued.
        grant_needed: bool,
    },
    /// The pair is connected but the live filter attribute differs.
    UpdateFilter {
        function_arn: String,
        topic_arn: String,
        subscription_arn: String,
        /// New attribute value; the empty document clears the filter.
        new_value: String,
        grant_needed: bool,
    },
    /// Already converged.
    NoOp { subscription_arn: String },
    /// The declared function does not exist in the backend.
    FunctionNotFound,
}

/// The single transition a removal must apply for one binding.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveAction {
    /// Unsubscribe the existing subscription.
    DeleteSubscription { subscription_arn: String },
    /// No subscription connects the pair; nothing to remove.
    NoOp,
}
