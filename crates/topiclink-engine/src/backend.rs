//! The cloud-API boundary the engine reconciles against.

use async_trait::async_trait;

use topiclink_core::Result;

/// Subscription protocol for function endpoints; the only protocol this
/// engine manages.
pub const FUNCTION_PROTOCOL: &str = "lambda";

/// Summary of one live subscription as returned by a topic listing.
///
/// The filter attribute is not part of the listing; it is fetched
/// separately via [`MessagingBackend::subscription_filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSummary {
    /// Subscription ARN.
    pub arn: String,
    /// Delivery protocol, e.g. `lambda`.
    pub protocol: String,
    /// Delivery endpoint; for function subscriptions, the function ARN.
    pub endpoint: String,
}

/// One statement of a function's resource policy, reduced to the fields
/// the permission audit inspects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyStatement {
    /// The service principal the statement grants to.
    pub principal_service: Option<String>,
    /// The resource the statement applies to.
    pub resource: Option<String>,
    /// The source ARN condition restricting the grant.
    pub source_arn: Option<String>,
}

/// Backend operations the engine reconciles against.
///
/// Implementations must be thread-safe (`Send + Sync`). Expected
/// absences are encoded as `Ok(None)` (or an empty string for a missing
/// filter attribute); every `Err` is fatal for the run, since the
/// engine deliberately has no retry policy.
#[async_trait]
pub trait MessagingBackend: Send + Sync {
    /// Resolves a function name to its ARN, or `None` if the function
    /// does not exist.
    async fn lookup_function(&self, name: &str) -> Result<Option<String>>;

    /// Fetches the function's resource policy statements, or `None` if
    /// the function has no policy yet.
    async fn function_policy(&self, function_arn: &str) -> Result<Option<Vec<PolicyStatement>>>;

    /// Grants the topic permission to invoke the function under the
    /// given statement ID. Granting again under the same ID must
    /// succeed.
    async fn grant_invoke_permission(
        &self,
        function_arn: &str,
        topic_arn: &str,
        statement_id: &str,
    ) -> Result<()>;

    /// Lists every subscription on the topic, across all pages.
    async fn list_subscriptions(&self, topic_arn: &str) -> Result<Vec<SubscriptionSummary>>;

    /// The live filter attribute of a subscription; empty when none is
    /// attached.
    async fn subscription_filter(&self, subscription_arn: &str) -> Result<String>;

    /// Subscribes the function to the topic and returns the new
    /// subscription's ARN. When a filter is given it is attached
    /// atomically as a creation attribute, never as a follow-up update.
    async fn create_subscription(
        &self,
        topic_arn: &str,
        function_arn: &str,
        filter_policy: Option<&str>,
    ) -> Result<String>;

    /// Rewrites the filter attribute of an existing subscription. The
    /// empty document clears the filter.
    async fn set_subscription_filter(
        &self,
        subscription_arn: &str,
        filter_policy: &str,
    ) -> Result<()>;

    /// Unsubscribes by ARN.
    async fn delete_subscription(&self, subscription_arn: &str) -> Result<()>;

    /// Reads the durable state object, or `None` if it was never
    /// written.
    async fn read_state_object(&self, bucket: &str, key: &str) -> Result<Option<String>>;

    /// Writes the durable state object.
    async fn write_state_object(&self, bucket: &str, key: &str, body: &str) -> Result<()>;

    /// Deletes the durable state object.
    async fn delete_state_object(&self, bucket: &str, key: &str) -> Result<()>;
}
