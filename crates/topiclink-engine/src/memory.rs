//! In-memory backend, the test double for the engine.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use topiclink_core::{EngineError, Result};

use crate::backend::{FUNCTION_PROTOCOL, MessagingBackend, PolicyStatement, SubscriptionSummary};
use crate::permission::MESSAGING_PRINCIPAL;

/// A recorded backend call, in invocation order. Reads are recorded
/// alongside mutations so tests can assert that short-circuit paths
/// issue no further calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    LookupFunction {
        name: String,
    },
    FunctionPolicy {
        function_arn: String,
    },
    ListSubscriptions {
        topic_arn: String,
    },
    SubscriptionFilter {
        subscription_arn: String,
    },
    CreateSubscription {
        topic_arn: String,
        function_arn: String,
        filter_policy: Option<String>,
    },
    SetSubscriptionFilter {
        subscription_arn: String,
        filter_policy: String,
    },
    DeleteSubscription {
        subscription_arn: String,
    },
    GrantInvokePermission {
        function_arn: String,
        topic_arn: String,
        statement_id: String,
    },
    ReadStateObject {
        bucket: String,
        key: String,
    },
    WriteStateObject {
        bucket: String,
        key: String,
        body: String,
    },
    DeleteStateObject {
        bucket: String,
        key: String,
    },
}

impl BackendCall {
    /// Returns `true` for calls that mutate backend state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateSubscription { .. }
                | Self::SetSubscriptionFilter { .. }
                | Self::DeleteSubscription { .. }
                | Self::GrantInvokePermission { .. }
                | Self::WriteStateObject { .. }
                | Self::DeleteStateObject { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct StoredSubscription {
    arn: String,
    topic_arn: String,
    protocol: String,
    endpoint: String,
    filter: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    functions: HashMap<String, String>,
    policies: HashMap<String, Vec<PolicyStatement>>,
    subscriptions: Vec<StoredSubscription>,
    objects: HashMap<(String, String), String>,
    calls: Vec<BackendCall>,
    fail_operations: HashSet<String>,
    subscription_counter: u64,
}

impl MemoryState {
    fn next_subscription_arn(&mut self, topic_arn: &str) -> String {
        self.subscription_counter += 1;
        format!("{topic_arn}:{:08}", self.subscription_counter)
    }
}

/// An in-memory [`MessagingBackend`].
///
/// Records every call so tests can assert on exactly what was issued,
/// and supports injecting a failure per logical operation. A repeated
/// grant under an existing statement ID succeeds, matching the
/// idempotence the engine relies on. Seeding methods do not appear in
/// the call log.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a function.
    pub fn add_function(&self, name: &str, arn: &str) {
        let mut state = self.state.lock().unwrap();
        state.functions.insert(name.to_string(), arn.to_string());
    }

    /// Seeds one statement of a function's resource policy.
    pub fn add_policy_statement(&self, function_arn: &str, statement: PolicyStatement) {
        let mut state = self.state.lock().unwrap();
        state
            .policies
            .entry(function_arn.to_string())
            .or_default()
            .push(statement);
    }

    /// Drops a function's policy, as if it had been detached out of
    /// band.
    pub fn clear_policy(&self, function_arn: &str) {
        let mut state = self.state.lock().unwrap();
        state.policies.remove(function_arn);
    }

    /// Seeds a live subscription and returns its ARN.
    pub fn add_subscription(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
        filter: &str,
    ) -> String {
        let mut state = self.state.lock().unwrap();
        let arn = state.next_subscription_arn(topic_arn);
        state.subscriptions.push(StoredSubscription {
            arn: arn.clone(),
            topic_arn: topic_arn.to_string(),
            protocol: protocol.to_string(),
            endpoint: endpoint.to_string(),
            filter: filter.to_string(),
        });
        arn
    }

    /// Deletes a subscription out of band, simulating drift.
    pub fn drop_subscription(&self, subscription_arn: &str) {
        let mut state = self.state.lock().unwrap();
        state.subscriptions.retain(|sub| sub.arn != subscription_arn);
    }

    /// Seeds a state object.
    pub fn put_state_object(&self, bucket: &str, key: &str, body: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), body.to_string());
    }

    /// Current body of a state object, if present.
    pub fn state_object(&self, bucket: &str, key: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// ARNs of the live subscriptions on a topic.
    pub fn subscription_arns(&self, topic_arn: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .subscriptions
            .iter()
            .filter(|sub| sub.topic_arn == topic_arn)
            .map(|sub| sub.arn.clone())
            .collect()
    }

    /// Live filter attribute of a subscription.
    pub fn filter_of(&self, subscription_arn: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .subscriptions
            .iter()
            .find(|sub| sub.arn == subscription_arn)
            .map(|sub| sub.filter.clone())
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Recorded mutating calls only.
    pub fn mutations(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(BackendCall::is_mutation)
            .collect()
    }

    /// Clears the call log, usually between two runs under test.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Makes the named logical operation fail until cleared.
    pub fn fail_operation(&self, operation: &str) {
        let mut state = self.state.lock().unwrap();
        state.fail_operations.insert(operation.to_string());
    }

    fn check_failure(&self, operation: &str, context: &str) -> Result<()> {
        let state = self.state.lock().unwrap();
        if state.fail_operations.contains(operation) {
            return Err(EngineError::backend(operation, context, "injected failure"));
        }
        Ok(())
    }

    fn record(&self, call: BackendCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl MessagingBackend for MemoryBackend {
    async fn lookup_function(&self, name: &str) -> Result<Option<String>> {
        self.check_failure("lookup_function", name)?;
        self.record(BackendCall::LookupFunction {
            name: name.to_string(),
        });
        let state = self.state.lock().unwrap();
        Ok(state.functions.get(name).cloned())
    }

    async fn function_policy(&self, function_arn: &str) -> Result<Option<Vec<PolicyStatement>>> {
        self.check_failure("function_policy", function_arn)?;
        self.record(BackendCall::FunctionPolicy {
            function_arn: function_arn.to_string(),
        });
        let state = self.state.lock().unwrap();
        Ok(state.policies.get(function_arn).cloned())
    }

    async fn grant_invoke_permission(
        &self,
        function_arn: &str,
        topic_arn: &str,
        statement_id: &str,
    ) -> Result<()> {
        self.check_failure("grant_invoke_permission", function_arn)?;
        self.record(BackendCall::GrantInvokePermission {
            function_arn: function_arn.to_string(),
            topic_arn: topic_arn.to_string(),
            statement_id: statement_id.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        let statements = state.policies.entry(function_arn.to_string()).or_default();
        // Re-granting under an existing statement ID succeeds without
        // duplicating the statement.
        if !statements
            .iter()
            .any(|st| st.source_arn.as_deref() == Some(topic_arn))
        {
            statements.push(PolicyStatement {
                principal_service: Some(MESSAGING_PRINCIPAL.to_string()),
                resource: Some(function_arn.to_string()),
                source_arn: Some(topic_arn.to_string()),
            });
        }
        Ok(())
    }

    async fn list_subscriptions(&self, topic_arn: &str) -> Result<Vec<SubscriptionSummary>> {
        self.check_failure("list_subscriptions", topic_arn)?;
        self.record(BackendCall::ListSubscriptions {
            topic_arn: topic_arn.to_string(),
        });
        let state = self.state.lock().unwrap();
        Ok(state
            .subscriptions
            .iter()
            .filter(|sub| sub.topic_arn == topic_arn)
            .map(|sub| SubscriptionSummary {
                arn: sub.arn.clone(),
                protocol: sub.protocol.clone(),
                endpoint: sub.endpoint.clone(),
            })
            .collect())
    }

    async fn subscription_filter(&self, subscription_arn: &str) -> Result<String> {
        self.check_failure("subscription_filter", subscription_arn)?;
        self.record(BackendCall::SubscriptionFilter {
            subscription_arn: subscription_arn.to_string(),
        });
        let state = self.state.lock().unwrap();
        state
            .subscriptions
            .iter()
            .find(|sub| sub.arn == subscription_arn)
            .map(|sub| sub.filter.clone())
            .ok_or_else(|| {
                EngineError::backend(
                    "subscription_filter",
                    subscription_arn,
                    "no such subscription",
                )
            })
    }

    async fn create_subscription(
        &self,
        topic_arn: &str,
        function_arn: &str,
        filter_policy: Option<&str>,
    ) -> Result<String> {
        self.check_failure("create_subscription", topic_arn)?;
        self.record(BackendCall::CreateSubscription {
            topic_arn: topic_arn.to_string(),
            function_arn: function_arn.to_string(),
            filter_policy: filter_policy.map(str::to_string),
        });
        let mut state = self.state.lock().unwrap();
        let arn = state.next_subscription_arn(topic_arn);
        state.subscriptions.push(StoredSubscription {
            arn: arn.clone(),
            topic_arn: topic_arn.to_string(),
            protocol: FUNCTION_PROTOCOL.to_string(),
            endpoint: function_arn.to_string(),
            filter: filter_policy.unwrap_or_default().to_string(),
        });
        Ok(arn)
    }

    async fn set_subscription_filter(
        &self,
        subscription_arn: &str,
        filter_policy: &str,
    ) -> Result<()> {
        self.check_failure("set_subscription_filter", subscription_arn)?;
        self.record(BackendCall::SetSubscriptionFilter {
            subscription_arn: subscription_arn.to_string(),
            filter_policy: filter_policy.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        match state
            .subscriptions
            .iter_mut()
            .find(|sub| sub.arn == subscription_arn)
        {
            Some(sub) => {
                sub.filter = filter_policy.to_string();
                Ok(())
            }
            None => Err(EngineError::backend(
                "set_subscription_filter",
                subscription_arn,
                "no such subscription",
            )),
        }
    }

    async fn delete_subscription(&self, subscription_arn: &str) -> Result<()> {
        self.check_failure("delete_subscription", subscription_arn)?;
        self.record(BackendCall::DeleteSubscription {
            subscription_arn: subscription_arn.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        state.subscriptions.retain(|sub| sub.arn != subscription_arn);
        Ok(())
    }

    async fn read_state_object(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        self.check_failure("read_state_object", key)?;
        self.record(BackendCall::ReadStateObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn write_state_object(&self, bucket: &str, key: &str, body: &str) -> Result<()> {
        self.check_failure("write_state_object", key)?;
        self.record(BackendCall::WriteStateObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: body.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), body.to_string());
        Ok(())
    }

    async fn delete_state_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.check_failure("delete_state_object", key)?;
        self.record(BackendCall::DeleteStateObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        state.objects.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
