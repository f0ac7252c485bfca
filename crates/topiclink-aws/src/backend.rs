//! [`MessagingBackend`] over SNS, Lambda, and S3.

use async_trait::async_trait;
use aws_sdk_lambda::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use serde_json::Value;
use tracing::debug;

use topiclink_core::{EngineError, Result};
use topiclink_engine::{
    FUNCTION_PROTOCOL, MESSAGING_PRINCIPAL, MessagingBackend, PolicyStatement,
    SubscriptionSummary,
};

use crate::clients::AwsClients;

const FILTER_POLICY_ATTRIBUTE: &str = "FilterPolicy";
const FILTER_POLICY_SCOPE_ATTRIBUTE: &str = "FilterPolicyScope";
const FILTER_POLICY_SCOPE: &str = "MessageAttributes";
const INVOKE_ACTION: &str = "lambda:InvokeFunction";

/// Production backend talking to AWS.
#[derive(Debug, Clone)]
pub struct AwsBackend {
    clients: AwsClients,
}

impl AwsBackend {
    /// Creates a backend over the given clients.
    pub fn new(clients: AwsClients) -> Self {
        Self { clients }
    }
}

fn fatal<E: std::error::Error>(
    operation: &'static str,
    context: impl Into<String>,
    err: E,
) -> EngineError {
    EngineError::backend(operation, context, DisplayErrorContext(err).to_string())
}

/// Reduces a policy document to the fields the permission audit
/// inspects. Statements missing a field simply never match.
fn parse_policy(policy: &str) -> Result<Vec<PolicyStatement>> {
    let document: Value = serde_json::from_str(policy)?;
    let statements = document
        .get("Statement")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    Ok(statements
        .iter()
        .map(|statement| PolicyStatement {
            principal_service: statement
                .pointer("/Principal/Service")
                .and_then(Value::as_str)
                .map(str::to_string),
            resource: statement
                .get("Resource")
                .and_then(Value::as_str)
                .map(str::to_string),
            source_arn: statement
                .pointer("/Condition/ArnLike/AWS:SourceArn")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
        .collect())
}

#[async_trait]
impl MessagingBackend for AwsBackend {
    async fn lookup_function(&self, name: &str) -> Result<Option<String>> {
        match self
            .clients
            .lambda
            .get_function()
            .function_name(name)
            .send()
            .await
        {
            Ok(output) => {
                let arn = output
                    .configuration()
                    .and_then(|config| config.function_arn())
                    .map(str::to_string);
                arn.map(Some).ok_or_else(|| {
                    EngineError::backend("get_function", name, "response carried no function ARN")
                })
            }
            Err(SdkError::ServiceError(err)) if err.err().is_resource_not_found_exception() => {
                Ok(None)
            }
            Err(err) => Err(fatal("get_function", name, err)),
        }
    }

    async fn function_policy(&self, function_arn: &str) -> Result<Option<Vec<PolicyStatement>>> {
        match self
            .clients
            .lambda
            .get_policy()
            .function_name(function_arn)
            .send()
            .await
        {
            Ok(output) => {
                let statements = parse_policy(output.policy().unwrap_or("{}"))?;
                Ok(Some(statements))
            }
            // A fresh function has no policy at all; that is the
            // no-grant-exists branch, not an error.
            Err(SdkError::ServiceError(err)) if err.err().is_resource_not_found_exception() => {
                Ok(None)
            }
            Err(err) => Err(fatal("get_policy", function_arn, err)),
        }
    }

    async fn grant_invoke_permission(
        &self,
        function_arn: &str,
        topic_arn: &str,
        statement_id: &str,
    ) -> Result<()> {
        match self
            .clients
            .lambda
            .add_permission()
            .function_name(function_arn)
            .statement_id(statement_id)
            .action(INVOKE_ACTION)
            .principal(MESSAGING_PRINCIPAL)
            .source_arn(topic_arn)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            // The statement ID is deterministic, so a conflict means the
            // grant is already in place.
            Err(SdkError::ServiceError(err)) if err.err().is_resource_conflict_exception() => {
                debug!(statement = %statement_id, "grant already present");
                Ok(())
            }
            Err(err) => Err(fatal(
                "add_permission",
                format!("{function_arn} <- {topic_arn}"),
                err,
            )),
        }
    }

    async fn list_subscriptions(&self, topic_arn: &str) -> Result<Vec<SubscriptionSummary>> {
        let mut summaries = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = self
                .clients
                .sns
                .list_subscriptions_by_topic()
                .topic_arn(topic_arn);
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }
            let output = request
                .send()
                .await
                .map_err(|err| fatal("list_subscriptions_by_topic", topic_arn, err))?;

            summaries.extend(output.subscriptions().iter().map(|sub| SubscriptionSummary {
                arn: sub.subscription_arn().unwrap_or_default().to_string(),
                protocol: sub.protocol().unwrap_or_default().to_string(),
                endpoint: sub.endpoint().unwrap_or_default().to_string(),
            }));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(summaries)
    }

    async fn subscription_filter(&self, subscription_arn: &str) -> Result<String> {
        let output = self
            .clients
            .sns
            .get_subscription_attributes()
            .subscription_arn(subscription_arn)
            .send()
            .await
            .map_err(|err| fatal("get_subscription_attributes", subscription_arn, err))?;
        Ok(output
            .attributes()
            .and_then(|attributes| attributes.get(FILTER_POLICY_ATTRIBUTE))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_subscription(
        &self,
        topic_arn: &str,
        function_arn: &str,
        filter_policy: Option<&str>,
    ) -> Result<String> {
        let mut request = self
            .clients
            .sns
            .subscribe()
            .topic_arn(topic_arn)
            .protocol(FUNCTION_PROTOCOL)
            .endpoint(function_arn)
            .return_subscription_arn(true);
        // The filter rides along as a creation attribute so the
        // subscription never exists unfiltered.
        if let Some(filter) = filter_policy {
            request = request
                .attributes(FILTER_POLICY_ATTRIBUTE, filter)
                .attributes(FILTER_POLICY_SCOPE_ATTRIBUTE, FILTER_POLICY_SCOPE);
        }
        let context = format!("{topic_arn} -> {function_arn}");
        let output = request
            .send()
            .await
            .map_err(|err| fatal("subscribe", context.clone(), err))?;
        output
            .subscription_arn()
            .map(str::to_string)
            .ok_or_else(|| {
                EngineError::backend("subscribe", context, "response carried no subscription ARN")
            })
    }

    async fn set_subscription_filter(
        &self,
        subscription_arn: &str,
        filter_policy: &str,
    ) -> Result<()> {
        self.clients
            .sns
            .set_subscription_attributes()
            .subscription_arn(subscription_arn)
            .attribute_name(FILTER_POLICY_ATTRIBUTE)
            .attribute_value(filter_policy)
            .send()
            .await
            .map_err(|err| fatal("set_subscription_attributes", subscription_arn, err))?;
        Ok(())
    }

    async fn delete_subscription(&self, subscription_arn: &str) -> Result<()> {
        self.clients
            .sns
            .unsubscribe()
            .subscription_arn(subscription_arn)
            .send()
            .await
            .map_err(|err| fatal("unsubscribe", subscription_arn, err))?;
        Ok(())
    }

    async fn read_state_object(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        let context = format!("s3://{bucket}/{key}");
        match self
            .clients
            .s3
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|err| fatal("get_object", context, err))?
                    .into_bytes();
                Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Err(SdkError::ServiceError(err)) if err.err().is_no_such_key() => Ok(None),
            Err(err) => Err(fatal("get_object", context, err)),
        }
    }

    async fn write_state_object(&self, bucket: &str, key: &str, body: &str) -> Result<()> {
        self.clients
            .s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body.as_bytes().to_vec()))
            .send()
            .await
            .map_err(|err| fatal("put_object", format!("s3://{bucket}/{key}"), err))?;
        Ok(())
    }

    async fn delete_state_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.clients
            .s3
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| fatal("delete_object", format!("s3://{bucket}/{key}"), err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_statements_reduce_to_the_audited_fields() {
        let policy = r#"{
            "Version": "2012-10-17",
            "Id": "default",
            "Statement": [{
                "Sid": "order-created-invoke-from-orders",
                "Effect": "Allow",
                "Principal": {"Service": "sns.amazonaws.com"},
                "Action": "lambda:InvokeFunction",
                "Resource": "arn:aws:lambda:eu-west-1:123456789012:function:order-created",
                "Condition": {"ArnLike": {"AWS:SourceArn": "arn:aws:sns:eu-west-1:123456789012:orders"}}
            }]
        }"#;
        let statements = parse_policy(policy).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].principal_service.as_deref(),
            Some("sns.amazonaws.com")
        );
        assert_eq!(
            statements[0].resource.as_deref(),
            Some("arn:aws:lambda:eu-west-1:123456789012:function:order-created")
        );
        assert_eq!(
            statements[0].source_arn.as_deref(),
            Some("arn:aws:sns:eu-west-1:123456789012:orders")
        );
    }

    #[test]
    fn statements_missing_fields_are_kept_but_never_match() {
        let policy = r#"{"Statement": [{"Sid": "other", "Principal": "*"}]}"#;
        let statements = parse_policy(policy).unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].principal_service.is_none());
        assert!(statements[0].source_arn.is_none());
    }

    #[test]
    fn an_empty_policy_document_has_no_statements() {
        assert!(parse_policy("{}").unwrap().is_empty());
    }

    #[test]
    fn malformed_policy_json_is_an_error() {
        assert!(parse_policy("not json").is_err());
    }
}
