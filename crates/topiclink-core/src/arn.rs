//! ARN helpers: name extraction, identity synthesis, and the
//! deterministic statement ID for invoke grants.

/// Extracts the topic name, the final `:` segment of a topic ARN.
pub fn topic_name(topic_arn: &str) -> &str {
    topic_arn.rsplit(':').next().unwrap_or(topic_arn)
}

/// Synthesizes the ARN a function has in the given account and region.
///
/// Used on the removal path, where the function may already be gone and
/// its identity must be derived rather than looked up.
pub fn function_arn(region: &str, account_id: &str, function_name: &str) -> String {
    format!("arn:aws:lambda:{region}:{account_id}:function:{function_name}")
}

/// Statement ID for the grant letting a topic invoke a function.
///
/// Derived from the declared names so it is stable across runs; a
/// repeated grant for the same pair reuses the same ID instead of
/// accumulating duplicate statements.
pub fn invoke_statement_id(function_name: &str, topic_arn: &str) -> String {
    format!("{function_name}-invoke-from-{}", topic_name(topic_arn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_name_is_the_last_arn_segment() {
        assert_eq!(
            topic_name("arn:aws:sns:eu-west-1:123456789012:orders"),
            "orders"
        );
    }

    #[test]
    fn topic_name_of_a_bare_name_is_itself() {
        assert_eq!(topic_name("orders"), "orders");
    }

    #[test]
    fn function_arn_synthesis() {
        assert_eq!(
            function_arn("eu-west-1", "123456789012", "order-created"),
            "arn:aws:lambda:eu-west-1:123456789012:function:order-created"
        );
    }

    #[test]
    fn statement_id_is_deterministic() {
        let topic = "arn:aws:sns:eu-west-1:123456789012:orders";
        let first = invoke_statement_id("order-created", topic);
        let second = invoke_statement_id("order-created", topic);
        assert_eq!(first, second);
        assert_eq!(first, "order-created-invoke-from-orders");
    }
}
