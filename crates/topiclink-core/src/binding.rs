//! Declared bindings between subscriber functions and topics.

use serde::Deserialize;

use crate::error::{EngineError, Result};
use crate::filter::FilterPolicy;

/// A declared pairing of one subscriber function and one topic,
/// immutable for the run.
#[derive(Debug, Clone, Deserialize)]
pub struct Binding {
    /// Declared name of the subscriber function.
    pub function: String,
    /// The topic the function subscribes to.
    pub topic: TopicTarget,
}

/// The topic side of a binding: either a literal topic ARN or a
/// structured reference carrying a filter policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TopicTarget {
    /// A bare topic ARN.
    Arn(String),
    /// A reference with an optional message-attribute filter.
    Reference {
        /// Topic ARN.
        arn: String,
        /// Filter restricting which messages the subscription receives.
        #[serde(default)]
        filter_policy: Option<FilterPolicy>,
    },
}

impl Binding {
    /// Creates a binding for the given function and topic.
    pub fn new(function: impl Into<String>, topic: TopicTarget) -> Self {
        Self {
            function: function.into(),
            topic,
        }
    }

    /// The declared topic ARN.
    ///
    /// A reference without an ARN cannot be classified; that is a
    /// configuration error, reported before any backend call.
    pub fn topic_arn(&self) -> Result<&str> {
        let arn = match &self.topic {
            TopicTarget::Arn(arn) => arn,
            TopicTarget::Reference { arn, .. } => arn,
        };
        if arn.is_empty() {
            return Err(EngineError::configuration(format!(
                "binding '{}' declares no topic ARN",
                self.function
            )));
        }
        Ok(arn)
    }

    /// The declared filter policy, if any.
    pub fn filter_policy(&self) -> Option<&FilterPolicy> {
        match &self.topic {
            TopicTarget::Arn(_) => None,
            TopicTarget::Reference { filter_policy, .. } => filter_policy.as_ref(),
        }
    }
}
