//! Message-attribute filter policies and the comparison that decides
//! whether a live subscription needs its filter attribute rewritten.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A filter policy document restricting which messages a subscription
/// receives.
///
/// Two policies describe the same filter iff their canonical serialized
/// forms are byte-identical; comparison never looks at structure. The
/// absence of a policy is distinct from the empty document `{}`: the
/// backend has no "unset" operation, so clearing a live filter writes
/// the empty document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterPolicy(Value);

impl FilterPolicy {
    /// Wraps a JSON document as a filter policy.
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// The empty document, written when an existing filter is cleared.
    pub fn empty() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }

    /// Canonical serialized form, the unit of equality.
    pub fn canonical(&self) -> String {
        self.0.to_string()
    }
}

/// Decides whether the live filter attribute must change to match the
/// desired policy.
///
/// Returns the new attribute value when an update is required:
/// the desired canonical form when one is declared, or the empty
/// document when the declaration dropped a filter that is still live.
/// `None` means the attribute is already in sync.
pub fn required_update(desired: Option<&FilterPolicy>, live: &str) -> Option<String> {
    match desired {
        Some(policy) => {
            let canonical = policy.canonical();
            if canonical == live { None } else { Some(canonical) }
        }
        None if live.is_empty() => None,
        None => Some(FilterPolicy::empty().canonical()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn both_absent_is_in_sync() {
        assert_eq!(required_update(None, ""), None);
    }

    #[test]
    fn equal_canonical_bytes_is_in_sync() {
        let desired = FilterPolicy::new(json!({"kind": ["created"]}));
        let live = desired.canonical();
        assert_eq!(required_update(Some(&desired), &live), None);
    }

    #[test]
    fn differing_bytes_require_the_desired_value() {
        let desired = FilterPolicy::new(json!({"kind": ["created"]}));
        assert_eq!(
            required_update(Some(&desired), r#"{"kind":["cancelled"]}"#),
            Some(desired.canonical())
        );
    }

    #[test]
    fn desired_against_unfiltered_subscription_requires_update() {
        let desired = FilterPolicy::new(json!({"kind": ["created"]}));
        assert_eq!(
            required_update(Some(&desired), ""),
            Some(desired.canonical())
        );
    }

    #[test]
    fn dropped_filter_is_cleared_with_the_empty_document() {
        assert_eq!(
            required_update(None, r#"{"a":1}"#),
            Some("{}".to_string())
        );
    }

    #[test]
    fn empty_document_is_not_absence() {
        // An explicitly declared `{}` against an unfiltered subscription
        // still writes the attribute.
        let desired = FilterPolicy::empty();
        assert_eq!(required_update(Some(&desired), ""), Some("{}".to_string()));
        assert_eq!(required_update(Some(&desired), "{}"), None);
    }
}
