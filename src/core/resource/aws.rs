//! AWS IAM resource types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::constants::POLICY_VERSION;

/// ARN of a customer-managed IAM policy.
pub fn policy_arn(account_id: &str, name: &str) -> String {
    format!("arn:aws:iam::{}:policy/{}", account_id, name)
}

/// ARN of an IAM role.
pub fn role_arn(account_id: &str, name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", account_id, name)
}

/// ARN of the IAM OIDC identity provider for an issuer (scheme already stripped).
pub fn oidc_provider_arn(account_id: &str, issuer: &str) -> String {
    format!("arn:aws:iam::{}:oidc-provider/{}", account_id, issuer)
}

/// IAM policy document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }
}

/// Single policy statement.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: Actions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Operator -> (condition key -> value)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub condition: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

/// A single action or a list of actions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Actions {
    One(String),
    Many(Vec<String>),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub federated: String,
}

/// Customer-managed IAM policy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IamPolicy {
    pub name: String,
    pub policy: PolicyDocument,
}

/// IAM role.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IamRole {
    pub name: String,
    pub assume_role_policy: PolicyDocument,
}

/// Attaches a managed policy to a role.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RolePolicyAttachment {
    pub role: String,
    pub policy_arn: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arns() {
        assert_eq!(
            policy_arn("123456789012", "coreAlbIngressPolicy"),
            "arn:aws:iam::123456789012:policy/coreAlbIngressPolicy"
        );
        assert_eq!(
            role_arn("123456789012", "coreAlbIngressRole"),
            "arn:aws:iam::123456789012:role/coreAlbIngressRole"
        );
        assert_eq!(
            oidc_provider_arn("123456789012", "oidc.eks.aws/id/X"),
            "arn:aws:iam::123456789012:oidc-provider/oidc.eks.aws/id/X"
        );
    }

    #[test]
    fn test_policy_document_uses_iam_field_names() {
        let doc = PolicyDocument::new(vec![Statement {
            effect: Effect::Allow,
            principal: None,
            action: Actions::Many(vec!["s3:PutObject".into()]),
            resource: Some("*".into()),
            condition: BTreeMap::new(),
        }]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["Version"], "2012-10-17");
        assert_eq!(json["Statement"][0]["Effect"], "Allow");
        assert_eq!(json["Statement"][0]["Action"][0], "s3:PutObject");
        assert!(json["Statement"][0].get("Condition").is_none());
        assert!(json["Statement"][0].get("Principal").is_none());
    }
}
