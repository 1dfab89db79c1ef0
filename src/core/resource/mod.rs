//! Resource bodies.
//!
//! Each descriptor in a plan resolves to one [`Resource`]. Kubernetes bodies
//! serialize as plain manifests; AWS and Helm bodies serialize as the argument set
//! the reconciliation engine expects for their type token.

use std::fmt;

use serde::Serialize;

pub mod aws;
pub mod helm;
pub mod k8s;

pub use aws::{IamPolicy, IamRole, PolicyDocument, RolePolicyAttachment};
pub use helm::HelmRelease;
pub use k8s::{Deployment, Ingress, Secret, Service};

/// Placeholder shown instead of secret data.
pub const REDACTED: &str = "[secret]";

/// Kind of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Policy,
    Role,
    RolePolicyAttachment,
    HelmRelease,
    Secret,
    Deployment,
    Service,
    Ingress,
}

impl ResourceKind {
    /// Short slug used in URNs and manifest file names.
    pub fn slug(&self) -> &'static str {
        match self {
            ResourceKind::Policy => "policy",
            ResourceKind::Role => "role",
            ResourceKind::RolePolicyAttachment => "role-policy-attachment",
            ResourceKind::HelmRelease => "helm-release",
            ResourceKind::Secret => "secret",
            ResourceKind::Deployment => "deployment",
            ResourceKind::Service => "service",
            ResourceKind::Ingress => "ingress",
        }
    }

    /// Provider type token understood by the reconciliation engine.
    pub fn type_token(&self) -> &'static str {
        match self {
            ResourceKind::Policy => "aws:iam/policy:Policy",
            ResourceKind::Role => "aws:iam/role:Role",
            ResourceKind::RolePolicyAttachment => {
                "aws:iam/rolePolicyAttachment:RolePolicyAttachment"
            }
            ResourceKind::HelmRelease => "kubernetes:helm.sh/v3:Release",
            ResourceKind::Secret => "kubernetes:core/v1:Secret",
            ResourceKind::Deployment => "kubernetes:apps/v1:Deployment",
            ResourceKind::Service => "kubernetes:core/v1:Service",
            ResourceKind::Ingress => "kubernetes:networking.k8s.io/v1:Ingress",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Desired state of one resource.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Resource {
    Policy(IamPolicy),
    Role(IamRole),
    RolePolicyAttachment(RolePolicyAttachment),
    HelmRelease(HelmRelease),
    Secret(Secret),
    Deployment(Deployment),
    Service(Service),
    Ingress(Ingress),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Policy(_) => ResourceKind::Policy,
            Resource::Role(_) => ResourceKind::Role,
            Resource::RolePolicyAttachment(_) => ResourceKind::RolePolicyAttachment,
            Resource::HelmRelease(_) => ResourceKind::HelmRelease,
            Resource::Secret(_) => ResourceKind::Secret,
            Resource::Deployment(_) => ResourceKind::Deployment,
            Resource::Service(_) => ResourceKind::Service,
            Resource::Ingress(_) => ResourceKind::Ingress,
        }
    }

    /// Copy with secret data replaced by [`REDACTED`].
    pub fn redacted(&self) -> Resource {
        match self {
            Resource::Secret(secret) => {
                let mut secret = secret.clone();
                for value in secret.string_data.values_mut() {
                    *value = REDACTED.to_string();
                }
                Resource::Secret(secret)
            }
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let r = Resource::Secret(Secret::new("a"));
        assert_eq!(r.kind(), ResourceKind::Secret);
        assert_eq!(r.kind().type_token(), "kubernetes:core/v1:Secret");
    }

    #[test]
    fn test_redacted_hides_secret_data_only() {
        let r = Resource::Secret(Secret::new("a").with_data("password", "hunter2"));
        let json = serde_json::to_string(&r.redacted()).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains(REDACTED));

        let attachment = Resource::RolePolicyAttachment(RolePolicyAttachment {
            role: "r".into(),
            policy_arn: "arn".into(),
        });
        assert_eq!(attachment.redacted(), attachment);
    }

    #[test]
    fn test_untagged_serializes_body_only() {
        let r = Resource::Secret(Secret::new("a"));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["kind"], "Secret");
        assert_eq!(json["apiVersion"], "v1");
    }
}
