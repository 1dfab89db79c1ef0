//! Shared ALB ingress controller.
//!
//! Composes the IAM policy, the IRSA role the controller assumes through the
//! cluster's OIDC provider, the attachment between them, and the controller's Helm
//! release. Every application Ingress depends on the release.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::info;

use crate::core::constants::{
    CONTROLLER_ACTIONS, CONTROLLER_CHART, CONTROLLER_CHART_REPO, CONTROLLER_CHART_VERSION,
    CONTROLLER_NAMESPACE, CONTROLLER_RELEASE, CONTROLLER_SERVICE_ACCOUNT, CONTROLLER_SUBJECT,
    HEALTH_CHECK_PATH,
};
use crate::core::deferred::Deferred;
use crate::core::plan::{Component, Descriptor, Plan, Urn};
use crate::core::resource::aws::{self, Actions, Effect, Principal, Statement};
use crate::core::resource::helm::RepositoryOpts;
use crate::core::resource::{
    HelmRelease, IamPolicy, IamRole, PolicyDocument, Resource, ResourceKind,
    RolePolicyAttachment,
};
use crate::core::validation::{strip_issuer_scheme, validate_account_id};
use crate::error::Result;

/// Component type of the shared controller.
pub const COMPONENT_TYPE: &str = "berth:infrastructure:AlbIngressController";

/// Handle to a composed controller. Application Ingresses depend on
/// [`IngressController::release`].
#[derive(Debug, Clone)]
pub struct IngressController {
    component: Component,
    policy: Urn,
    role: Urn,
    attachment: Urn,
    release: Urn,
    role_arn: String,
}

impl IngressController {
    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn policy(&self) -> &Urn {
        &self.policy
    }

    pub fn role(&self) -> &Urn {
        &self.role
    }

    pub fn attachment(&self) -> &Urn {
        &self.attachment
    }

    /// The controller's Helm release.
    pub fn release(&self) -> &Urn {
        &self.release
    }

    /// ARN of the role the controller's service account assumes.
    pub fn role_arn(&self) -> &str {
        &self.role_arn
    }
}

/// Compose the shared ingress controller.
///
/// The trust policy is derived from the deferred issuer URL; a malformed URL fails
/// resolution of the role descriptor with `ComposeError::MalformedIssuerUrl`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for a malformed account id, or a
/// `ComposeError` if a descriptor cannot be emitted.
pub fn compose_ingress_controller(
    plan: &mut Plan,
    prefix: &str,
    account_id: &str,
    cluster_name: &Deferred<String>,
    oidc_issuer_url: &Deferred<String>,
) -> Result<IngressController> {
    validate_account_id(account_id)?;
    info!(prefix, "composing ingress controller");

    let component = Component::new(COMPONENT_TYPE, prefix);
    let policy_name = format!("{}AlbIngressPolicy", prefix);
    let role_name = format!("{}AlbIngressRole", prefix);
    let attachment_name = format!("{}RolePolicyAttachment", prefix);
    let role_arn = aws::role_arn(account_id, &role_name);

    let policy = plan.emit(
        Descriptor::new(
            ResourceKind::Policy,
            &policy_name,
            Deferred::known(Resource::Policy(controller_policy(&policy_name))),
        )
        .with_parent(&component),
    )?;

    let role_body = {
        let account_id = account_id.to_string();
        let role_name = role_name.clone();
        oidc_issuer_url.try_map(move |url| {
            let issuer = strip_issuer_scheme(&url)?;
            Ok(Resource::Role(IamRole {
                name: role_name.clone(),
                assume_role_policy: trust_policy(&account_id, issuer),
            }))
        })
    };
    let role = plan.emit(
        Descriptor::new(ResourceKind::Role, &role_name, role_body).with_parent(&component),
    )?;

    let attachment = plan.emit(
        Descriptor::new(
            ResourceKind::RolePolicyAttachment,
            &attachment_name,
            Deferred::known(Resource::RolePolicyAttachment(RolePolicyAttachment {
                role: role_name.clone(),
                policy_arn: aws::policy_arn(account_id, &policy_name),
            })),
        )
        .with_parent(&component)
        .depends_on(&role)
        .depends_on(&policy),
    )?;

    let release_body = {
        let role_arn = role_arn.clone();
        cluster_name.map(move |cluster| {
            Resource::HelmRelease(controller_release(&cluster, &role_arn))
        })
    };
    let release = plan.emit(
        Descriptor::new(ResourceKind::HelmRelease, CONTROLLER_RELEASE, release_body)
            .with_parent(&component)
            .depends_on(&attachment),
    )?;

    Ok(IngressController {
        component,
        policy,
        role,
        attachment,
        release,
        role_arn,
    })
}

/// Policy granting the controller its static allow-list.
pub fn controller_policy(name: &str) -> IamPolicy {
    IamPolicy {
        name: name.to_string(),
        policy: PolicyDocument::new(vec![Statement {
            effect: Effect::Allow,
            principal: None,
            action: Actions::Many(CONTROLLER_ACTIONS.iter().map(|a| a.to_string()).collect()),
            resource: Some("*".to_string()),
            condition: BTreeMap::new(),
        }]),
    }
}

/// Trust policy letting the controller's service account assume the role.
///
/// `issuer` is the issuer URL without its scheme; it is used both in the federated
/// principal and as the condition key prefix.
pub fn trust_policy(account_id: &str, issuer: &str) -> PolicyDocument {
    let mut string_equals = BTreeMap::new();
    string_equals.insert(format!("{}:sub", issuer), CONTROLLER_SUBJECT.to_string());

    let mut condition = BTreeMap::new();
    condition.insert("StringEquals".to_string(), string_equals);

    PolicyDocument::new(vec![Statement {
        effect: Effect::Allow,
        principal: Some(Principal {
            federated: aws::oidc_provider_arn(account_id, issuer),
        }),
        action: Actions::One("sts:AssumeRoleWithWebIdentity".to_string()),
        resource: None,
        condition,
    }])
}

/// Helm release of the controller chart.
pub fn controller_release(cluster_name: &str, role_arn: &str) -> HelmRelease {
    HelmRelease {
        name: CONTROLLER_RELEASE.to_string(),
        chart: CONTROLLER_CHART.to_string(),
        version: CONTROLLER_CHART_VERSION.to_string(),
        namespace: CONTROLLER_NAMESPACE.to_string(),
        repository_opts: RepositoryOpts {
            repo: CONTROLLER_CHART_REPO.to_string(),
        },
        values: json!({
            "clusterName": cluster_name,
            "serviceAccount": {
                "create": true,
                "name": CONTROLLER_SERVICE_ACCOUNT,
                "annotations": {
                    "eks.amazonaws.com/role-arn": role_arn,
                    "alb.ingress.kubernetes.io/healthcheck-path": HEALTH_CHECK_PATH,
                    "alb.ingress.kubernetes.io/success-codes": "200",
                },
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stack::StackOutputs;
    use crate::error::{ComposeError, ConfigError, Error};

    const ACCOUNT: &str = "123456789012";

    fn compose(plan: &mut Plan) -> IngressController {
        compose_ingress_controller(
            plan,
            "core",
            ACCOUNT,
            &Deferred::stack_output("eksClusterName"),
            &Deferred::stack_output("eksClusterEndpointOidcIssuerUrl"),
        )
        .unwrap()
    }

    fn outputs(issuer: &str) -> StackOutputs {
        StackOutputs::default()
            .with_output("eksClusterName", json!("prod-eks"))
            .with_output("eksClusterEndpointOidcIssuerUrl", json!(issuer))
    }

    #[test]
    fn test_emits_four_descriptors_in_dependency_order() {
        let mut plan = Plan::new();
        let controller = compose(&mut plan);

        let urns: Vec<&str> = plan.descriptors().iter().map(|d| d.urn().as_str()).collect();
        assert_eq!(
            urns,
            vec![
                "policy/coreAlbIngressPolicy",
                "role/coreAlbIngressRole",
                "role-policy-attachment/coreRolePolicyAttachment",
                "helm-release/aws-load-balancer-controller",
            ]
        );
        assert_eq!(controller.release().as_str(), "helm-release/aws-load-balancer-controller");
        assert_eq!(
            controller.role_arn(),
            "arn:aws:iam::123456789012:role/coreAlbIngressRole"
        );
        for d in plan.descriptors() {
            assert_eq!(
                d.parent(),
                Some("berth:infrastructure:AlbIngressController/core")
            );
        }
    }

    #[test]
    fn test_trust_policy_strips_scheme_in_both_positions() {
        let mut plan = Plan::new();
        let controller = compose(&mut plan);
        let resolved = plan
            .resolve(&outputs("https://issuer.example.com/id/ABC"))
            .unwrap();

        let role = match &resolved.get(controller.role()).unwrap().resource {
            Resource::Role(role) => role.clone(),
            other => panic!("expected role, got {:?}", other),
        };
        let statement = &role.assume_role_policy.statement[0];
        assert_eq!(
            statement.principal.as_ref().unwrap().federated,
            "arn:aws:iam::123456789012:oidc-provider/issuer.example.com/id/ABC"
        );
        assert_eq!(
            statement.condition["StringEquals"]["issuer.example.com/id/ABC:sub"],
            "system:serviceaccount:kube-system:aws-load-balancer-controller"
        );
        assert_eq!(
            statement.action,
            Actions::One("sts:AssumeRoleWithWebIdentity".to_string())
        );
    }

    #[test]
    fn test_malformed_issuer_fails_role_resolution() {
        let mut plan = Plan::new();
        compose(&mut plan);

        let err = plan.resolve(&outputs("issuer.example.com/id/ABC")).unwrap_err();
        match err {
            Error::Descriptor { descriptor, source } => {
                assert_eq!(descriptor, "role/coreAlbIngressRole");
                assert!(matches!(
                    *source,
                    Error::Compose(ComposeError::MalformedIssuerUrl { .. })
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_placeholder_account_id() {
        let mut plan = Plan::new();
        let err = compose_ingress_controller(
            &mut plan,
            "core",
            "<account-id>",
            &Deferred::known("c".to_string()),
            &Deferred::known("https://i".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_attachment_links_role_and_policy() {
        let mut plan = Plan::new();
        let controller = compose(&mut plan);
        let resolved = plan.resolve(&outputs("https://i.example.com/id/1")).unwrap();

        let attachment = resolved.get(controller.attachment()).unwrap();
        assert_eq!(
            attachment.depends_on,
            vec![controller.role().clone(), controller.policy().clone()]
        );
        match &attachment.resource {
            Resource::RolePolicyAttachment(a) => {
                assert_eq!(a.role, "coreAlbIngressRole");
                assert_eq!(
                    a.policy_arn,
                    "arn:aws:iam::123456789012:policy/coreAlbIngressPolicy"
                );
            }
            other => panic!("expected attachment, got {:?}", other),
        }
    }

    #[test]
    fn test_release_values() {
        let mut plan = Plan::new();
        let controller = compose(&mut plan);
        let resolved = plan.resolve(&outputs("https://i.example.com/id/1")).unwrap();

        let release = resolved.get(controller.release()).unwrap();
        assert_eq!(release.depends_on, vec![controller.attachment().clone()]);
        let release = match &release.resource {
            Resource::HelmRelease(r) => r,
            other => panic!("expected release, got {:?}", other),
        };
        assert_eq!(release.chart, "aws-load-balancer-controller");
        assert_eq!(release.version, "1.4.0");
        assert_eq!(release.namespace, "kube-system");
        assert_eq!(release.repository_opts.repo, "https://aws.github.io/eks-charts");
        assert_eq!(release.values["clusterName"], "prod-eks");
        let annotations = &release.values["serviceAccount"]["annotations"];
        assert_eq!(
            annotations["eks.amazonaws.com/role-arn"],
            "arn:aws:iam::123456789012:role/coreAlbIngressRole"
        );
        assert_eq!(
            annotations["alb.ingress.kubernetes.io/healthcheck-path"],
            "/actuator/health"
        );
        assert_eq!(annotations["alb.ingress.kubernetes.io/success-codes"], "200");
        assert_eq!(release.values["serviceAccount"]["create"], true);
    }

    #[test]
    fn test_controller_policy_is_static_allow_list() {
        let policy = controller_policy("p");
        let statement = &policy.policy.statement[0];
        assert_eq!(statement.effect, Effect::Allow);
        assert_eq!(statement.resource.as_deref(), Some("*"));
        match &statement.action {
            Actions::Many(actions) => {
                assert_eq!(actions.len(), CONTROLLER_ACTIONS.len());
                assert!(actions.iter().any(|a| a == "elasticloadbalancing:CreateLoadBalancer"));
                assert!(actions.iter().any(|a| a == "wafv2:GetWebACLForResource"));
            }
            other => panic!("expected action list, got {:?}", other),
        }
    }
}
