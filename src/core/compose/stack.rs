//! Whole-stack composition: the shared controller, then every enabled application.

use tracing::info;

use crate::core::compose::application::compose_application;
use crate::core::compose::ingress_controller::compose_ingress_controller;
use crate::core::config::StackConfig;
use crate::core::constants::{
    CONTROLLER_PREFIX, DATABASE_PASSWORD_SUFFIX, OUTPUT_APPLICATION_PREFIX, OUTPUT_CLUSTER_NAME,
    OUTPUT_OIDC_ISSUER_URL,
};
use crate::core::deferred::Deferred;
use crate::core::plan::Plan;
use crate::core::validation::validate_tag;
use crate::error::Result;

/// Stack output naming an application's image repository.
pub fn image_output(application: &str) -> String {
    format!("{}{}", OUTPUT_APPLICATION_PREFIX, application)
}

/// Secret key holding an application's database password.
pub fn database_password_key(application: &str) -> String {
    format!("{}{}", application, DATABASE_PASSWORD_SUFFIX)
}

/// Compose the full stack described by `config`.
///
/// # Errors
///
/// Returns the first composition error: an invalid account id, application name or
/// tag, or `ComposeError::DuplicateDescriptor` when an application is listed twice.
pub fn compose_stack(config: &StackConfig) -> Result<Plan> {
    info!(
        environment = %config.environment,
        applications = config.applications.len(),
        "composing stack"
    );

    let mut plan = Plan::new();
    let controller = compose_ingress_controller(
        &mut plan,
        CONTROLLER_PREFIX,
        &config.account_id,
        &Deferred::stack_output(OUTPUT_CLUSTER_NAME),
        &Deferred::stack_output(OUTPUT_OIDC_ISSUER_URL),
    )?;

    for app in &config.applications {
        validate_tag(&app.name, &app.tag)?;
        let image = {
            let tag = app.tag.clone();
            Deferred::stack_output(image_output(&app.name))
                .map(move |repository| format!("{}:{}", repository, tag))
        };
        let password = Deferred::secret(database_password_key(&app.name));

        compose_application(
            &mut plan,
            &app.name,
            config.environment,
            &image,
            &password,
            &controller,
        )?;
    }

    info!(descriptors = plan.len(), "stack composed");
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::application::EnabledApplication;
    use crate::core::environment::Environment;
    use crate::core::resource::ResourceKind;
    use crate::core::stack::StackOutputs;
    use crate::error::{ComposeError, Error};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn config(applications: Vec<EnabledApplication>) -> StackConfig {
        StackConfig {
            path: PathBuf::from("berth.toml"),
            infra_stack: PathBuf::from("infra.json"),
            environment: Environment::Prod,
            account_id: "123456789012".to_string(),
            applications,
            secrets: BTreeMap::new(),
        }
    }

    fn outputs() -> StackOutputs {
        StackOutputs::default()
            .with_output("eksClusterName", json!("prod-eks"))
            .with_output(
                "eksClusterEndpointOidcIssuerUrl",
                json!("https://oidc.eks.eu-west-1.amazonaws.com/id/XYZ"),
            )
            .with_output("application:checkout", json!("ecr/checkout"))
            .with_output("application:catalog", json!("ecr/catalog"))
    }

    #[test]
    fn test_no_applications_composes_controller_only() {
        let plan = compose_stack(&config(vec![])).unwrap();
        let urns: Vec<_> = plan.descriptors().iter().map(|d| d.urn().to_string()).collect();
        assert_eq!(
            urns,
            vec![
                "policy/coreAlbIngressPolicy",
                "role/coreAlbIngressRole",
                "role-policy-attachment/coreRolePolicyAttachment",
                "helm-release/aws-load-balancer-controller",
            ]
        );
    }

    #[test]
    fn test_applications_in_configured_order() {
        let plan = compose_stack(&config(vec![
            EnabledApplication::new("checkout", "v1"),
            EnabledApplication::new("catalog", "v2"),
        ]))
        .unwrap();
        let resolved = plan
            .resolve(&outputs().with_secret("catalog-database-password", "pw"))
            .unwrap();

        let deployments: Vec<_> = resolved
            .of_kind(ResourceKind::Deployment)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(deployments, vec!["checkout-deployment", "catalog-deployment"]);

        let secrets: Vec<_> = resolved
            .of_kind(ResourceKind::Secret)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(secrets, vec!["catalog-db-credentials"]);
    }

    #[test]
    fn test_image_combines_output_and_tag() {
        let plan =
            compose_stack(&config(vec![EnabledApplication::new("checkout", "v1.2.0")])).unwrap();
        let resolved = plan.resolve(&outputs()).unwrap();
        let deployment = resolved.of_kind(ResourceKind::Deployment).next().unwrap();
        match &deployment.resource {
            crate::core::resource::Resource::Deployment(d) => {
                assert_eq!(d.container().unwrap().image, "ecr/checkout:v1.2.0");
            }
            other => panic!("expected deployment, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_application_rejected() {
        let err = compose_stack(&config(vec![
            EnabledApplication::new("checkout", "v1"),
            EnabledApplication::new("checkout", "v2"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Compose(ComposeError::DuplicateDescriptor(_))
        ));
    }

    #[test]
    fn test_blank_tag_rejected() {
        let err =
            compose_stack(&config(vec![EnabledApplication::new("checkout", " ")])).unwrap_err();
        assert!(matches!(
            err,
            Error::Compose(ComposeError::InvalidApplicationSpec { .. })
        ));
    }

    #[test]
    fn test_missing_image_output_names_deployment() {
        let plan = compose_stack(&config(vec![EnabledApplication::new("orders", "v1")])).unwrap();
        let err = plan.resolve(&outputs()).unwrap_err();
        assert!(matches!(
            err,
            Error::Descriptor { ref descriptor, .. } if descriptor == "deployment/orders-deployment"
        ));
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(image_output("checkout"), "application:checkout");
        assert_eq!(database_password_key("checkout"), "checkout-database-password");
    }
}
