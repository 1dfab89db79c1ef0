//! Per-application workloads.
//!
//! Each application gets an optional database credentials Secret, a Deployment, a
//! Service and an Ingress, all keyed by the label selector `{app: <app>-service}`.

use std::collections::BTreeMap;

use tracing::info;

use crate::core::compose::ingress_controller::IngressController;
use crate::core::constants::{
    APPLICATION_PORT, CONTAINER_PORT, DATABASE_PASSWORD_ENV_VAR, DATABASE_PASSWORD_KEY,
    HEALTH_CHECK_PATH, IDLE_TIMEOUT_SECONDS, LIVENESS_INITIAL_DELAY_SECONDS,
    LIVENESS_PERIOD_SECONDS, NO_DATABASE_PLACEHOLDER, PROFILE_ENV_VAR,
    READINESS_INITIAL_DELAY_SECONDS, READINESS_PERIOD_SECONDS, REPLICAS, SERVICE_PORT,
};
use crate::core::deferred::Deferred;
use crate::core::environment::Environment;
use crate::core::plan::{Component, Descriptor, Plan, Urn};
use crate::core::resource::k8s::{
    Container, ContainerPort, DeploymentSpec, EnvVar, HttpIngressPath, HttpIngressRuleValue,
    IngressRule, IngressSpec, LabelSelector, Labels, ObjectMeta, PodSpec, PodTemplateSpec,
    Probe, ServicePort, ServiceSpec,
};
use crate::core::resource::{Deployment, Ingress, Resource, ResourceKind, Secret, Service};
use crate::core::validation::{validate_application_name, validate_image};
use crate::error::Result;

/// Component type of an application.
pub const COMPONENT_TYPE: &str = "berth:infrastructure:Application";

/// Object names derived from an application name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationNames {
    pub deployment: String,
    pub service: String,
    pub ingress: String,
    pub secret: String,
}

impl ApplicationNames {
    pub fn new(application: &str) -> Self {
        Self {
            deployment: format!("{}-deployment", application),
            service: format!("{}-service", application),
            ingress: format!("{}-ingress", application),
            secret: format!("{}-db-credentials", application),
        }
    }
}

/// URNs of a composed application.
#[derive(Debug, Clone)]
pub struct ApplicationResources {
    pub component: Component,
    pub secret: Urn,
    pub deployment: Urn,
    pub service: Urn,
    pub ingress: Urn,
}

/// Compose one application.
///
/// The database secret exists only when `database_password` resolves to a value;
/// the deployment's `DB_PASSWORD` follows from that same deferred value.
///
/// # Errors
///
/// Returns `ComposeError::InvalidApplicationSpec` if the name is not a valid
/// Kubernetes name, before any descriptor is emitted.
pub fn compose_application(
    plan: &mut Plan,
    name: &str,
    environment: Environment,
    image: &Deferred<String>,
    database_password: &Deferred<Option<String>>,
    controller: &IngressController,
) -> Result<ApplicationResources> {
    validate_application_name(name)?;
    info!(application = name, environment = %environment, "composing application");

    let component = Component::new(COMPONENT_TYPE, name);
    let names = ApplicationNames::new(name);
    let labels = app_labels(&names.service);

    let secret_body = {
        let secret_name = names.secret.clone();
        database_password.map(move |password| {
            password.map(|password| Resource::Secret(database_secret(&secret_name, &password)))
        })
    };
    let secret_created = secret_body.map(|body| body.is_some()).into_public();
    let secret = plan.emit(
        Descriptor::optional(ResourceKind::Secret, &names.secret, secret_body)
            .with_parent(&component),
    )?;

    let env = {
        let secret_name = names.secret.clone();
        Deferred::all(vec![
            Deferred::known(EnvVar::literal(PROFILE_ENV_VAR, environment.as_str())),
            secret_created.map(move |created| database_password_env(created, &secret_name)),
        ])
    };
    let image = {
        let application = name.to_string();
        image.try_map(move |image| {
            validate_image(&application, &image)?;
            Ok(image)
        })
    };
    let deployment_body = {
        let (names, labels, container) = (names.clone(), labels.clone(), name.to_string());
        image.zip(&env).map(move |(image, env)| {
            Resource::Deployment(deployment(&names.deployment, &container, &labels, image, env))
        })
    };
    let deployment = plan.emit(
        Descriptor::new(ResourceKind::Deployment, &names.deployment, deployment_body)
            .with_parent(&component)
            .depends_on(&secret),
    )?;

    let service = plan.emit(
        Descriptor::new(
            ResourceKind::Service,
            &names.service,
            Deferred::known(Resource::Service(service(&names.service, &labels))),
        )
        .with_parent(&component),
    )?;

    let ingress = plan.emit(
        Descriptor::new(
            ResourceKind::Ingress,
            &names.ingress,
            Deferred::known(Resource::Ingress(ingress(&names.ingress, &names.service))),
        )
        .with_parent(&component)
        .depends_on(controller.release())
        .depends_on(&service),
    )?;

    Ok(ApplicationResources {
        component,
        secret,
        deployment,
        service,
        ingress,
    })
}

/// Selector shared by the deployment, its pods and the service.
pub fn app_labels(service_name: &str) -> Labels {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), service_name.to_string());
    labels
}

/// Secret holding the database password.
pub fn database_secret(name: &str, password: &str) -> Secret {
    Secret::new(name).with_data(DATABASE_PASSWORD_KEY, password)
}

/// `DB_PASSWORD`: a reference to the credentials secret, or a placeholder literal.
pub fn database_password_env(secret_created: bool, secret_name: &str) -> EnvVar {
    if secret_created {
        EnvVar::from_secret(DATABASE_PASSWORD_ENV_VAR, secret_name, DATABASE_PASSWORD_KEY)
    } else {
        EnvVar::literal(DATABASE_PASSWORD_ENV_VAR, NO_DATABASE_PLACEHOLDER)
    }
}

pub fn deployment(
    name: &str,
    container_name: &str,
    labels: &Labels,
    image: String,
    env: Vec<EnvVar>,
) -> Deployment {
    let container = Container {
        name: container_name.to_string(),
        image,
        ports: vec![ContainerPort {
            container_port: CONTAINER_PORT,
        }],
        env,
        liveness_probe: Some(Probe::http_get(
            HEALTH_CHECK_PATH,
            APPLICATION_PORT,
            LIVENESS_INITIAL_DELAY_SECONDS,
            LIVENESS_PERIOD_SECONDS,
        )),
        readiness_probe: Some(Probe::http_get(
            HEALTH_CHECK_PATH,
            APPLICATION_PORT,
            READINESS_INITIAL_DELAY_SECONDS,
            READINESS_PERIOD_SECONDS,
        )),
    };

    Deployment::new(
        name,
        DeploymentSpec {
            replicas: REPLICAS,
            selector: LabelSelector {
                match_labels: labels.clone(),
            },
            template: PodTemplateSpec {
                metadata: ObjectMeta::labelled(labels.clone()),
                spec: PodSpec {
                    containers: vec![container],
                },
            },
        },
    )
}

pub fn service(name: &str, labels: &Labels) -> Service {
    Service::new(
        name,
        ServiceSpec {
            selector: labels.clone(),
            ports: vec![ServicePort {
                port: SERVICE_PORT,
                target_port: APPLICATION_PORT,
                protocol: "TCP".to_string(),
            }],
        },
    )
}

/// Internet-facing ALB ingress routing `/` to the service.
pub fn ingress(name: &str, service_name: &str) -> Ingress {
    let metadata = ObjectMeta::named(name)
        .with_annotation("kubernetes.io/ingress.class", "alb")
        .with_annotation("alb.ingress.kubernetes.io/scheme", "internet-facing")
        .with_annotation("alb.ingress.kubernetes.io/target-type", "ip")
        .with_annotation(
            "alb.ingress.kubernetes.io/load-balancer-attributes",
            format!("idle_timeout.timeout_seconds={}", IDLE_TIMEOUT_SECONDS),
        )
        .with_annotation("alb.ingress.kubernetes.io/healthcheck-path", HEALTH_CHECK_PATH);

    Ingress::new(
        metadata,
        IngressSpec {
            rules: vec![IngressRule {
                http: HttpIngressRuleValue {
                    paths: vec![HttpIngressPath::prefix("/", service_name, SERVICE_PORT)],
                },
            }],
        },
    )
}
