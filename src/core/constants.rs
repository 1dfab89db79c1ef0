//! Constants used throughout berth.
//!
//! Centralizes magic strings and the fixed shape of every composed resource.

/// Default configuration file name (berth.toml).
pub const CONFIG_FILE: &str = "berth.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_ENV: &str = "BERTH_CONFIG";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "BERTH_LOG";

/// Prefix of environment variables that override `[secrets]` entries.
///
/// `checkout-database-password` is overridden by `BERTH_SECRET_CHECKOUT_DATABASE_PASSWORD`.
pub const SECRET_ENV_PREFIX: &str = "BERTH_SECRET_";

// --- Stack outputs ---

/// Infra stack output holding the EKS cluster name.
pub const OUTPUT_CLUSTER_NAME: &str = "eksClusterName";

/// Infra stack output holding the cluster's OIDC issuer URL.
pub const OUTPUT_OIDC_ISSUER_URL: &str = "eksClusterEndpointOidcIssuerUrl";

/// Prefix of infra stack outputs holding per-application image repositories.
pub const OUTPUT_APPLICATION_PREFIX: &str = "application:";

/// Suffix of the per-application database password secret key.
pub const DATABASE_PASSWORD_SUFFIX: &str = "-database-password";

// --- Shared ingress controller ---

/// Name prefix of the shared ingress controller component.
pub const CONTROLLER_PREFIX: &str = "core";

/// Scheme every OIDC issuer URL must carry.
pub const ISSUER_SCHEME: &str = "https://";

/// Service account the load balancer controller runs as.
pub const CONTROLLER_SERVICE_ACCOUNT: &str = "aws-load-balancer-controller";

/// Trust policy subject: the controller's service account in kube-system.
pub const CONTROLLER_SUBJECT: &str =
    "system:serviceaccount:kube-system:aws-load-balancer-controller";

pub const CONTROLLER_RELEASE: &str = "aws-load-balancer-controller";
pub const CONTROLLER_CHART: &str = "aws-load-balancer-controller";
pub const CONTROLLER_CHART_REPO: &str = "https://aws.github.io/eks-charts";
pub const CONTROLLER_CHART_VERSION: &str = "1.4.0";
pub const CONTROLLER_NAMESPACE: &str = "kube-system";

/// IAM policy document version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Actions granted to the load balancer controller.
///
/// A static allow-list; nothing here is scoped per cluster.
pub const CONTROLLER_ACTIONS: &[&str] = &[
    "acm:DescribeCertificate",
    "acm:ListCertificates",
    "acm:GetCertificate",
    "ec2:AuthorizeSecurityGroupIngress",
    "ec2:CreateSecurityGroup",
    "ec2:CreateTags",
    "ec2:DeleteTags",
    "ec2:DeleteSecurityGroup",
    "ec2:DescribeAccountAttributes",
    "ec2:DescribeAddresses",
    "ec2:DescribeAvailabilityZones",
    "ec2:DescribeInstances",
    "ec2:DescribeInstanceStatus",
    "ec2:DescribeInternetGateways",
    "ec2:DescribeNetworkInterfaces",
    "ec2:DescribeSecurityGroups",
    "ec2:DescribeSubnets",
    "ec2:DescribeTags",
    "ec2:DescribeVpcs",
    "ec2:ModifyInstanceAttribute",
    "ec2:ModifyNetworkInterfaceAttribute",
    "ec2:RevokeSecurityGroupIngress",
    "elasticloadbalancing:AddListenerCertificates",
    "elasticloadbalancing:AddTags",
    "elasticloadbalancing:CreateListener",
    "elasticloadbalancing:CreateLoadBalancer",
    "elasticloadbalancing:CreateRule",
    "elasticloadbalancing:CreateTargetGroup",
    "elasticloadbalancing:DeleteListener",
    "elasticloadbalancing:DeleteLoadBalancer",
    "elasticloadbalancing:DeleteRule",
    "elasticloadbalancing:DeleteTargetGroup",
    "elasticloadbalancing:DeregisterTargets",
    "elasticloadbalancing:DescribeListenerCertificates",
    "elasticloadbalancing:DescribeListeners",
    "elasticloadbalancing:DescribeLoadBalancers",
    "elasticloadbalancing:DescribeLoadBalancerAttributes",
    "elasticloadbalancing:DescribeRules",
    "elasticloadbalancing:DescribeSSLPolicies",
    "elasticloadbalancing:DescribeTags",
    "elasticloadbalancing:DescribeTargetGroups",
    "elasticloadbalancing:DescribeTargetGroupAttributes",
    "elasticloadbalancing:DescribeTargetHealth",
    "elasticloadbalancing:ModifyListener",
    "elasticloadbalancing:ModifyLoadBalancerAttributes",
    "elasticloadbalancing:ModifyRule",
    "elasticloadbalancing:ModifyTargetGroup",
    "elasticloadbalancing:ModifyTargetGroupAttributes",
    "elasticloadbalancing:RegisterTargets",
    "elasticloadbalancing:RemoveListenerCertificates",
    "elasticloadbalancing:RemoveTags",
    "elasticloadbalancing:SetIpAddressType",
    "elasticloadbalancing:SetSecurityGroups",
    "elasticloadbalancing:SetSubnets",
    "elasticloadbalancing:SetWebACL",
    "wafv2:GetWebACLForResource",
    "waf-regional:GetWebACLForResource",
    "s3:PutObject",
    "s3:GetBucketAcl",
];

// --- Applications ---

/// Health endpoint probed by the kubelet and the ALB.
pub const HEALTH_CHECK_PATH: &str = "/actuator/health";

/// Port the application process listens on.
pub const APPLICATION_PORT: u16 = 8080;

/// Port declared on the application container.
pub const CONTAINER_PORT: u16 = 80;

/// Port the Service and Ingress expose.
pub const SERVICE_PORT: u16 = 80;

pub const REPLICAS: i32 = 2;

pub const LIVENESS_INITIAL_DELAY_SECONDS: i32 = 15;
pub const LIVENESS_PERIOD_SECONDS: i32 = 10;
pub const READINESS_INITIAL_DELAY_SECONDS: i32 = 5;
pub const READINESS_PERIOD_SECONDS: i32 = 5;

/// Environment variable carrying the active runtime profile.
pub const PROFILE_ENV_VAR: &str = "SPRING_PROFILES_ACTIVE";

/// Environment variable carrying the database password.
pub const DATABASE_PASSWORD_ENV_VAR: &str = "DB_PASSWORD";

/// Literal injected when an application has no database password.
pub const NO_DATABASE_PLACEHOLDER: &str = "NO-DATABASE-CONFIGURED";

/// Key of the password entry inside the database credentials secret.
pub const DATABASE_PASSWORD_KEY: &str = "password";

/// ALB idle timeout applied to every application load balancer.
pub const IDLE_TIMEOUT_SECONDS: u32 = 120;
