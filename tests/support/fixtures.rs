//! Test fixtures and constants.

/// Exported outputs of a prerequisite infra stack.
pub const INFRA_OUTPUTS: &str = r#"{
  "eksClusterName": "staging-eks",
  "eksClusterEndpointOidcIssuerUrl": "https://oidc.eks.eu-west-1.amazonaws.com/id/ABC123",
  "application:checkout": "123456789012.dkr.ecr.eu-west-1.amazonaws.com/checkout",
  "application:catalog": "123456789012.dkr.ecr.eu-west-1.amazonaws.com/catalog"
}
"#;

/// `checkout` has a database password, `catalog` does not.
pub const STANDARD_CONFIG: &str = r#"
infra-stack = "infra.json"
environment = "STAGING"
account-id = "123456789012"
enabled-applications = """
- name: checkout
  tag: v1.2.0
- name: catalog
  tag: "42"
"""

[secrets]
checkout-database-password = "correct-horse-battery-staple"
"#;

/// Config with no applications.
pub const EMPTY_CONFIG: &str = r#"
infra-stack = "infra.json"
environment = "DEV"
account-id = "123456789012"
"#;

/// Password configured for `checkout` in [`STANDARD_CONFIG`].
pub const CHECKOUT_PASSWORD: &str = "correct-horse-battery-staple";
