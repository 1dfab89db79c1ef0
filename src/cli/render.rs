//! Render command.
//!
//! Prints every resolved resource in apply order, as a multi-document YAML stream
//! or a JSON array. Secret data is redacted unless asked for.

use serde::Serialize;
use tracing::debug;

use crate::cli::Format;
use crate::core::compose::compose_stack;
use crate::core::config::StackConfig;
use crate::core::plan::{ResolvedDescriptor, ResolvedPlan, Urn};
use crate::core::resource::Resource;
use crate::error::{Error, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Rendered<'a> {
    urn: &'a Urn,
    #[serde(rename = "type")]
    type_token: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<&'a str>,
    depends_on: &'a [Urn],
    resource: Resource,
}

/// Print the resolved stack.
pub fn execute(config: &StackConfig, format: Format, show_secrets: bool) -> Result<()> {
    let plan = compose_stack(config)?;
    let resolved = plan.resolve(&config.resolver()?)?;
    print!("{}", render(&resolved, format, show_secrets)?);
    Ok(())
}

/// Serialize a resolved plan.
///
/// # Errors
///
/// Returns `Error::Serialize` if a resource cannot be serialized.
pub fn render(resolved: &ResolvedPlan, format: Format, show_secrets: bool) -> Result<String> {
    debug!(descriptors = resolved.len(), ?format, show_secrets, "rendering");

    let body = |d: &ResolvedDescriptor| {
        if d.secret && !show_secrets {
            d.resource.redacted()
        } else {
            d.resource.clone()
        }
    };

    match format {
        Format::Yaml => {
            let mut out = String::new();
            for d in resolved.descriptors() {
                let doc = serde_yaml::to_string(&body(d))
                    .map_err(|e| Error::Serialize(e.to_string()))?;
                out.push_str("---\n");
                out.push_str(&format!("# {}\n", d.urn));
                out.push_str(&doc);
            }
            Ok(out)
        }
        Format::Json => {
            let docs: Vec<Rendered<'_>> = resolved
                .descriptors()
                .iter()
                .map(|d| Rendered {
                    urn: &d.urn,
                    type_token: d.kind.type_token(),
                    parent: d.parent.as_deref(),
                    depends_on: &d.depends_on,
                    resource: body(d),
                })
                .collect();
            let mut out =
                serde_json::to_string_pretty(&docs).map_err(|e| Error::Serialize(e.to_string()))?;
            out.push('\n');
            Ok(out)
        }
    }
}
