//! Check command.
//!
//! Loads the config, composes the stack and resolves it against the infra stack's
//! outputs. Nothing is written.

use crate::cli::output;
use crate::core::compose::application::ApplicationNames;
use crate::core::compose::compose_stack;
use crate::core::config::StackConfig;
use crate::core::resource::ResourceKind;
use crate::error::Result;

pub fn execute(config: &StackConfig) -> Result<()> {
    let plan = compose_stack(config)?;
    let resolved = plan.resolve(&config.resolver()?)?;

    output::header("Stack");
    output::rule();
    output::kv("config:", output::path(config.path.display()));
    output::kv("infra stack:", output::path(config.infra_stack.display()));
    output::kv("environment:", config.environment);
    output::kv("applications:", config.applications.len());
    output::kv("descriptors:", resolved.len());
    output::kv("secrets:", resolved.of_kind(ResourceKind::Secret).count());

    for app in &config.applications {
        let secret = ApplicationNames::new(&app.name).secret;
        if !resolved
            .of_kind(ResourceKind::Secret)
            .any(|d| d.name == secret)
        {
            output::warn(&format!(
                "{}: no database password configured, DB_PASSWORD will be a placeholder",
                app.name
            ));
        }
    }

    println!();
    output::success("stack resolves");
    Ok(())
}
