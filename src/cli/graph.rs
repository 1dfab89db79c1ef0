//! Graph command.
//!
//! Prints the composed descriptors in apply order, grouped under their component,
//! without resolving anything. Optional descriptors are listed even though they may
//! resolve to nothing.

use crate::cli::output;
use crate::core::compose::compose_stack;
use crate::core::config::StackConfig;
use crate::error::Result;

pub fn execute(config: &StackConfig) -> Result<()> {
    let plan = compose_stack(config)?;

    let mut current: Option<&str> = None;
    for descriptor in plan.descriptors() {
        if descriptor.parent() != current {
            current = descriptor.parent();
            output::section(current.unwrap_or("(root)"));
        }

        let mut line = format!("  {}", output::urn(descriptor.urn()));
        if descriptor.body().is_secret() {
            line.push_str(&format!(" {}", output::dim("(secret)")));
        }
        println!("{}", line);
        for dependency in descriptor.dependencies() {
            println!("      {} {}", output::dim("←"), dependency);
        }
    }

    println!();
    output::kv("descriptors:", plan.len());
    Ok(())
}
