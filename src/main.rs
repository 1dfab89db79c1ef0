//! Berth - declarative EKS application stacks.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use berth::cli::output;
use berth::cli::{execute, Cli};
use berth::core::constants::LOG_ENV;
use berth::error::{ConfigError, Error};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("berth=debug")
        } else {
            EnvFilter::new("berth=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli) {
        let suggestion = match &e {
            Error::Config(ConfigError::NotFound(_)) => {
                Some("create berth.toml or pass --config <path>")
            }
            Error::Config(ConfigError::MissingField { .. }) => {
                Some("required keys: infra-stack, environment, account-id")
            }
            Error::Config(ConfigError::StackOutputsRead { .. }) => {
                Some("infra-stack is resolved relative to the config file")
            }
            Error::Descriptor { source, .. } if matches!(**source, Error::Resolve(_)) => {
                Some("check the infra stack's exported outputs")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
