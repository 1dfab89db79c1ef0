//! Berth - declarative EKS application stacks.
//!
//! Reads the list of enabled applications, composes the shared ALB ingress
//! controller and one workload per application, resolves the composed plan against
//! the outputs of a prerequisite infrastructure stack, and hands the result to a
//! reconciliation engine.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/                  # Command-line interface
//! │   ├── render            # Print resolved manifests
//! │   ├── apply             # Write manifests and plan index
//! │   ├── graph             # Print the descriptor graph
//! │   ├── check             # Validate config and stack outputs
//! │   └── completions       # Shell completions
//! └── core/                 # Core library components
//!     ├── config            # berth.toml
//!     ├── application       # enabled-applications list
//!     ├── deferred          # Pending values and the Resolve trait
//!     ├── compose/          # Composers
//!     │   ├── ingress_controller
//!     │   ├── application
//!     │   └── stack
//!     ├── plan              # Descriptors, resolution, apply order
//!     ├── engine            # Engine trait, ManifestWriter, DryRun
//!     ├── resource/         # Kubernetes, IAM and Helm bodies
//!     └── stack             # Stack outputs resolver
//! ```

pub mod cli;
pub mod core;
pub mod error;
