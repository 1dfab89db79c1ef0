//! Composers.
//!
//! Composers are pure builders: they emit descriptors with deferred bodies into a
//! [`Plan`](crate::core::plan::Plan) and never resolve anything themselves.

pub mod application;
pub mod ingress_controller;
pub mod stack;

pub use application::{compose_application, ApplicationResources};
pub use ingress_controller::{compose_ingress_controller, IngressController};
pub use stack::compose_stack;
