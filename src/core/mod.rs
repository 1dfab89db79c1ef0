//! Core library components.
//!
//! Configuration reading, the composers, deferred values, plans and the engines
//! that consume them.

pub mod application;
pub mod compose;
pub mod config;
pub mod constants;
pub mod deferred;
pub mod engine;
pub mod environment;
pub mod plan;
pub mod resource;
pub mod stack;
pub mod validation;
