//! Container runtime driver for the MPT deployment stack.
//!
//! This crate provides:
//! - A typed model of the compose deployment descriptor
//! - Runtime discovery: the `docker compose` plugin, or standalone
//!   `docker-compose` as fallback
//! - Typed invocation building and async execution with timeouts
//! - Service status polling and in-container environment inspection

pub mod descriptor;
pub mod error;
pub mod runtime;
pub mod stack;
pub mod status;

// Re-export common types
pub use descriptor::{ComposeFile, PortMapping, Service, COMPOSE_FILE};
pub use error::{ComposeError, ComposeResult};
pub use runtime::{CommandOutput, ComposeCli, ComposeCommand, ComposeFlavor, ComposeRunner};
pub use stack::StackDriver;
pub use status::{ServiceState, ServiceStatus};
