//! Application layer: session registry, input injection, and the operator
//! command dispatcher.
//!
//! Use cases in this layer depend only on the traits and types exposed by
//! the infrastructure layer (`RdpConnectionFactory`, `ConnectionLifecycle`),
//! so they are fully unit-testable against the recording mock bridge.

pub mod dispatch_commands;
pub mod inject_input;
pub mod manage_sessions;
