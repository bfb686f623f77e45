//! The mutable graph model consumed by the inference algorithms.
pub mod network;
pub mod variable;

// Re-export key types for convenient access
pub use network::{LinkKind, Network, NodeId};
pub use variable::{Variable, VariableKind};
