//! # Sibyl Core
//!
//! Exact inference core for probabilistic graphical models: Bayesian
//! networks, influence diagrams, and decision-analysis networks.
//!
//! The crate is organized bottom-up:
//! - [`graph`]: variables and the mutable network the algorithms consume.
//! - [`potential`]: numeric/symbolic potentials (tables, decision trees)
//!   and the registry of constructible representations.
//! - [`elimination`]: pluggable elimination-order heuristics and the
//!   variable-elimination engine.
//! - [`strategy`]: bounded-depth strategy-tree decomposition with
//!   structural sharing of identical subtrees.

pub mod display;
pub mod elimination;
pub mod error;
pub mod graph;
pub mod potential;
pub mod strategy;

// Re-export commonly used types
pub use elimination::engine::{EliminationReport, VariableEliminationEngine};
pub use elimination::{EliminationGroups, EliminationHeuristic};
pub use error::InferenceError;
pub use graph::{LinkKind, Network, NodeId, Variable, VariableKind};
pub use potential::{DecisionPolicy, Potential, PotentialRegistry, Role, TablePotential};
pub use strategy::{DecompositionConfig, DecompositionResult, StrategyForest, StrategyTreeBuilder};
