//! Strategy trees: bounded-depth decision-tree decomposition of influence
//! diagrams and decision-analysis networks, with structural sharing
//! (coalescence) of identical subtrees.
pub mod builder;
pub mod forest;

pub use builder::{DecompositionConfig, DecompositionResult, StrategyTreeBuilder};
pub use forest::{BranchRef, BranchTarget, StrategyBranch, StrategyForest, StrategyNode, TreeId};
