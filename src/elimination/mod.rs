//! Elimination-order heuristics and the variable-elimination engine.
pub mod engine;
pub mod file_order;
pub mod groups;
pub mod min_fill;
pub mod simple;
pub mod time_slice;

pub use engine::{EliminationReport, VariableEliminationEngine};
pub use file_order::FileElimination;
pub use groups::EliminationGroups;
pub use min_fill::MinimalFillIn;
pub use simple::SimpleElimination;
pub use time_slice::TimeSliceElimination;

use crate::error::InferenceError;
use crate::graph::{Network, Variable};

/// A strategy deciding which variable to remove next.
///
/// The contract is a two-state machine: while any eliminable group is
/// non-empty the heuristic is active; once every group is empty it is
/// exhausted, terminally. [`EliminationHeuristic::pick_variable`] never
/// mutates anything; [`EliminationHeuristic::on_node_removed`] is the sole
/// mutator and is invoked by the engine synchronously after each removal it
/// performs (no implicit editor-originated mutation path exists).
pub trait EliminationHeuristic {
    /// Proposes the next variable to eliminate, always from the last
    /// non-empty group. Fails with
    /// [`InferenceError::NoEliminationOrder`] when exhausted.
    fn pick_variable(&self, network: &Network) -> Result<Variable, InferenceError>;

    /// Reacts to the removal of `variable`: drops it from its group and
    /// updates any heuristic-local caches.
    fn on_node_removed(&mut self, variable: &Variable);

    fn is_exhausted(&self) -> bool;
}
