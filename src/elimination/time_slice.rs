//! time_slice.rs
//! Temporal elimination for time-expanded networks: slices are eliminated
//! from the latest to the earliest, and within a slice the variable with the
//! cheapest resulting combined table is preferred.

use super::{EliminationGroups, EliminationHeuristic};
use crate::error::InferenceError;
use crate::graph::{Network, Variable};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct TimeSliceElimination {
    groups: EliminationGroups,
}

impl TimeSliceElimination {
    /// Non-temporal variables occupy slice 0 and are eliminated last.
    pub fn new(groups: EliminationGroups) -> Self {
        Self { groups }
    }

    /// Size of the table over the union of variables of every potential
    /// mentioning `candidate`: the size of the potential the engine would
    /// have to build to eliminate it now.
    fn combined_size(network: &Network, candidate: &Variable) -> usize {
        let mut union: HashSet<Variable> = HashSet::new();
        for p in network.potentials_mentioning(candidate) {
            union.extend(p.variables().iter().cloned());
        }
        if union.is_empty() {
            return candidate.cardinality();
        }
        union.iter().map(Variable::cardinality).product()
    }
}

impl EliminationHeuristic for TimeSliceElimination {
    fn pick_variable(&self, network: &Network) -> Result<Variable, InferenceError> {
        let group = self.groups.current().ok_or(InferenceError::NoEliminationOrder {
            remaining: 0,
        })?;

        let latest = group
            .iter()
            .map(Variable::slice_or_zero)
            .max()
            .ok_or(InferenceError::NoEliminationOrder { remaining: 0 })?;

        let mut best: Option<(&Variable, usize)> = None;
        for candidate in group.iter().filter(|v| v.slice_or_zero() == latest) {
            let size = Self::combined_size(network, candidate);
            if best.map_or(true, |(_, best_size)| size < best_size) {
                best = Some((candidate, size));
            }
        }
        best.map(|(v, _)| v.clone())
            .ok_or(InferenceError::NoEliminationOrder { remaining: 0 })
    }

    fn on_node_removed(&mut self, variable: &Variable) {
        self.groups.remove(variable);
    }

    fn is_exhausted(&self) -> bool {
        self.groups.is_exhausted()
    }
}
