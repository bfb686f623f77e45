//! simple.rs
//! Fewest-neighbors elimination: pick the variable whose node currently has
//! the fewest sibling links, ties broken by group scan order.

use super::{EliminationGroups, EliminationHeuristic};
use crate::error::InferenceError;
use crate::graph::{Network, Variable};

#[derive(Debug, Clone)]
pub struct SimpleElimination {
    groups: EliminationGroups,
}

impl SimpleElimination {
    pub fn new(groups: EliminationGroups) -> Self {
        Self { groups }
    }
}

impl EliminationHeuristic for SimpleElimination {
    fn pick_variable(&self, network: &Network) -> Result<Variable, InferenceError> {
        let group = self.groups.current().ok_or(InferenceError::NoEliminationOrder {
            remaining: 0,
        })?;

        let mut best: Option<(&Variable, usize)> = None;
        for candidate in group {
            let count = network
                .get_node(candidate)
                .map(|id| network.sibling_count(id))
                .unwrap_or(0);
            // Strict < keeps the first-found candidate on ties.
            if best.map_or(true, |(_, best_count)| count < best_count) {
                best = Some((candidate, count));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_fewest_siblings() {
        // Star: Hub married to L1 and L2. Leaves have 1 sibling, hub has 2.
        let mut net = Network::new();
        let hub = Variable::binary("Hub");
        let l1 = Variable::binary("L1");
        let l2 = Variable::binary("L2");
        let h = net.add_variable(hub.clone());
        let a = net.add_variable(l1.clone());
        let b = net.add_variable(l2.clone());
        net.add_link(h, a, false);
        net.add_link(h, b, false);

        let heuristic = SimpleElimination::new(EliminationGroups::single([
            hub.clone(),
            l1.clone(),
            l2.clone(),
        ]));
        // L1 and L2 tie at 1 sibling; L1 is scanned first.
        assert_eq!(heuristic.pick_variable(&net).unwrap(), l1);
    }

    #[test]
    fn test_exhausted_pick_fails() {
        let net = Network::new();
        let v = Variable::binary("A");
        let mut heuristic = SimpleElimination::new(EliminationGroups::single([v.clone()]));
        heuristic.on_node_removed(&v);
        assert!(heuristic.is_exhausted());
        assert!(matches!(
            heuristic.pick_variable(&net).unwrap_err(),
            InferenceError::NoEliminationOrder { .. }
        ));
    }
}
