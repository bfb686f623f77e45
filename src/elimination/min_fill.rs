//! min_fill.rs
//! Minimal-fill-in elimination: pick the variable whose removal adds the
//! fewest new links among its neighbors.
//!
//! Fill-in depends on the post-removal topology of everything eliminated so
//! far, so the heuristic keeps a private copy of the graph and performs the
//! marriage step itself on every removal, independent of what the engine
//! does to the shared network.

use super::{EliminationGroups, EliminationHeuristic};
use crate::error::InferenceError;
use crate::graph::{Network, Variable};

#[derive(Debug, Clone)]
pub struct MinimalFillIn {
    groups: EliminationGroups,
    /// Private moralized copy; mutated only by `on_node_removed`.
    scratch: Network,
}

impl MinimalFillIn {
    /// Takes its own copy of `network` and moralizes it, so fill-in counts
    /// run over sibling links from the start.
    pub fn new(groups: EliminationGroups, network: &Network) -> Self {
        let mut scratch = network.clone();
        scratch.moralize();
        Self { groups, scratch }
    }

    /// Number of new links required to fully connect `variable`'s current
    /// neighbors: the count of pairwise non-adjacent neighbor pairs.
    fn fill_in(&self, variable: &Variable) -> usize {
        let Some(id) = self.scratch.get_node(variable) else {
            return 0;
        };
        let neighbors = self.scratch.neighbors(id);
        let mut fill = 0;
        for (i, &a) in neighbors.iter().enumerate() {
            for &b in &neighbors[i + 1..] {
                if !self.scratch.adjacent(a, b) {
                    fill += 1;
                }
            }
        }
        fill
    }
}

impl EliminationHeuristic for MinimalFillIn {
    fn pick_variable(&self, _network: &Network) -> Result<Variable, InferenceError> {
        let group = self.groups.current().ok_or(InferenceError::NoEliminationOrder {
            remaining: 0,
        })?;

        let mut best: Option<(&Variable, usize)> = None;
        for candidate in group {
            let fill = self.fill_in(candidate);
            if best.map_or(true, |(_, best_fill)| fill < best_fill) {
                best = Some((candidate, fill));
                if fill == 0 {
                    // Nothing can beat a simplicial candidate.
                    break;
                }
            }
        }
        best.map(|(v, _)| v.clone())
            .ok_or(InferenceError::NoEliminationOrder { remaining: 0 })
    }

    fn on_node_removed(&mut self, variable: &Variable) {
        self.groups.remove(variable);
        if let Some(id) = self.scratch.get_node(variable) {
            // Materialize the fill-in links before dropping the node, so the
            // next fill-in counts see the post-elimination topology.
            let neighbors = self.scratch.neighbors(id);
            self.scratch.marry(&neighbors);
            self.scratch.remove_node(id);
        }
    }

    fn is_exhausted(&self) -> bool {
        self.groups.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 4-cycle A-B-C-D: eliminating any node adds exactly one link (its
    /// two neighbors are non-adjacent); after one elimination the remaining
    /// triangle is fill-in free.
    fn four_cycle() -> (Network, Vec<Variable>) {
        let mut net = Network::new();
        let vars: Vec<Variable> =
            ["A", "B", "C", "D"].iter().map(|n| Variable::binary(*n)).collect();
        let ids: Vec<_> = vars.iter().map(|v| net.add_variable(v.clone())).collect();
        net.add_link(ids[0], ids[1], false);
        net.add_link(ids[1], ids[2], false);
        net.add_link(ids[2], ids[3], false);
        net.add_link(ids[3], ids[0], false);
        (net, vars)
    }

    #[test]
    fn test_fill_in_counts_non_adjacent_neighbor_pairs() {
        let (net, vars) = four_cycle();
        let h = MinimalFillIn::new(EliminationGroups::single(vars.clone()), &net);
        for v in &vars {
            assert_eq!(h.fill_in(v), 1);
        }
    }

    #[test]
    fn test_removal_moralizes_private_copy() {
        let (net, vars) = four_cycle();
        let mut h = MinimalFillIn::new(EliminationGroups::single(vars.clone()), &net);

        let first = h.pick_variable(&net).unwrap();
        assert_eq!(first, vars[0], "all tie at fill-in 1, first found wins");
        h.on_node_removed(&first);

        // B and D are now married in the private copy; the triangle B-C-D
        // has no missing links left.
        for v in &vars[1..] {
            assert_eq!(h.fill_in(v), 0, "{} should be simplicial", v);
        }
    }

    #[test]
    fn test_chosen_fill_in_is_minimal_in_group() {
        // Star with one rim link: Hub connects to L1,L2,L3 and L1-L2 are
        // linked. Hub needs two fill-ins, every leaf at most one.
        let mut net = Network::new();
        let hub = Variable::binary("Hub");
        let leaves: Vec<Variable> =
            ["L1", "L2", "L3"].iter().map(|n| Variable::binary(*n)).collect();
        let h_id = net.add_variable(hub.clone());
        let l_ids: Vec<_> = leaves.iter().map(|v| net.add_variable(v.clone())).collect();
        for &l in &l_ids {
            net.add_link(h_id, l, false);
        }
        net.add_link(l_ids[0], l_ids[1], false);

        let all: Vec<Variable> =
            std::iter::once(hub.clone()).chain(leaves.iter().cloned()).collect();
        let h = MinimalFillIn::new(EliminationGroups::single(all.clone()), &net);

        let picked = h.pick_variable(&net).unwrap();
        let picked_fill = h.fill_in(&picked);
        for other in &all {
            assert!(picked_fill <= h.fill_in(other));
        }
        // Hub needs L1-L3 and L2-L3; every leaf needs at most one link.
        assert_eq!(h.fill_in(&hub), 2);
        assert!(picked != hub);
    }
}
