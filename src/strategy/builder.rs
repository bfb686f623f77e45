//! builder.rs
//! Bounded-depth decomposition of a decision-analysis network into an
//! optimal strategy tree.
//!
//! Each decision variable is taken in topological order; every candidate
//! state is scored by restricting the network to the accumulated evidence
//! and running variable elimination on what remains (chance variables summed
//! out, still-unresolved decisions maxed out). Argmax states become the
//! node's branches, and structurally identical optimal subtrees coalesce in
//! the forest.

use super::forest::{BranchTarget, StrategyBranch, StrategyForest, StrategyNode};
use crate::elimination::{EliminationGroups, SimpleElimination, VariableEliminationEngine};
use crate::error::InferenceError;
use crate::graph::{Network, NodeId, Variable};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use tracing::debug;

/// Utilities within this distance of the best state count as co-optimal.
const UTILITY_TOLERANCE: f64 = 1e-9;

/// Configuration for strategy-tree decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecompositionConfig {
    /// Maximum number of decision variables resolved along any root-to-leaf
    /// path. Deeper decisions are folded into the leaf evaluation by
    /// maximization.
    pub max_depth: usize,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

impl DecompositionConfig {
    pub fn validate(self) -> Result<Self, InferenceError> {
        if self.max_depth == 0 {
            return Err(InferenceError::Construction {
                type_id: "strategy-tree".to_string(),
                message: "max_depth must be > 0".to_string(),
            });
        }
        Ok(self)
    }
}

/// The finished decomposition: the arena, the root, and the expected utility
/// of following the optimal policy.
#[derive(Debug, Clone)]
pub struct DecompositionResult {
    pub forest: StrategyForest,
    pub root: BranchTarget,
    pub expected_utility: f64,
}

#[derive(Debug)]
pub struct StrategyTreeBuilder<'a> {
    network: &'a Network,
    config: DecompositionConfig,
    /// Decision variables in topological order, fixed for the whole build.
    decisions: Vec<Variable>,
}

impl<'a> StrategyTreeBuilder<'a> {
    pub fn new(network: &'a Network, config: DecompositionConfig) -> Result<Self, InferenceError> {
        let config = config.validate()?;
        let decisions = decisions_in_topological_order(network);
        Ok(Self { network, config, decisions })
    }

    /// Builds the optimal strategy tree, optionally under pre-resolution
    /// evidence (`(variable, observed state)` pairs).
    pub fn build(
        &self,
        evidence: &[(Variable, usize)],
    ) -> Result<DecompositionResult, InferenceError> {
        let mut forest = StrategyForest::new();
        let mut resolved: Vec<(Variable, usize)> = evidence.to_vec();
        let (root, expected_utility) =
            self.expand(&mut forest, &mut resolved, self.config.max_depth)?;
        Ok(DecompositionResult { forest, root, expected_utility })
    }

    /// Recursively resolves the next open decision, one subtree per
    /// candidate state.
    fn expand(
        &self,
        forest: &mut StrategyForest,
        resolved: &mut Vec<(Variable, usize)>,
        depth: usize,
    ) -> Result<(BranchTarget, f64), InferenceError> {
        let next = self
            .decisions
            .iter()
            .find(|d| !resolved.iter().any(|(v, _)| v == *d))
            .cloned();

        let decision = match (next, depth) {
            (None, _) | (_, 0) => {
                let utility = self.evaluate(resolved)?;
                return Ok((BranchTarget::Leaf(utility), utility));
            }
            (Some(d), _) => d,
        };

        let mut outcomes: Vec<(BranchTarget, f64)> = Vec::with_capacity(decision.cardinality());
        for state in 0..decision.cardinality() {
            resolved.push((decision.clone(), state));
            let outcome = self.expand(forest, resolved, depth - 1)?;
            resolved.pop();
            outcomes.push(outcome);
        }

        let best = outcomes
            .iter()
            .map(|(_, u)| *u)
            .fold(f64::NEG_INFINITY, f64::max);

        // One branch per distinct optimal subtree; co-optimal states whose
        // subtrees coalesced share a branch.
        let mut branches: Vec<StrategyBranch> = Vec::new();
        for (state, (target, utility)) in outcomes.iter().enumerate() {
            if *utility < best - UTILITY_TOLERANCE {
                continue;
            }
            match branches.iter_mut().find(|b| b.target == *target) {
                Some(branch) => branch.states.push(state),
                None => branches.push(StrategyBranch {
                    states: SmallVec::from_slice(&[state]),
                    target: *target,
                }),
            }
        }

        debug!(
            decision = %decision,
            best_utility = best,
            branches = branches.len(),
            "resolved decision"
        );
        let id = forest.intern(StrategyNode { variable: decision, branches, utility: best });
        Ok((BranchTarget::Subtree(id), best))
    }

    /// Expected utility of the network under `resolved`, computed by a full
    /// elimination of the restricted sub-network.
    fn evaluate(&self, resolved: &[(Variable, usize)]) -> Result<f64, InferenceError> {
        let mut net = self.network.clone();
        for (variable, state) in resolved {
            net.observe(variable, *state)?;
        }

        let remaining: Vec<Variable> = net
            .node_ids()
            .filter_map(|id| net.variable(id).cloned())
            .collect();
        let heuristic = SimpleElimination::new(EliminationGroups::single(remaining));
        let report = VariableEliminationEngine::new(net, Box::new(heuristic)).run()?;

        report
            .potential
            .scalar_value()
            .ok_or_else(|| InferenceError::NotEvaluableNetwork {
                message: "slice evaluation did not reduce to a scalar".to_string(),
            })
    }
}

/// Decision variables ordered by the directed part of the network (Kahn's
/// algorithm); insertion order breaks ties deterministically.
fn decisions_in_topological_order(network: &Network) -> Vec<Variable> {
    let ids: Vec<NodeId> = network.node_ids().collect();
    let mut in_degree: std::collections::HashMap<NodeId, usize> = ids
        .iter()
        .map(|&id| (id, network.parents(id).len()))
        .collect();
    let mut queue: VecDeque<NodeId> = ids
        .iter()
        .copied()
        .filter(|id| in_degree[id] == 0)
        .collect();
    let mut order = Vec::new();

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for child in network.children(id) {
            if let Some(deg) = in_degree.get_mut(&child) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(child);
                }
            }
        }
    }
    // A directed cycle would leave nodes unqueued; append them in insertion
    // order so no decision is silently dropped.
    for id in &ids {
        if !order.contains(id) {
            order.push(*id);
        }
    }

    order
        .into_iter()
        .filter_map(|id| network.variable(id).cloned())
        .filter(Variable::is_decision)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::potential::{Potential, Role, TablePotential};

    /// Decision D1, then D2, chance X; utility depends on X and D2 only.
    fn two_decision_network() -> (Network, Variable, Variable, Variable) {
        let d1 = Variable::decision("D1", ["a", "b"]);
        let d2 = Variable::decision("D2", ["c", "d"]);
        let x = Variable::binary("X");

        let mut net = Network::new();
        let n1 = net.add_variable(d1.clone());
        let n2 = net.add_variable(d2.clone());
        let nx = net.add_variable(x.clone());
        net.add_link(n1, n2, true);
        net.add_link(n2, nx, true);

        net.attach_potential(
            nx,
            Potential::Table(
                TablePotential::new([x.clone()], Role::Probability, vec![0.5, 0.5]).unwrap(),
            ),
        );
        // U(X, D2): D2=d strictly dominates.
        net.attach_potential(
            n2,
            Potential::Table(
                TablePotential::new(
                    [x.clone(), d2.clone()],
                    Role::Utility,
                    vec![1.0, 4.0, 3.0, 6.0],
                )
                .unwrap(),
            ),
        );
        (net, d1, d2, x)
    }

    #[test]
    fn test_optimal_policy_and_utility() {
        let (net, _d1, d2, _x) = two_decision_network();
        let builder = StrategyTreeBuilder::new(&net, DecompositionConfig::default()).unwrap();
        let result = builder.build(&[]).unwrap();

        // EU(D2=d) = 0.5*4 + 0.5*6 = 5.
        assert!((result.expected_utility - 5.0).abs() < 1e-9);

        let root = match result.root {
            BranchTarget::Subtree(id) => result.forest.node(id),
            BranchTarget::Leaf(_) => panic!("expected a decision node at the root"),
        };
        // D2's subtree must pick state 1 ("d").
        let d2_node = match root.branches[0].target {
            BranchTarget::Subtree(id) => result.forest.node(id),
            BranchTarget::Leaf(_) => panic!("expected the D2 node below D1"),
        };
        assert_eq!(d2_node.variable, d2);
        assert_eq!(d2_node.branches.len(), 1);
        assert_eq!(d2_node.branches[0].states.as_slice(), &[1]);
    }

    #[test]
    fn test_identical_subtrees_coalesce_across_sibling_branches() {
        let (net, d1, _d2, _x) = two_decision_network();
        let builder = StrategyTreeBuilder::new(&net, DecompositionConfig::default()).unwrap();
        let result = builder.build(&[]).unwrap();

        let root = match result.root {
            BranchTarget::Subtree(id) => result.forest.node(id),
            BranchTarget::Leaf(_) => panic!("expected a decision node at the root"),
        };
        assert_eq!(root.variable, d1);
        // The utility ignores D1, so both D1 states lead to the *same*
        // optimal subtree object: one branch carrying both states, sharing
        // one arena index.
        assert_eq!(root.branches.len(), 1);
        assert_eq!(root.branches[0].states.as_slice(), &[0, 1]);
        // Forest holds exactly the D2 node and the D1 node.
        assert_eq!(result.forest.len(), 2);
    }

    #[test]
    fn test_depth_bound_folds_decisions_into_leaves() {
        let (net, _d1, _d2, _x) = two_decision_network();
        let config = DecompositionConfig { max_depth: 1 };
        let builder = StrategyTreeBuilder::new(&net, config).unwrap();
        let result = builder.build(&[]).unwrap();

        let root = match result.root {
            BranchTarget::Subtree(id) => result.forest.node(id),
            BranchTarget::Leaf(_) => panic!("depth 1 still resolves the first decision"),
        };
        // Below D1 the depth is exhausted: D2 is maxed inside the leaf
        // evaluation rather than expanded.
        assert!(matches!(root.branches[0].target, BranchTarget::Leaf(u) if (u - 5.0).abs() < 1e-9));
        assert!((result.expected_utility - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_pre_resolution_evidence_restricts_the_build() {
        let (net, _d1, _d2, x) = two_decision_network();
        let builder = StrategyTreeBuilder::new(&net, DecompositionConfig::default()).unwrap();
        // Observing X=0 removes the chance weighting: EU = max(U(0, .)) with
        // the surviving probability mass 0.5.
        let result = builder.build(&[(x.clone(), 0)]).unwrap();
        assert!((result.expected_utility - 0.5 * 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_depth_config_is_rejected() {
        let (net, ..) = two_decision_network();
        let err = StrategyTreeBuilder::new(&net, DecompositionConfig { max_depth: 0 }).unwrap_err();
        assert!(matches!(err, InferenceError::Construction { .. }));
    }
}
