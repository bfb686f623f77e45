//! engine.rs
//! The variable-elimination inference loop: repeatedly ask the heuristic for
//! a variable, combine every potential mentioning it, marginalize it out,
//! and fold the result back into the working set.

use super::EliminationHeuristic;
use crate::error::InferenceError;
use crate::graph::{Network, Variable};
use crate::potential::{DecisionPolicy, Potential, Role};
use tracing::debug;

/// The outcome of a completed elimination run: the final potential over the
/// remaining (query/utility) variables, plus one optimal policy per decision
/// variable that was maxed out along the way.
#[derive(Debug, Clone)]
pub struct EliminationReport {
    pub potential: Potential,
    pub policies: Vec<DecisionPolicy>,
}

/// Drives one inference run. The engine owns the network and the working
/// potential set exclusively for the duration of the run; no concurrent run
/// may share a graph instance.
pub struct VariableEliminationEngine {
    network: Network,
    heuristic: Box<dyn EliminationHeuristic>,
    potentials: Vec<Potential>,
    policies: Vec<DecisionPolicy>,
}

impl VariableEliminationEngine {
    /// Drains the attached potentials out of `network` into the working set.
    pub fn new(mut network: Network, heuristic: Box<dyn EliminationHeuristic>) -> Self {
        let potentials = network.take_all_potentials();
        Self { network, heuristic, potentials, policies: Vec::new() }
    }

    /// Runs elimination to completion. A combination failure mid-run aborts
    /// the whole run; the partial potential set is discarded, not returned.
    pub fn run(mut self) -> Result<EliminationReport, InferenceError> {
        while !self.heuristic.is_exhausted() {
            let variable = self.heuristic.pick_variable(&self.network)?;
            self.eliminate(&variable)?;

            // Notify first, then mutate the graph: the heuristic's caches
            // key off the variable, not the node id.
            self.heuristic.on_node_removed(&variable);
            if let Some(id) = self.network.get_node(&variable) {
                self.network.remove_node(id);
            }
        }

        if self.potentials.is_empty() {
            return Err(InferenceError::NotEvaluableNetwork {
                message: "no potentials remain after elimination".to_string(),
            });
        }
        let potential = combine_all(std::mem::take(&mut self.potentials))?;
        Ok(EliminationReport { potential, policies: self.policies })
    }

    /// One elimination step for `variable`.
    fn eliminate(&mut self, variable: &Variable) -> Result<(), InferenceError> {
        let (mentioning, rest): (Vec<Potential>, Vec<Potential>) = std::mem::take(&mut self.potentials)
            .into_iter()
            .partition(|p| p.contains(variable));
        self.potentials = rest;

        if mentioning.is_empty() {
            debug!(variable = %variable, "no potential mentions variable, removal is free");
            return Ok(());
        }
        debug!(
            variable = %variable,
            gathered = mentioning.len(),
            decision = variable.is_decision(),
            "eliminating"
        );

        let combined = combine_all(mentioning)?;
        let result = if variable.is_decision() {
            let (maxed, policy) = combined.maximize(variable)?;
            self.policies.push(policy);
            maxed
        } else {
            combined.marginalize(variable)?
        };
        self.potentials.push(result);
        Ok(())
    }
}

/// Folds a set of potentials into one, applying the role discipline: utility
/// potentials are summed first (the explicit sum policy), probability
/// potentials multiply, then the two parts combine. A role no registered
/// combination can handle surfaces as `NotEvaluableNetwork`.
fn combine_all(potentials: Vec<Potential>) -> Result<Potential, InferenceError> {
    let mut probability: Option<Potential> = None;
    let mut utility: Option<Potential> = None;

    for p in potentials {
        match p.role() {
            Role::Probability => {
                probability = Some(match probability {
                    Some(acc) => acc.combine(&p).map_err(not_evaluable)?,
                    None => p,
                });
            }
            Role::Utility => {
                utility = Some(match utility {
                    Some(acc) => acc.sum(&p).map_err(not_evaluable)?,
                    None => p,
                });
            }
            Role::Policy => {
                return Err(InferenceError::NotEvaluableNetwork {
                    message: "a policy potential cannot participate in combination".to_string(),
                })
            }
        }
    }

    match (probability, utility) {
        (Some(p), Some(u)) => p.combine(&u).map_err(not_evaluable),
        (Some(p), None) => Ok(p),
        (None, Some(u)) => Ok(u),
        (None, None) => Err(InferenceError::NotEvaluableNetwork {
            message: "empty potential set".to_string(),
        }),
    }
}

fn not_evaluable(err: InferenceError) -> InferenceError {
    InferenceError::NotEvaluableNetwork { message: err.to_string() }
}
