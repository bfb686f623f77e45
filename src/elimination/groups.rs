//! groups.rs
//! The ordered partition of variables into eliminable groups shared by every
//! heuristic. Typical partitions put "no evidence, no observation" variables
//! in an earlier group than normal ones; a heuristic only ever proposes a
//! variable from the last non-empty group.

use crate::graph::Variable;

/// An ordered sequence of disjoint variable groups.
#[derive(Debug, Clone, Default)]
pub struct EliminationGroups {
    groups: Vec<Vec<Variable>>,
}

impl EliminationGroups {
    pub fn new(groups: Vec<Vec<Variable>>) -> Self {
        Self { groups }
    }

    /// A single-group partition over all given variables.
    pub fn single(variables: impl IntoIterator<Item = Variable>) -> Self {
        Self { groups: vec![variables.into_iter().collect()] }
    }

    /// The last non-empty group, if any. Variables are only ever proposed
    /// from here; emptying it advances the cursor to the previous non-empty
    /// group, until none is left.
    pub fn current(&self) -> Option<&[Variable]> {
        self.groups
            .iter()
            .rev()
            .find(|g| !g.is_empty())
            .map(|g| g.as_slice())
    }

    /// Removes `variable` from whichever group holds it. Returns whether it
    /// was present.
    pub fn remove(&mut self, variable: &Variable) -> bool {
        for group in &mut self.groups {
            if let Some(pos) = group.iter().position(|v| v == variable) {
                group.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn is_exhausted(&self) -> bool {
        self.groups.iter().all(|g| g.is_empty())
    }

    /// Total variables left across all groups.
    pub fn remaining(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &Variable> {
        self.groups.iter().flatten()
    }
}
