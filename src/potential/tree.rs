//! tree.rs
//! Tree-structured decision potentials: internal nodes test a variable,
//! branches are labeled by a non-empty subset of its states, leaves hold
//! numbers. Compact when large state regions share one value.

use super::{Role, TablePotential};
use crate::error::InferenceError;
use crate::graph::Variable;
use smallvec::SmallVec;

/// One labeled edge of a split node.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeBranch {
    /// The states of the split variable this branch covers. Never empty.
    pub states: SmallVec<[usize; 4]>,
    pub child: TreeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Leaf(f64),
    Split {
        variable: Variable,
        branches: Vec<TreeBranch>,
    },
}

/// A potential stored as a branch-keyed tree.
///
/// The variable list is fixed at construction. Restriction prunes branches
/// natively; combination and marginalization lower to a dense table first.
#[derive(Debug, Clone)]
pub struct TreeDecision {
    variables: Vec<Variable>,
    role: Role,
    root: TreeNode,
}

impl TreeDecision {
    /// Builds a tree potential, checking that every split tests a declared
    /// variable and that each split's branches partition its domain.
    pub fn new(
        variables: impl IntoIterator<Item = Variable>,
        role: Role,
        root: TreeNode,
    ) -> Result<Self, InferenceError> {
        let variables: Vec<Variable> = variables.into_iter().collect();
        validate_node(&root, &variables)?;
        Ok(Self { variables, role, root })
    }

    /// A single-leaf tree: the same value for every configuration.
    pub fn uniform(variables: impl IntoIterator<Item = Variable>, role: Role, value: f64) -> Self {
        Self {
            variables: variables.into_iter().collect(),
            role,
            root: TreeNode::Leaf(value),
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn scalar_value(&self) -> Option<f64> {
        match (self.variables.is_empty(), &self.root) {
            (true, TreeNode::Leaf(v)) => Some(*v),
            _ => None,
        }
    }

    /// Evaluates the tree at a full configuration, `states` parallel to the
    /// declared variable list.
    pub fn value_at(&self, states: &[usize]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf(v) => return *v,
                TreeNode::Split { variable, branches } => {
                    let pos = self
                        .variables
                        .iter()
                        .position(|v| v == variable)
                        .unwrap_or(0);
                    let state = states[pos];
                    match branches.iter().find(|b| b.states.contains(&state)) {
                        Some(branch) => node = &branch.child,
                        // Validation guarantees coverage; an uncovered state
                        // means the tree was built through the unchecked path.
                        None => return 0.0,
                    }
                }
            }
        }
    }

    /// Lowers the tree to a dense table over the same variables.
    pub fn to_table(&self) -> TablePotential {
        let size: usize = self.variables.iter().map(Variable::cardinality).product();
        let mut values = Vec::with_capacity(size);
        let mut states: SmallVec<[usize; 4]> = SmallVec::from_elem(0, self.variables.len());
        for _ in 0..size {
            values.push(self.value_at(&states));
            // Odometer increment, last variable fastest.
            for k in (0..states.len()).rev() {
                states[k] += 1;
                if states[k] < self.variables[k].cardinality() {
                    break;
                }
                states[k] = 0;
            }
        }
        TablePotential::new(self.variables.iter().cloned(), self.role, values)
            .unwrap_or_else(|_| TablePotential::scalar(self.role, 0.0))
    }

    /// Projects `variable` onto one state by pruning branches. Splits on
    /// `variable` collapse to the covering branch's child; other splits keep
    /// their shape.
    pub fn restrict(
        &self,
        variable: &Variable,
        state: usize,
    ) -> Result<TreeDecision, InferenceError> {
        if !self.variables.contains(variable) {
            return Err(InferenceError::VariableNotPresent {
                variable: variable.name().to_string(),
            });
        }
        let variables: Vec<Variable> =
            self.variables.iter().filter(|v| *v != variable).cloned().collect();
        let root = restrict_node(&self.root, variable, state);
        Ok(TreeDecision { variables, role: self.role, root })
    }
}

fn restrict_node(node: &TreeNode, variable: &Variable, state: usize) -> TreeNode {
    match node {
        TreeNode::Leaf(v) => TreeNode::Leaf(*v),
        TreeNode::Split { variable: split_var, branches } => {
            if split_var == variable {
                match branches.iter().find(|b| b.states.contains(&state)) {
                    Some(branch) => restrict_node(&branch.child, variable, state),
                    None => TreeNode::Leaf(0.0),
                }
            } else {
                TreeNode::Split {
                    variable: split_var.clone(),
                    branches: branches
                        .iter()
                        .map(|b| TreeBranch {
                            states: b.states.clone(),
                            child: restrict_node(&b.child, variable, state),
                        })
                        .collect(),
                }
            }
        }
    }
}

fn validate_node(node: &TreeNode, variables: &[Variable]) -> Result<(), InferenceError> {
    match node {
        TreeNode::Leaf(_) => Ok(()),
        TreeNode::Split { variable, branches } => {
            if !variables.contains(variable) {
                return Err(InferenceError::Construction {
                    type_id: "tree".to_string(),
                    message: format!("split on undeclared variable '{}'", variable.name()),
                });
            }
            let mut covered = vec![false; variable.cardinality()];
            for branch in branches {
                if branch.states.is_empty() {
                    return Err(InferenceError::Construction {
                        type_id: "tree".to_string(),
                        message: format!("empty branch label under '{}'", variable.name()),
                    });
                }
                for &s in &branch.states {
                    if s >= covered.len() || covered[s] {
                        return Err(InferenceError::Construction {
                            type_id: "tree".to_string(),
                            message: format!(
                                "state {} of '{}' out of range or covered twice",
                                s,
                                variable.name()
                            ),
                        });
                    }
                    covered[s] = true;
                }
                validate_node(&branch.child, variables)?;
            }
            if covered.iter().any(|c| !c) {
                return Err(InferenceError::Construction {
                    type_id: "tree".to_string(),
                    message: format!("branches under '{}' do not cover the domain", variable.name()),
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(variable: &Variable, branches: Vec<(Vec<usize>, TreeNode)>) -> TreeNode {
        TreeNode::Split {
            variable: variable.clone(),
            branches: branches
                .into_iter()
                .map(|(states, child)| TreeBranch { states: SmallVec::from_vec(states), child })
                .collect(),
        }
    }

    #[test]
    fn test_tree_to_table_matches_branch_structure() {
        let a = Variable::binary("A");
        let b = Variable::chance("B", ["b0", "b1", "b2"]);
        // A=0 -> 1.0 everywhere; A=1 -> split on B: {b0,b1} -> 2.0, {b2} -> 5.0
        let tree = TreeDecision::new(
            [a.clone(), b.clone()],
            Role::Utility,
            split(
                &a,
                vec![
                    (vec![0], TreeNode::Leaf(1.0)),
                    (
                        vec![1],
                        split(&b, vec![(vec![0, 1], TreeNode::Leaf(2.0)), (vec![2], TreeNode::Leaf(5.0))]),
                    ),
                ],
            ),
        )
        .unwrap();

        let table = tree.to_table();
        assert_eq!(table.size(), 6);
        assert_eq!(table.values(), &[1.0, 1.0, 1.0, 2.0, 2.0, 5.0]);
    }

    #[test]
    fn test_restrict_prunes_split() {
        let a = Variable::binary("A");
        let b = Variable::binary("B");
        let tree = TreeDecision::new(
            [a.clone(), b.clone()],
            Role::Probability,
            split(
                &a,
                vec![
                    (vec![0], TreeNode::Leaf(0.2)),
                    (vec![1], split(&b, vec![(vec![0], TreeNode::Leaf(0.6)), (vec![1], TreeNode::Leaf(0.4))])),
                ],
            ),
        )
        .unwrap();

        let restricted = tree.restrict(&a, 1).unwrap();
        assert_eq!(restricted.variables(), &[b.clone()]);
        assert_eq!(restricted.to_table().values(), &[0.6, 0.4]);

        let constant = tree.restrict(&a, 0).unwrap();
        assert!(matches!(constant.root(), TreeNode::Leaf(v) if *v == 0.2));
    }

    #[test]
    fn test_validation_rejects_gaps_and_overlaps() {
        let a = Variable::chance("A", ["a0", "a1", "a2"]);
        let gap = TreeDecision::new(
            [a.clone()],
            Role::Probability,
            split(&a, vec![(vec![0], TreeNode::Leaf(1.0))]),
        );
        assert!(matches!(gap.unwrap_err(), InferenceError::Construction { .. }));

        let overlap = TreeDecision::new(
            [a.clone()],
            Role::Probability,
            split(&a, vec![(vec![0, 1], TreeNode::Leaf(1.0)), (vec![1, 2], TreeNode::Leaf(2.0))]),
        );
        assert!(matches!(overlap.unwrap_err(), InferenceError::Construction { .. }));
    }

    #[test]
    fn test_uniform_tree_is_constant() {
        let a = Variable::binary("A");
        let tree = TreeDecision::uniform([a], Role::Utility, 3.5);
        assert_eq!(tree.to_table().values(), &[3.5, 3.5]);
    }
}
