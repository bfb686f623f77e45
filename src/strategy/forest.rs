//! forest.rs
//! The arena holding every strategy-tree node. Branches store arena indices
//! rather than owned children, which makes structural sharing a matter of
//! two branches holding the same index.
//!
//! Sharing safety does not rely on an incrementally maintained parent set:
//! the number of parents of a subtree is recomputed from the arena's reverse
//! edges whenever a destructive edit is considered, so no dangling-parent
//! state can survive a deep copy.

use crate::graph::Variable;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::debug;

/// Index of a strategy-tree node within its forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u32);

impl TreeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a branch leads to: a terminal utility or a child subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchTarget {
    Leaf(f64),
    Subtree(TreeId),
}

/// One labeled edge: a non-empty set of the parent variable's states and the
/// target they lead to.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyBranch {
    pub states: SmallVec<[usize; 4]>,
    pub target: BranchTarget,
}

/// An internal strategy-tree node: the variable resolved here, the branches
/// for its (optimal) states, and the expected utility achieved below.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyNode {
    pub variable: Variable,
    pub branches: Vec<StrategyBranch>,
    pub utility: f64,
}

/// Names one branch of one node, for grafting operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchRef {
    pub node: TreeId,
    pub branch: usize,
}

/// Structural key for hash-consing. Leaves key on the value's bit pattern so
/// NaN payloads and signed zeros stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    variable: Variable,
    branches: Vec<(Vec<usize>, TargetKey)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum TargetKey {
    Leaf(u64),
    Subtree(TreeId),
}

impl TargetKey {
    fn of(target: BranchTarget) -> Self {
        match target {
            BranchTarget::Leaf(v) => TargetKey::Leaf(v.to_bits()),
            BranchTarget::Subtree(id) => TargetKey::Subtree(id),
        }
    }
}

/// Arena plus coalescence table.
#[derive(Debug, Clone, Default)]
pub struct StrategyForest {
    nodes: Vec<StrategyNode>,
    cons: HashMap<NodeKey, TreeId>,
}

impl StrategyForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: TreeId) -> &StrategyNode {
        &self.nodes[id.index()]
    }

    fn key_of_node(node: &StrategyNode) -> NodeKey {
        let mut branches: Vec<(Vec<usize>, TargetKey)> = node
            .branches
            .iter()
            .map(|b| (b.states.to_vec(), TargetKey::of(b.target)))
            .collect();
        branches.sort();
        NodeKey { variable: node.variable.clone(), branches }
    }

    /// Inserts a node with coalescence: a structurally identical node
    /// already in the forest is reused, so both referring branches end up
    /// holding one shared index.
    pub fn intern(&mut self, mut node: StrategyNode) -> TreeId {
        node.branches.sort_by_key(|b| b.states.iter().min().copied());
        let key = Self::key_of_node(&node);
        if let Some(&existing) = self.cons.get(&key) {
            debug!(id = existing.0, variable = %node.variable, "coalesced identical subtree");
            return existing;
        }
        let id = TreeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.cons.insert(key, id);
        id
    }

    /// Inserts a node without consulting the coalescence table. Used for
    /// copies, which exist precisely to be mutated independently.
    fn add_unshared(&mut self, node: StrategyNode) -> TreeId {
        let id = TreeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Number of branches anywhere in the forest referencing `id`,
    /// recomputed from the arena's reverse edges.
    pub fn parent_count(&self, id: TreeId) -> usize {
        self.nodes
            .iter()
            .flat_map(|n| n.branches.iter())
            .filter(|b| b.target == BranchTarget::Subtree(id))
            .count()
    }

    /// Structural deep clone of `id`. Sharing *within* the copied subtree is
    /// preserved through a per-copy memo; sharing with the rest of the
    /// forest is severed, so the copy starts with no parents.
    pub fn copy(&mut self, id: TreeId) -> TreeId {
        let mut memo: HashMap<TreeId, TreeId> = HashMap::new();
        self.copy_rec(id, &mut memo)
    }

    fn copy_rec(&mut self, id: TreeId, memo: &mut HashMap<TreeId, TreeId>) -> TreeId {
        if let Some(&done) = memo.get(&id) {
            return done;
        }
        let source = self.nodes[id.index()].clone();
        let branches = source
            .branches
            .iter()
            .map(|b| StrategyBranch {
                states: b.states.clone(),
                target: match b.target {
                    BranchTarget::Leaf(v) => BranchTarget::Leaf(v),
                    BranchTarget::Subtree(child) => {
                        BranchTarget::Subtree(self.copy_rec(child, memo))
                    }
                },
            })
            .collect();
        let fresh = self.add_unshared(StrategyNode {
            variable: source.variable,
            branches,
            utility: source.utility,
        });
        memo.insert(id, fresh);
        fresh
    }

    /// Attaches `tree` below the subtree currently referenced by `parent`:
    /// every open `Leaf` branch under it is re-pointed at `tree`.
    ///
    /// If that subtree has parents other than `parent`, it is copied first
    /// and `parent` is re-pointed at the copy, so the aliasing parents keep
    /// the pre-edit structure. With exactly one parent the graft is done
    /// destructively in place (see [`StrategyForest::carefree_concatenate`]).
    ///
    /// Returns the id of the subtree that actually received the graft. A
    /// `parent` branch that is itself a leaf simply becomes `Subtree(tree)`.
    pub fn concatenate(&mut self, parent: BranchRef, tree: TreeId) -> TreeId {
        let target = self.nodes[parent.node.index()].branches[parent.branch].target;
        match target {
            BranchTarget::Leaf(_) => {
                self.invalidate_key(parent.node);
                self.nodes[parent.node.index()].branches[parent.branch].target =
                    BranchTarget::Subtree(tree);
                tree
            }
            BranchTarget::Subtree(attachee) => {
                if self.parent_count(attachee) > 1 {
                    let copied = self.copy(attachee);
                    self.invalidate_key(parent.node);
                    self.nodes[parent.node.index()].branches[parent.branch].target =
                        BranchTarget::Subtree(copied);
                    self.graft(copied, tree);
                    copied
                } else {
                    self.carefree_concatenate(attachee, tree);
                    attachee
                }
            }
        }
    }

    /// Destructive graft: replaces every `Leaf` branch under `subtree` with
    /// `Subtree(tree)`, copying on the way down only where a child is shared
    /// with some other parent. The caller asserts `subtree` itself has at
    /// most one parent.
    pub fn carefree_concatenate(&mut self, subtree: TreeId, tree: TreeId) {
        self.graft(subtree, tree);
    }

    fn graft(&mut self, id: TreeId, tree: TreeId) {
        self.invalidate_key(id);
        let branch_count = self.nodes[id.index()].branches.len();
        for b in 0..branch_count {
            match self.nodes[id.index()].branches[b].target {
                BranchTarget::Leaf(_) => {
                    self.nodes[id.index()].branches[b].target = BranchTarget::Subtree(tree);
                }
                BranchTarget::Subtree(child) => {
                    if child == tree {
                        continue;
                    }
                    let child = if self.parent_count(child) > 1 {
                        let copied = self.copy(child);
                        self.nodes[id.index()].branches[b].target = BranchTarget::Subtree(copied);
                        copied
                    } else {
                        child
                    };
                    self.graft(child, tree);
                }
            }
        }
    }

    /// Drops the coalescence entry for a node about to be mutated in place,
    /// so later interns cannot resurrect its pre-edit shape pointing at the
    /// edited node.
    fn invalidate_key(&mut self, id: TreeId) {
        let key = Self::key_of_node(&self.nodes[id.index()]);
        if self.cons.get(&key) == Some(&id) {
            self.cons.remove(&key);
        }
    }
}
