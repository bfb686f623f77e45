//! network.rs
//! The mutable network the elimination algorithms operate on: nodes owning
//! one variable and its attached potentials, plus directed/undirected links.

use super::variable::Variable;
use crate::error::InferenceError;
use crate::potential::{Potential, Role};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A unique, stable identifier for a node within the network.
///
/// This is a type alias for `petgraph::graph::NodeIndex`. Stable indices are
/// required because variable elimination removes nodes continuously and
/// heuristics hold on to ids across removals.
pub type NodeId = NodeIndex;

/// Edge payload. An undirected link is stored once; its endpoint order
/// carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Directed,
    Undirected,
}

#[derive(Debug, Clone)]
struct NodeData {
    variable: Variable,
    potentials: Vec<Potential>,
}

/// A network of chance/decision variables with attached potentials.
///
/// `Network` is `Clone`: [`crate::elimination::MinimalFillIn`] keeps a
/// private copy whose topology it mutates as elimination proceeds, and the
/// strategy-tree builder evaluates restricted copies per candidate decision.
#[derive(Debug, Clone, Default)]
pub struct Network {
    graph: StableDiGraph<NodeData, LinkKind>,
    index: HashMap<Variable, NodeId>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, variable: Variable) -> NodeId {
        let id = self.graph.add_node(NodeData {
            variable: variable.clone(),
            potentials: Vec::new(),
        });
        self.index.insert(variable, id);
        id
    }

    pub fn attach_potential(&mut self, id: NodeId, potential: Potential) {
        if let Some(data) = self.graph.node_weight_mut(id) {
            data.potentials.push(potential);
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    pub fn variable(&self, id: NodeId) -> Option<&Variable> {
        self.graph.node_weight(id).map(|d| &d.variable)
    }

    pub fn get_node(&self, variable: &Variable) -> Option<NodeId> {
        self.index.get(variable).copied()
    }

    /// True when any link, of either kind and either orientation, joins `a` and `b`.
    pub fn adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.graph.edges_connecting(a, b).next().is_some()
            || self.graph.edges_connecting(b, a).next().is_some()
    }

    /// Adds a link between `a` and `b`. Adding a link that already exists is
    /// a no-op, which keeps [`Network::marry`] idempotent.
    pub fn add_link(&mut self, a: NodeId, b: NodeId, directed: bool) {
        let kind = if directed { LinkKind::Directed } else { LinkKind::Undirected };
        let exists = self
            .graph
            .edges_connecting(a, b)
            .any(|e| *e.weight() == kind)
            || (!directed
                && self
                    .graph
                    .edges_connecting(b, a)
                    .any(|e| *e.weight() == kind));
        if !exists {
            self.graph.add_edge(a, b, kind);
        }
    }

    pub fn remove_link(&mut self, a: NodeId, b: NodeId, directed: bool) {
        let kind = if directed { LinkKind::Directed } else { LinkKind::Undirected };
        let mut found: Option<petgraph::graph::EdgeIndex> = None;
        for e in self.graph.edges_connecting(a, b) {
            if *e.weight() == kind {
                found = Some(e.id());
                break;
            }
        }
        if found.is_none() && !directed {
            for e in self.graph.edges_connecting(b, a) {
                if *e.weight() == kind {
                    found = Some(e.id());
                    break;
                }
            }
        }
        if let Some(edge) = found {
            self.graph.remove_edge(edge);
        }
    }

    /// Removes a node together with all its incident links.
    ///
    /// petgraph's stable graph drops the incident edges with the node, so the
    /// removal is atomic from the caller's point of view.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Variable> {
        let data = self.graph.remove_node(id)?;
        self.index.remove(&data.variable);
        Some(data.variable)
    }

    /// Fully connects a set of nodes with undirected links (the "marriage"
    /// step of moralization and of fill-in bookkeeping).
    pub fn marry(&mut self, nodes: &[NodeId]) {
        for (i, &a) in nodes.iter().enumerate() {
            for &b in &nodes[i + 1..] {
                if !self.adjacent(a, b) {
                    self.add_link(a, b, false);
                }
            }
        }
    }

    /// All nodes adjacent to `id` via any link, in deterministic order.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for n in self.graph.neighbors_undirected(id) {
            if seen.insert(n) {
                out.push(n);
            }
        }
        out
    }

    /// Nodes joined to `id` by an undirected link.
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for dir in [Direction::Outgoing, Direction::Incoming] {
            for e in self.graph.edges_directed(id, dir) {
                if *e.weight() == LinkKind::Undirected {
                    let other = if e.source() == id { e.target() } else { e.source() };
                    if seen.insert(other) {
                        out.push(other);
                    }
                }
            }
        }
        out
    }

    pub fn sibling_count(&self, id: NodeId) -> usize {
        self.siblings(id).len()
    }

    /// Parents of `id` via directed links.
    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for e in self.graph.edges_directed(id, Direction::Incoming) {
            if *e.weight() == LinkKind::Directed {
                out.push(e.source());
            }
        }
        out
    }

    /// Children of `id` via directed links.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for e in self.graph.edges_directed(id, Direction::Outgoing) {
            if *e.weight() == LinkKind::Directed {
                out.push(e.target());
            }
        }
        out
    }

    /// Enters evidence: every attached potential mentioning `variable` is
    /// restricted to `state`, then the variable's node is removed.
    pub fn observe(&mut self, variable: &Variable, state: usize) -> Result<(), InferenceError> {
        let ids: Vec<NodeId> = self.graph.node_indices().collect();
        for id in ids {
            if let Some(data) = self.graph.node_weight_mut(id) {
                let mut restricted = Vec::with_capacity(data.potentials.len());
                for p in data.potentials.drain(..) {
                    if p.contains(variable) {
                        restricted.push(p.restrict(variable, state)?);
                    } else {
                        restricted.push(p);
                    }
                }
                data.potentials = restricted;
            }
        }
        if let Some(id) = self.get_node(variable) {
            self.remove_node(id);
        }
        Ok(())
    }

    /// Potentials currently attached to a node.
    pub fn potentials(&self, id: NodeId) -> &[Potential] {
        self.graph
            .node_weight(id)
            .map(|d| d.potentials.as_slice())
            .unwrap_or(&[])
    }

    /// Probability-role potentials attached to `variable`'s node.
    pub fn prob_potentials(&self, variable: &Variable) -> Vec<&Potential> {
        match self.get_node(variable).and_then(|id| self.graph.node_weight(id)) {
            Some(data) => data
                .potentials
                .iter()
                .filter(|p| p.role() == Role::Probability)
                .collect(),
            None => Vec::new(),
        }
    }

    /// All attached potentials, anywhere in the network, whose variable list
    /// mentions `variable`.
    pub fn potentials_mentioning(&self, variable: &Variable) -> Vec<&Potential> {
        let mut out = Vec::new();
        for id in self.graph.node_indices() {
            if let Some(data) = self.graph.node_weight(id) {
                for p in &data.potentials {
                    if p.variables().contains(variable) {
                        out.push(p);
                    }
                }
            }
        }
        out
    }

    /// Drains every attached potential out of the network. The elimination
    /// engine owns the working potential set; nodes keep only topology.
    pub fn take_all_potentials(&mut self) -> Vec<Potential> {
        let mut out = Vec::new();
        let ids: Vec<NodeId> = self.graph.node_indices().collect();
        for id in ids {
            if let Some(data) = self.graph.node_weight_mut(id) {
                out.append(&mut data.potentials);
            }
        }
        out
    }

    /// Moralizes the network: marries the parents of every node, then turns
    /// every directed link undirected. Standard preprocessing before
    /// elimination on a directed model.
    pub fn moralize(&mut self) {
        let ids: Vec<NodeId> = self.graph.node_indices().collect();
        for id in &ids {
            let parents = self.parents(*id);
            if parents.len() > 1 {
                self.marry(&parents);
            }
        }
        let edges: Vec<petgraph::graph::EdgeIndex> = self.graph.edge_indices().collect();
        for e in edges {
            if let Some(w) = self.graph.edge_weight_mut(e) {
                *w = LinkKind::Undirected;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::potential::TablePotential;

    fn chain3() -> (Network, NodeId, NodeId, NodeId) {
        // A -> B -> C
        let mut net = Network::new();
        let a = net.add_variable(Variable::binary("A"));
        let b = net.add_variable(Variable::binary("B"));
        let c = net.add_variable(Variable::binary("C"));
        net.add_link(a, b, true);
        net.add_link(b, c, true);
        (net, a, b, c)
    }

    #[test]
    fn test_neighbors_and_siblings_distinguish_link_kinds() {
        let (mut net, a, b, c) = chain3();
        assert_eq!(net.neighbors(b).len(), 2);
        assert_eq!(net.siblings(b).len(), 0, "directed links are not sibling links");

        net.moralize();
        assert_eq!(net.siblings(b).len(), 2);
        assert!(!net.adjacent(a, c), "chain moralization adds no A-C link");
    }

    #[test]
    fn test_moralize_marries_parents() {
        // A -> C <- B (v-structure)
        let mut net = Network::new();
        let a = net.add_variable(Variable::binary("A"));
        let b = net.add_variable(Variable::binary("B"));
        let c = net.add_variable(Variable::binary("C"));
        net.add_link(a, c, true);
        net.add_link(b, c, true);

        net.moralize();
        assert!(net.adjacent(a, b), "co-parents must be married");
        assert_eq!(net.sibling_count(c), 2);
    }

    #[test]
    fn test_remove_node_drops_incident_links_atomically() {
        let (mut net, a, b, c) = chain3();
        let removed = net.remove_node(b).unwrap();
        assert_eq!(removed.name(), "B");
        assert_eq!(net.node_count(), 2);
        assert!(!net.adjacent(a, c));
        assert!(net.get_node(&removed).is_none());
    }

    #[test]
    fn test_potential_queries() {
        let (mut net, na, nb, _c) = chain3();
        let a = net.variable(na).unwrap().clone();
        let b = net.variable(nb).unwrap().clone();

        net.attach_potential(
            na,
            Potential::Table(TablePotential::filled([a.clone()], Role::Probability, 0.5)),
        );
        net.attach_potential(
            nb,
            Potential::Table(TablePotential::filled(
                [a.clone(), b.clone()],
                Role::Utility,
                1.0,
            )),
        );

        assert_eq!(net.prob_potentials(&a).len(), 1);
        assert_eq!(net.prob_potentials(&b).len(), 0, "utility role is filtered out");
        assert_eq!(net.potentials_mentioning(&a).len(), 2);
        assert_eq!(net.potentials_mentioning(&b).len(), 1);
    }

    #[test]
    fn test_remove_link() {
        let (mut net, a, b, _c) = chain3();
        assert!(net.adjacent(a, b));
        net.remove_link(a, b, true);
        assert!(!net.adjacent(a, b));
    }

    #[test]
    fn test_marry_is_idempotent() {
        let (mut net, a, b, c) = chain3();
        net.marry(&[a, b, c]);
        net.marry(&[a, b, c]);
        // 2 original directed links + 1 new undirected A-C; A-B and B-C were
        // already adjacent so marry adds nothing for them.
        assert_eq!(net.siblings(a).len(), 1);
        assert_eq!(net.siblings(c).len(), 1);
    }
}
