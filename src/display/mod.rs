//! Text rendering of strategy trees.
//!
//! Shared subtrees are printed once; later references show a `(shared #n)`
//! marker instead of re-expanding, which makes coalescence visible in the
//! output.

use crate::strategy::{BranchTarget, StrategyForest, TreeId};
use std::collections::HashMap;
use std::fmt::Write;

pub fn format_strategy_tree(forest: &StrategyForest, root: BranchTarget) -> String {
    let mut renderer = Renderer {
        forest,
        printed: HashMap::new(),
        output: String::new(),
    };
    let _ = writeln!(renderer.output, "OPTIMAL STRATEGY");
    let _ = writeln!(renderer.output, "----------------");
    renderer.render_target(root, "");
    renderer.output
}

struct Renderer<'a> {
    forest: &'a StrategyForest,
    /// Subtrees already expanded, with the label they were printed under.
    printed: HashMap<TreeId, usize>,
    output: String,
}

impl<'a> Renderer<'a> {
    fn render_target(&mut self, target: BranchTarget, prefix: &str) {
        match target {
            BranchTarget::Leaf(utility) => {
                let _ = writeln!(self.output, "{}= {:.4}", prefix, utility);
            }
            BranchTarget::Subtree(id) => self.render_node(id, prefix),
        }
    }

    fn render_node(&mut self, id: TreeId, prefix: &str) {
        if let Some(&label) = self.printed.get(&id) {
            let _ = writeln!(self.output, "{}-> (shared #{})", prefix, label);
            return;
        }
        let label = self.printed.len() + 1;
        self.printed.insert(id, label);

        let node = self.forest.node(id);
        let _ = writeln!(
            self.output,
            "{}[#{}] {} (EU {:.4})",
            prefix,
            label,
            node.variable.name(),
            node.utility
        );
        for branch in &node.branches {
            let states: Vec<&str> = branch
                .states
                .iter()
                .filter_map(|&s| node.variable.states().get(s))
                .map(String::as_str)
                .collect();
            let _ = writeln!(self.output, "{}  {{{}}}:", prefix, states.join(", "));
            let child_prefix = format!("{}    ", prefix);
            self.render_target(branch.target, &child_prefix);
        }
    }
}
