//! file_order.rs
//! Externally supplied elimination orders: a name list (typically read from
//! a file) matched against the known variables by substring.
//!
//! Unmatched names are ignored but never silently: they are kept as a
//! diagnostic the caller can surface, and logged. Variables the file never
//! names are simply left unordered by this heuristic, so an elimination run
//! driven by it stops once the named variables are gone.

use super::{EliminationGroups, EliminationHeuristic};
use crate::error::InferenceError;
use crate::graph::{Network, Variable};
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct FileElimination {
    /// Matched variables in file order; removal pops from the back, so the
    /// last name in the file is removed first.
    stack: Vec<Variable>,
    unmatched: Vec<String>,
}

impl FileElimination {
    /// Matches `names` against the variables in `groups`. Each name claims,
    /// in group order, every yet-unclaimed variable whose name contains it.
    ///
    /// Fails with [`InferenceError::MalformedExternalOrder`] only when the
    /// order matches nothing at all while variables remain; partial orders
    /// are legitimate.
    pub fn new(names: &[String], groups: &EliminationGroups) -> Result<Self, InferenceError> {
        let mut stack: Vec<Variable> = Vec::new();
        let mut unmatched = Vec::new();

        for name in names {
            let mut hit = false;
            for variable in groups.iter_all() {
                if variable.name().contains(name.as_str()) && !stack.contains(variable) {
                    stack.push(variable.clone());
                    hit = true;
                }
            }
            if !hit {
                warn!(name = %name, "elimination order entry matched no variable");
                unmatched.push(name.clone());
            }
        }

        if stack.is_empty() && groups.remaining() > 0 {
            return Err(InferenceError::MalformedExternalOrder { unmatched });
        }

        Ok(Self { stack, unmatched })
    }

    /// Reads one name per line; blank lines and `#` comments are skipped.
    pub fn from_path(
        path: impl AsRef<Path>,
        groups: &EliminationGroups,
    ) -> Result<Self, InferenceError> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            InferenceError::MalformedExternalOrder {
                unmatched: vec![format!("{}: {e}", path.as_ref().display())],
            }
        })?;
        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self::new(&names, groups)
    }

    /// Order-file entries that matched no variable. Empty for a fully
    /// matched file.
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }
}

impl EliminationHeuristic for FileElimination {
    fn pick_variable(&self, _network: &Network) -> Result<Variable, InferenceError> {
        self.stack
            .last()
            .cloned()
            .ok_or(InferenceError::NoEliminationOrder { remaining: 0 })
    }

    fn on_node_removed(&mut self, variable: &Variable) {
        self.stack.retain(|v| v != variable);
    }

    fn is_exhausted(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn xs() -> (Variable, Variable, Variable) {
        (
            Variable::binary("X1"),
            Variable::binary("X2"),
            Variable::binary("X3"),
        )
    }

    #[test]
    fn test_file_order_is_reversed_and_partial() {
        let (x1, x2, x3) = xs();
        let groups = EliminationGroups::single([x1.clone(), x2.clone(), x3.clone()]);
        let names = vec!["X2".to_string(), "X1".to_string()];
        let mut h = FileElimination::new(&names, &groups).unwrap();
        let net = Network::new();

        assert!(h.unmatched().is_empty());
        // Last name in the file goes first.
        assert_eq!(h.pick_variable(&net).unwrap(), x1);
        h.on_node_removed(&x1);
        assert_eq!(h.pick_variable(&net).unwrap(), x2);
        h.on_node_removed(&x2);
        // X3 was never named: the heuristic is done with it unordered.
        assert!(h.is_exhausted());
    }

    #[test]
    fn test_unmatched_names_are_surfaced_not_swallowed() {
        let (x1, x2, _) = xs();
        let groups = EliminationGroups::single([x1, x2]);
        let names = vec!["X1".to_string(), "Ghost".to_string()];
        let h = FileElimination::new(&names, &groups).unwrap();
        assert_eq!(h.unmatched(), &["Ghost".to_string()]);
    }

    #[test]
    fn test_fully_unmatched_order_fails() {
        let (x1, _, _) = xs();
        let groups = EliminationGroups::single([x1]);
        let names = vec!["Ghost".to_string()];
        let err = FileElimination::new(&names, &groups).unwrap_err();
        assert_eq!(
            err,
            InferenceError::MalformedExternalOrder { unmatched: vec!["Ghost".to_string()] }
        );
    }

    #[test]
    fn test_from_path_skips_comments_and_blanks() {
        let (x1, x2, x3) = xs();
        let groups = EliminationGroups::single([x1, x2.clone(), x3.clone()]);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# elimination order").unwrap();
        writeln!(file, "X3").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  X2  ").unwrap();

        let h = FileElimination::from_path(file.path(), &groups).unwrap();
        let net = Network::new();
        assert_eq!(h.pick_variable(&net).unwrap(), x2);
        assert!(h.unmatched().is_empty());
    }

    #[test]
    fn test_substring_match_claims_every_hit() {
        let (x1, x2, x3) = xs();
        let groups = EliminationGroups::single([x1.clone(), x2.clone(), x3.clone()]);
        let names = vec!["X".to_string()];
        let h = FileElimination::new(&names, &groups).unwrap();
        let net = Network::new();
        // "X" matches all three in group order; X3 is on top of the stack.
        assert_eq!(h.pick_variable(&net).unwrap(), x3);
    }
}
