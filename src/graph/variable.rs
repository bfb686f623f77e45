//! Defines `Variable`, the immutable identity shared by nodes and potentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Distinguishes random variables from decision variables.
///
/// Utilities are not a kind of variable: they are a [`crate::potential::Role`]
/// carried by the potential attached to a value node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    Chance,
    Decision,
}

#[derive(Debug)]
struct VariableInner {
    name: String,
    states: Vec<String>,
    kind: VariableKind,
    /// Temporal slice index for time-expanded networks. `None` means the
    /// variable is atemporal (treated as slice 0 by temporal heuristics).
    time_slice: Option<u32>,
}

/// A finite-domain variable with identity semantics.
///
/// Two `Variable` values compare equal only when they are clones of the same
/// underlying allocation. Two independently built variables named `"A"` are
/// distinct, which matches how a network editor hands the same object to
/// every potential that mentions it.
#[derive(Debug, Clone)]
pub struct Variable {
    inner: Arc<VariableInner>,
}

impl Variable {
    pub fn chance(name: impl Into<String>, states: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(name, states, VariableKind::Chance, None)
    }

    pub fn decision(name: impl Into<String>, states: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(name, states, VariableKind::Decision, None)
    }

    pub fn new(
        name: impl Into<String>,
        states: impl IntoIterator<Item = impl Into<String>>,
        kind: VariableKind,
        time_slice: Option<u32>,
    ) -> Self {
        Self {
            inner: Arc::new(VariableInner {
                name: name.into(),
                states: states.into_iter().map(Into::into).collect(),
                kind,
                time_slice,
            }),
        }
    }

    /// A convenience constructor for a binary chance variable.
    pub fn binary(name: impl Into<String>) -> Self {
        Self::chance(name, ["false", "true"])
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn states(&self) -> &[String] {
        &self.inner.states
    }

    /// Number of states in the domain.
    pub fn cardinality(&self) -> usize {
        self.inner.states.len()
    }

    pub fn kind(&self) -> VariableKind {
        self.inner.kind
    }

    pub fn is_decision(&self) -> bool {
        self.inner.kind == VariableKind::Decision
    }

    pub fn time_slice(&self) -> Option<u32> {
        self.inner.time_slice
    }

    /// Slice index used for temporal ordering; atemporal variables sort as 0.
    pub fn slice_or_zero(&self) -> u32 {
        self.inner.time_slice.unwrap_or(0)
    }

    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.inner.states.iter().position(|s| s == state)
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Variable {}

impl std::hash::Hash for Variable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality_not_value_equality() {
        let a1 = Variable::binary("A");
        let a2 = Variable::binary("A");
        assert_ne!(a1, a2, "same name must not imply same variable");
        assert_eq!(a1, a1.clone());
    }

    #[test]
    fn test_domain_accessors() {
        let v = Variable::chance("Weather", ["sun", "rain", "snow"]);
        assert_eq!(v.cardinality(), 3);
        assert_eq!(v.state_index("rain"), Some(1));
        assert_eq!(v.state_index("fog"), None);
        assert_eq!(v.slice_or_zero(), 0);
    }
}
