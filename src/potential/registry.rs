//! registry.rs
//! An explicit registry of constructible potential representations: type
//! identifier -> factory closure + validator closure. Populated by explicit
//! registration calls, no runtime discovery.

use super::{Potential, Role, TablePotential, TreeDecision};
use crate::error::InferenceError;
use crate::graph::{Network, NodeId, Variable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extra, per-type construction parameters. Types that need none ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParams {
    /// Cycle length for time-sliced representations: the number of slices
    /// after which the temporal pattern repeats.
    pub cycle_length: Option<u32>,
}

type Constructor =
    Box<dyn Fn(&[Variable], Role, &TypeParams) -> Result<Potential, InferenceError> + Send + Sync>;
type Validator = Box<dyn Fn(&[Variable], Role) -> bool + Send + Sync>;

struct RegistryEntry {
    constructor: Constructor,
    validator: Validator,
}

/// Maps potential-type identifiers to construction and validation closures.
///
/// External callers (a network editor, typically) use
/// [`PotentialRegistry::applicable_types`] to offer the representations a
/// node can switch to, then [`PotentialRegistry::create`] to build one.
#[derive(Default)]
pub struct PotentialRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl PotentialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in representations registered:
    /// `"table"`, `"tree"`, and `"sliced-table"`.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();

        registry.register(
            "table",
            Box::new(|variables, role, _| {
                check_domains("table", variables)?;
                Ok(Potential::Table(default_table(variables, role)))
            }),
            Box::new(|variables, _| variables.iter().all(|v| v.cardinality() > 0)),
        );

        registry.register(
            "tree",
            Box::new(|variables, role, _| {
                check_domains("tree", variables)?;
                let value = default_fill(variables, role);
                Ok(Potential::Tree(TreeDecision::uniform(
                    variables.iter().cloned(),
                    role,
                    value,
                )))
            }),
            Box::new(|variables, _| variables.iter().all(|v| v.cardinality() > 0)),
        );

        registry.register(
            "sliced-table",
            Box::new(|variables, role, params| {
                check_domains("sliced-table", variables)?;
                let cycle = params.cycle_length.ok_or_else(|| InferenceError::Construction {
                    type_id: "sliced-table".to_string(),
                    message: "cycle_length parameter is required".to_string(),
                })?;
                for v in variables {
                    match v.time_slice() {
                        Some(slice) if slice < cycle => {}
                        _ => {
                            return Err(InferenceError::Construction {
                                type_id: "sliced-table".to_string(),
                                message: format!(
                                    "variable '{}' is not temporal or lies outside cycle length {}",
                                    v.name(),
                                    cycle
                                ),
                            })
                        }
                    }
                }
                Ok(Potential::Table(default_table(variables, role)))
            }),
            Box::new(|variables, _| {
                !variables.is_empty() && variables.iter().all(|v| v.time_slice().is_some())
            }),
        );

        registry
    }

    pub fn register(
        &mut self,
        type_id: impl Into<String>,
        constructor: Constructor,
        validator: Validator,
    ) {
        self.entries
            .insert(type_id.into(), RegistryEntry { constructor, validator });
    }

    pub fn is_registered(&self, type_id: &str) -> bool {
        self.entries.contains_key(type_id)
    }

    /// Constructs a potential of the registered type over `variables`.
    pub fn create(
        &self,
        type_id: &str,
        variables: &[Variable],
        role: Role,
        params: &TypeParams,
    ) -> Result<Potential, InferenceError> {
        let entry = self
            .entries
            .get(type_id)
            .ok_or_else(|| InferenceError::UnknownType { type_id: type_id.to_string() })?;
        (entry.constructor)(variables, role, params)
    }

    /// The registered type ids whose validator accepts the node's current
    /// potential variables and role. A node with no attached potential is
    /// judged by its own variable under the probability role.
    pub fn applicable_types(&self, network: &Network, node: NodeId) -> Vec<String> {
        let attached = network.potentials(node).first();
        let owned: Vec<Variable>;
        let (variables, role): (&[Variable], Role) = match attached {
            Some(p) => (p.variables(), p.role()),
            None => match network.variable(node) {
                Some(v) => {
                    owned = vec![v.clone()];
                    (&owned, Role::Probability)
                }
                None => return Vec::new(),
            },
        };
        self.entries
            .iter()
            .filter(|(_, entry)| (entry.validator)(variables, role))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

fn check_domains(type_id: &str, variables: &[Variable]) -> Result<(), InferenceError> {
    match variables.iter().find(|v| v.cardinality() == 0) {
        Some(v) => Err(InferenceError::Construction {
            type_id: type_id.to_string(),
            message: format!("variable '{}' has an empty domain", v.name()),
        }),
        None => Ok(()),
    }
}

/// New probability tables start uniform; everything else starts at zero.
fn default_fill(variables: &[Variable], role: Role) -> f64 {
    match role {
        Role::Probability => {
            let size: usize = variables.iter().map(Variable::cardinality).product();
            if size > 0 {
                1.0 / size as f64
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

fn default_table(variables: &[Variable], role: Role) -> TablePotential {
    TablePotential::filled(variables.iter().cloned(), role, default_fill(variables, role))
}
