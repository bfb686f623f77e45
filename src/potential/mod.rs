//! Potentials: numeric/symbolic functions over a set of variables.
//!
//! A potential's variable list is fixed at construction; combination,
//! marginalization, and restriction always produce a new potential. The
//! combining operator is determined by the roles involved, not by the
//! representation.

pub mod registry;
pub mod table;
pub mod tree;

pub use registry::{PotentialRegistry, TypeParams};
pub use table::TablePotential;
pub use tree::TreeDecision;

use crate::error::InferenceError;
use crate::graph::Variable;
use serde::{Deserialize, Serialize};

/// What the numbers in a potential mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Probability,
    Utility,
    /// An optimal-policy artifact produced by maximization. Policies are
    /// results, not operands: combining one is a role error.
    Policy,
}

/// Cell-wise operator applied during combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CombineOp {
    Multiply,
    Add,
}

impl CombineOp {
    #[inline(always)]
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            CombineOp::Multiply => a * b,
            CombineOp::Add => a + b,
        }
    }
}

/// Role arbitration for `combine`.
///
/// Probability distributes over utility (expected-utility weighting), so a
/// mixed pair multiplies into a utility. Two utilities never combine
/// implicitly: summation must be requested through [`Potential::sum`].
fn combined_role(left: Role, right: Role) -> Result<(Role, CombineOp), InferenceError> {
    match (left, right) {
        (Role::Probability, Role::Probability) => Ok((Role::Probability, CombineOp::Multiply)),
        (Role::Probability, Role::Utility) | (Role::Utility, Role::Probability) => {
            Ok((Role::Utility, CombineOp::Multiply))
        }
        _ => Err(InferenceError::IncompatibleRoles { left, right }),
    }
}

/// The argmax side table recorded when a decision variable is maxed out:
/// one chosen state index per configuration of the conditioning variables.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPolicy {
    pub decision: Variable,
    pub conditioning: Vec<Variable>,
    pub choice: Vec<usize>,
}

/// A potential in one of the registered representations.
///
/// Cross-representation operations lower trees to tables; the numeric
/// semantics are identical either way.
#[derive(Debug, Clone)]
pub enum Potential {
    Table(TablePotential),
    Tree(TreeDecision),
}

impl Potential {
    pub fn variables(&self) -> &[Variable] {
        match self {
            Potential::Table(t) => t.variables(),
            Potential::Tree(t) => t.variables(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Potential::Table(t) => t.role(),
            Potential::Tree(t) => t.role(),
        }
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.variables().contains(variable)
    }

    /// Size of the joint state space this potential ranges over.
    pub fn table_size(&self) -> usize {
        self.variables().iter().map(Variable::cardinality).product()
    }

    fn to_table(&self) -> TablePotential {
        match self {
            Potential::Table(t) => t.clone(),
            Potential::Tree(t) => t.to_table(),
        }
    }

    /// Combines two potentials over the union of their variables. The
    /// operator follows the roles: probabilities multiply, a probability
    /// weights a utility, and everything else is a role error.
    pub fn combine(&self, other: &Potential) -> Result<Potential, InferenceError> {
        let (role, op) = combined_role(self.role(), other.role())?;
        let result = self.to_table().combine_with(&other.to_table(), role, op);
        Ok(Potential::Table(result))
    }

    /// The explicit sum policy for utility potentials.
    pub fn sum(&self, other: &Potential) -> Result<Potential, InferenceError> {
        if self.role() != Role::Utility || other.role() != Role::Utility {
            return Err(InferenceError::IncompatibleRoles {
                left: self.role(),
                right: other.role(),
            });
        }
        let result = self
            .to_table()
            .combine_with(&other.to_table(), Role::Utility, CombineOp::Add);
        Ok(Potential::Table(result))
    }

    /// Removes `variable` by summation.
    pub fn marginalize(&self, variable: &Variable) -> Result<Potential, InferenceError> {
        Ok(Potential::Table(self.to_table().marginalize(variable)?))
    }

    /// Removes `variable` by maximization, recording the argmax as an
    /// optimal-policy side table.
    pub fn maximize(
        &self,
        variable: &Variable,
    ) -> Result<(Potential, DecisionPolicy), InferenceError> {
        let (table, policy) = self.to_table().maximize(variable)?;
        Ok((Potential::Table(table), policy))
    }

    /// Projects `variable` onto one observed state.
    pub fn restrict(
        &self,
        variable: &Variable,
        state: usize,
    ) -> Result<Potential, InferenceError> {
        match self {
            Potential::Table(t) => Ok(Potential::Table(t.restrict(variable, state)?)),
            // Trees restrict natively: branch pruning, no table blow-up.
            Potential::Tree(t) => Ok(Potential::Tree(t.restrict(variable, state)?)),
        }
    }

    /// The value of a zero-variable potential.
    pub fn scalar_value(&self) -> Option<f64> {
        match self {
            Potential::Table(t) => t.scalar_value(),
            Potential::Tree(t) => t.scalar_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prob(var: &Variable, values: Vec<f64>) -> Potential {
        Potential::Table(TablePotential::new([var.clone()], Role::Probability, values).unwrap())
    }

    #[test]
    fn test_combining_two_utilities_requires_explicit_sum() {
        let x = Variable::binary("X");
        let u1 = Potential::Table(TablePotential::filled([x.clone()], Role::Utility, 1.0));
        let u2 = Potential::Table(TablePotential::filled([x.clone()], Role::Utility, 2.0));

        assert_eq!(
            u1.combine(&u2).unwrap_err(),
            InferenceError::IncompatibleRoles { left: Role::Utility, right: Role::Utility }
        );

        let summed = u1.sum(&u2).unwrap();
        assert_eq!(summed.role(), Role::Utility);
        assert!(summed.scalar_value().is_none());
        if let Potential::Table(t) = &summed {
            assert_eq!(t.values(), &[3.0, 3.0]);
        }
    }

    #[test]
    fn test_probability_weights_utility() {
        let x = Variable::binary("X");
        let p = prob(&x, vec![0.25, 0.75]);
        let u = Potential::Table(
            TablePotential::new([x.clone()], Role::Utility, vec![100.0, 20.0]).unwrap(),
        );
        let eu = p.combine(&u).unwrap();
        assert_eq!(eu.role(), Role::Utility);
        let total = eu.marginalize(&x).unwrap();
        assert!((total.scalar_value().unwrap() - (0.25 * 100.0 + 0.75 * 20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_combination_is_order_independent() {
        // Three overlapping potentials; every fold order must agree.
        let x = Variable::binary("X");
        let y = Variable::chance("Y", ["y0", "y1", "y2"]);
        let z = Variable::binary("Z");

        let px = prob(&x, vec![0.4, 0.6]);
        let pyx = Potential::Table(
            TablePotential::new(
                [x.clone(), y.clone()],
                Role::Probability,
                vec![0.2, 0.3, 0.5, 0.1, 0.8, 0.1],
            )
            .unwrap(),
        );
        let pzy = Potential::Table(
            TablePotential::new(
                [y.clone(), z.clone()],
                Role::Probability,
                vec![0.9, 0.1, 0.4, 0.6, 0.25, 0.75],
            )
            .unwrap(),
        );

        let orders: Vec<Potential> = vec![
            px.combine(&pyx).unwrap().combine(&pzy).unwrap(),
            pyx.combine(&pzy).unwrap().combine(&px).unwrap(),
            pzy.combine(&px).unwrap().combine(&pyx).unwrap(),
        ];

        // Compare by evaluating every joint configuration through restriction.
        let reference = &orders[0];
        for candidate in &orders[1..] {
            for xs in 0..2 {
                for ys in 0..3 {
                    for zs in 0..2 {
                        let a = reference
                            .restrict(&x, xs)
                            .and_then(|p| p.restrict(&y, ys))
                            .and_then(|p| p.restrict(&z, zs))
                            .unwrap()
                            .scalar_value()
                            .unwrap();
                        let b = candidate
                            .restrict(&x, xs)
                            .and_then(|p| p.restrict(&y, ys))
                            .and_then(|p| p.restrict(&z, zs))
                            .unwrap()
                            .scalar_value()
                            .unwrap();
                        assert!((a - b).abs() < 1e-9, "fold orders disagree at ({xs},{ys},{zs})");
                    }
                }
            }
        }
    }
}
