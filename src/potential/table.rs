//! table.rs
//! Dense table potentials: a flat value array indexed by a mixed-radix
//! encoding of the variables' state combinations.

use super::{CombineOp, DecisionPolicy, Role};
use crate::error::InferenceError;
use crate::graph::Variable;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Result sizes at or above this use the parallel combine path. The map is
/// element-wise and pure, so both paths produce bit-identical values.
const PAR_COMBINE_THRESHOLD: usize = 1 << 14;

pub(crate) type VariableList = SmallVec<[Variable; 4]>;

/// A dense potential: one `f64` per joint state configuration.
///
/// Layout is row-major with the *last* variable varying fastest. The variable
/// list is fixed at construction; every transformation returns a new table.
#[derive(Debug, Clone)]
pub struct TablePotential {
    variables: VariableList,
    values: Vec<f64>,
    role: Role,
}

impl TablePotential {
    /// Builds a table, enforcing `values.len() == product(cardinalities)`.
    pub fn new(
        variables: impl IntoIterator<Item = Variable>,
        role: Role,
        values: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        let variables: VariableList = variables.into_iter().collect();
        let expected: usize = variables.iter().map(Variable::cardinality).product();
        if values.len() != expected {
            return Err(InferenceError::Construction {
                type_id: "table".to_string(),
                message: format!(
                    "value array has {} entries, joint state space has {}",
                    values.len(),
                    expected
                ),
            });
        }
        Ok(Self { variables, values, role })
    }

    /// A table holding the same value in every cell.
    pub fn filled(
        variables: impl IntoIterator<Item = Variable>,
        role: Role,
        value: f64,
    ) -> Self {
        let variables: VariableList = variables.into_iter().collect();
        let size: usize = variables.iter().map(Variable::cardinality).product();
        Self { variables, values: vec![value; size], role }
    }

    /// A zero-variable table: a single scalar.
    pub fn scalar(role: Role, value: f64) -> Self {
        Self { variables: VariableList::new(), values: vec![value], role }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.variables.contains(variable)
    }

    /// The scalar value of a zero-variable table.
    pub fn scalar_value(&self) -> Option<f64> {
        if self.variables.is_empty() {
            self.values.first().copied()
        } else {
            None
        }
    }

    /// Strides of each variable under the row-major/last-fastest layout.
    fn strides(variables: &[Variable]) -> SmallVec<[usize; 4]> {
        let mut strides: SmallVec<[usize; 4]> = SmallVec::with_capacity(variables.len());
        let mut acc = 1usize;
        for v in variables.iter().rev() {
            strides.push(acc);
            acc *= v.cardinality();
        }
        strides.reverse();
        strides
    }

    /// Flat index of a full state configuration (one index per variable, in
    /// this table's variable order).
    pub fn index_of(&self, states: &[usize]) -> usize {
        let strides = Self::strides(&self.variables);
        states.iter().zip(strides.iter()).map(|(s, st)| s * st).sum()
    }

    /// Inverse of [`TablePotential::index_of`].
    pub fn states_of(&self, mut index: usize) -> SmallVec<[usize; 4]> {
        let mut out: SmallVec<[usize; 4]> = SmallVec::with_capacity(self.variables.len());
        let strides = Self::strides(&self.variables);
        for stride in strides {
            out.push(index / stride);
            index %= stride;
        }
        out
    }

    fn position_of(&self, variable: &Variable) -> Result<usize, InferenceError> {
        self.variables
            .iter()
            .position(|v| v == variable)
            .ok_or_else(|| InferenceError::VariableNotPresent {
                variable: variable.name().to_string(),
            })
    }

    /// Combines two tables over the union of their variables, applying `op`
    /// cell-wise. Role arbitration happens in the caller; this is pure
    /// table algebra.
    pub(crate) fn combine_with(
        &self,
        other: &TablePotential,
        role: Role,
        op: CombineOp,
    ) -> TablePotential {
        let mut variables: VariableList = self.variables.clone();
        for v in &other.variables {
            if !variables.contains(v) {
                variables.push(v.clone());
            }
        }

        let result_strides = Self::strides(&variables);
        let size: usize = variables.iter().map(Variable::cardinality).product();

        // Per result-variable strides into each operand; 0 when the operand
        // does not mention the variable, so absent digits contribute nothing.
        let self_strides = Self::strides(&self.variables);
        let other_strides = Self::strides(&other.variables);
        let stride_into = |table: &TablePotential, strides: &SmallVec<[usize; 4]>| -> SmallVec<[usize; 4]> {
            variables
                .iter()
                .map(|v| {
                    table
                        .variables
                        .iter()
                        .position(|t| t == v)
                        .map(|p| strides[p])
                        .unwrap_or(0)
                })
                .collect()
        };
        let into_self = stride_into(self, &self_strides);
        let into_other = stride_into(other, &other_strides);

        let cardinalities: SmallVec<[usize; 4]> =
            variables.iter().map(Variable::cardinality).collect();
        let cell = |idx: usize| -> f64 {
            let mut rem = idx;
            let mut a = 0usize;
            let mut b = 0usize;
            for k in 0..variables.len() {
                let digit = rem / result_strides[k];
                rem %= result_strides[k];
                debug_assert!(digit < cardinalities[k]);
                a += digit * into_self[k];
                b += digit * into_other[k];
            }
            op.apply(self.values[a], other.values[b])
        };

        let values: Vec<f64> = if size >= PAR_COMBINE_THRESHOLD {
            (0..size).into_par_iter().map(cell).collect()
        } else {
            (0..size).map(cell).collect()
        };

        TablePotential { variables, values, role }
    }

    /// Sums `variable` out of the table.
    pub fn marginalize(&self, variable: &Variable) -> Result<TablePotential, InferenceError> {
        self.project(variable, Projection::Sum).map(|(t, _)| t)
    }

    /// Maxes `variable` out of the table, recording the argmax state per
    /// remaining configuration as an optimal-policy side table.
    pub fn maximize(
        &self,
        variable: &Variable,
    ) -> Result<(TablePotential, DecisionPolicy), InferenceError> {
        let (table, choice) = self.project(variable, Projection::Max)?;
        let policy = DecisionPolicy {
            decision: variable.clone(),
            conditioning: table.variables.to_vec(),
            choice: choice.unwrap_or_default(),
        };
        Ok((table, policy))
    }

    fn project(
        &self,
        variable: &Variable,
        projection: Projection,
    ) -> Result<(TablePotential, Option<Vec<usize>>), InferenceError> {
        let pos = self.position_of(variable)?;
        let mut variables = self.variables.clone();
        variables.remove(pos);

        let result_size: usize = variables.iter().map(Variable::cardinality).product();
        let self_strides = Self::strides(&self.variables);
        let result_strides = Self::strides(&variables);

        let init = match projection {
            Projection::Sum => 0.0,
            Projection::Max => f64::NEG_INFINITY,
        };
        let mut values = vec![init; result_size];
        let mut choice = match projection {
            Projection::Sum => None,
            Projection::Max => Some(vec![0usize; result_size]),
        };

        for (idx, &val) in self.values.iter().enumerate() {
            // Map the source cell to the result cell by dropping `variable`'s digit.
            let mut rem = idx;
            let mut out = 0usize;
            let mut dropped_digit = 0usize;
            let mut k_out = 0usize;
            for (k, stride) in self_strides.iter().enumerate() {
                let digit = rem / stride;
                rem %= stride;
                if k == pos {
                    dropped_digit = digit;
                } else {
                    out += digit * result_strides[k_out];
                    k_out += 1;
                }
            }
            match projection {
                Projection::Sum => values[out] += val,
                Projection::Max => {
                    if val > values[out] {
                        values[out] = val;
                        if let Some(choice) = choice.as_mut() {
                            choice[out] = dropped_digit;
                        }
                    }
                }
            }
        }

        Ok((TablePotential { variables, values, role: self.role }, choice))
    }

    /// Projects `variable` onto a single state, dropping it from the
    /// variable list. Used for evidence.
    pub fn restrict(
        &self,
        variable: &Variable,
        state: usize,
    ) -> Result<TablePotential, InferenceError> {
        let pos = self.position_of(variable)?;
        let mut variables = self.variables.clone();
        variables.remove(pos);

        let self_strides = Self::strides(&self.variables);
        let var_stride = self_strides[pos];
        let card = variable.cardinality();

        let result_size = self.values.len() / card;
        let mut values = Vec::with_capacity(result_size);
        for idx in 0..self.values.len() {
            if (idx / var_stride) % card == state {
                values.push(self.values[idx]);
            }
        }

        Ok(TablePotential { variables, values, role: self.role })
    }

    /// Rescales a probability table so its entries sum to one. A zero-mass
    /// table is left unchanged.
    pub fn normalize(mut self) -> TablePotential {
        let total: f64 = self.values.iter().sum();
        if total > 0.0 {
            for v in &mut self.values {
                *v /= total;
            }
        }
        self
    }
}

#[derive(Clone, Copy)]
enum Projection {
    Sum,
    Max,
}
