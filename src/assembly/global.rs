//! Scatter of element contributions into global containers.
use crate::element::udg::{ElementMatrix, ElementVector};
use crate::element::Hex8Connectivity;
use crate::error::AssemblyError;
use crate::mesh::EquationNumbering;
use crate::Real;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::{CooMatrix, CsrMatrix, SparseEntryMut};
use std::collections::BTreeSet;

/// A global stiffness matrix that accepts individual `(row, col, value)` contributions.
pub trait StiffnessAccumulator<T> {
    fn nrows(&self) -> usize;

    fn ncols(&self) -> usize;

    /// Adds `value` to the entry at `(row, col)`.
    fn add_entry(&mut self, row: usize, col: usize, value: T) -> Result<(), AssemblyError>;
}

/// Duplicate entries are stored and summed on conversion to a compressed format.
impl<T: Real> StiffnessAccumulator<T> for CooMatrix<T> {
    fn nrows(&self) -> usize {
        CooMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        CooMatrix::ncols(self)
    }

    fn add_entry(&mut self, row: usize, col: usize, value: T) -> Result<(), AssemblyError> {
        if row < CooMatrix::nrows(self) && col < CooMatrix::ncols(self) {
            self.push(row, col, value);
            Ok(())
        } else {
            Err(AssemblyError::MissingMatrixEntry { row, col })
        }
    }
}

/// Entries must be part of the sparsity pattern, see
/// [`UdgHexDomain::stiffness_pattern`](crate::assembly::UdgHexDomain::stiffness_pattern).
impl<T: Real> StiffnessAccumulator<T> for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        CsrMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        CsrMatrix::ncols(self)
    }

    fn add_entry(&mut self, row: usize, col: usize, value: T) -> Result<(), AssemblyError> {
        match self.get_entry_mut(row, col) {
            Some(SparseEntryMut::NonZero(entry)) => {
                *entry += value;
                Ok(())
            }
            _ => Err(AssemblyError::MissingMatrixEntry { row, col }),
        }
    }
}

impl<T: Real> StiffnessAccumulator<T> for DMatrix<T> {
    fn nrows(&self) -> usize {
        DMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        DMatrix::ncols(self)
    }

    fn add_entry(&mut self, row: usize, col: usize, value: T) -> Result<(), AssemblyError> {
        let entry = self
            .get_mut((row, col))
            .ok_or(AssemblyError::MissingMatrixEntry { row, col })?;
        *entry += value;
        Ok(())
    }
}

/// Global equation of every element degree of freedom, in element node order.
pub fn element_equations(
    connectivity: &Hex8Connectivity,
    numbering: &(impl EquationNumbering + ?Sized),
) -> [Option<usize>; 24] {
    let mut equations = [None; 24];
    for (a, &node) in connectivity.vertex_indices().iter().enumerate() {
        for d in 0..3 {
            equations[3 * a + d] = numbering.equation(node, d);
        }
    }
    equations
}

/// Adds `scale * element_vector` into `global` at the given equations.
///
/// Entries without equation are skipped.
pub fn add_element_vector<T: Real>(
    global: &mut DVector<T>,
    equations: &[Option<usize>; 24],
    element_vector: &ElementVector<T>,
    scale: T,
) {
    for (equation, value) in equations.iter().zip(element_vector.iter()) {
        if let Some(eq) = equation {
            global[*eq] += scale * *value;
        }
    }
}

/// Adds every entry of `element_matrix` whose row and column both have an equation.
pub fn add_element_matrix<T: Real>(
    accumulator: &mut (impl StiffnessAccumulator<T> + ?Sized),
    equations: &[Option<usize>; 24],
    element_matrix: &ElementMatrix<T>,
) -> Result<(), AssemblyError> {
    for (i, row) in equations.iter().enumerate() {
        if let Some(row) = row {
            for (j, col) in equations.iter().enumerate() {
                if let Some(col) = col {
                    accumulator.add_entry(*row, *col, element_matrix[(i, j)])?;
                }
            }
        }
    }
    Ok(())
}

/// Builds the CSR sparsity pattern coupling all equations that share an element.
pub fn assemble_pattern(
    num_equations: usize,
    elements: impl IntoIterator<Item = [Option<usize>; 24]>,
) -> SparsityPattern {
    // Collecting into a BTreeSet stores each entry exactly once and yields them sorted by
    // row and then column
    let mut matrix_entries = BTreeSet::new();
    for equations in elements {
        for row in equations.iter().flatten() {
            for col in equations.iter().flatten() {
                matrix_entries.insert((*row, *col));
            }
        }
    }

    let mut offsets = Vec::with_capacity(num_equations + 1);
    let mut column_indices = Vec::with_capacity(matrix_entries.len());
    offsets.push(0);
    for (i, j) in matrix_entries {
        // Runs in a loop to handle consecutive empty rows
        while i + 1 > offsets.len() {
            offsets.push(column_indices.len());
        }
        column_indices.push(j);
    }
    while offsets.len() < num_equations + 1 {
        offsets.push(column_indices.len());
    }

    SparsityPattern::try_from_offsets_and_indices(num_equations, num_equations, offsets, column_indices)
        .expect("offsets and indices of sorted unique entries form a valid pattern")
}
