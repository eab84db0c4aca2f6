//! Hexahedral meshes and the node store consumed by domain assembly.
//!
//! Assembly only needs two narrow views of the surrounding mesh: node positions by index
//! ([`NodalPositions`]) and the map from `(node, direction)` to global equation
//! ([`EquationNumbering`]). [`SolidMesh`] is a simple implementation of both.
use crate::element::Hex8Connectivity;
use crate::error::AssemblyError;
use crate::Real;
use nalgebra::{DVector, Point3, Scalar, Vector3};
use serde::{Deserialize, Serialize};

pub mod procedural;

/// Vertices and connectivity of a conforming 8-node hexahedral mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct HexMesh<T: Scalar> {
    vertices: Vec<Point3<T>>,
    connectivity: Vec<Hex8Connectivity>,
}

impl<T: Scalar> HexMesh<T> {
    /// Constructs a mesh from vertices and connectivity.
    ///
    /// Indices are not checked here. Domains check them with
    /// [`UdgHexDomain::validate`](crate::assembly::UdgHexDomain::validate).
    pub fn from_vertices_and_connectivity(vertices: Vec<Point3<T>>, connectivity: Vec<Hex8Connectivity>) -> Self {
        Self { vertices, connectivity }
    }

    pub fn vertices(&self) -> &[Point3<T>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[Hex8Connectivity] {
        &self.connectivity
    }

    pub fn into_parts(self) -> (Vec<Point3<T>>, Vec<Hex8Connectivity>) {
        (self.vertices, self.connectivity)
    }
}

/// Query of node positions by stable node index.
pub trait NodalPositions<T: Scalar> {
    fn num_nodes(&self) -> usize;

    fn reference_position(&self, node: usize) -> Option<Point3<T>>;

    fn current_position(&self, node: usize) -> Option<Point3<T>>;
}

/// Map from `(node, direction)` to a global equation index.
///
/// `None` marks a degree of freedom without equation (prescribed by a Dirichlet condition).
pub trait EquationNumbering {
    fn num_equations(&self) -> usize;

    fn equation(&self, node: usize, direction: usize) -> Option<usize>;
}

/// A node store with displacement state and equation numbering.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidMesh<T: Scalar> {
    vertices: Vec<Point3<T>>,
    displacements: Vec<Vector3<T>>,
    fixed: Vec<[bool; 3]>,
    equations: Vec<[Option<usize>; 3]>,
    num_equations: usize,
}

impl<T: Real> SolidMesh<T> {
    /// Creates an undeformed node store in which every degree of freedom is free.
    pub fn new(vertices: Vec<Point3<T>>) -> Self {
        let n = vertices.len();
        let mut mesh = Self {
            vertices,
            displacements: vec![Vector3::zeros(); n],
            fixed: vec![[false; 3]; n],
            equations: vec![[None; 3]; n],
            num_equations: 0,
        };
        mesh.number_equations();
        mesh
    }

    pub fn vertices(&self) -> &[Point3<T>] {
        &self.vertices
    }

    pub fn displacements(&self) -> &[Vector3<T>] {
        &self.displacements
    }

    pub fn displacement(&self, node: usize) -> Option<&Vector3<T>> {
        self.displacements.get(node)
    }

    /// Mutable access to the displacement of a node, used to prescribe values of fixed
    /// degrees of freedom.
    pub fn displacement_mut(&mut self, node: usize) -> Option<&mut Vector3<T>> {
        self.displacements.get_mut(node)
    }

    pub fn is_fixed(&self, node: usize, direction: usize) -> bool {
        self.fixed
            .get(node)
            .and_then(|flags| flags.get(direction))
            .copied()
            .unwrap_or(false)
    }

    /// Removes the equation of degree of freedom `(node, direction)` and renumbers.
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist or `direction >= 3`.
    pub fn fix(&mut self, node: usize, direction: usize) {
        self.fixed[node][direction] = true;
        self.number_equations();
    }

    /// Fixes the given directions of every node whose reference position satisfies `predicate`.
    ///
    /// Returns the number of affected nodes.
    ///
    /// # Panics
    ///
    /// Panics if a direction is not in `0 .. 3`.
    pub fn fix_where(&mut self, predicate: impl Fn(&Point3<T>) -> bool, directions: &[usize]) -> usize {
        let mut count = 0;
        for (vertex, flags) in self.vertices.iter().zip(&mut self.fixed) {
            if predicate(vertex) {
                for &d in directions {
                    flags[d] = true;
                }
                count += 1;
            }
        }
        self.number_equations();
        count
    }

    /// Assigns consecutive equation indices to all free degrees of freedom, node by node.
    ///
    /// Returns the number of equations.
    pub fn number_equations(&mut self) -> usize {
        let mut next = 0;
        for (flags, equations) in self.fixed.iter().zip(&mut self.equations) {
            for d in 0..3 {
                equations[d] = if flags[d] {
                    None
                } else {
                    next += 1;
                    Some(next - 1)
                };
            }
        }
        self.num_equations = next;
        next
    }

    /// Overwrites the displacements of all free degrees of freedom from a vector of equation
    /// values. Prescribed displacements are left untouched.
    pub fn set_displacements_from_equations(&mut self, u: &DVector<T>) -> Result<(), AssemblyError> {
        self.update_free_displacements(u, |_, value| value)
    }

    /// Adds an increment, given per equation, to the displacements of the free degrees of
    /// freedom.
    pub fn add_displacements_from_equations(&mut self, du: &DVector<T>) -> Result<(), AssemblyError> {
        self.update_free_displacements(du, |current, increment| current + increment)
    }

    /// Displacements of the free degrees of freedom, one entry per equation.
    pub fn equation_displacements(&self) -> DVector<T> {
        let mut u = DVector::zeros(self.num_equations);
        for (equations, displacement) in self.equations.iter().zip(&self.displacements) {
            for d in 0..3 {
                if let Some(eq) = equations[d] {
                    u[eq] = displacement[d];
                }
            }
        }
        u
    }

    fn update_free_displacements(
        &mut self,
        values: &DVector<T>,
        update: impl Fn(T, T) -> T,
    ) -> Result<(), AssemblyError> {
        if values.len() != self.num_equations {
            return Err(AssemblyError::DimensionMismatch {
                expected: self.num_equations,
                actual: values.len(),
            });
        }
        for (equations, displacement) in self.equations.iter().zip(&mut self.displacements) {
            for d in 0..3 {
                if let Some(eq) = equations[d] {
                    displacement[d] = update(displacement[d], values[eq]);
                }
            }
        }
        Ok(())
    }
}

impl<T: Real> NodalPositions<T> for SolidMesh<T> {
    fn num_nodes(&self) -> usize {
        self.vertices.len()
    }

    fn reference_position(&self, node: usize) -> Option<Point3<T>> {
        self.vertices.get(node).copied()
    }

    fn current_position(&self, node: usize) -> Option<Point3<T>> {
        Some(self.vertices.get(node)? + self.displacements.get(node)?)
    }
}

impl<T: Real> EquationNumbering for SolidMesh<T> {
    fn num_equations(&self) -> usize {
        self.num_equations
    }

    fn equation(&self, node: usize, direction: usize) -> Option<usize> {
        *self.equations.get(node)?.get(direction)?
    }
}
