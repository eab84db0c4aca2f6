//! Hexahedral elements: the Hex8 reference element, volume-averaged gradients and the UDG kernel.
use crate::nalgebra::{Point3, Scalar};
use serde::{Deserialize, Serialize};

mod hexahedron;
pub mod udg;

pub use hexahedron::*;

/// Node indices of an 8-node hexahedron.
///
/// The nodes follow the ordering of [`Hex8Element::reference`]: the bottom face
/// `(-1, -1, -1), (1, -1, -1), (1, 1, -1), (-1, 1, -1)` counter-clockwise, followed by the
/// corresponding nodes of the top face.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hex8Connectivity(pub [usize; 8]);

impl Hex8Connectivity {
    pub fn vertex_indices(&self) -> &[usize; 8] {
        &self.0
    }

    /// Collects the vertices of the element, or `None` if an index is out of bounds.
    pub fn element_vertices<T: Scalar + Copy>(&self, vertices: &[Point3<T>]) -> Option<[Point3<T>; 8]> {
        let mut result = [*vertices.get(self.0[0])?; 8];
        for (v, &idx) in result.iter_mut().zip(&self.0).skip(1) {
            *v = *vertices.get(idx)?;
        }
        Some(result)
    }
}
