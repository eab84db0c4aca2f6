//! Basic procedural mesh generation routines.
use crate::element::Hex8Connectivity;
use crate::mesh::HexMesh;
use crate::Real;
use nalgebra::{convert, Point3};

pub fn create_unit_box_uniform_hex_mesh<T>(cells_per_dim: usize) -> HexMesh<T>
where
    T: Real,
{
    create_rectangular_uniform_hex_mesh(T::one(), 1, 1, 1, cells_per_dim)
}

/// Generates an axis-aligned rectangular uniform three-dimensional hex mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
///
/// The resulting box is given by the set `[0, u * ux] x [0, u * uy] x [0, u * uz]`
/// where u denotes the unit length, ux, uy and uz denote the number of units along each
/// coordinate axis. Vertices are numbered with x running fastest, then y, then z.
pub fn create_rectangular_uniform_hex_mesh<T>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    units_z: usize,
    cells_per_unit: usize,
) -> HexMesh<T>
where
    T: Real,
{
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 || units_z == 0 {
        return HexMesh::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let cell_size = unit_length / convert::<f64, T>(cells_per_unit as f64);
    let coordinate = |i: usize| convert::<f64, T>(i as f64) * cell_size;

    let num_cells = [units_x, units_y, units_z].map(|units| units * cells_per_unit);
    let [nx, ny, nz] = num_cells.map(|cells| cells + 1);
    let vertex_index = |i: usize, j: usize, k: usize| (nx * ny) * k + nx * j + i;

    let mut vertices = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                vertices.push(Point3::new(coordinate(i), coordinate(j), coordinate(k)));
            }
        }
    }

    let mut cells = Vec::with_capacity(num_cells.iter().product());
    for k in 0..num_cells[2] {
        for j in 0..num_cells[1] {
            for i in 0..num_cells[0] {
                let idx = &vertex_index;
                cells.push(Hex8Connectivity([
                    idx(i, j, k),
                    idx(i + 1, j, k),
                    idx(i + 1, j + 1, k),
                    idx(i, j + 1, k),
                    idx(i, j, k + 1),
                    idx(i + 1, j, k + 1),
                    idx(i + 1, j + 1, k + 1),
                    idx(i, j + 1, k + 1),
                ]));
            }
        }
    }

    HexMesh::from_vertices_and_connectivity(vertices, cells)
}
