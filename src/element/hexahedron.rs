use crate::error::{report_value, ElementError};
use crate::nalgebra::{Matrix3, Point3, SMatrix, Scalar, Vector3};
use crate::quadrature::hexahedron_gauss_2x2x2;
use crate::Real;
use itertools::izip;
use numeric_literals::replace_float_literals;

/// Hourglass base vectors of the 8-node hexahedron.
///
/// With the node ordering of [`Hex8Element::reference`], the vectors are the nodal values of
/// `ηζ`, `ξζ`, `ξη` and `ξηζ`. They are orthogonal to the constant and the linear nodal fields
/// of the reference cube, and therefore span the displacement patterns that a one-point
/// integrated element cannot see.
#[rustfmt::skip]
pub const HOURGLASS_BASE_VECTORS: [[f64; 8]; 4] = [
    [ 1.0,  1.0, -1.0, -1.0, -1.0, -1.0,  1.0,  1.0],
    [ 1.0, -1.0, -1.0,  1.0, -1.0,  1.0,  1.0, -1.0],
    [ 1.0, -1.0,  1.0, -1.0,  1.0, -1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0,  1.0,  1.0, -1.0,  1.0, -1.0],
];

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn phi_linear_1d<T: Real>(alpha: T, xi: T) -> T {
    (1.0 + alpha * xi) / 2.0
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn phi_linear_1d_grad<T: Real>(alpha: T) -> T {
    alpha / 2.0
}

/// The trilinear 8-node hexahedron.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Hex8Element<T: Scalar> {
    vertices: [Point3<T>; 8],
}

impl<T> Hex8Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point3<T>; 8]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point3<T>; 8] {
        &self.vertices
    }
}

impl<T> Hex8Element<T>
where
    T: Real,
{
    /// The reference hexahedron `[-1, 1]^3`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn reference() -> Self {
        Self::from_vertices([
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
        ])
    }

    /// Shape function values at the reference coordinates `xi`.
    pub fn evaluate_basis(&self, xi: &Point3<T>) -> SMatrix<T, 1, 8> {
        let reference = Self::reference();
        SMatrix::<T, 1, 8>::from_fn(|_, a| {
            let node = &reference.vertices[a];
            phi_linear_1d(node[0], xi[0]) * phi_linear_1d(node[1], xi[1]) * phi_linear_1d(node[2], xi[2])
        })
    }

    /// Shape function gradients with respect to the reference coordinates, one column per node.
    pub fn gradients(&self, xi: &Point3<T>) -> SMatrix<T, 3, 8> {
        let reference = Self::reference();
        let mut gradients = SMatrix::<T, 3, 8>::zeros();
        for (a, node) in reference.vertices.iter().enumerate() {
            let phi = |d: usize| phi_linear_1d(node[d], xi[d]);
            let grad = |d: usize| phi_linear_1d_grad(node[d]);
            gradients.set_column(
                a,
                &Vector3::new(
                    grad(0) * phi(1) * phi(2),
                    phi(0) * grad(1) * phi(2),
                    phi(0) * phi(1) * grad(2),
                ),
            );
        }
        gradients
    }

    #[allow(non_snake_case)]
    pub fn map_reference_coords(&self, xi: &Point3<T>) -> Point3<T> {
        let X = self.vertex_matrix();
        let N = self.evaluate_basis(xi);
        Point3::from(X * N.transpose())
    }

    /// The Jacobian `∂x/∂ξ` of the map from reference coordinates.
    #[allow(non_snake_case)]
    pub fn reference_jacobian(&self, xi: &Point3<T>) -> Matrix3<T> {
        let X = self.vertex_matrix();
        X * self.gradients(xi).transpose()
    }

    pub fn centroid(&self) -> Point3<T> {
        self.map_reference_coords(&Point3::origin())
    }

    fn vertex_matrix(&self) -> SMatrix<T, 3, 8> {
        SMatrix::<T, 3, 8>::from_fn(|i, a| self.vertices[a][i])
    }
}

/// Volume of the trilinear hexahedron with the given vertices.
///
/// Negative for inverted elements.
pub fn hex_volume<T: Real>(vertices: &[Point3<T>; 8]) -> T {
    let element = Hex8Element::from_vertices(*vertices);
    let (weights, points) = hexahedron_gauss_2x2x2();
    izip!(&weights, &points).fold(T::zero(), |volume, (w, xi)| {
        volume + *w * element.reference_jacobian(xi).determinant()
    })
}

/// Computes the volume-averaged Cartesian shape function gradients
/// $$
/// \vec G_a = \frac{1}{V} \int_{\Omega_e} \nabla N_a \, \mathrm{d}v
/// $$
/// and the volume `V` of the hexahedron with the given vertices.
///
/// The integrand `∇N_a dv` is evaluated through the cofactor of the reference Jacobian, which is
/// polynomial in the reference coordinates, so the 2x2x2 Gauss rule computes both quantities
/// exactly and no Jacobian needs to be inverted. A consequence is that
/// `Σ_a x_a ⊗ G_a = I` for the vertices `x_a` themselves.
///
/// Fails with [`ElementError::InvertedElement`] if the volume is not positive. The reported
/// Jacobian is the smallest determinant of the reference Jacobian at the quadrature points.
pub fn average_cartesian_derivatives<T: Real>(
    vertices: &[Point3<T>; 8],
) -> Result<(SMatrix<T, 3, 8>, T), ElementError> {
    let element = Hex8Element::from_vertices(*vertices);
    let (weights, points) = hexahedron_gauss_2x2x2();

    let mut integrated_gradients = SMatrix::<T, 3, 8>::zeros();
    let mut volume = T::zero();
    let mut min_jacobian = None;
    for (w, xi) in izip!(&weights, &points) {
        let jacobian = element.reference_jacobian(xi);
        let (j0, j1, j2) = (jacobian.column(0), jacobian.column(1), jacobian.column(2));
        // Columns of det(J) J^-T
        let cofactor = Matrix3::from_columns(&[j1.cross(&j2), j2.cross(&j0), j0.cross(&j1)]);
        let det = jacobian.determinant();
        volume += *w * det;
        min_jacobian = Some(min_jacobian.map_or(det, |min: T| min.min(det)));
        integrated_gradients += cofactor * element.gradients(xi) * *w;
    }

    if volume > T::zero() && volume.is_finite() {
        Ok((integrated_gradients / volume, volume))
    } else {
        Err(ElementError::InvertedElement {
            volume: report_value(volume),
            jacobian: report_value(min_jacobian.unwrap_or(volume)),
        })
    }
}
