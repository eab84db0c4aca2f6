//! The uniform deformation gradient (UDG) hexahedron.
//!
//! The element evaluates its material once, at a single deformation gradient obtained by
//! averaging the displacement gradient over the reference element. One-point evaluation leaves
//! the twelve hourglass modes of the hexahedron without stiffness, so a Flanagan-Belytschko type
//! stabilization with a modulus taken from the current material tangent is added to both the
//! internal force and the stiffness.
use crate::constitutive::ConstitutiveModel;
use crate::element::{average_cartesian_derivatives, hex_volume, Hex8Element, HOURGLASS_BASE_VECTORS};
use crate::error::{report_value, ElementError, ParameterError};
use crate::material_point::{EvaluationContext, MaterialPoint, PointHistory};
use crate::nalgebra::{Matrix3, Point3, SMatrix, SVector, Vector3};
use crate::tensor::SymmetricTensor4;
use crate::Real;
use log::trace;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Element force vector, three components per node in node order.
pub type ElementVector<T> = SVector<T, 24>;
/// Element stiffness matrix, with the same degree of freedom ordering as [`ElementVector`].
pub type ElementMatrix<T> = SMatrix<T, 24, 24>;

/// Control settings of the UDG element.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UdgSettings<T> {
    /// Dimensionless scale of the hourglass stabilization. Zero disables it.
    pub hourglass: T,
}

impl<T: Real> Default for UdgSettings<T> {
    fn default() -> Self {
        Self { hourglass: T::one() }
    }
}

impl<T: Real> UdgSettings<T> {
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.hourglass >= T::zero() && self.hourglass.is_finite() {
            Ok(())
        } else {
            Err(ParameterError::OutOfRange {
                name: "hourglass",
                value: report_value(self.hourglass),
                expected: ">= 0",
            })
        }
    }
}

/// Selects the node positions on which averaged gradients are evaluated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Configuration {
    Reference,
    Current,
}

/// Reference and current positions of the nodes of one element.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UdgHexNodes<T: Real> {
    pub reference: [Point3<T>; 8],
    pub current: [Point3<T>; 8],
}

impl<T: Real> UdgHexNodes<T> {
    pub fn new(reference: [Point3<T>; 8], current: [Point3<T>; 8]) -> Self {
        Self { reference, current }
    }

    /// Nodes of an element that has not moved.
    pub fn undeformed(reference: [Point3<T>; 8]) -> Self {
        Self::new(reference, reference)
    }

    pub fn vertices(&self, configuration: Configuration) -> &[Point3<T>; 8] {
        match configuration {
            Configuration::Reference => &self.reference,
            Configuration::Current => &self.current,
        }
    }

    /// Nodal displacements `x_a - X_a`, stacked in node order.
    pub fn displacements(&self) -> ElementVector<T> {
        let mut u = ElementVector::zeros();
        for (a, (x, x0)) in self.current.iter().zip(&self.reference).enumerate() {
            u.fixed_rows_mut::<3>(3 * a).copy_from(&(x - x0));
        }
        u
    }

    /// Volume-averaged Cartesian shape function gradients and volume in the given configuration.
    pub fn average_cartesian_derivatives(
        &self,
        configuration: Configuration,
    ) -> Result<(SMatrix<T, 3, 8>, T), ElementError> {
        average_cartesian_derivatives(self.vertices(configuration))
    }

    fn vertex_matrix(&self, configuration: Configuration) -> SMatrix<T, 3, 8> {
        let vertices = self.vertices(configuration);
        SMatrix::<T, 3, 8>::from_fn(|i, a| vertices[a][i])
    }
}

/// Everything computed from a single material evaluation of one element.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UdgHexResponse<T: Real> {
    pub deformation_gradient: Matrix3<T>,
    pub jacobian: T,
    /// Current element volume.
    pub volume: T,
    pub stress: Matrix3<T>,
    pub hourglass_modulus: T,
    /// Internal force, including the hourglass force.
    pub force: ElementVector<T>,
    /// Sum of material, geometric and hourglass stiffness.
    pub stiffness: ElementMatrix<T>,
}

/// The element kernel, evaluating one element at a time against a shared material.
#[derive(Debug)]
pub struct UdgHexKernel<'a, T: Real, M: ?Sized> {
    material: &'a M,
    settings: UdgSettings<T>,
    context: EvaluationContext<T>,
}

impl<'a, T: Real, M: ?Sized> Clone for UdgHexKernel<'a, T, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Real, M: ?Sized> Copy for UdgHexKernel<'a, T, M> {}

/// Element quantities derived from the nodes before the material is evaluated.
struct Kinematics<T: Real> {
    reference_gradients: SMatrix<T, 3, 8>,
    reference_volume: T,
    /// Reference gradients pushed forward, `g_a = F^-T G⁰_a`.
    spatial_gradients: SMatrix<T, 3, 8>,
    /// `J V₀`, the volume the one-point rule assigns to the current configuration.
    spatial_volume: T,
    current_volume: T,
    point: MaterialPoint<T>,
}

impl<'a, T, M> UdgHexKernel<'a, T, M>
where
    T: Real,
    M: ConstitutiveModel<T> + ?Sized,
{
    pub fn new(material: &'a M, settings: UdgSettings<T>) -> Self {
        Self {
            material,
            settings,
            context: EvaluationContext::default(),
        }
    }

    pub fn with_context(self, context: EvaluationContext<T>) -> Self {
        Self { context, ..self }
    }

    pub fn material(&self) -> &'a M {
        self.material
    }

    pub fn settings(&self) -> &UdgSettings<T> {
        &self.settings
    }

    /// The element-uniform deformation gradient `F = Σ_a x_a ⊗ G⁰_a`, where `G⁰_a` are the
    /// averaged gradients of the reference configuration.
    pub fn average_deformation_gradient(&self, nodes: &UdgHexNodes<T>) -> Result<Matrix3<T>, ElementError> {
        let (reference_gradients, _) = nodes.average_cartesian_derivatives(Configuration::Reference)?;
        checked_deformation_gradient(nodes, &reference_gradients)
    }

    /// The single material point of the element, located at the reference centroid.
    pub fn material_point(
        &self,
        nodes: &UdgHexNodes<T>,
        history: &PointHistory<T>,
    ) -> Result<MaterialPoint<T>, ElementError> {
        Ok(self.kinematics(nodes, history)?.point)
    }

    /// Internal force `f_a = v σ g_a`, plus the hourglass force.
    ///
    /// The gradients `g_a = F^-T G⁰_a` and the volume `v = J V₀` are the reference averages pushed
    /// forward by the element-uniform `F`, which makes the force the gradient of `V₀ W(F)` for
    /// hyperelastic materials and the material and geometric stiffness its exact derivative.
    pub fn internal_force(
        &self,
        nodes: &UdgHexNodes<T>,
        history: &PointHistory<T>,
    ) -> Result<ElementVector<T>, ElementError> {
        let kinematics = self.kinematics(nodes, history)?;
        let (stress, tangent) = self.material.stress_and_tangent(&kinematics.point)?;
        let mut force = stress_divergence_force(&kinematics.spatial_gradients, kinematics.spatial_volume, &stress);
        if self.settings.hourglass > T::zero() {
            let modulus = self.hourglass_modulus(&tangent);
            let k_hg = self.hourglass_stiffness_with(nodes, &kinematics, modulus);
            force += k_hg * nodes.displacements();
        }
        Ok(force)
    }

    /// Hourglass force `K_hg u`, with `u` the nodal displacements and the modulus taken from
    /// `tangent`.
    pub fn hourglass_force(
        &self,
        nodes: &UdgHexNodes<T>,
        tangent: &SymmetricTensor4<T>,
    ) -> Result<ElementVector<T>, ElementError> {
        Ok(self.hourglass_stiffness(nodes, tangent)? * nodes.displacements())
    }

    /// Hourglass stiffness for the modulus derived from `tangent`.
    pub fn hourglass_stiffness(
        &self,
        nodes: &UdgHexNodes<T>,
        tangent: &SymmetricTensor4<T>,
    ) -> Result<ElementMatrix<T>, ElementError> {
        let (reference_gradients, reference_volume) = nodes.average_cartesian_derivatives(Configuration::Reference)?;
        let modulus = self.hourglass_modulus(tangent);
        Ok(hourglass_stiffness(
            &nodes.vertex_matrix(Configuration::Reference),
            &reference_gradients,
            reference_volume,
            self.settings.hourglass * modulus,
        ))
    }

    /// Material stiffness `K_ab = v g_a · c · g_b`.
    pub fn material_stiffness(
        &self,
        nodes: &UdgHexNodes<T>,
        history: &PointHistory<T>,
    ) -> Result<ElementMatrix<T>, ElementError> {
        let kinematics = self.kinematics(nodes, history)?;
        let tangent = self.material.tangent(&kinematics.point)?;
        Ok(material_stiffness(
            &kinematics.spatial_gradients,
            kinematics.spatial_volume,
            &tangent,
        ))
    }

    /// Geometric (initial stress) stiffness `K_ab = v (g_a · σ g_b) I`.
    pub fn geometric_stiffness(
        &self,
        nodes: &UdgHexNodes<T>,
        history: &PointHistory<T>,
    ) -> Result<ElementMatrix<T>, ElementError> {
        let kinematics = self.kinematics(nodes, history)?;
        let stress = self.material.stress(&kinematics.point)?;
        Ok(geometric_stiffness(
            &kinematics.spatial_gradients,
            kinematics.spatial_volume,
            &stress,
        ))
    }

    /// Total element stiffness: material, geometric and hourglass contributions.
    pub fn stiffness(
        &self,
        nodes: &UdgHexNodes<T>,
        history: &PointHistory<T>,
    ) -> Result<ElementMatrix<T>, ElementError> {
        Ok(self.evaluate(nodes, history)?.stiffness)
    }

    /// Strain energy `V₀ W(F)` stored in the element, if the material has a strain energy.
    ///
    /// The hourglass stabilization does not contribute.
    pub fn strain_energy(&self, nodes: &UdgHexNodes<T>, history: &PointHistory<T>) -> Option<Result<T, ElementError>> {
        let kinematics = match self.kinematics(nodes, history) {
            Ok(kinematics) => kinematics,
            Err(err) => return Some(Err(err)),
        };
        let reference_volume = kinematics.reference_volume;
        self.material
            .strain_energy_density(&kinematics.point)
            .map(|w| w.map(|w| w * reference_volume).map_err(ElementError::from))
    }

    /// Fiber stretch at the element material point, for materials with fibers.
    pub fn fiber_stretch(
        &self,
        nodes: &UdgHexNodes<T>,
        history: &PointHistory<T>,
    ) -> Result<Option<T>, ElementError> {
        let kinematics = self.kinematics(nodes, history)?;
        Ok(self
            .material
            .fiber_stretch(&kinematics.point)
            .transpose()?)
    }

    /// Evaluates force and stiffness of the element with a single material evaluation.
    pub fn evaluate(
        &self,
        nodes: &UdgHexNodes<T>,
        history: &PointHistory<T>,
    ) -> Result<UdgHexResponse<T>, ElementError> {
        let kinematics = self.kinematics(nodes, history)?;
        let (stress, tangent) = self.material.stress_and_tangent(&kinematics.point)?;
        let g = &kinematics.spatial_gradients;
        let v = kinematics.spatial_volume;

        let mut force = stress_divergence_force(g, v, &stress);
        let mut stiffness = material_stiffness(g, v, &tangent) + geometric_stiffness(g, v, &stress);
        let modulus = self.hourglass_modulus(&tangent);
        if self.settings.hourglass > T::zero() {
            let k_hg = self.hourglass_stiffness_with(nodes, &kinematics, modulus);
            force += k_hg * nodes.displacements();
            stiffness += k_hg;
        }

        Ok(UdgHexResponse {
            deformation_gradient: *kinematics.point.deformation_gradient(),
            jacobian: kinematics.point.jacobian(),
            volume: kinematics.current_volume,
            stress,
            hourglass_modulus: modulus,
            force,
            stiffness,
        })
    }

    /// The hourglass modulus: the mean shear modulus of the tangent, clamped at zero.
    pub fn hourglass_modulus(&self, tangent: &SymmetricTensor4<T>) -> T {
        let modulus = tangent.shear_moduli_mean().max(T::zero());
        trace!("hourglass modulus {}", report_value(modulus));
        modulus
    }

    fn hourglass_stiffness_with(
        &self,
        nodes: &UdgHexNodes<T>,
        kinematics: &Kinematics<T>,
        modulus: T,
    ) -> ElementMatrix<T> {
        hourglass_stiffness(
            &nodes.vertex_matrix(Configuration::Reference),
            &kinematics.reference_gradients,
            kinematics.reference_volume,
            self.settings.hourglass * modulus,
        )
    }

    fn kinematics(&self, nodes: &UdgHexNodes<T>, history: &PointHistory<T>) -> Result<Kinematics<T>, ElementError> {
        let (reference_gradients, reference_volume) = nodes.average_cartesian_derivatives(Configuration::Reference)?;
        let deformation_gradient = checked_deformation_gradient(nodes, &reference_gradients)?;
        let current_volume = hex_volume(&nodes.current);
        let inverse_transpose = deformation_gradient
            .try_inverse()
            .map(|inverse| inverse.transpose());
        let inverse_transpose = match inverse_transpose {
            Some(inverse_transpose) if current_volume > T::zero() => inverse_transpose,
            _ => {
                return Err(ElementError::InvertedElement {
                    volume: report_value(current_volume),
                    jacobian: report_value(deformation_gradient.determinant()),
                })
            }
        };
        let centroid = Hex8Element::from_vertices(nodes.reference).centroid();
        let point = MaterialPoint::new(deformation_gradient)?
            .with_position(centroid)
            .with_context(&self.context)
            .with_history(*history);
        Ok(Kinematics {
            spatial_gradients: inverse_transpose * reference_gradients,
            spatial_volume: point.jacobian() * reference_volume,
            reference_gradients,
            reference_volume,
            current_volume,
            point,
        })
    }
}

fn checked_deformation_gradient<T: Real>(
    nodes: &UdgHexNodes<T>,
    reference_gradients: &SMatrix<T, 3, 8>,
) -> Result<Matrix3<T>, ElementError> {
    let deformation_gradient = nodes.vertex_matrix(Configuration::Current) * reference_gradients.transpose();
    let jacobian = deformation_gradient.determinant();
    if jacobian > T::zero() && jacobian.is_finite() {
        Ok(deformation_gradient)
    } else {
        Err(ElementError::InvertedElement {
            volume: report_value(hex_volume(&nodes.current)),
            jacobian: report_value(jacobian),
        })
    }
}

fn stress_divergence_force<T: Real>(gradients: &SMatrix<T, 3, 8>, volume: T, stress: &Matrix3<T>) -> ElementVector<T> {
    let mut force = ElementVector::zeros();
    for a in 0..8 {
        let f_a: Vector3<T> = stress * gradients.column(a) * volume;
        force.fixed_rows_mut::<3>(3 * a).copy_from(&f_a);
    }
    force
}

fn material_stiffness<T: Real>(
    gradients: &SMatrix<T, 3, 8>,
    volume: T,
    tangent: &SymmetricTensor4<T>,
) -> ElementMatrix<T> {
    let mut stiffness = ElementMatrix::zeros();
    for a in 0..8 {
        for b in 0..8 {
            let g_a = gradients.column(a);
            let g_b = gradients.column(b);
            for i in 0..3 {
                for k in 0..3 {
                    let mut k_ab = T::zero();
                    for j in 0..3 {
                        for l in 0..3 {
                            k_ab += g_a[j] * tangent.get(i, j, k, l) * g_b[l];
                        }
                    }
                    stiffness[(3 * a + i, 3 * b + k)] = volume * k_ab;
                }
            }
        }
    }
    stiffness
}

fn geometric_stiffness<T: Real>(gradients: &SMatrix<T, 3, 8>, volume: T, stress: &Matrix3<T>) -> ElementMatrix<T> {
    let mut stiffness = ElementMatrix::zeros();
    for a in 0..8 {
        for b in 0..8 {
            let k_ab = volume * gradients.column(a).dot(&(stress * gradients.column(b)));
            for i in 0..3 {
                stiffness[(3 * a + i, 3 * b + i)] = k_ab;
            }
        }
    }
    stiffness
}

/// Hourglass shape vectors `γ_α = 1/8 (h_α - Σ_b (h_α · X_b) G⁰_b)`, one column per base vector.
///
/// `reference_vertices` holds one reference node position per column.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn hourglass_shape_vectors<T: Real>(
    reference_vertices: &SMatrix<T, 3, 8>,
    reference_gradients: &SMatrix<T, 3, 8>,
) -> SMatrix<T, 8, 4> {
    let mut gamma = SMatrix::<T, 8, 4>::zeros();
    for (alpha, base) in HOURGLASS_BASE_VECTORS.iter().enumerate() {
        let h = SVector::<T, 8>::from_fn(|a, _| T::from_f64(base[a]).expect("Literal must fit in T"));
        let projection = reference_vertices * &h;
        let gamma_alpha = (h - reference_gradients.transpose() * projection) / 8.0;
        gamma.set_column(alpha, &gamma_alpha);
    }
    gamma
}

/// Hourglass stiffness `K_hg = C Σ_α γ_α γ_α^T ⊗ I` with `C = scale V₀ Σ_a |G⁰_a|²`.
fn hourglass_stiffness<T: Real>(
    reference_vertices: &SMatrix<T, 3, 8>,
    reference_gradients: &SMatrix<T, 3, 8>,
    reference_volume: T,
    scale: T,
) -> ElementMatrix<T> {
    let gamma = hourglass_shape_vectors(reference_vertices, reference_gradients);
    let c = scale * reference_volume * reference_gradients.norm_squared();
    let nodal = gamma * gamma.transpose() * c;

    let mut stiffness = ElementMatrix::zeros();
    for a in 0..8 {
        for b in 0..8 {
            for i in 0..3 {
                stiffness[(3 * a + i, 3 * b + i)] = nodal[(a, b)];
            }
        }
    }
    stiffness
}
