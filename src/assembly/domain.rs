use crate::assembly::global::{
    add_element_matrix, add_element_vector, assemble_pattern, element_equations, StiffnessAccumulator,
};
use crate::constitutive::ConstitutiveModel;
use crate::element::udg::{ElementMatrix, UdgHexKernel, UdgHexNodes, UdgSettings};
use crate::element::Hex8Connectivity;
use crate::error::{AssemblyError, ElementError, ParameterError};
use crate::material_point::{EvaluationContext, PointHistory};
use crate::mesh::{EquationNumbering, NodalPositions};
use crate::Real;
use log::{debug, warn};
use nalgebra::{DVector, Matrix3, Point3};
use nalgebra_sparse::pattern::SparsityPattern;
use rayon::prelude::*;
use std::sync::Arc;

/// Number of element matrices evaluated concurrently before they are scattered.
const PARALLEL_STIFFNESS_BATCH: usize = 1024;

/// An ordered collection of UDG hexahedra sharing one material.
///
/// The domain owns its element list together with per-element cached stress and committed
/// history. Node positions and equation numbers are read from the mesh passed to each call, and
/// the material is shared through an [`Arc`]. Residual and stiffness evaluations never modify
/// the domain, so they can be repeated every Newton iteration.
#[derive(Debug)]
pub struct UdgHexDomain<T: Real, M> {
    connectivity: Vec<Hex8Connectivity>,
    material: Arc<M>,
    settings: UdgSettings<T>,
    context: EvaluationContext<T>,
    stresses: Vec<Matrix3<T>>,
    history: Vec<PointHistory<T>>,
}

/// Clones the element list and per-element state. The material is shared with the original.
impl<T: Real, M> Clone for UdgHexDomain<T, M> {
    fn clone(&self) -> Self {
        Self {
            connectivity: self.connectivity.clone(),
            material: Arc::clone(&self.material),
            settings: self.settings,
            context: self.context,
            stresses: self.stresses.clone(),
            history: self.history.clone(),
        }
    }
}

impl<T: Real, M> UdgHexDomain<T, M> {
    pub fn new(
        connectivity: Vec<Hex8Connectivity>,
        material: Arc<M>,
        settings: UdgSettings<T>,
    ) -> Result<Self, ParameterError> {
        settings.validate()?;
        let n = connectivity.len();
        Ok(Self {
            connectivity,
            material,
            settings,
            context: EvaluationContext::default(),
            stresses: vec![Matrix3::zeros(); n],
            history: vec![PointHistory::default(); n],
        })
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn connectivity(&self) -> &[Hex8Connectivity] {
        &self.connectivity
    }

    pub fn material(&self) -> &Arc<M> {
        &self.material
    }

    pub fn settings(&self) -> &UdgSettings<T> {
        &self.settings
    }

    pub fn context(&self) -> &EvaluationContext<T> {
        &self.context
    }

    /// Sets the driver values (activation scale, time step) used by subsequent evaluations.
    pub fn set_context(&mut self, context: EvaluationContext<T>) {
        self.context = context;
    }

    /// Averaged Cauchy stress of every element, as of the last [`update_stresses`](Self::update_stresses).
    pub fn stresses(&self) -> &[Matrix3<T>] {
        &self.stresses
    }

    /// Committed history of every element.
    pub fn history(&self) -> &[PointHistory<T>] {
        &self.history
    }

    /// Checks that every element references existing nodes.
    pub fn validate(&self, mesh: &(impl NodalPositions<T> + ?Sized)) -> Result<(), AssemblyError> {
        let num_nodes = mesh.num_nodes();
        for (element_index, conn) in self.connectivity.iter().enumerate() {
            if let Some(&node) = conn.vertex_indices().iter().find(|&&node| node >= num_nodes) {
                return Err(AssemblyError::NodeOutOfBounds { element_index, node });
            }
        }
        Ok(())
    }

    /// Gathers reference and current node positions of element `element_index`.
    ///
    /// # Panics
    ///
    /// Panics if `element_index` is out of bounds.
    pub fn element_nodes(
        &self,
        element_index: usize,
        mesh: &(impl NodalPositions<T> + ?Sized),
    ) -> Result<UdgHexNodes<T>, AssemblyError> {
        let conn = &self.connectivity[element_index];
        let mut reference = [Point3::origin(); 8];
        let mut current = [Point3::origin(); 8];
        for (a, &node) in conn.vertex_indices().iter().enumerate() {
            let out_of_bounds = || AssemblyError::NodeOutOfBounds { element_index, node };
            reference[a] = mesh.reference_position(node).ok_or_else(out_of_bounds)?;
            current[a] = mesh.current_position(node).ok_or_else(out_of_bounds)?;
        }
        Ok(UdgHexNodes::new(reference, current))
    }

    /// The sparsity pattern of the stiffness matrix over all free equations.
    pub fn stiffness_pattern(&self, numbering: &(impl EquationNumbering + ?Sized)) -> SparsityPattern {
        let elements = self
            .connectivity
            .iter()
            .map(|conn| element_equations(conn, numbering));
        assemble_pattern(numbering.num_equations(), elements)
    }
}

impl<T, M> UdgHexDomain<T, M>
where
    T: Real,
    M: ConstitutiveModel<T>,
{
    /// The element kernel configured with this domain's material, settings and context.
    pub fn kernel(&self) -> UdgHexKernel<'_, T, M> {
        UdgHexKernel::new(&*self.material, self.settings).with_context(self.context)
    }

    /// Adds `-f_int` of every element to `residual`, so that `R = f_ext - f_int` once the caller
    /// has added the external forces.
    ///
    /// Element forces are gathered in a separate buffer, so `residual` is left unchanged if an
    /// element fails.
    pub fn residual<Mesh>(&self, mesh: &Mesh, residual: &mut DVector<T>) -> Result<(), AssemblyError>
    where
        Mesh: NodalPositions<T> + EquationNumbering + ?Sized,
    {
        check_dimension(mesh.num_equations(), residual.len())?;
        debug!(
            "Assembling residual over {} elements and {} equations",
            self.num_elements(),
            mesh.num_equations()
        );

        let kernel = self.kernel();
        let mut total = DVector::zeros(residual.len());
        for (i, conn) in self.connectivity.iter().enumerate() {
            let nodes = self.element_nodes(i, mesh)?;
            let force = kernel
                .internal_force(&nodes, &self.history[i])
                .map_err(|err| element_failure(i, err))?;
            add_element_vector(&mut total, &element_equations(conn, mesh), &force, -T::one());
        }
        *residual += total;
        Ok(())
    }

    /// Adds the stiffness of every element to `stiffness`.
    ///
    /// Only entries whose row and column both belong to free equations are added. Element
    /// matrices are scattered as they are computed: after an error, `stiffness` holds the
    /// contributions of the elements before the failing one and must be discarded.
    pub fn stiffness_matrix<Mesh, S>(&self, mesh: &Mesh, stiffness: &mut S) -> Result<(), AssemblyError>
    where
        Mesh: NodalPositions<T> + EquationNumbering + ?Sized,
        S: StiffnessAccumulator<T> + ?Sized,
    {
        check_matrix_dimensions(mesh.num_equations(), stiffness)?;
        debug!(
            "Assembling stiffness matrix over {} elements and {} equations",
            self.num_elements(),
            mesh.num_equations()
        );

        for (i, conn) in self.connectivity.iter().enumerate() {
            let element_matrix = self.element_stiffness(i, mesh)?;
            add_element_matrix(stiffness, &element_equations(conn, mesh), &element_matrix)?;
        }
        Ok(())
    }

    /// Recomputes the cached averaged stress of every element.
    pub fn update_stresses(&mut self, mesh: &(impl NodalPositions<T> + ?Sized)) -> Result<(), AssemblyError> {
        let mut stresses = Vec::with_capacity(self.num_elements());
        {
            let kernel = self.kernel();
            for i in 0..self.num_elements() {
                let nodes = self.element_nodes(i, mesh)?;
                let stress = kernel
                    .material_point(&nodes, &self.history[i])
                    .and_then(|point| kernel.material().stress(&point).map_err(ElementError::from))
                    .map_err(|err| element_failure(i, err))?;
                stresses.push(stress);
            }
        }
        self.stresses = stresses;
        Ok(())
    }

    /// Records the current state of every element as its committed history.
    ///
    /// Invoked by the time-stepping driver once a step has converged. Materials without fibers
    /// leave the history empty.
    pub fn commit_history(&mut self, mesh: &(impl NodalPositions<T> + ?Sized)) -> Result<(), AssemblyError> {
        let mut history = Vec::with_capacity(self.num_elements());
        {
            let kernel = self.kernel();
            for i in 0..self.num_elements() {
                let nodes = self.element_nodes(i, mesh)?;
                let fiber_stretch = kernel
                    .fiber_stretch(&nodes, &self.history[i])
                    .map_err(|err| element_failure(i, err))?;
                history.push(PointHistory { fiber_stretch });
            }
        }
        self.history = history;
        Ok(())
    }

    /// Total strain energy of the domain, if the material has a strain energy.
    pub fn strain_energy(&self, mesh: &(impl NodalPositions<T> + ?Sized)) -> Option<Result<T, AssemblyError>> {
        let kernel = self.kernel();
        let mut energy = T::zero();
        for i in 0..self.num_elements() {
            let nodes = match self.element_nodes(i, mesh) {
                Ok(nodes) => nodes,
                Err(err) => return Some(Err(err)),
            };
            match kernel.strain_energy(&nodes, &self.history[i])? {
                Ok(element_energy) => energy += element_energy,
                Err(err) => return Some(Err(element_failure(i, err))),
            }
        }
        Some(Ok(energy))
    }

    fn element_stiffness<Mesh>(&self, element_index: usize, mesh: &Mesh) -> Result<ElementMatrix<T>, AssemblyError>
    where
        Mesh: NodalPositions<T> + ?Sized,
    {
        let nodes = self.element_nodes(element_index, mesh)?;
        self.kernel()
            .stiffness(&nodes, &self.history[element_index])
            .map_err(|err| element_failure(element_index, err))
    }
}

impl<T, M> UdgHexDomain<T, M>
where
    T: Real + Send + Sync,
    M: ConstitutiveModel<T> + Send + Sync,
{
    /// Parallel version of [`residual`](Self::residual).
    ///
    /// Every worker accumulates into its own buffer and the buffers are summed afterwards, so
    /// the result only differs from the serial one by rounding. As in the serial version,
    /// `residual` is left unchanged if an element fails.
    pub fn par_residual<Mesh>(&self, mesh: &Mesh, residual: &mut DVector<T>) -> Result<(), AssemblyError>
    where
        Mesh: NodalPositions<T> + EquationNumbering + Sync + ?Sized,
    {
        let num_equations = mesh.num_equations();
        check_dimension(num_equations, residual.len())?;
        debug!(
            "Assembling residual in parallel over {} elements and {} equations",
            self.num_elements(),
            num_equations
        );

        let kernel = self.kernel();
        let total = self
            .connectivity
            .par_iter()
            .enumerate()
            .try_fold(
                || DVector::zeros(num_equations),
                |mut buffer, (i, conn)| {
                    let nodes = self.element_nodes(i, mesh)?;
                    let force = kernel
                        .internal_force(&nodes, &self.history[i])
                        .map_err(|err| element_failure(i, err))?;
                    add_element_vector(&mut buffer, &element_equations(conn, mesh), &force, -T::one());
                    Ok::<_, AssemblyError>(buffer)
                },
            )
            .try_reduce(|| DVector::zeros(num_equations), |a, b| Ok(a + b))?;

        *residual += total;
        Ok(())
    }

    /// Parallel version of [`stiffness_matrix`](Self::stiffness_matrix).
    ///
    /// Element matrices are computed concurrently in batches, then scattered in element order
    /// on the calling thread. The result is identical to the serial assembly, and so is the
    /// state of `stiffness` after an error.
    pub fn par_stiffness_matrix<Mesh, S>(&self, mesh: &Mesh, stiffness: &mut S) -> Result<(), AssemblyError>
    where
        Mesh: NodalPositions<T> + EquationNumbering + Sync + ?Sized,
        S: StiffnessAccumulator<T> + ?Sized,
    {
        check_matrix_dimensions(mesh.num_equations(), stiffness)?;
        debug!(
            "Assembling stiffness matrix in parallel over {} elements and {} equations",
            self.num_elements(),
            mesh.num_equations()
        );

        let num_elements = self.num_elements();
        for batch_start in (0..num_elements).step_by(PARALLEL_STIFFNESS_BATCH) {
            let batch_end = (batch_start + PARALLEL_STIFFNESS_BATCH).min(num_elements);
            let element_matrices: Vec<_> = (batch_start..batch_end)
                .into_par_iter()
                .map(|i| self.element_stiffness(i, mesh).map(Box::new))
                .collect();
            for (i, element_matrix) in (batch_start..batch_end).zip(element_matrices) {
                let equations = element_equations(&self.connectivity[i], mesh);
                add_element_matrix(stiffness, &equations, &*element_matrix?)?;
            }
        }
        Ok(())
    }
}

fn element_failure(element_index: usize, source: ElementError) -> AssemblyError {
    warn!("Evaluation of element {} failed: {}", element_index, source);
    AssemblyError::Element { element_index, source }
}

fn check_dimension(expected: usize, actual: usize) -> Result<(), AssemblyError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AssemblyError::DimensionMismatch { expected, actual })
    }
}

fn check_matrix_dimensions<T>(
    num_equations: usize,
    stiffness: &(impl StiffnessAccumulator<T> + ?Sized),
) -> Result<(), AssemblyError> {
    check_dimension(num_equations, stiffness.nrows())?;
    check_dimension(num_equations, stiffness.ncols())
}
