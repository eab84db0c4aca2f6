//! Constitutive models for `udgfem`.
//!
//! Every model implements [`ConstitutiveModel`] and can be used directly with
//! [`UdgHexDomain`](udgfem::assembly::UdgHexDomain). The [`Material`] enum collects all models of
//! this crate behind a single type, and [`MaterialConfig`] is its serializable description.
use log::info;
use serde::{Deserialize, Serialize};
use udgfem::constitutive::ConstitutiveModel;
use udgfem::error::{MaterialError, ParameterError};
use udgfem::material_point::MaterialPoint;
use udgfem::nalgebra::{Matrix3, Scalar};
use udgfem::tensor::SymmetricTensor4;
use udgfem::Real;

pub mod curve;
pub mod fiber;
pub mod materials;

use materials::{
    ActiveFiberParameters, ActiveFiberStress, ArrudaBoyce, ArrudaBoyceParameters, MuscleMaterial, MuscleParameters,
};

/// Parameters of one of the materials of this crate, tagged by the material type.
///
/// ```json
/// { "type": "arruda-boyce", "mu": 1.0, "N": 10.0, "k": 100.0 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MaterialConfig<T: Scalar> {
    ArrudaBoyce(ArrudaBoyceParameters<T>),
    Muscle(MuscleParameters<T>),
    ActiveFiberStress(ActiveFiberParameters<T>),
}

impl<T: Scalar> MaterialConfig<T> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ArrudaBoyce(_) => "arruda-boyce",
            Self::Muscle(_) => "muscle",
            Self::ActiveFiberStress(_) => "active-fiber-stress",
        }
    }
}

/// A validated material.
#[derive(Clone, Debug, PartialEq)]
pub enum Material<T: Scalar> {
    ArrudaBoyce(ArrudaBoyce<T>),
    Muscle(MuscleMaterial<T>),
    ActiveFiberStress(ActiveFiberStress<T>),
}

impl<T: Real> Material<T> {
    /// Validates the parameters of `config` and builds the corresponding material.
    pub fn from_config(config: MaterialConfig<T>) -> Result<Self, ParameterError> {
        let type_name = config.type_name();
        let material = match config {
            MaterialConfig::ArrudaBoyce(parameters) => Self::ArrudaBoyce(ArrudaBoyce::new(parameters)?),
            MaterialConfig::Muscle(parameters) => Self::Muscle(MuscleMaterial::new(parameters)?),
            MaterialConfig::ActiveFiberStress(parameters) => {
                Self::ActiveFiberStress(ActiveFiberStress::new(parameters)?)
            }
        };
        info!("Constructed {} material from configuration", type_name);
        Ok(material)
    }

    /// The configuration that reproduces this material.
    pub fn to_config(&self) -> MaterialConfig<T> {
        match self {
            Self::ArrudaBoyce(material) => MaterialConfig::ArrudaBoyce(*material.parameters()),
            Self::Muscle(material) => MaterialConfig::Muscle(*material.parameters()),
            Self::ActiveFiberStress(material) => MaterialConfig::ActiveFiberStress(material.parameters().clone()),
        }
    }

    fn model(&self) -> &dyn ConstitutiveModel<T> {
        match self {
            Self::ArrudaBoyce(material) => material,
            Self::Muscle(material) => material,
            Self::ActiveFiberStress(material) => material,
        }
    }
}

impl<T: Real> TryFrom<MaterialConfig<T>> for Material<T> {
    type Error = ParameterError;

    fn try_from(config: MaterialConfig<T>) -> Result<Self, Self::Error> {
        Self::from_config(config)
    }
}

impl<T: Real> ConstitutiveModel<T> for Material<T> {
    fn stress(&self, point: &MaterialPoint<T>) -> Result<Matrix3<T>, MaterialError> {
        self.model().stress(point)
    }

    fn tangent(&self, point: &MaterialPoint<T>) -> Result<SymmetricTensor4<T>, MaterialError> {
        self.model().tangent(point)
    }

    fn stress_and_tangent(
        &self,
        point: &MaterialPoint<T>,
    ) -> Result<(Matrix3<T>, SymmetricTensor4<T>), MaterialError> {
        self.model().stress_and_tangent(point)
    }

    fn strain_energy_density(&self, point: &MaterialPoint<T>) -> Option<Result<T, MaterialError>> {
        self.model().strain_energy_density(point)
    }

    fn fiber_stretch(&self, point: &MaterialPoint<T>) -> Option<Result<T, MaterialError>> {
        self.model().fiber_stretch(point)
    }
}
