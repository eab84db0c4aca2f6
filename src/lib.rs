//! Uniform deformation gradient (UDG) hexahedral elements for implicit nonlinear solid mechanics.
//!
//! The crate provides the constitutive evaluation layer (tensor kernel, material points and the
//! [`ConstitutiveModel`](constitutive::ConstitutiveModel) contract) together with the one-point
//! integrated hexahedral element kernel with hourglass control, and the glue that scatters element
//! contributions into global residual vectors and stiffness matrices.
//!
//! Concrete material models live in the companion crate `udgfem-solid`.
use nalgebra::RealField;

pub mod assembly;
pub mod calculus;
pub mod constitutive;
pub mod element;
pub mod error;
pub mod material_point;
pub mod mesh;
pub mod quadrature;
pub mod tensor;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Scalar type used throughout `udgfem`.
///
/// A trait alias for the bounds needed by generic numerical routines.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
