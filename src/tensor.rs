//! Second- and fourth-order tensor algebra for continuum mechanics.
//!
//! Rank-2 tensors are plain [`Matrix3`] values. Fourth-order tensors with both minor symmetries
//! and the major symmetry are stored as [`SymmetricTensor4`], which keeps the 21 independent
//! components of the symmetric 6x6 Voigt matrix in the order `xx, yy, zz, xy, yz, xz`.
use crate::Real;
use nalgebra::{Matrix3, Matrix6, Scalar, Vector3};
use numeric_literals::replace_float_literals;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Index pairs `(i, j)` represented by each Voigt index.
pub const VOIGT_PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (1, 2), (0, 2)];

/// Voigt index associated with the (unordered) index pair `(i, j)`.
const VOIGT_INDEX: [[usize; 3]; 3] = [[0, 3, 5], [3, 1, 4], [5, 4, 2]];

/// Position of Voigt entry `(I, J)` in the packed upper triangle.
#[rustfmt::skip]
const PACKED_INDEX: [[usize; 6]; 6] = [
    [0,  1,  2,  3,  4,  5],
    [1,  6,  7,  8,  9, 10],
    [2,  7, 11, 12, 13, 14],
    [3,  8, 12, 15, 16, 17],
    [4,  9, 13, 16, 18, 19],
    [5, 10, 14, 17, 19, 20],
];

/// Returns the Voigt index of the tensor index pair `(i, j)`.
///
/// # Panics
///
/// Panics if `i` or `j` is not in `0 .. 3`.
pub fn voigt_index(i: usize, j: usize) -> usize {
    VOIGT_INDEX[i][j]
}

/// The deviatoric part `a - tr(a) / 3 I` of a rank-2 tensor.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn deviator<T: Real>(a: &Matrix3<T>) -> Matrix3<T> {
    a - Matrix3::from_diagonal_element(a.trace() / 3.0)
}

/// The dyadic product `v ⊗ v`.
pub fn dyad<T: Real>(v: &Vector3<T>) -> Matrix3<T> {
    v * v.transpose()
}

/// The symmetrized dyadic product `a ⊗ b + b ⊗ a`.
pub fn dyad_sym<T: Real>(a: &Vector3<T>, b: &Vector3<T>) -> Matrix3<T> {
    a * b.transpose() + b * a.transpose()
}

/// The double contraction `a : b = a_ij b_ij`.
pub fn double_contraction<T: Real>(a: &Matrix3<T>, b: &Matrix3<T>) -> T {
    a.dot(b)
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn symmetric_part<T: Real>(a: &Matrix3<T>) -> Matrix3<T> {
    (a + a.transpose()) * 0.5
}

/// A fourth-order tensor with minor symmetries `C_ijkl = C_jikl = C_ijlk` and the major symmetry
/// `C_ijkl = C_klij`.
///
/// Only the 21 independent components are stored. Products that are built from symmetric
/// rank-2 tensors (such as [`dyad1s`](Self::dyad1s) or [`dyad4s`](Self::dyad4s)) inherit all
/// symmetries, which is why they are evaluated only on one representative index quadruple per
/// stored component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SymmetricTensor4<T: Scalar> {
    components: [T; 21],
}

impl<T: Real> Default for SymmetricTensor4<T> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<T: Real> SymmetricTensor4<T> {
    pub fn zeros() -> Self {
        Self {
            components: [T::zero(); 21],
        }
    }

    /// Builds a tensor by evaluating `f(i, j, k, l)` on one representative index quadruple of
    /// every independent component.
    ///
    /// The caller is responsible for `f` actually having the symmetries of the tensor.
    pub fn from_fn(mut f: impl FnMut(usize, usize, usize, usize) -> T) -> Self {
        let mut components = [T::zero(); 21];
        for (row, &(i, j)) in VOIGT_PAIRS.iter().enumerate() {
            for (col, &(k, l)) in VOIGT_PAIRS.iter().enumerate().skip(row) {
                components[PACKED_INDEX[row][col]] = f(i, j, k, l);
            }
        }
        Self { components }
    }

    /// Builds a tensor from its 6x6 Voigt matrix, averaging the matrix with its transpose.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn from_voigt_matrix(matrix: &Matrix6<T>) -> Self {
        let mut components = [T::zero(); 21];
        for row in 0..6 {
            for col in row..6 {
                components[PACKED_INDEX[row][col]] = 0.5 * (matrix[(row, col)] + matrix[(col, row)]);
            }
        }
        Self { components }
    }

    /// The tensor `I ⊗ I`.
    pub fn identity_dyad() -> Self {
        Self::dyad1s(&Matrix3::identity())
    }

    /// The symmetric fourth-order identity `I ⊙ I`, which maps every symmetric rank-2 tensor to
    /// itself.
    pub fn symmetric_identity() -> Self {
        Self::dyad4s(&Matrix3::identity())
    }

    /// The dyadic product `a ⊗ a` of a symmetric rank-2 tensor with itself.
    pub fn dyad1s(a: &Matrix3<T>) -> Self {
        Self::from_fn(|i, j, k, l| a[(i, j)] * a[(k, l)])
    }

    /// The symmetrized dyadic product `a ⊗ b + b ⊗ a` of two symmetric rank-2 tensors.
    pub fn dyad1s_pair(a: &Matrix3<T>, b: &Matrix3<T>) -> Self {
        Self::from_fn(|i, j, k, l| a[(i, j)] * b[(k, l)] + b[(i, j)] * a[(k, l)])
    }

    /// The product `(a ⊙ a)_ijkl = 1/2 (a_ik a_jl + a_il a_jk)` of a symmetric rank-2 tensor.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn dyad4s(a: &Matrix3<T>) -> Self {
        Self::from_fn(|i, j, k, l| 0.5 * (a[(i, k)] * a[(j, l)] + a[(i, l)] * a[(j, k)]))
    }

    /// The symmetrized product
    /// `1/2 (a_ik b_jl + a_il b_jk + b_ik a_jl + b_il a_jk)` of two symmetric rank-2 tensors.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn dyad4s_pair(a: &Matrix3<T>, b: &Matrix3<T>) -> Self {
        Self::from_fn(|i, j, k, l| {
            0.5 * (a[(i, k)] * b[(j, l)] + a[(i, l)] * b[(j, k)] + b[(i, k)] * a[(j, l)] + b[(i, l)] * a[(j, k)])
        })
    }

    /// The component `C_ijkl`.
    ///
    /// # Panics
    ///
    /// Panics if any index is not in `0 .. 3`.
    pub fn get(&self, i: usize, j: usize, k: usize, l: usize) -> T {
        self.voigt(voigt_index(i, j), voigt_index(k, l))
    }

    /// The entry `(row, col)` of the Voigt matrix.
    pub fn voigt(&self, row: usize, col: usize) -> T {
        self.components[PACKED_INDEX[row][col]]
    }

    pub fn to_voigt_matrix(&self) -> Matrix6<T> {
        Matrix6::from_fn(|row, col| self.voigt(row, col))
    }

    /// The contraction `(C : a)_ij = C_ijkl a_kl`.
    pub fn contract(&self, a: &Matrix3<T>) -> Matrix3<T> {
        let mut result = Matrix3::zeros();
        for i in 0..3 {
            for j in i..3 {
                let mut c_ij = T::zero();
                for k in 0..3 {
                    for l in 0..3 {
                        c_ij += self.get(i, j, k, l) * a[(k, l)];
                    }
                }
                result[(i, j)] = c_ij;
                result[(j, i)] = c_ij;
            }
        }
        result
    }

    /// Returns the tensor `Q_ia Q_jb Q_kc Q_ld C_abcd` expressed in a rotated frame.
    pub fn rotated(&self, q: &Matrix3<T>) -> Self {
        Self::from_fn(|i, j, k, l| {
            let mut sum = T::zero();
            for a in 0..3 {
                for b in 0..3 {
                    let q_ij = q[(i, a)] * q[(j, b)];
                    for c in 0..3 {
                        for d in 0..3 {
                            sum += q_ij * q[(k, c)] * q[(l, d)] * self.get(a, b, c, d);
                        }
                    }
                }
            }
            sum
        })
    }

    /// The mean of the three shear diagonal components `C_1212`, `C_2323` and `C_1313`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn shear_moduli_mean(&self) -> T {
        (self.voigt(3, 3) + self.voigt(4, 4) + self.voigt(5, 5)) / 3.0
    }

    pub fn max_abs(&self) -> T {
        self.components
            .iter()
            .fold(T::zero(), |max, c| max.max(c.abs()))
    }
}

impl<T: Real> Add for SymmetricTensor4<T> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<T: Real> Sub for SymmetricTensor4<T> {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl<T: Real> AddAssign for SymmetricTensor4<T> {
    fn add_assign(&mut self, rhs: Self) {
        for (c, r) in self.components.iter_mut().zip(rhs.components) {
            *c += r;
        }
    }
}

impl<T: Real> SubAssign for SymmetricTensor4<T> {
    fn sub_assign(&mut self, rhs: Self) {
        for (c, r) in self.components.iter_mut().zip(rhs.components) {
            *c -= r;
        }
    }
}

impl<T: Real> Neg for SymmetricTensor4<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            components: self.components.map(|c| -c),
        }
    }
}

impl<T: Real> Mul<T> for SymmetricTensor4<T> {
    type Output = Self;

    fn mul(self, scalar: T) -> Self {
        Self {
            components: self.components.map(|c| c * scalar),
        }
    }
}

impl<T: Real> Div<T> for SymmetricTensor4<T> {
    type Output = Self;

    fn div(self, scalar: T) -> Self {
        Self {
            components: self.components.map(|c| c / scalar),
        }
    }
}
