//! Assembly of UDG hexahedral domains into global residual vectors and stiffness matrices.
//!
//! Element evaluations are independent of each other and are the unit of parallel work. The
//! scatter into shared global containers is where elements interact: the residual is
//! accumulated into per-worker buffers that are summed at the end, and element stiffness
//! matrices are computed concurrently but scattered on a single thread in element order.
mod domain;
mod global;

pub use domain::*;
pub use global::*;
