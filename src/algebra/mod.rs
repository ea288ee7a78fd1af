//! Concrete value and Jacobian rules for each manifold.
//!
//! Every function here is pure: it takes plain values and returns plain values or
//! fixed-size Jacobians. Dispatch over operations happens in [`crate::rules`] and
//! [`crate::jacobian`].

pub mod rigid_transform;
pub mod rotation;
pub mod vector;

pub use rigid_transform::RigidTransform;
pub use rotation::Rotation;
pub use vector::VectorValue;
