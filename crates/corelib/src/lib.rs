//! Core types: math re-exports, model placement, camera and orbit.

pub use glam::{Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod transform;
