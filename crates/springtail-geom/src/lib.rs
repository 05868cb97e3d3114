//! Collision predicates and shapes for springtail.
//!
//! Stateless intersection and distance tests used by the spring chain
//! simulation: signed plane distances, point-in-triangle, and segment
//! tests against spheres, finite cylinders, and capsules.
//!
//! All predicates are total: degenerate geometry (zero-length segments,
//! segment parallel to a cylinder axis) is handled with explicit epsilon
//! branches rather than errors.

mod capsule;
mod plane;

pub use capsule::{
    segment_capsule_hit, segment_cylinder_hit, segment_sphere_hit, Capsule,
    INSIDE_PROBE_EXTENSION,
};
pub use plane::{point_in_triangle, project_to_plane, same_side, signed_distance, PlaneQuad};
