//! Collision resolver: applies the geometric predicates to a node's
//! candidate motion against the capsule set and the bounded plane.

use glam::Vec3;
use springtail_geom::{Capsule, PlaneQuad};

/// Result of resolving a candidate child position against the capsule set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleContact {
    /// True when either probe direction hit a capsule.
    pub collided: bool,
    /// Candidate child position, possibly snapped to a capsule surface.
    pub child_position: Vec3,
    /// Corrected previous child position, fed to the orientation solve.
    pub corrected_previous: Vec3,
}

/// Cheap reach test: a capsule can only touch the moving child when the
/// node sits within bone length plus radius of the capsule axis line.
pub fn capsule_in_reach(node_position: Vec3, bone_length: f32, capsule: &Capsule) -> bool {
    capsule.axis_distance(node_position) < bone_length + capsule.radius
}

/// Nearest hit to `reference` across `capsules` for the probe `sa → sb`.
fn closest_hit(sa: Vec3, sb: Vec3, capsules: &[&Capsule], reference: Vec3) -> Option<Vec3> {
    let mut best: Option<Vec3> = None;
    let mut best_dist = f32::INFINITY;

    for capsule in capsules {
        if let Some(hit) = capsule.segment_hit(sa, sb) {
            let dist = hit.distance(reference);
            if dist < best_dist {
                best_dist = dist;
                best = Some(hit);
            }
        }
    }

    best
}

/// Resolves the motion from the committed child position to `candidate`
/// against every capsule in reach of the node.
///
/// Both probe directions are tested because penetration direction is
/// ambiguous once a point is already inside a volume:
///
/// - only the candidate-side probe hits: snap the candidate to it;
/// - only the committed-side probe hits: correct the previous position only,
///   letting the candidate stand;
/// - both hit: take the hit nearer the midpoint of the travel, and under
///   `fast_move` also drag the corrected previous position onto it.
pub fn resolve_capsules(
    candidate: Vec3,
    committed_child: Vec3,
    node_position: Vec3,
    bone_length: f32,
    capsules: &[Capsule],
    fast_move: bool,
) -> CapsuleContact {
    let mut contact = CapsuleContact {
        collided: false,
        child_position: candidate,
        corrected_previous: committed_child,
    };

    let in_reach: Vec<&Capsule> = capsules
        .iter()
        .filter(|c| capsule_in_reach(node_position, bone_length, c))
        .collect();
    if in_reach.is_empty() {
        return contact;
    }

    let from_candidate = closest_hit(candidate, committed_child, &in_reach, committed_child);
    let from_committed = closest_hit(committed_child, candidate, &in_reach, committed_child);

    match (from_candidate, from_committed) {
        (Some(hit), None) => contact.child_position = hit,
        (None, Some(hit)) => contact.corrected_previous = hit,
        (Some(a), Some(b)) => {
            let midpoint = (committed_child + candidate) / 2.0;
            contact.child_position = if a.distance(midpoint) < b.distance(midpoint) {
                a
            } else {
                b
            };
            if fast_move {
                contact.corrected_previous = contact.child_position;
            }
        }
        (None, None) => {}
    }

    contact.collided = from_candidate.is_some() || from_committed.is_some();
    contact
}

/// Resolves a child position against the bounded plane.
///
/// A hit requires the node above the plane, the child below it, and the
/// child's projection inside the quad — or an ancestor already on the plane
/// this frame, which glues the rest of the chain to it. On hit the child is
/// projected onto the plane.
pub fn resolve_plane(
    node_position: Vec3,
    child_position: Vec3,
    plane: &PlaneQuad,
    ancestor_on_plane: bool,
) -> (bool, Vec3) {
    let projected = plane.project(child_position);

    let crossed = plane.signed_distance(node_position) > 0.0
        && plane.signed_distance(child_position) < 0.0
        && plane.contains_projected(projected);

    if crossed || ancestor_on_plane {
        (true, projected)
    } else {
        (false, child_position)
    }
}
