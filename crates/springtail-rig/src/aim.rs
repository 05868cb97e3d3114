//! Weighted aim solve for node orientations.

use glam::{Mat3, Quat, Vec3};

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Orientation solver shared by every chain of one run via `Rc`.
///
/// Aims a node's primary axis at the weighted average of up to three target
/// positions (raw candidate, corrected previous, grandchild feedback), with
/// a world-up hint controlling roll. Owned explicitly and released when the
/// last chain drops it; concurrent runs need independent instances.
#[derive(Debug, Clone, PartialEq)]
pub struct AimSolver {
    /// Local axis aimed at the target.
    pub aim_axis: Vec3,
    /// Local axis steered toward the world-up hint.
    pub up_axis: Vec3,
}

impl Default for AimSolver {
    fn default() -> Self {
        Self {
            aim_axis: Vec3::X,
            up_axis: Vec3::Y,
        }
    }
}

impl AimSolver {
    /// Creates a solver aiming +X with +Y up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescales `tension` so its total influence is invariant under
    /// sub-stepping. Identity at one sub-division.
    pub fn substep_tension(tension: f32, substeps: f32) -> f32 {
        tension * (sigmoid(1.0 - substeps) + 0.5)
    }

    /// Blends the previous up vector toward the current proxy Y axis by `t`,
    /// renormalizing the result.
    pub fn blend_up(previous: Vec3, current: Vec3, t: f32) -> Vec3 {
        let previous = previous.normalize_or_zero();
        let current = current.normalize_or_zero();
        (previous * (1.0 - t) + current * t).normalize_or(previous)
    }

    /// Solves the orientation aiming from `origin` at the weight-averaged
    /// target, rolling the up axis toward `up_hint`.
    ///
    /// Zero total weight, a target coincident with the origin, or an up hint
    /// parallel to the aim direction never fail: the solve falls back to
    /// `current` or an arbitrary orthonormal roll.
    pub fn solve(&self, origin: Vec3, up_hint: Vec3, targets: &[(Vec3, f32)], current: Quat) -> Quat {
        let total: f32 = targets.iter().map(|(_, w)| w).sum();
        if total <= f32::EPSILON {
            return current;
        }

        let mut target = Vec3::ZERO;
        for (position, weight) in targets {
            target += *position * (*weight / total);
        }

        let aim = (target - origin).normalize_or_zero();
        if aim == Vec3::ZERO {
            return current;
        }

        let mut side = aim.cross(up_hint.normalize_or_zero());
        if side.length_squared() < 1e-10 {
            side = aim.any_orthonormal_vector();
        }
        // Basis mapping aim_axis → aim and up_axis → the closest roll to the
        // hint. The solver's axes are +X/+Y, so the basis columns are
        // (aim, up, side) directly.
        let side = side.normalize();
        let up = side.cross(aim);

        Quat::from_mat3(&Mat3::from_cols(aim, up, side))
    }
}
