//! Spring parameters, run settings, and the frozen scene snapshot.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use springtail_geom::{Capsule, PlaneQuad};

/// Per-chain spring behavior. Immutable for the duration of a run and shared
/// by every node.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpringParameters {
    /// Blend toward the new child position versus the previous one, in [0, 1].
    pub ratio: f32,
    /// How fast the up vector follows the animated pose, in [0, 1].
    pub twist_ratio: f32,
    /// Grandchild feedback weight applied while the child is colliding, ≥ 0.
    pub tension: f32,
    /// Length stretch amount, in [0, 1]. Zero keeps segments rigid.
    pub extend: f32,
    /// Resistance to direction change, in [0, 1].
    pub inertia: f32,
}

impl Default for SpringParameters {
    fn default() -> Self {
        Self {
            ratio: 0.5,
            twist_ratio: 0.0,
            tension: 0.0,
            extend: 0.0,
            inertia: 0.0,
        }
    }
}

impl SpringParameters {
    /// Creates parameters, clamping each field to its valid range.
    pub fn new(ratio: f32, twist_ratio: f32, tension: f32, extend: f32, inertia: f32) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
            twist_ratio: twist_ratio.clamp(0.0, 1.0),
            tension: tension.max(0.0),
            extend: extend.clamp(0.0, 1.0),
            inertia: inertia.clamp(0.0, 1.0),
        }
    }
}

/// Settings for one simulation run. Read-only once the run starts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationSettings {
    /// First frame of the simulated range. Also the initial-condition frame.
    pub start_frame: i32,
    /// Last frame of the simulated range. Must be ≥ `start_frame`.
    pub end_frame: i32,
    /// Sub-steps per frame, ≥ 1. Higher values stabilize fast motion.
    pub sub_divisions: u32,
    /// Re-simulate the first frame after the last so looped playback closes.
    pub is_loop: bool,
    /// Record the authored pose in a pre-pass for blend-weighted matching.
    pub is_pose_match: bool,
    /// Enable capsule and plane collision.
    pub is_collision: bool,
    /// When both collision probes hit, also snap the corrected previous
    /// position; helps fast-travelling chains escape volumes.
    pub is_fast_move: bool,
    /// Resample committed channels onto integer frames after the run.
    pub wipe_subframe: bool,
}

impl SimulationSettings {
    /// Creates settings over a frame range with defaults for everything else.
    pub fn over_frames(start_frame: i32, end_frame: i32) -> Self {
        Self {
            start_frame,
            end_frame: end_frame.max(start_frame),
            sub_divisions: 1,
            is_loop: false,
            is_pose_match: false,
            is_collision: false,
            is_fast_move: false,
            wipe_subframe: true,
        }
    }

    /// Sub-division count as a float factor, never below one.
    pub(crate) fn substeps(&self) -> f32 {
        self.sub_divisions.max(1) as f32
    }

    /// Whole frames in the range, excluding the initial-condition frame.
    pub(crate) fn frame_span(&self) -> i64 {
        (self.end_frame - self.start_frame) as i64
    }
}

/// A sinusoidal wind source.
///
/// The force oscillates between `min_force` and `max_force` at `frequency`
/// cycles per frame, pushing along `direction` (the source's world X axis).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindSource {
    /// Force at the crest of the oscillation.
    pub max_force: f32,
    /// Force at the trough of the oscillation.
    pub min_force: f32,
    /// Oscillation frequency in cycles per frame.
    pub frequency: f32,
    /// World-space push direction.
    pub direction: Vec3,
}

impl WindSource {
    /// Instantaneous force magnitude at an absolute frame time.
    pub fn force_at(&self, frame: f64) -> f32 {
        let mid = (self.max_force + self.min_force) / 2.0;
        let amplitude = (self.max_force - self.min_force) / 2.0;
        mid + (frame as f32 * self.frequency).sin() * amplitude
    }

    /// World-space offset contributed per sub-step at an absolute frame time.
    pub fn offset_at(&self, frame: f64, substeps: f32) -> Vec3 {
        self.direction.normalize_or_zero() * (self.force_at(frame) / substeps)
    }
}

/// Collision and wind inputs, snapshot once at run start.
///
/// External mutation of the source scene mid-run has no effect until the
/// next run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SceneSnapshot {
    /// Capsule collision volumes.
    pub capsules: Vec<Capsule>,
    /// Bounded collision plane, if authored.
    pub plane: Option<PlaneQuad>,
    /// Wind source, if authored.
    pub wind: Option<WindSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_clamped() {
        let p = SpringParameters::new(1.5, -0.2, -3.0, 2.0, 0.7);
        assert_eq!(p.ratio, 1.0);
        assert_eq!(p.twist_ratio, 0.0);
        assert_eq!(p.tension, 0.0);
        assert_eq!(p.extend, 1.0);
        assert_eq!(p.inertia, 0.7);
    }

    #[test]
    fn test_settings_range_is_ordered() {
        let s = SimulationSettings::over_frames(10, 3);
        assert_eq!(s.end_frame, 10);
        assert_eq!(s.frame_span(), 0);
    }

    #[test]
    fn test_wind_force_bounds() {
        let wind = WindSource {
            max_force: 2.0,
            min_force: 1.0,
            frequency: 0.37,
            direction: Vec3::X,
        };
        for frame in 0..200 {
            let f = wind.force_at(frame as f64);
            assert!((1.0..=2.0).contains(&f), "force {f} out of range");
        }
    }

    #[test]
    fn test_wind_offset_scales_with_substeps() {
        let wind = WindSource {
            max_force: 1.0,
            min_force: 1.0,
            frequency: 1.0,
            direction: Vec3::new(2.0, 0.0, 0.0),
        };
        let whole = wind.offset_at(5.0, 1.0);
        let halved = wind.offset_at(5.0, 2.0);
        assert!((whole.x - 1.0).abs() < 1e-6);
        assert!((halved.x - 0.5).abs() < 1e-6);
    }
}
