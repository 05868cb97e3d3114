//! Per-node spring state and the frame integrator.

use std::rc::Rc;

use glam::{Quat, Vec3};

use crate::aim::AimSolver;
use crate::collide::{resolve_capsules, resolve_plane};
use crate::host::{ProxyHandle, SegmentId, SpringHost};
use crate::spring::{SceneSnapshot, SimulationSettings, SpringParameters};

/// Lifecycle of a chain node across one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePhase {
    /// Constructed at the start frame, no update processed yet.
    Ready,
    /// At least one frame processed.
    Updated,
    /// Proxy released; the node must not be stepped again.
    Finalized,
}

/// What one node update did, fed back to the scheduler for flag propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// The child hit a capsule this frame.
    pub collided: bool,
    /// The child was glued to the collision plane this frame.
    pub plane_hit: bool,
}

/// Inputs shared by every node update of one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Absolute, possibly fractional, frame time.
    pub frame: f64,
    /// Frozen collision and wind inputs.
    pub scene: &'a SceneSnapshot,
    /// The upstream chain member hit the plane earlier this frame.
    pub ancestor_on_plane: bool,
}

/// Owned mutable state for one non-tip chain member.
///
/// State carried between frames: the committed child position, the corrected
/// previous child position, the grandchild position, the committed
/// orientation and up vector, and the collision flags. The rest length is
/// measured once at construction and never recomputed.
#[derive(Debug)]
pub struct ChainNode {
    /// The segment this node rotates.
    pub seg: SegmentId,
    /// The child whose position the spring tracks.
    pub child: SegmentId,
    /// Grandchild used for tension feedback, absent near the tip.
    pub grand_child: Option<SegmentId>,
    /// Previous simulated chain member; carries same-frame plane flags
    /// down the chain and next-frame collision flags back up.
    pub upstream: Option<SegmentId>,

    pub(crate) proxy: ProxyHandle,
    pub(crate) params: SpringParameters,
    pub(crate) settings: SimulationSettings,
    pub(crate) solver: Rc<AimSolver>,

    pub(crate) bone_length: f32,
    pub(crate) child_position: Vec3,
    pub(crate) previous_child_position: Vec3,
    pub(crate) grand_child_position: Option<Vec3>,
    pub(crate) rotation: Quat,
    pub(crate) up_vector: Vec3,

    /// Written by this node's child at the end of its update, consumed by
    /// this node on its next update (one-frame lag by construction).
    pub(crate) has_child_collide: bool,
    /// Written by this node, read by its child in the same frame.
    pub(crate) has_plane_collide: bool,

    pub(crate) phase: NodePhase,
}

impl ChainNode {
    /// Captures a node's initial state at the start frame and attaches its
    /// child proxy.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: &mut dyn SpringHost,
        seg: SegmentId,
        child: SegmentId,
        grand_child: Option<SegmentId>,
        upstream: Option<SegmentId>,
        params: SpringParameters,
        settings: SimulationSettings,
        solver: Rc<AimSolver>,
    ) -> Self {
        let child_position = host.world_position(child);
        let node_position = host.world_position(seg);

        let proxy = host.attach_proxy(seg, child, !settings.is_pose_match);
        if !settings.is_pose_match {
            host.prepare_channels(
                seg,
                child,
                settings.start_frame as f64,
                settings.end_frame as f64,
                params.extend != 0.0,
            );
        }

        Self {
            seg,
            child,
            grand_child,
            upstream,
            proxy,
            params,
            settings,
            solver,
            bone_length: node_position.distance(child_position),
            child_position,
            previous_child_position: child_position,
            grand_child_position: grand_child.map(|g| host.world_position(g)),
            rotation: host.world_rotation(seg),
            up_vector: host.world_up_axis(seg),
            has_child_collide: false,
            has_plane_collide: false,
            phase: NodePhase::Ready,
        }
    }

    /// Rest length measured at construction.
    pub fn bone_length(&self) -> f32 {
        self.bone_length
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> NodePhase {
        self.phase
    }

    /// Records the authored child pose onto the proxy at the current frame
    /// (pose-match pre-pass). The blend weight is zeroed around the snap so
    /// the recorded pose is the authored one, not a half-applied spring.
    pub fn record_pose(&mut self, host: &mut dyn SpringHost) {
        host.set_blend_weight(self.seg, 0.0);
        host.record_proxy_pose(self.proxy);
        host.set_blend_weight(self.seg, 1.0);
    }

    /// Advances this node by one frame step.
    ///
    /// Order within the step: inertia, wind, capsule resolution, plane
    /// resolution (reading the upstream same-frame flag), up-vector twist
    /// blend, weighted aim solve with tension feedback, optional length
    /// extension, state commit.
    pub fn step(&mut self, host: &mut dyn SpringHost, ctx: &FrameContext<'_>) -> StepOutcome {
        debug_assert!(self.phase != NodePhase::Finalized, "stepping a finalized node");

        let substeps = self.settings.substeps();
        let ratio = self.params.ratio / substeps;

        let node_position = host.world_position(self.seg);
        let raw_candidate = host.proxy_position(self.proxy);

        let mut candidate = self.child_position + self.inertia_offset(raw_candidate, substeps, ratio);
        if let Some(wind) = &ctx.scene.wind {
            candidate += wind.offset_at(ctx.frame, substeps);
        }

        let mut corrected_previous = self.child_position;
        let mut collided = false;
        if self.settings.is_collision && !ctx.scene.capsules.is_empty() {
            let contact = resolve_capsules(
                candidate,
                self.child_position,
                node_position,
                self.bone_length,
                &ctx.scene.capsules,
                self.settings.is_fast_move,
            );
            collided = contact.collided;
            candidate = contact.child_position;
            corrected_previous = contact.corrected_previous;
        }

        let mut plane_hit = false;
        if self.settings.is_collision {
            if let Some(plane) = &ctx.scene.plane {
                let (hit, snapped) =
                    resolve_plane(node_position, candidate, plane, ctx.ancestor_on_plane);
                if hit {
                    candidate = snapped;
                    plane_hit = true;
                }
            }
        }

        let up = AimSolver::blend_up(
            self.up_vector,
            host.proxy_up_axis(self.proxy),
            self.params.twist_ratio / substeps,
        );

        let tension = AimSolver::substep_tension(self.params.tension, substeps);
        let mut targets = [
            (candidate, ratio),
            (corrected_previous, 1.0 - ratio),
            (Vec3::ZERO, 0.0),
        ];
        if self.has_child_collide && tension != 0.0 {
            if let Some(grand_child) = self.grand_child_position {
                targets[2] = (grand_child, (1.0 - ratio) * tension);
            }
        }
        let rotation = self.solver.solve(node_position, up, &targets, self.rotation);
        host.commit_rotation(self.seg, rotation);

        if self.params.extend != 0.0 {
            let reach = corrected_previous.distance(node_position);
            let length =
                self.bone_length * (1.0 - self.params.extend) + reach * self.params.extend;
            host.commit_stretch(self.child, length);
        }

        // Commit state as next frame's "previous". The child position is
        // re-read so it reflects the rotation written above.
        self.child_position = host.world_position(self.child);
        self.grand_child_position = self.grand_child.map(|g| host.world_position(g));
        self.previous_child_position = corrected_previous;
        self.rotation = host.world_rotation(self.seg);
        self.up_vector = host.world_up_axis(self.seg);
        self.has_child_collide = collided;
        self.has_plane_collide = plane_hit;
        self.phase = NodePhase::Updated;

        StepOutcome {
            collided,
            plane_hit,
        }
    }

    /// Releases the node's proxy. The node cannot be stepped afterwards.
    pub fn finalize(&mut self, host: &mut dyn SpringHost) {
        if self.phase != NodePhase::Finalized {
            host.release_proxy(self.proxy);
            self.phase = NodePhase::Finalized;
        }
    }

    /// Inertial offset for the candidate child position.
    ///
    /// Primary term: continue along the travel committed last frame, scaled
    /// by `inertia`. Secondary drag term, active only with inertia: pull
    /// toward the raw authored candidate scaled by `(1-ratio)(1-inertia)`.
    /// Both are divided by the substep count.
    fn inertia_offset(&self, raw_candidate: Vec3, substeps: f32, ratio: f32) -> Vec3 {
        let mut offset = Vec3::ZERO;

        if self.params.inertia > 0.0 {
            let drag = raw_candidate - self.child_position;
            let magnitude = (drag * (1.0 - ratio) * (1.0 - self.params.inertia)).length();
            offset = drag.normalize_or_zero() * (magnitude / substeps);
        }

        let travel = self.child_position - self.previous_child_position;
        offset + travel.normalize_or_zero() * (travel.length() * self.params.inertia / substeps)
    }
}
