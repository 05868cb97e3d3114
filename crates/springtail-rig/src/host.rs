//! Host-facing traits: scene access, channel writes, and run monitoring.

use glam::{Quat, Vec3};

/// A segment identifier, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(pub u32);

impl SegmentId {
    /// Creates a new segment ID.
    pub fn new(index: u32) -> Self {
        Self(index)
    }
}

/// Handle to a child proxy created by the host for one chain node.
///
/// The proxy carries the authored child pose: snapshot once at run start in
/// the normal case, or keyed per integer frame by the pose-match pre-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProxyHandle(pub u32);

/// Descriptor for one selected chain member.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Host id.
    pub id: SegmentId,
    /// Unique name, used in diagnostics.
    pub name: String,
    /// Parent segment, if any. May reference a segment outside the input
    /// set; the scheduler walks [`SpringHost::parent_of`] through such
    /// segments to find the nearest input ancestor.
    pub parent: Option<SegmentId>,
    /// Rest local translation, used to warn about segments whose primary
    /// axis does not point at their child.
    pub local_translation: Vec3,
}

impl Segment {
    /// Creates a segment descriptor.
    pub fn new(
        id: SegmentId,
        name: impl Into<String>,
        parent: Option<SegmentId>,
        local_translation: Vec3,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            local_translation,
        }
    }
}

/// Scene and animation-store access provided by the host.
///
/// The simulation is frame-sequential: the scheduler calls [`set_frame`],
/// reads world transforms, and commits at most one rotation (and optionally
/// one stretch) write per node per frame. World queries must reflect writes
/// committed earlier in the same frame; parent rotations are corrected
/// before their descendants read them.
///
/// [`set_frame`]: SpringHost::set_frame
pub trait SpringHost {
    /// Moves host evaluation to an absolute, possibly fractional, frame.
    fn set_frame(&mut self, frame: f64);

    /// Immediate hierarchy parent of a segment, whether or not it belongs
    /// to the simulated input set. Lets chains bridge across unselected
    /// segments sitting between two selected ones.
    fn parent_of(&self, seg: SegmentId) -> Option<SegmentId>;

    /// World position of a segment at the current frame.
    fn world_position(&self, seg: SegmentId) -> Vec3;

    /// World rotation of a segment at the current frame.
    fn world_rotation(&self, seg: SegmentId) -> Quat;

    /// World-space Y axis of a segment at the current frame.
    fn world_up_axis(&self, seg: SegmentId) -> Vec3;

    /// Writes a segment's world rotation and keys it at the current frame.
    fn commit_rotation(&mut self, seg: SegmentId, rotation: Quat);

    /// Writes a segment's local primary-axis offset and keys it at the
    /// current frame. Only called when length extension is active.
    fn commit_stretch(&mut self, seg: SegmentId, offset: f32);

    /// Clears existing keys over the simulated range and keys the initial
    /// rotation (and stretch channel when `stretch` is set) so the run
    /// starts from a clean curve. Skipped in pose-match mode.
    fn prepare_channels(&mut self, seg: SegmentId, child: SegmentId, start: f64, end: f64, stretch: bool);

    /// Creates the child proxy for a node: a helper parented one level above
    /// the node so it rigidly follows corrected ancestors. When
    /// `snap_to_child` is set the proxy is snapped to the child's current
    /// world pose; pose-match runs leave it to be keyed by the pre-pass.
    fn attach_proxy(&mut self, seg: SegmentId, child: SegmentId, snap_to_child: bool) -> ProxyHandle;

    /// World position of a proxy at the current frame.
    fn proxy_position(&self, proxy: ProxyHandle) -> Vec3;

    /// World-space Y axis of a proxy at the current frame.
    fn proxy_up_axis(&self, proxy: ProxyHandle) -> Vec3;

    /// Pose-match recording: snap the proxy to the child's current world
    /// pose and key it at the current frame. The node's blend weight is
    /// zeroed around the snap so the recorded pose is the authored one.
    fn record_proxy_pose(&mut self, proxy: ProxyHandle);

    /// Releases a proxy at the end of a run.
    fn release_proxy(&mut self, proxy: ProxyHandle);

    /// Sets the pose-match blend weight for a node: 0 makes the recorded
    /// proxy pose authoritative, 1 the spring-computed orientation.
    fn set_blend_weight(&mut self, seg: SegmentId, weight: f32);

    /// Resamples the committed channels of `segs` onto integer frames,
    /// discarding sub-frame keys.
    fn wipe_subframes(&mut self, segs: &[SegmentId], start: f64, end: f64);
}

/// Progress and cancellation for one run.
///
/// Cancellation is cooperative: it is polled before each frame and each
/// node, an in-progress node update always finishes, and committed frames
/// are never rolled back.
pub trait RunMonitor {
    /// Reports overall progress in `[0, 100]`, once per processed frame.
    fn progress(&mut self, percent: f32) {
        let _ = percent;
    }

    /// Polled before each unit of work; return true to stop the run.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Monitor that reports nothing and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentMonitor;

impl RunMonitor for SilentMonitor {}
