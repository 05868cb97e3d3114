//! Minimal forward-kinematics host used by the unit tests.

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::host::{ProxyHandle, Segment, SegmentId, SpringHost};

struct Joint {
    parent: Option<usize>,
    local_translation: Vec3,
    local_rotation: Quat,
    /// Authored translation over time, used to drive roots.
    driver: Option<Box<dyn Fn(f64) -> Vec3>>,
}

struct Proxy {
    parent: Option<usize>,
    local_translation: Vec3,
    local_rotation: Quat,
    /// Recorded world poses, keyed by the pose-match pre-pass.
    keys: Vec<(f64, Vec3, Quat)>,
    released: bool,
}

/// In-memory joint hierarchy implementing [`SpringHost`].
///
/// Committed rotations overwrite local state immediately, so world queries
/// made later in the same frame see them, like a scene graph would.
pub(crate) struct StickHost {
    joints: Vec<Joint>,
    proxies: Vec<Proxy>,
    frame: f64,
    rotation_log: HashMap<u32, Vec<(f64, Quat)>>,
    stretch_log: HashMap<u32, Vec<(f64, f32)>>,
    pub blend_events: Vec<(SegmentId, f32)>,
    pub prepared: Vec<SegmentId>,
    pub wiped: Option<(Vec<SegmentId>, f64, f64)>,
}

impl StickHost {
    /// Builds `count` joints chained along +X with unit bones; joint 0 is
    /// the unparented root. Returns descriptors for every joint.
    pub fn straight_chain(count: usize) -> (Self, Vec<Segment>) {
        let mut joints = Vec::with_capacity(count);
        let mut segments = Vec::with_capacity(count);
        for i in 0..count {
            let local = if i == 0 { Vec3::ZERO } else { Vec3::X };
            joints.push(Joint {
                parent: i.checked_sub(1),
                local_translation: local,
                local_rotation: Quat::IDENTITY,
                driver: None,
            });
            segments.push(Segment::new(
                SegmentId(i as u32),
                format!("joint{i}"),
                i.checked_sub(1).map(|p| SegmentId(p as u32)),
                local,
            ));
        }
        (
            Self {
                joints,
                proxies: Vec::new(),
                frame: 0.0,
                rotation_log: HashMap::new(),
                stretch_log: HashMap::new(),
                blend_events: Vec::new(),
                prepared: Vec::new(),
                wiped: None,
            },
            segments,
        )
    }

    /// Drives a joint's local translation from an animation function.
    pub fn drive(&mut self, seg: SegmentId, f: impl Fn(f64) -> Vec3 + 'static) {
        self.joints[seg.0 as usize].driver = Some(Box::new(f));
    }

    pub fn rotation_keys(&self, seg: SegmentId) -> &[(f64, Quat)] {
        self.rotation_log
            .get(&seg.0)
            .map(|keys| keys.as_slice())
            .unwrap_or(&[])
    }

    pub fn stretch_keys(&self, seg: SegmentId) -> &[(f64, f32)] {
        self.stretch_log
            .get(&seg.0)
            .map(|keys| keys.as_slice())
            .unwrap_or(&[])
    }

    pub fn live_proxy_count(&self) -> usize {
        self.proxies.iter().filter(|p| !p.released).count()
    }

    pub fn proxy_key_total(&self) -> usize {
        self.proxies.iter().map(|p| p.keys.len()).sum()
    }

    fn local_of(&self, index: usize) -> (Vec3, Quat) {
        let joint = &self.joints[index];
        let translation = match &joint.driver {
            Some(driver) => driver(self.frame),
            None => joint.local_translation,
        };
        (translation, joint.local_rotation)
    }

    fn world_of(&self, index: usize) -> (Vec3, Quat) {
        let (translation, rotation) = self.local_of(index);
        match self.joints[index].parent {
            None => (translation, rotation),
            Some(parent) => {
                let (pt, pr) = self.world_of(parent);
                (pt + pr * translation, pr * rotation)
            }
        }
    }

    fn proxy_world(&self, handle: ProxyHandle) -> (Vec3, Quat) {
        let proxy = &self.proxies[handle.0 as usize];
        if !proxy.keys.is_empty() {
            // Recorded pose wins; hold the nearest key at or before the
            // current frame.
            let mut pose = (proxy.keys[0].1, proxy.keys[0].2);
            for (frame, position, rotation) in &proxy.keys {
                if *frame <= self.frame + 1e-9 {
                    pose = (*position, *rotation);
                }
            }
            return pose;
        }
        match proxy.parent {
            None => (proxy.local_translation, proxy.local_rotation),
            Some(parent) => {
                let (pt, pr) = self.world_of(parent);
                (pt + pr * proxy.local_translation, pr * proxy.local_rotation)
            }
        }
    }
}

impl SpringHost for StickHost {
    fn set_frame(&mut self, frame: f64) {
        self.frame = frame;
    }

    fn parent_of(&self, seg: SegmentId) -> Option<SegmentId> {
        self.joints[seg.0 as usize]
            .parent
            .map(|p| SegmentId(p as u32))
    }

    fn world_position(&self, seg: SegmentId) -> Vec3 {
        self.world_of(seg.0 as usize).0
    }

    fn world_rotation(&self, seg: SegmentId) -> Quat {
        self.world_of(seg.0 as usize).1
    }

    fn world_up_axis(&self, seg: SegmentId) -> Vec3 {
        self.world_of(seg.0 as usize).1 * Vec3::Y
    }

    fn commit_rotation(&mut self, seg: SegmentId, rotation: Quat) {
        let index = seg.0 as usize;
        let parent_rotation = match self.joints[index].parent {
            None => Quat::IDENTITY,
            Some(parent) => self.world_of(parent).1,
        };
        self.joints[index].local_rotation = parent_rotation.inverse() * rotation;
        self.rotation_log
            .entry(seg.0)
            .or_default()
            .push((self.frame, rotation));
    }

    fn commit_stretch(&mut self, seg: SegmentId, offset: f32) {
        self.joints[seg.0 as usize].local_translation.x = offset;
        self.stretch_log
            .entry(seg.0)
            .or_default()
            .push((self.frame, offset));
    }

    fn prepare_channels(
        &mut self,
        seg: SegmentId,
        _child: SegmentId,
        _start: f64,
        _end: f64,
        _stretch: bool,
    ) {
        self.prepared.push(seg);
    }

    fn attach_proxy(&mut self, seg: SegmentId, child: SegmentId, snap_to_child: bool) -> ProxyHandle {
        let parent = self.joints[seg.0 as usize].parent;
        let (child_position, child_rotation) = self.world_of(child.0 as usize);
        let (local_translation, local_rotation) = if snap_to_child {
            match parent {
                None => (child_position, child_rotation),
                Some(p) => {
                    let (pt, pr) = self.world_of(p);
                    (pr.inverse() * (child_position - pt), pr.inverse() * child_rotation)
                }
            }
        } else {
            (Vec3::ZERO, Quat::IDENTITY)
        };
        self.proxies.push(Proxy {
            parent,
            local_translation,
            local_rotation,
            keys: Vec::new(),
            released: false,
        });
        ProxyHandle(self.proxies.len() as u32 - 1)
    }

    fn proxy_position(&self, proxy: ProxyHandle) -> Vec3 {
        self.proxy_world(proxy).0
    }

    fn proxy_up_axis(&self, proxy: ProxyHandle) -> Vec3 {
        self.proxy_world(proxy).1 * Vec3::Y
    }

    fn record_proxy_pose(&mut self, proxy: ProxyHandle) {
        // Record the pose the proxy currently follows. The mock has no
        // blend layer, so the followed pose stands in for the authored one.
        let (position, rotation) = self.proxy_world(proxy);
        self.proxies[proxy.0 as usize]
            .keys
            .push((self.frame, position, rotation));
    }

    fn release_proxy(&mut self, proxy: ProxyHandle) {
        self.proxies[proxy.0 as usize].released = true;
    }

    fn set_blend_weight(&mut self, seg: SegmentId, weight: f32) {
        self.blend_events.push((seg, weight));
    }

    fn wipe_subframes(&mut self, segs: &[SegmentId], start: f64, end: f64) {
        for seg in segs {
            if let Some(keys) = self.rotation_log.get_mut(&seg.0) {
                keys.retain(|(frame, _)| frame.fract().abs() < 1e-6);
            }
        }
        self.wiped = Some((segs.to_vec(), start, end));
    }
}
