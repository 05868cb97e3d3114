//! Chain discovery and the frame-sequential run scheduler.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, warn};

use crate::aim::AimSolver;
use crate::error::SpringError;
use crate::host::{RunMonitor, Segment, SegmentId, SpringHost};
use crate::node::{ChainNode, FrameContext};
use crate::spring::{SceneSnapshot, SimulationSettings, SpringParameters};

/// Outcome of a completed (or cancelled) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Frames processed, pose-match pre-pass included.
    pub frames_processed: usize,
    /// The run stopped early on a cancellation request. Frames committed
    /// before the stop are kept.
    pub cancelled: bool,
}

/// Hop cap for the upward walk through unselected segments; a hierarchy
/// deeper than this is treated as malformed.
const MAX_ANCESTOR_HOPS: usize = 1024;

/// Nearest input-set ancestor of `seg`, walking unselected segments via the
/// host hierarchy.
fn nearest_in_set_ancestor(
    host: &dyn SpringHost,
    by_id: &HashMap<SegmentId, &Segment>,
    seg: &Segment,
) -> Result<Option<SegmentId>, SpringError> {
    let mut current = seg.parent;
    let mut hops = 0;
    while let Some(id) = current {
        if by_id.contains_key(&id) {
            return Ok(Some(id));
        }
        hops += 1;
        if hops > MAX_ANCESTOR_HOPS {
            return Err(SpringError::AmbiguousParent(seg.name.clone()));
        }
        current = host.parent_of(id);
    }
    Ok(None)
}

/// Groups the input segments into simulation chains, each ordered root to
/// tip.
///
/// A segment starts a chain when no other input segment sits among its
/// ancestors. Unselected segments between two selected ones are bridged
/// over: the nearer selected segment adopts the farther as its spring
/// child. A chain-starting segment without any parent at all cannot swing,
/// so it is dropped from its own chain; it still parents the proxy of the
/// next member. Children are walked depth-first in input order.
pub fn build_chains(
    host: &dyn SpringHost,
    segments: &[Segment],
) -> Result<Vec<Vec<SegmentId>>, SpringError> {
    let mut by_id: HashMap<SegmentId, &Segment> = HashMap::with_capacity(segments.len());
    let mut names: HashSet<&str> = HashSet::with_capacity(segments.len());
    for seg in segments {
        if !names.insert(seg.name.as_str()) {
            return Err(SpringError::DuplicateSegment(seg.name.clone()));
        }
        if by_id.insert(seg.id, seg).is_some() {
            return Err(SpringError::DuplicateSegmentId(seg.name.clone()));
        }
    }

    let mut chain_parent: HashMap<SegmentId, Option<SegmentId>> =
        HashMap::with_capacity(segments.len());
    for seg in segments {
        chain_parent.insert(seg.id, nearest_in_set_ancestor(host, &by_id, seg)?);
    }

    for seg in segments {
        let mut current = chain_parent[&seg.id];
        let mut hops = 0;
        while let Some(id) = current {
            if id == seg.id || hops > segments.len() {
                return Err(SpringError::AmbiguousParent(seg.name.clone()));
            }
            hops += 1;
            current = chain_parent[&id];
        }
    }

    let mut children: HashMap<SegmentId, Vec<SegmentId>> = HashMap::new();
    for seg in segments {
        if let Some(parent) = chain_parent[&seg.id] {
            children.entry(parent).or_default().push(seg.id);
        }
    }

    let mut chains = Vec::new();
    for seg in segments {
        if chain_parent[&seg.id].is_some() {
            continue;
        }

        let mut chain = Vec::new();
        let mut stack = vec![seg.id];
        while let Some(id) = stack.pop() {
            chain.push(id);
            if let Some(kids) = children.get(&id) {
                for kid in kids.iter().rev() {
                    stack.push(*kid);
                }
            }
        }
        if seg.parent.is_none() {
            chain.remove(0);
        }
        if !chain.is_empty() {
            chains.push(chain);
        }
    }

    Ok(chains)
}

/// Simulates every chain in `segments` over the settings' frame range,
/// writing rotations (and stretch, when extension is active) through `host`.
///
/// Nodes update parent before child within a frame, so each node reads
/// ancestor corrections already committed this frame. A node's capsule
/// contact reaches its parent with a one-frame lag; its plane contact
/// reaches its child in the same frame.
pub fn run(
    host: &mut dyn SpringHost,
    segments: &[Segment],
    params: SpringParameters,
    settings: SimulationSettings,
    scene: &SceneSnapshot,
    monitor: &mut dyn RunMonitor,
) -> Result<RunReport, SpringError> {
    let chains = build_chains(&*host, segments)?;
    let by_id: HashMap<SegmentId, &Segment> = segments.iter().map(|s| (s.id, s)).collect();

    for seg in segments {
        let Some(parent) = seg.parent else { continue };
        let Some(parent) = by_id.get(&parent) else { continue };
        let t = seg.local_translation;
        if t.x < 0.0 || t.y.abs() > 1e-3 || t.z.abs() > 1e-3 {
            warn!(
                "{} primary axis does not point at {}; spring results may drift",
                parent.name, seg.name
            );
        }
    }

    debug!(
        "spring run over frames {}..={}, {} chain(s)",
        settings.start_frame,
        settings.end_frame,
        chains.len()
    );

    host.set_frame(settings.start_frame as f64);
    let solver = Rc::new(AimSolver::new());
    let mut nodes: Vec<ChainNode> = Vec::new();
    let mut cancelled = false;
    for chain in &chains {
        if monitor.is_cancelled() {
            cancelled = true;
            break;
        }
        for i in 0..chain.len().saturating_sub(1) {
            nodes.push(ChainNode::new(
                host,
                chain[i],
                chain[i + 1],
                chain.get(i + 2).copied(),
                if i > 0 { Some(chain[i - 1]) } else { None },
                params,
                settings,
                Rc::clone(&solver),
            ));
        }
    }

    let node_index: HashMap<SegmentId, usize> =
        nodes.iter().enumerate().map(|(i, n)| (n.seg, i)).collect();
    let parent_node: Vec<Option<usize>> = nodes
        .iter()
        .map(|n| n.upstream.and_then(|p| node_index.get(&p).copied()))
        .collect();

    let span = settings.frame_span();
    let sub = i64::from(settings.sub_divisions.max(1));
    let mut total = if settings.is_loop {
        (span * 2 + 1) * sub
    } else {
        span * sub
    };
    if settings.is_pose_match {
        total += span + 1;
    }
    let increment = 100.0 / total.max(1) as f32;
    let mut progress = 0.0f32;
    let mut frames_processed = 0usize;

    monitor.progress(0.0);

    if settings.is_pose_match && !cancelled {
        'pose: for f in 0..=span {
            if monitor.is_cancelled() {
                cancelled = true;
                break;
            }
            host.set_frame(settings.start_frame as f64 + f as f64);
            for node in &mut nodes {
                if monitor.is_cancelled() {
                    cancelled = true;
                    break 'pose;
                }
                node.record_pose(host);
            }
            progress = (progress + increment).min(100.0);
            monitor.progress(progress);
            frames_processed += 1;
        }
    }

    if !cancelled {
        let step = 1.0 / sub as f64;
        let mut offsets: Vec<f64> = (1..=span * sub).map(|i| i as f64 * step).collect();
        if settings.is_loop {
            // Second pass over the whole range, start frame included, so the
            // last frame feeds back into the first.
            offsets.extend((0..=span * sub).map(|i| i as f64 * step));
        }

        'frames: for offset in offsets {
            if monitor.is_cancelled() {
                cancelled = true;
                break;
            }
            let frame = settings.start_frame as f64 + offset;
            host.set_frame(frame);
            for i in 0..nodes.len() {
                if monitor.is_cancelled() {
                    cancelled = true;
                    break 'frames;
                }
                let ancestor_on_plane = parent_node[i]
                    .map(|p| nodes[p].has_plane_collide)
                    .unwrap_or(false);
                let outcome = nodes[i].step(
                    host,
                    &FrameContext {
                        frame,
                        scene,
                        ancestor_on_plane,
                    },
                );
                if let Some(p) = parent_node[i] {
                    nodes[p].has_child_collide = outcome.collided;
                }
            }
            progress = (progress + increment).min(100.0);
            monitor.progress(progress);
            frames_processed += 1;
        }
    }

    if settings.wipe_subframe && !cancelled && !nodes.is_empty() {
        for node in &nodes {
            host.set_blend_weight(node.seg, 0.0);
        }
        let segs: Vec<SegmentId> = nodes.iter().map(|n| n.seg).collect();
        host.wipe_subframes(&segs, settings.start_frame as f64, settings.end_frame as f64);
    }

    for node in &mut nodes {
        node.finalize(host);
    }

    Ok(RunReport {
        frames_processed,
        cancelled,
    })
}
