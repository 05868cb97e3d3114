//! Spring chain simulation for springtail.
//!
//! Computes procedural secondary motion for chains of rigid segments driven
//! by pre-existing primary animation: trailing lag, capsule and bounded-plane
//! collision, and sinusoidal wind. The simulation is deterministic, offline,
//! and frame-sequential; it mutates only rotation (and optionally one length
//! channel) of chain members, writing through a host-provided animation
//! store.
//!
//! The scene graph, animation curves, and viewport feedback belong to the
//! host: implement [`SpringHost`] over your rig and call [`run`].
//!
//! # Example
//!
//! ```ignore
//! use springtail_rig::{run, SceneSnapshot, SilentMonitor, SimulationSettings, SpringParameters};
//!
//! let params = SpringParameters::new(0.5, 0.0, 0.0, 0.0, 0.0);
//! let settings = SimulationSettings::over_frames(1, 30);
//! let report = run(
//!     &mut host,
//!     &segments,
//!     params,
//!     settings,
//!     &SceneSnapshot::default(),
//!     &mut SilentMonitor,
//! )?;
//! assert!(!report.cancelled);
//! ```

mod aim;
mod chain;
mod collide;
mod error;
mod host;
mod node;
mod spring;
#[cfg(test)]
mod testing;

pub use aim::AimSolver;
pub use chain::{build_chains, run, RunReport};
pub use collide::{capsule_in_reach, resolve_capsules, resolve_plane, CapsuleContact};
pub use error::SpringError;
pub use host::{ProxyHandle, RunMonitor, Segment, SegmentId, SilentMonitor, SpringHost};
pub use node::{ChainNode, FrameContext, NodePhase, StepOutcome};
pub use spring::{SceneSnapshot, SimulationSettings, SpringParameters, WindSource};
