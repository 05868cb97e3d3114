//! Capsule shape and segment intersection tests.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::plane::{project_to_plane, same_side};

const EPSILON: f32 = 1e-6;

/// Probe extension, in world units, used by [`segment_capsule_hit`] when both
/// segment endpoints are already inside the capsule.
///
/// The probe ray is restarted this far past the start point along the travel
/// direction and cast back toward it, so the surface exit point can still be
/// found. Resolution is only correct for capsules smaller than this span.
pub const INSIDE_PROBE_EXTENSION: f32 = 200.0;

/// A capsule collision volume: a cylinder capped by two hemispheres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Capsule {
    /// Center of the first cap sphere.
    pub a: Vec3,
    /// Center of the second cap sphere.
    pub b: Vec3,
    /// Radius of the cylinder and both caps.
    pub radius: f32,
}

impl Capsule {
    /// Creates a capsule between two sphere centers.
    pub fn new(a: Vec3, b: Vec3, radius: f32) -> Self {
        Self { a, b, radius }
    }

    /// Returns true when `p` is inside the capsule: inside the cylindrical
    /// span (between both cap planes and within the radius) or inside either
    /// end sphere.
    pub fn contains_point(&self, p: Vec3) -> bool {
        point_in_cylinder(p, self.a, self.b, self.radius)
            || point_in_sphere(p, self.a, self.radius)
            || point_in_sphere(p, self.b, self.radius)
    }

    /// Distance from `p` to the infinite line through the capsule axis.
    pub fn axis_distance(&self, p: Vec3) -> f32 {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        if len_sq < EPSILON {
            return self.a.distance(p);
        }
        let foot = self.a + ab * ((p - self.a).dot(ab) / len_sq);
        foot.distance(p)
    }

    /// Nearest intersection of segment `sa → sb` with this capsule.
    pub fn segment_hit(&self, sa: Vec3, sb: Vec3) -> Option<Vec3> {
        segment_capsule_hit(sa, sb, self.a, self.b, self.radius)
    }
}

fn point_in_sphere(p: Vec3, c: Vec3, r: f32) -> bool {
    (p - c).length() <= r
}

/// Point-in-finite-cylinder via two cap-plane side tests and a radial check
/// against the axis.
fn point_in_cylinder(pt: Vec3, p: Vec3, q: Vec3, r: f32) -> bool {
    let mid = (p + q) / 2.0;
    let n = (q - p).normalize_or_zero();

    if !same_side(pt, mid, n, n.dot(p)) {
        return false;
    }
    let d = n.dot(q);
    if !same_side(pt, mid, n, d) {
        return false;
    }

    project_to_plane(pt, n, d).distance(q) <= r
}

/// Nearest intersection of segment `sa → sb` with the sphere at `c`.
///
/// Solves the quadratic along the normalized segment direction; roots behind
/// the start or past the segment end are rejected. A start point already
/// inside the sphere (negative discriminant term) falls through to the root
/// solve rather than being rejected outright.
pub fn segment_sphere_hit(sa: Vec3, sb: Vec3, c: Vec3, r: f32) -> Option<Vec3> {
    let dir = (sb - sa).normalize_or_zero();
    let m = sa - c;
    let b = m.dot(dir);
    let cc = m.dot(m) - r * r;

    // Start outside and pointing away: no hit.
    if cc > 0.0 && b > 0.0 {
        return None;
    }

    let discr = b * b - cc;
    if discr < 0.0 {
        return None;
    }

    let t = -b - discr.sqrt();
    if t < 0.0 || t > sa.distance(sb) {
        return None;
    }

    Some(sa + dir * t)
}

/// Nearest intersection of segment `sa → sb` with the finite cylinder whose
/// axis runs `p → q`.
///
/// Slab test on axis-projected quantities. A segment near-parallel to the
/// axis (`|a| < ε`) is resolved by a case split on where the segment origin
/// projects along the axis span; roots falling outside the span are clamped
/// to the cap plane and revalidated radially. A zero-length axis has no
/// cylindrical surface and never hits.
pub fn segment_cylinder_hit(sa: Vec3, sb: Vec3, p: Vec3, q: Vec3, r: f32) -> Option<Vec3> {
    let d = q - p;
    let m = sa - p;
    let n = sb - sa;
    let md = m.dot(d);
    let nd = n.dot(d);
    let dd = d.dot(d);

    // Zero-length axis: no cylindrical surface, the cap spheres own it.
    if dd < EPSILON {
        return None;
    }

    // Entirely outside either cap plane.
    if md < 0.0 && md + nd < 0.0 {
        return None;
    }
    if md > dd && md + nd > dd {
        return None;
    }

    let nn = n.dot(n);
    let mn = m.dot(n);

    let a = dd * nn - nd * nd;
    let k = m.dot(m) - r * r;
    let c = dd * k - md * md;

    if a.abs() < EPSILON {
        // Segment parallel to the axis.
        if c > 0.0 {
            return None;
        }
        let t = if md < 0.0 {
            -mn / nn
        } else if md > dd {
            (nd - mn) / nn
        } else {
            0.0
        };
        return Some(sa.lerp(sb, t));
    }

    let b = dd * mn - nd * md;
    let discr = b * b - a * c;
    if discr < 0.0 {
        return None;
    }

    let t = (-b - discr.sqrt()) / a;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    if md + t * nd < 0.0 {
        // Crosses the p-side cap plane.
        if nd <= 0.0 {
            return None;
        }
        let t = -md / nd;
        if k + 2.0 * t * (mn + t * nn) <= 0.0 {
            return Some(sa.lerp(sb, t));
        }
        return None;
    } else if md + t * nd > dd {
        // Crosses the q-side cap plane.
        if nd >= 0.0 {
            return None;
        }
        let t = (dd - md) / nd;
        if k + dd - 2.0 * md + t * (2.0 * (mn - nd) + t * nn) <= 0.0 {
            return Some(sa.lerp(sb, t));
        }
        return None;
    }

    Some(sa.lerp(sb, t))
}

/// Nearest intersection of segment `sa → sb` with the capsule `p`/`q`/`r`,
/// measured from the probe start.
///
/// When the start point is inside the capsule the probe is reordered so it
/// runs from outside in: if only `sa` is inside the segment is reversed, and
/// if both endpoints are inside the probe is restarted
/// [`INSIDE_PROBE_EXTENSION`] units past `sa` along the travel direction and
/// cast back toward `sa`. Both end spheres and the cylinder are tested; the
/// hit nearest the probe start wins.
pub fn segment_capsule_hit(sa: Vec3, sb: Vec3, p: Vec3, q: Vec3, r: f32) -> Option<Vec3> {
    let capsule = Capsule::new(p, q, r);
    let (sa, sb) = if capsule.contains_point(sa) {
        if capsule.contains_point(sb) {
            let probe = sa + (sb - sa).normalize_or_zero() * INSIDE_PROBE_EXTENSION;
            (probe, sa)
        } else {
            (sb, sa)
        }
    } else {
        (sa, sb)
    };

    let mut best: Option<Vec3> = None;
    let mut best_dist = f32::INFINITY;

    for hit in [
        segment_sphere_hit(sa, sb, p, r),
        segment_sphere_hit(sa, sb, q, r),
        segment_cylinder_hit(sa, sb, p, q, r),
    ]
    .into_iter()
    .flatten()
    {
        let dist = sa.distance(hit);
        if dist < best_dist {
            best_dist = dist;
            best = Some(hit);
        }
    }

    best
}
