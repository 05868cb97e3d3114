//! Plane predicates and the bounded collision plane.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Angle-sum threshold for [`point_in_triangle`], in degrees.
///
/// A point inside the triangle sees the three vertices under angles summing
/// to 360°; the threshold is kept below that to absorb floating error.
const TRIANGLE_ANGLE_SUM_MIN: f32 = 359.0;

/// Signed distance from `p` to the plane with unit normal `n` and offset `d`.
///
/// Positive on the side the normal points toward.
pub fn signed_distance(p: Vec3, n: Vec3, d: f32) -> f32 {
    n.dot(p) - d
}

/// Returns true when `a` and `b` are on the same side of the plane.
pub fn same_side(a: Vec3, b: Vec3, n: Vec3, d: f32) -> bool {
    let da = signed_distance(a, n, d);
    let db = signed_distance(b, n, d);
    da.is_sign_positive() == db.is_sign_positive()
}

/// Projects `p` onto the plane with unit normal `n` and offset `d`.
pub fn project_to_plane(p: Vec3, n: Vec3, d: f32) -> Vec3 {
    p - n * signed_distance(p, n, d)
}

/// Returns true when `p` lies inside triangle `abc`, tested in the plane of
/// the triangle.
///
/// Uses the angle-sum criterion: the angles ∠(a,p,b), ∠(b,p,c), ∠(c,p,a)
/// sum to a full turn iff `p` is enclosed. Invariant under permutation of
/// the vertices. A point coincident with a vertex counts as inside.
pub fn point_in_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> bool {
    let ta = a - p;
    let tb = b - p;
    let tc = c - p;
    // Coincident with a vertex: the angle at that vertex is undefined but
    // the point is trivially enclosed.
    if ta.length_squared() < 1e-12 || tb.length_squared() < 1e-12 || tc.length_squared() < 1e-12 {
        return true;
    }
    let ta = ta.normalize();
    let tb = tb.normalize();
    let tc = tc.normalize();

    let sum = ta.dot(tb).clamp(-1.0, 1.0).acos()
        + tb.dot(tc).clamp(-1.0, 1.0).acos()
        + tc.dot(ta).clamp(-1.0, 1.0).acos();

    sum.to_degrees().abs() > TRIANGLE_ANGLE_SUM_MIN
}

/// A bounded collision plane: a world-space quad with a unit normal.
///
/// Two plane offsets are cached: `d` anchored at a vertex drives the
/// side-of-plane hit tests, `d_center` anchored at the quad center drives
/// the projection applied on a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneQuad {
    /// World vertices, wound so that `[0,1,2]` and `[3,1,2]` cover the quad.
    pub vertices: [Vec3; 4],
    /// Unit normal.
    pub normal: Vec3,
    d: f32,
    d_center: f32,
}

impl PlaneQuad {
    /// Builds a plane from four world vertices and its world normal.
    pub fn new(vertices: [Vec3; 4], normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        let center = (vertices[0] + vertices[1] + vertices[2] + vertices[3]) / 4.0;
        Self {
            vertices,
            normal,
            d: normal.dot(vertices[1]),
            d_center: normal.dot(center),
        }
    }

    /// Signed distance from `p` to the plane.
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        signed_distance(p, self.normal, self.d)
    }

    /// Projects `p` onto the plane through the quad center.
    pub fn project(&self, p: Vec3) -> Vec3 {
        project_to_plane(p, self.normal, self.d_center)
    }

    /// Returns true when the already-projected point `p` falls inside the
    /// quad, tested as two triangles.
    pub fn contains_projected(&self, p: Vec3) -> bool {
        let [v0, v1, v2, v3] = self.vertices;
        point_in_triangle(p, v0, v1, v2) || point_in_triangle(p, v3, v1, v2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> PlaneQuad {
        // Matches a 10x10 ground plane quad at y=0.
        PlaneQuad::new(
            [
                Vec3::new(-5.0, 0.0, 5.0),
                Vec3::new(5.0, 0.0, 5.0),
                Vec3::new(-5.0, 0.0, -5.0),
                Vec3::new(5.0, 0.0, -5.0),
            ],
            Vec3::Y,
        )
    }

    #[test]
    fn test_signed_distance_sides() {
        let q = unit_quad();
        assert!(q.signed_distance(Vec3::new(0.0, 2.0, 0.0)) > 0.0);
        assert!(q.signed_distance(Vec3::new(0.0, -1.0, 0.0)) < 0.0);
        assert!(q.signed_distance(Vec3::new(3.0, 0.0, -2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_same_side() {
        let n = Vec3::Y;
        assert!(same_side(Vec3::new(0.0, 1.0, 0.0), Vec3::new(5.0, 3.0, 1.0), n, 0.0));
        assert!(!same_side(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            n,
            0.0
        ));
    }

    #[test]
    fn test_project_lands_on_plane() {
        let p = Vec3::new(2.0, 7.0, -3.0);
        let projected = project_to_plane(p, Vec3::Y, 1.0);
        assert!((projected.y - 1.0).abs() < 1e-6);
        assert_eq!(projected.x, p.x);
        assert_eq!(projected.z, p.z);
    }

    #[test]
    fn test_point_in_triangle_inside_outside() {
        let a = Vec3::ZERO;
        let b = Vec3::new(4.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 4.0);

        assert!(point_in_triangle(Vec3::new(1.0, 0.0, 1.0), a, b, c));
        assert!(!point_in_triangle(Vec3::new(5.0, 0.0, 5.0), a, b, c));
    }

    #[test]
    fn test_point_in_triangle_permutation_invariant() {
        let a = Vec3::new(-1.0, 0.0, -1.0);
        let b = Vec3::new(3.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 3.0);
        let inside = Vec3::new(0.5, 0.0, 0.5);
        let outside = Vec3::new(4.0, 0.0, 4.0);

        for (x, y, z) in [(a, b, c), (b, c, a), (c, a, b), (a, c, b), (b, a, c), (c, b, a)] {
            assert!(point_in_triangle(inside, x, y, z));
            assert!(!point_in_triangle(outside, x, y, z));
        }
    }

    #[test]
    fn test_point_on_vertex_is_inside() {
        let a = Vec3::ZERO;
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 1.0);
        assert!(point_in_triangle(a, a, b, c));
    }

    #[test]
    fn test_quad_containment() {
        let q = unit_quad();
        assert!(q.contains_projected(Vec3::new(0.0, 0.0, 0.0)));
        assert!(q.contains_projected(Vec3::new(4.5, 0.0, -4.5)));
        assert!(!q.contains_projected(Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn test_quad_project_uses_center() {
        let q = PlaneQuad::new(
            [
                Vec3::new(-1.0, 2.0, 1.0),
                Vec3::new(1.0, 2.0, 1.0),
                Vec3::new(-1.0, 2.0, -1.0),
                Vec3::new(1.0, 2.0, -1.0),
            ],
            Vec3::Y,
        );
        let projected = q.project(Vec3::new(0.25, 9.0, 0.5));
        assert!((projected.y - 2.0).abs() < 1e-6);
    }
}
