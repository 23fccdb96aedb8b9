//! Separating-axis search over face normals and filtered edge pairs.
//!
//! The edge phase runs first so that a face axis with an equal or better
//! score wins the merge; face contacts are numerically better behaved than
//! edge contacts, and [`FACE_PREFERENCE_BIAS`] extends that preference to
//! near ties.
//!
//! Axis conventions follow the solver: the winning axis points from hull B
//! toward hull A (the direction an impulse on A would be applied), so the
//! support of a hull along an axis is the *minimum* vertex projection.

use glam::Vec3;
use tracing::{debug, trace};

use crate::body::RigidBody;
use crate::hull::WorldHull;

/// Edge-pair cross products below this magnitude are treated as parallel and
/// skipped before the Gauss-map filter runs.
const PARALLEL_EDGE_EPS: f32 = 0.001;

/// An edge axis must beat the best face axis by more than this to win the
/// merge.
const FACE_PREFERENCE_BIAS: f32 = 0.001;

/// Feature type that produced the winning axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSource {
    Face,
    Edge,
}

/// Which hull of a tested pair owns the reference face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HullSide {
    A,
    B,
}

/// Outcome of one pair test. `distance <= 0` means no separating axis was
/// found (the hulls overlap); a positive `distance` proves separation and the
/// axis is diagnostic only.
#[derive(Debug, Clone, Copy)]
pub struct SeparatingAxisResult {
    pub distance: f32,
    /// Unit axis pointing from hull B toward hull A.
    pub axis: Vec3,
    pub source: AxisSource,
    /// Best face-phase score, kept independently of the merge.
    pub face_distance: f32,
    pub face_axis: Vec3,
    /// Best edge-phase score. `INFINITY` when no edge pair survived the
    /// parallel skip and the Gauss-map filter.
    pub edge_distance: f32,
    pub edge_axis: Vec3,
    /// Winning face index, valid when `source == Face`.
    pub face: usize,
    /// Hull owning the reference face, valid when `source == Face`.
    pub reference: HullSide,
    /// Winning edge indices on hulls A and B, valid when `source == Edge`.
    pub edges: [usize; 2],
}

impl SeparatingAxisResult {
    #[inline]
    pub fn is_overlap(&self) -> bool {
        self.distance <= 0.0
    }
}

/// Running best (maximum separation) over candidate axes.
struct AxisTracker {
    distance: f32,
    axis: Vec3,
    initialized: bool,
}

impl AxisTracker {
    fn new() -> Self {
        Self {
            distance: 0.0,
            axis: Vec3::ZERO,
            initialized: false,
        }
    }

    /// Accept the candidate if it is the first or beats the current best.
    fn offer(&mut self, distance: f32, axis: Vec3) -> bool {
        if !self.initialized || distance > self.distance {
            self.distance = distance;
            self.axis = axis;
            self.initialized = true;
            true
        } else {
            false
        }
    }

    fn result(&self) -> Option<(f32, Vec3)> {
        self.initialized.then_some((self.distance, self.axis))
    }
}

/// Support of a hull along an inward-pointing axis: the minimum vertex
/// projection (the deepest penetrating vertex by the axis convention).
fn support_distance(hull: &WorldHull, axis: Vec3) -> f32 {
    let mut min_dot = f32::INFINITY;
    for &p in hull.positions() {
        min_dot = min_dot.min(axis.dot(p));
    }
    min_dot
}

/// Separation of hull B from the supporting plane of an edge on hull A: the
/// projected gap between B's deepest vertex along `axis` and the plane
/// through `edge_origin`. Unlike the face phase this is a single projected
/// gap, not a sum of opposing supports; the asymmetry is intentional and
/// affects which axis wins close contests.
fn edge_plane_gap(hull_b: &WorldHull, axis: Vec3, edge_origin: Vec3) -> f32 {
    let mut deepest = f32::NEG_INFINITY;
    for &p in hull_b.positions() {
        deepest = deepest.max(axis.dot(p));
    }
    deepest - axis.dot(edge_origin)
}

/// Gauss-map test: an edge pair can only be the supporting feature of the
/// Minkowski difference if each edge's direction separates the other edge's
/// two adjacent face normals (the great-circle arcs cross).
///
/// `normal_b` starts as edge B's normal and may be negated by the degenerate
/// retry; the caller must rebuild the candidate axis from it afterwards.
pub fn is_supporting_edge_pair(
    hull_a: &WorldHull,
    edge_a: usize,
    hull_b: &WorldHull,
    edge_b: usize,
    normal_b: &mut Vec3,
) -> bool {
    let ea = &hull_a.edges()[edge_a];
    let eb = &hull_b.edges()[edge_b];
    let na0 = hull_a.faces()[ea.faces[0]].normal;
    let na1 = hull_a.faces()[ea.faces[1]].normal;
    let nb0 = hull_b.faces()[eb.faces[0]].normal;
    let nb1 = hull_b.faces()[eb.faces[1]].normal;

    let sign_a_b0 = ea.normal.dot(nb0) >= 0.0;
    let sign_a_b1 = ea.normal.dot(nb1) >= 0.0;
    let sign_b_a0 = eb.normal.dot(na0) >= 0.0;
    let sign_b_a1 = eb.normal.dot(na1) >= 0.0;

    // Edge B's boundary faces can be antiparallel (a flat planar hull); the
    // arc degenerates to a full great circle and the second test may pass
    // with the edge normal negated.
    if nb0.cross(nb1).length_squared() < 1e-12 {
        if sign_a_b0 == sign_a_b1 {
            return false;
        }
        if sign_b_a0 != sign_b_a1 {
            return true;
        }
        *normal_b = -*normal_b;
        let retry_a0 = normal_b.dot(na0) >= 0.0;
        let retry_a1 = normal_b.dot(na1) >= 0.0;
        retry_a0 != retry_a1
    } else {
        sign_a_b0 != sign_a_b1 && sign_b_a0 != sign_b_a1
    }
}

/// Search all face normals of both hulls and all non-parallel, filtered edge
/// pairs for the axis of minimum penetration (or proof of separation).
pub fn find_separating_axis(body_a: &RigidBody, body_b: &RigidBody) -> SeparatingAxisResult {
    let hull_a = body_a.hull();
    let hull_b = body_b.hull();

    // Edge phase first; ties go to the face phase in the merge.
    let mut edge_tracker = AxisTracker::new();
    let mut best_edges = [0usize; 2];
    let mut skipped_pairs = 0u32;
    for (i_edge, edge_a) in hull_a.edges().iter().enumerate() {
        for (j_edge, edge_b) in hull_b.edges().iter().enumerate() {
            // parallel edges leave the axis undefined
            if edge_a.normal.cross(edge_b.normal).length() <= PARALLEL_EDGE_EPS {
                continue;
            }
            let mut normal_b = edge_b.normal;
            if !is_supporting_edge_pair(hull_a, i_edge, hull_b, j_edge, &mut normal_b) {
                skipped_pairs += 1;
                continue;
            }
            // rebuild in case the filter negated normal_b
            let mut axis = edge_a.normal.cross(normal_b);
            let edge_origin = hull_a.position(edge_a.verts[0]);
            // keep the axis pointing toward hull A's center
            if axis.dot(body_a.position - edge_origin) < 0.0 {
                axis = -axis;
            }
            let axis = axis.normalize();
            if edge_tracker.offer(edge_plane_gap(hull_b, axis, edge_origin), axis) {
                best_edges = [i_edge, j_edge];
            }
        }
    }
    trace!(skipped_pairs, "edge phase complete");

    let mut face_tracker = AxisTracker::new();
    let mut best_face = 0usize;
    let mut reference = HullSide::A;
    // Hull A's normals are inverted so every candidate axis points into A.
    for (i, face) in hull_a.faces().iter().enumerate() {
        let axis = -face.normal;
        let d = support_distance(hull_a, axis) + support_distance(hull_b, -axis);
        if face_tracker.offer(d, axis) {
            best_face = i;
            reference = HullSide::A;
        }
    }
    for (i, face) in hull_b.faces().iter().enumerate() {
        let axis = face.normal;
        let d = support_distance(hull_a, axis) + support_distance(hull_b, -axis);
        if face_tracker.offer(d, axis) {
            best_face = i;
            reference = HullSide::B;
        }
    }

    let (face_distance, face_axis) = face_tracker.result().unwrap_or((f32::INFINITY, Vec3::ZERO));
    let edge_result = edge_tracker.result();
    let (edge_distance, edge_axis) = edge_result.unwrap_or((f32::INFINITY, Vec3::ZERO));

    let face_overlaps = face_distance <= 0.0;
    let edge_overlaps = edge_result.is_some() && edge_distance <= 0.0;

    let (distance, axis, source) = if face_overlaps && edge_overlaps {
        if face_distance + FACE_PREFERENCE_BIAS >= edge_distance {
            (face_distance, face_axis, AxisSource::Face)
        } else {
            (edge_distance, edge_axis, AxisSource::Edge)
        }
    } else if face_overlaps {
        (face_distance, face_axis, AxisSource::Face)
    } else if edge_overlaps {
        (edge_distance, edge_axis, AxisSource::Edge)
    } else if edge_result.is_some() && edge_distance > face_distance {
        // separated; keep the axis of maximal separation for diagnostics
        (edge_distance, edge_axis, AxisSource::Edge)
    } else {
        (face_distance, face_axis, AxisSource::Face)
    };

    debug!(distance, ?source, "separating axis search");

    SeparatingAxisResult {
        distance,
        axis,
        source,
        face_distance,
        face_axis,
        edge_distance,
        edge_axis,
        face: best_face,
        reference,
        edges: best_edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{box_inverse_inertia, RigidBody};
    use crate::hull::{box_vertices, HullDescriptor};

    fn unit_box_body(position: Vec3) -> RigidBody {
        let base = HullDescriptor::box_hull(&box_vertices(Vec3::splat(0.5))).unwrap();
        RigidBody::new_dynamic(
            &base,
            position,
            1.0,
            box_inverse_inertia(1.0, Vec3::splat(0.5)),
        )
    }

    #[test]
    fn test_distant_boxes_are_separated() {
        let a = unit_box_body(Vec3::ZERO);
        let b = unit_box_body(Vec3::new(0.0, 3.0, 0.0));
        let result = find_separating_axis(&a, &b);
        assert!(!result.is_overlap(), "distance = {}", result.distance);
    }

    #[test]
    fn test_stacked_boxes_overlap_on_face_axis() {
        let a = unit_box_body(Vec3::ZERO);
        let b = unit_box_body(Vec3::new(0.0, 0.9, 0.0));
        let result = find_separating_axis(&a, &b);

        assert!(result.is_overlap());
        assert_eq!(result.source, AxisSource::Face);
        assert!((result.distance + 0.1).abs() < 1e-4, "d = {}", result.distance);
        assert!(
            result.axis.y.abs() > 0.999,
            "axis should be +/-Y, got {:?}",
            result.axis
        );
    }

    #[test]
    fn test_touching_boxes_count_as_overlap() {
        // zero separation is not a separating axis
        let a = unit_box_body(Vec3::ZERO);
        let b = unit_box_body(Vec3::new(0.0, 1.0, 0.0));
        let result = find_separating_axis(&a, &b);
        assert!(result.is_overlap());
        assert!(result.distance.abs() < 1e-5);
    }

    #[test]
    fn test_edge_filter_rejects_non_crossing_arcs() {
        let a = unit_box_body(Vec3::ZERO);
        let b = unit_box_body(Vec3::new(0.0, 0.9, 0.0));
        // A's edge 0 runs along z between the +x and -y faces; B's edge 9
        // sits between its +x and +z faces. The second Gauss arc does not
        // cross, so the pair cannot be a supporting feature.
        let mut normal_b = b.hull().edges()[9].normal;
        assert!(!is_supporting_edge_pair(a.hull(), 0, b.hull(), 9, &mut normal_b));
    }

    #[test]
    fn test_edge_filter_accepts_crossing_arcs() {
        let a = unit_box_body(Vec3::ZERO);
        let b = unit_box_body(Vec3::new(0.0, 0.9, 0.0));
        // A's edge 9 (+x/+z boundary, normal -y) against B's edge 4
        // (+y/+x boundary, normal -z): both sign tests alternate.
        let mut normal_b = b.hull().edges()[4].normal;
        assert!(is_supporting_edge_pair(a.hull(), 9, b.hull(), 4, &mut normal_b));
    }

    #[test]
    fn test_rotated_box_reports_consistent_overlap() {
        let base = HullDescriptor::box_hull(&box_vertices(Vec3::splat(0.5))).unwrap();
        let mut a = RigidBody::new_dynamic(
            &base,
            Vec3::new(0.0, 1.15, 0.0),
            1.0,
            box_inverse_inertia(1.0, Vec3::splat(0.5)),
        );
        a.set_pose(
            Vec3::new(0.0, 1.15, 0.0),
            glam::Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
        );
        let b = unit_box_body(Vec3::ZERO);

        let result = find_separating_axis(&a, &b);
        assert!(result.is_overlap());
        assert!(result.distance < 0.0);
        assert!((result.axis.length() - 1.0).abs() < 1e-4);
    }
}
