//! Contact manifold generation from a winning separating-axis result.
//!
//! Face axes produce up to four contacts by clipping the incident face
//! against the side planes of the reference face. The clip projects
//! offending vertices onto each plane instead of inserting intersection
//! vertices, so the polygon never grows and stays convex enough for the
//! solver. Edge axes produce a single contact at the midpoint of the
//! closest-point segment between the two edges.

use glam::Vec3;
use tracing::{debug, trace};

use crate::hull::WorldHull;
use crate::sat::{AxisSource, HullSide, SeparatingAxisResult};

/// Maximum contacts in a manifold.
pub const MAX_CONTACTS: usize = 4;

/// Scratch polygon capacity for the clip loop.
const CLIP_VERTS: usize = 8;

/// Edge-pair denominators below this are treated as parallel and the
/// contact skipped.
const EDGE_DENOM_EPS: f32 = 1e-7;

/// One contact between two hulls.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactPoint {
    /// World-space position on the reference plane (face) or between the
    /// edges (edge).
    pub point: Vec3,
    /// Unit normal pointing from hull B toward hull A.
    pub normal: Vec3,
    /// Signed depth along the normal, zero or negative.
    pub penetration: f32,
}

/// Up to [`MAX_CONTACTS`] contacts between one body pair for one step.
#[derive(Debug, Clone, Copy)]
pub struct ContactManifold {
    contacts: [ContactPoint; MAX_CONTACTS],
    num_contacts: usize,
    /// World body indices (A, B) this manifold was generated for.
    pub bodies: [usize; 2],
}

impl ContactManifold {
    pub fn new(bodies: [usize; 2]) -> Self {
        Self {
            contacts: [ContactPoint::default(); MAX_CONTACTS],
            num_contacts: 0,
            bodies,
        }
    }

    fn push(&mut self, contact: ContactPoint) {
        if self.num_contacts < MAX_CONTACTS {
            self.contacts[self.num_contacts] = contact;
            self.num_contacts += 1;
        }
    }

    #[inline]
    pub fn contacts(&self) -> &[ContactPoint] {
        &self.contacts[..self.num_contacts]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.num_contacts
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_contacts == 0
    }
}

/// Build the manifold for an overlapping pair from the axis the search
/// selected. May come back empty when an edge pair degenerates.
pub fn generate_contacts(
    axis: &SeparatingAxisResult,
    hull_a: &WorldHull,
    hull_b: &WorldHull,
    bodies: [usize; 2],
) -> ContactManifold {
    let mut manifold = ContactManifold::new(bodies);
    match axis.source {
        AxisSource::Face => face_contacts(axis, hull_a, hull_b, &mut manifold),
        AxisSource::Edge => edge_contact(axis, hull_a, hull_b, &mut manifold),
    }
    debug!(contacts = manifold.len(), source = ?axis.source, "manifold generated");
    manifold
}

/// Clip the incident face of the non-reference hull against the reference
/// face's side planes, then keep the vertices at or below the reference
/// plane, projected onto it.
fn face_contacts(
    axis: &SeparatingAxisResult,
    hull_a: &WorldHull,
    hull_b: &WorldHull,
    manifold: &mut ContactManifold,
) {
    let (reference_hull, incident_hull) = match axis.reference {
        HullSide::A => (hull_a, hull_b),
        HullSide::B => (hull_b, hull_a),
    };
    let reference_face = &reference_hull.faces()[axis.face];

    // incident face: the one most antiparallel to the reference normal
    let mut incident_face = &incident_hull.faces()[0];
    let mut smallest_dot = reference_face.normal.dot(incident_face.normal);
    for face in &incident_hull.faces()[1..] {
        let dot = reference_face.normal.dot(face.normal);
        if dot < smallest_dot {
            smallest_dot = dot;
            incident_face = face;
        }
    }

    let mut poly = [Vec3::ZERO; CLIP_VERTS];
    let mut poly_len = 0;
    for &vi in incident_face.vert_indices() {
        poly[poly_len] = incident_hull.position(vi);
        poly_len += 1;
    }

    // One side plane per reference-face edge; the plane normal faces inward
    // across the face. Offenders are projected onto the plane, so the
    // vertex count is stable and the loop can mutate in place.
    let ref_verts = reference_face.vert_indices();
    for i in 0..ref_verts.len() {
        let edge_start = reference_hull.position(ref_verts[i]);
        let edge_end = reference_hull.position(ref_verts[(i + 1) % ref_verts.len()]);
        let clip_normal = reference_face
            .normal
            .cross(edge_end - edge_start)
            .normalize();
        for vert in poly[..poly_len].iter_mut() {
            let dist = clip_normal.dot(*vert - edge_start);
            if dist < 0.0 {
                *vert -= clip_normal * dist;
            }
        }
    }

    // Keep what ended up at or below the reference plane; the signed
    // distance is the contact's penetration and the point lands on the
    // plane itself.
    let plane_vert = reference_hull.position(ref_verts[0]);
    for &vert in &poly[..poly_len] {
        let dist = reference_face.normal.dot(vert - plane_vert);
        if dist <= 0.0 {
            manifold.push(ContactPoint {
                point: vert - reference_face.normal * dist,
                normal: axis.axis,
                penetration: dist,
            });
        }
    }
}

/// Closest points between the two winning edges via the standard 2x2
/// parametric system; the contact sits at the midpoint of the connecting
/// segment. Near-parallel systems abort without a contact.
fn edge_contact(
    axis: &SeparatingAxisResult,
    hull_a: &WorldHull,
    hull_b: &WorldHull,
    manifold: &mut ContactManifold,
) {
    let edge_a = &hull_a.edges()[axis.edges[0]];
    let edge_b = &hull_b.edges()[axis.edges[1]];
    let p1 = hull_a.position(edge_a.verts[0]);
    let p2 = hull_a.position(edge_a.verts[1]);
    let p3 = hull_b.position(edge_b.verts[0]);
    let p4 = hull_b.position(edge_b.verts[1]);

    let d13 = p1 - p3;
    let d43 = p4 - p3;
    let d21 = p2 - p1;

    let d1343 = d13.dot(d43);
    let d4321 = d43.dot(d21);
    let d1321 = d13.dot(d21);
    let d4343 = d43.dot(d43);
    let d2121 = d21.dot(d21);

    if d4343.abs() < EDGE_DENOM_EPS {
        trace!("edge contact skipped, degenerate edge B");
        return;
    }
    let denom = d2121 * d4343 - d4321 * d4321;
    if denom.abs() < EDGE_DENOM_EPS {
        trace!("edge contact skipped, near-parallel edges");
        return;
    }

    let mu_a = (d1343 * d4321 - d1321 * d4343) / denom;
    let mu_b = (d1343 + mu_a * d4321) / d4343;
    let point_a = p1 + d21 * mu_a;
    let point_b = p3 + d43 * mu_b;

    manifold.push(ContactPoint {
        point: (point_a + point_b) * 0.5,
        normal: axis.axis,
        penetration: axis.distance,
    });
}
