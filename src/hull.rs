//! Convex hull topology for boxes and ground planes.
//!
//! A [`HullDescriptor`] is the immutable body-local shape: unique vertex
//! positions plus faces and edges that reference them by index. Adjacency is
//! deliberately index-based; faces and edges never own vertex data. A
//! [`WorldHull`] is the per-body world-space copy whose coordinates are
//! rewritten every step from the body pose.

use glam::{Mat3, Vec3};
use thiserror::Error;

/// Maximum vertices in a hull (a box).
pub const MAX_HULL_VERTS: usize = 8;
/// Maximum faces in a hull.
pub const MAX_HULL_FACES: usize = 6;
/// Maximum edges in a hull.
pub const MAX_HULL_EDGES: usize = 12;

/// Errors reported when constructing a hull descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HullError {
    #[error("expected {expected} vertices, got {got}")]
    VertexCount { expected: usize, got: usize },
    #[error("edge {edge} endpoints are not shared by adjacent face {face}")]
    EdgeAdjacency { edge: usize, face: usize },
    #[error("face {face} has degenerate geometry")]
    DegenerateFace { face: usize },
}

/// A planar face: outward normal plus 3 or 4 vertex indices ordered around
/// the face.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub normal: Vec3,
    verts: [usize; 4],
    num_verts: usize,
}

impl Face {
    /// Vertex indices ordered around the face.
    #[inline]
    pub fn vert_indices(&self) -> &[usize] {
        &self.verts[..self.num_verts]
    }
}

/// An edge between two vertices, with its two adjacent faces.
///
/// `normal` is the cross product of the adjacent face normals. For a planar
/// hull whose two faces are antiparallel that cross product vanishes, so the
/// normalized edge direction is stored instead.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub normal: Vec3,
    pub verts: [usize; 2],
    pub faces: [usize; 2],
}

const EMPTY_FACE: Face = Face {
    normal: Vec3::ZERO,
    verts: [0; 4],
    num_verts: 0,
};

const EMPTY_EDGE: Edge = Edge {
    normal: Vec3::ZERO,
    verts: [0; 2],
    faces: [0; 2],
};

/// Box face vertex loops, ordered +x, +z, -x, -z, +y, -y.
const BOX_FACES: [[usize; 4]; 6] = [
    [0, 4, 5, 1],
    [1, 5, 6, 2],
    [2, 6, 7, 3],
    [3, 0, 4, 7],
    [4, 7, 6, 5],
    [1, 2, 3, 0],
];

/// Box edges as (endpoint indices, adjacent face indices).
const BOX_EDGES: [([usize; 2], [usize; 2]); 12] = [
    ([0, 1], [0, 5]),
    ([1, 2], [1, 5]),
    ([2, 3], [2, 5]),
    ([3, 0], [3, 5]),
    ([4, 5], [4, 0]),
    ([5, 6], [4, 1]),
    ([6, 7], [4, 2]),
    ([7, 4], [4, 3]),
    ([0, 4], [0, 3]),
    ([1, 5], [0, 1]),
    ([2, 6], [1, 2]),
    ([3, 7], [2, 3]),
];

/// Canonical box vertex positions for the topology tables above.
///
/// Bottom ring first (+x,-y,-z), (+x,-y,+z), (-x,-y,+z), (-x,-y,-z), then the
/// top ring in the same x/z order.
pub fn box_vertices(half_extents: Vec3) -> [Vec3; 8] {
    let h = half_extents;
    [
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(-h.x, h.y, h.z),
        Vec3::new(-h.x, h.y, -h.z),
    ]
}

/// Canonical ground plane vertices: a y=0 quad of the given half size.
pub fn plane_vertices(half_size: f32) -> [Vec3; 4] {
    [
        Vec3::new(half_size, 0.0, -half_size),
        Vec3::new(-half_size, 0.0, -half_size),
        Vec3::new(-half_size, 0.0, half_size),
        Vec3::new(half_size, 0.0, half_size),
    ]
}

/// Immutable body-local convex hull topology.
#[derive(Debug, Clone)]
pub struct HullDescriptor {
    positions: [Vec3; MAX_HULL_VERTS],
    num_positions: usize,
    faces: [Face; MAX_HULL_FACES],
    num_faces: usize,
    edges: [Edge; MAX_HULL_EDGES],
    num_edges: usize,
}

impl HullDescriptor {
    /// Build a box hull from 8 model vertices in the canonical ordering of
    /// [`box_vertices`]. Face normals are derived from the vertex geometry
    /// and oriented outward from the hull centroid.
    pub fn box_hull(vertices: &[Vec3]) -> Result<Self, HullError> {
        if vertices.len() != 8 {
            return Err(HullError::VertexCount {
                expected: 8,
                got: vertices.len(),
            });
        }

        let mut positions = [Vec3::ZERO; MAX_HULL_VERTS];
        positions[..8].copy_from_slice(vertices);
        let centroid = vertices.iter().sum::<Vec3>() / 8.0;

        let mut faces = [EMPTY_FACE; MAX_HULL_FACES];
        for (i, loop_indices) in BOX_FACES.iter().enumerate() {
            let a = positions[loop_indices[0]];
            let b = positions[loop_indices[1]];
            let c = positions[loop_indices[2]];
            let mut normal = (b - a).cross(c - a);
            if normal.length_squared() < 1e-12 {
                return Err(HullError::DegenerateFace { face: i });
            }
            normal = normal.normalize();
            // orient outward
            if normal.dot(a - centroid) < 0.0 {
                normal = -normal;
            }
            faces[i] = Face {
                normal,
                verts: *loop_indices,
                num_verts: 4,
            };
        }

        let mut edges = [EMPTY_EDGE; MAX_HULL_EDGES];
        for (i, (verts, adjacent)) in BOX_EDGES.iter().enumerate() {
            edges[i] = Edge {
                normal: faces[adjacent[0]].normal.cross(faces[adjacent[1]].normal),
                verts: *verts,
                faces: *adjacent,
            };
        }

        let hull = Self {
            positions,
            num_positions: 8,
            faces,
            num_faces: 6,
            edges,
            num_edges: 12,
        };
        hull.validate()?;
        Ok(hull)
    }

    /// Build a two-sided ground plane hull from 4 coplanar vertices ordered
    /// as in [`plane_vertices`].
    ///
    /// The two faces are antiparallel, so each edge's adjacent-normal cross
    /// product is zero; the edge normal falls back to the edge direction.
    pub fn plane_hull(vertices: &[Vec3]) -> Result<Self, HullError> {
        if vertices.len() != 4 {
            return Err(HullError::VertexCount {
                expected: 4,
                got: vertices.len(),
            });
        }

        let mut positions = [Vec3::ZERO; MAX_HULL_VERTS];
        positions[..4].copy_from_slice(vertices);

        let up = (vertices[1] - vertices[0]).cross(vertices[2] - vertices[0]);
        if up.length_squared() < 1e-12 {
            return Err(HullError::DegenerateFace { face: 0 });
        }
        let up = up.normalize();

        let mut faces = [EMPTY_FACE; MAX_HULL_FACES];
        faces[0] = Face {
            normal: up,
            verts: [0, 1, 2, 3],
            num_verts: 4,
        };
        faces[1] = Face {
            normal: -up,
            verts: [3, 2, 1, 0],
            num_verts: 4,
        };

        let mut edges = [EMPTY_EDGE; MAX_HULL_EDGES];
        for i in 0..4 {
            let a = i;
            let b = (i + 1) % 4;
            let direction = positions[b] - positions[a];
            if direction.length_squared() < 1e-12 {
                return Err(HullError::DegenerateFace { face: 0 });
            }
            edges[i] = Edge {
                normal: direction.normalize(),
                verts: [a, b],
                faces: [1, 0],
            };
        }

        let hull = Self {
            positions,
            num_positions: 4,
            faces,
            num_faces: 2,
            edges,
            num_edges: 4,
        };
        hull.validate()?;
        Ok(hull)
    }

    /// Check that every edge's adjacent faces both reference both of the
    /// edge's endpoints.
    fn validate(&self) -> Result<(), HullError> {
        for (i, edge) in self.edges().iter().enumerate() {
            for &face_index in &edge.faces {
                let face = &self.faces()[face_index];
                let shares_both = edge
                    .verts
                    .iter()
                    .all(|v| face.vert_indices().contains(v));
                if !shares_both {
                    return Err(HullError::EdgeAdjacency {
                        edge: i,
                        face: face_index,
                    });
                }
            }
        }
        Ok(())
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions[..self.num_positions]
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces[..self.num_faces]
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges[..self.num_edges]
    }

    #[inline]
    pub fn position(&self, index: usize) -> Vec3 {
        self.positions[index]
    }
}

/// A hull transformed into world space. Owned by exactly one body and
/// overwritten in place each step; topology always matches the base
/// descriptor it was created from.
#[derive(Debug, Clone)]
pub struct WorldHull {
    hull: HullDescriptor,
}

impl WorldHull {
    pub fn new(base: &HullDescriptor) -> Self {
        Self { hull: base.clone() }
    }

    /// Rewrite world coordinates from the base hull and a body pose:
    /// positions are rotated then translated, normals rotated only.
    pub fn refresh(&mut self, base: &HullDescriptor, position: Vec3, orientation: Mat3) {
        for i in 0..base.num_positions {
            self.hull.positions[i] = orientation * base.positions[i] + position;
        }
        for i in 0..base.num_faces {
            self.hull.faces[i].normal = orientation * base.faces[i].normal;
        }
        for i in 0..base.num_edges {
            self.hull.edges[i].normal = orientation * base.edges[i].normal;
        }
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        self.hull.positions()
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        self.hull.faces()
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        self.hull.edges()
    }

    #[inline]
    pub fn position(&self, index: usize) -> Vec3 {
        self.hull.position(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_box_hull_normals_point_outward() {
        let hull = HullDescriptor::box_hull(&box_vertices(Vec3::splat(0.5))).unwrap();
        let eps = 1e-6;
        let expected = [
            Vec3::X,
            Vec3::Z,
            -Vec3::X,
            -Vec3::Z,
            Vec3::Y,
            -Vec3::Y,
        ];
        for (face, want) in hull.faces().iter().zip(expected) {
            assert!((face.normal - want).length() < eps, "normal {:?}", face.normal);
        }
    }

    #[test]
    fn test_box_hull_edge_count_and_adjacency() {
        let hull = HullDescriptor::box_hull(&box_vertices(Vec3::splat(0.5))).unwrap();
        assert_eq!(hull.edges().len(), 12);
        for edge in hull.edges() {
            // unit-length cross of perpendicular face normals
            assert!((edge.normal.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_box_hull_rejects_wrong_vertex_count() {
        let result = HullDescriptor::box_hull(&[Vec3::ZERO; 5]);
        assert_eq!(
            result.unwrap_err(),
            HullError::VertexCount {
                expected: 8,
                got: 5
            }
        );
    }

    #[test]
    fn test_plane_hull_edge_normals_follow_edges() {
        let hull = HullDescriptor::plane_hull(&plane_vertices(20.0)).unwrap();
        assert_eq!(hull.faces().len(), 2);
        assert_eq!(hull.edges().len(), 4);
        let eps = 1e-6;
        assert!((hull.faces()[0].normal - Vec3::Y).length() < eps);
        assert!((hull.faces()[1].normal + Vec3::Y).length() < eps);
        let expected = [-Vec3::X, Vec3::Z, Vec3::X, -Vec3::Z];
        for (edge, want) in hull.edges().iter().zip(expected) {
            assert!((edge.normal - want).length() < eps, "normal {:?}", edge.normal);
        }
    }

    #[test]
    fn test_refresh_identity_round_trip() {
        let base = HullDescriptor::box_hull(&box_vertices(Vec3::splat(0.5))).unwrap();
        let mut world = WorldHull::new(&base);
        world.refresh(&base, Vec3::ZERO, Mat3::IDENTITY);

        for (w, b) in world.positions().iter().zip(base.positions()) {
            assert_eq!(w, b);
        }
        for (w, b) in world.faces().iter().zip(base.faces()) {
            assert_eq!(w.normal, b.normal);
            assert_eq!(w.vert_indices(), b.vert_indices());
        }
        for (w, b) in world.edges().iter().zip(base.edges()) {
            assert_eq!(w.normal, b.normal);
            assert_eq!(w.verts, b.verts);
            assert_eq!(w.faces, b.faces);
        }
    }

    #[test]
    fn test_refresh_rotates_normals_without_translation() {
        let base = HullDescriptor::box_hull(&box_vertices(Vec3::splat(0.5))).unwrap();
        let mut world = WorldHull::new(&base);
        let rotation = Mat3::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        world.refresh(&base, Vec3::new(10.0, 0.0, 0.0), rotation);

        let eps = 1e-5;
        // +x face normal rotates to +y and must not pick up the translation
        assert!((world.faces()[0].normal - Vec3::Y).length() < eps);
        // vertex 0 = (0.5, -0.5, -0.5) -> rotate -> (0.5, 0.5, -0.5) -> translate
        assert!((world.position(0) - Vec3::new(10.5, 0.5, -0.5)).length() < eps);
    }
}
