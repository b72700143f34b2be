//! Mesh geometry representation for the Ember scene graph.
//!
//! A renderer-agnostic indexed triangle mesh. Loaders fill it in, the
//! renderer flattens it into world-space triangles.

use ember_math::{Aabb, Mat4, Mat4Ext, Vec3};

/// A mesh consisting of vertex positions, optional normals, and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - flat face normals are used when absent)
    pub normals: Option<Vec<Vec3>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

/// One triangle of a mesh with its three shading normals resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshTriangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    ///
    /// Normals are NOT computed here. Call `compute_normals()` or
    /// `ensure_normals()` explicitly if you need smooth shading.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let bounds = Self::compute_bounds(&positions);
        Self {
            positions,
            normals,
            indices,
            bounds,
        }
    }

    /// A unit quad in the XZ plane, centered at the origin, facing +Y.
    pub fn quad() -> Self {
        let positions = vec![
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(-0.5, 0.0, 0.5),
            Vec3::new(0.5, 0.0, 0.5),
            Vec3::new(0.5, 0.0, -0.5),
        ];
        let normals = vec![Vec3::Y; 4];
        Self::new(positions, vec![0, 1, 2, 0, 2, 3], Some(normals))
    }

    /// A unit cube centered at the origin with outward-facing flat normals.
    pub fn cube() -> Self {
        // (normal, u, v) with u x v == normal so every face winds CCW from outside
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            let center = normal * 0.5;
            positions.push(center - u * 0.5 - v * 0.5);
            positions.push(center + u * 0.5 - v * 0.5);
            positions.push(center + u * 0.5 + v * 0.5);
            positions.push(center - u * 0.5 + v * 0.5);
            normals.extend_from_slice(&[normal; 4]);
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(positions, indices, Some(normals))
    }

    /// Compute axis-aligned bounding box from positions.
    fn compute_bounds(positions: &[Vec3]) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for pos in positions {
            bounds.grow(*pos);
        }
        bounds
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Face normals are accumulated unnormalized, so larger faces weigh
    /// more. Winding is counter-clockwise: `(p1 - p0) x (p2 - p0)`.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            let len = normal.length();
            if len > 0.0 {
                *normal /= len;
            } else {
                *normal = Vec3::Y; // Default up normal for degenerate cases
            }
        }

        self.normals = Some(normals);
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Ensure the mesh has per-vertex normals, computing them if necessary.
    /// Also recomputes if existing normals don't match vertex count.
    pub fn ensure_normals(&mut self) {
        let mismatch = match &self.normals {
            None => true,
            Some(normals) => normals.len() != self.positions.len(),
        };

        if mismatch {
            if let Some(normals) = &self.normals {
                log::debug!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    normals.len(),
                    self.positions.len()
                );
            }
            self.compute_normals();
        }
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.center()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Return a copy of the mesh with positions and normals transformed.
    pub fn transformed(&self, matrix: &Mat4) -> Mesh {
        let positions = self
            .positions
            .iter()
            .map(|p| matrix.transform_point3(*p))
            .collect();
        let normals = self
            .normals
            .as_ref()
            .map(|normals| normals.iter().map(|n| matrix.transform_normal(*n)).collect());
        Mesh::new(positions, self.indices.clone(), normals)
    }

    /// Resolve every face into positions plus shading normals.
    ///
    /// Faces referencing missing vertices are skipped. Without per-vertex
    /// normals every corner gets the flat face normal.
    pub fn triangles(&self) -> Vec<MeshTriangle> {
        let vertex_count = self.positions.len();
        let normals = self
            .normals
            .as_ref()
            .filter(|normals| normals.len() == vertex_count);

        let mut triangles = Vec::with_capacity(self.triangle_count());
        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                log::warn!(
                    "Invalid triangle indices: [{}, {}, {}], vertex count: {}",
                    i0,
                    i1,
                    i2,
                    vertex_count
                );
                continue;
            }

            let positions = [self.positions[i0], self.positions[i1], self.positions[i2]];
            let normals = match normals {
                Some(n) => [n[i0], n[i1], n[i2]],
                None => {
                    let face_normal = (positions[1] - positions[0])
                        .cross(positions[2] - positions[0])
                        .normalize_or_zero();
                    [face_normal; 3]
                }
            };
            triangles.push(MeshTriangle { positions, normals });
        }

        triangles
    }
}
