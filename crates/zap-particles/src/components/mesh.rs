use std::fmt;

use glam::Vec3;

/// Triangle geometry supplied by the host scene graph.
///
/// Points are in the emitter's local (unrotated, unscaled) space.
pub trait TriangleMesh: fmt::Debug {
    /// Number of triangles in the mesh.
    fn triangle_count(&self) -> usize;

    /// The three corners of triangle `index`. Panics if `index >= triangle_count()`.
    fn triangle(&self, index: usize) -> [Vec3; 3];

    /// Center of the mesh's axis-aligned bounding box.
    fn bound_center(&self) -> Vec3 {
        let count = self.triangle_count();
        if count == 0 {
            return Vec3::ZERO;
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..count {
            for p in self.triangle(i) {
                min = min.min(p);
                max = max.max(p);
            }
        }
        (min + max) * 0.5
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl TriMesh {
    /// Build from vertex positions and a triangle index list.
    /// A trailing partial triangle in `indices` is ignored.
    pub fn new(positions: Vec<Vec3>, mut indices: Vec<u32>) -> Self {
        indices.truncate(indices.len() - indices.len() % 3);
        debug_assert!(indices.iter().all(|&i| (i as usize) < positions.len()));
        Self { positions, indices }
    }

    /// Build from unindexed triangles.
    pub fn from_triangles(triangles: &[[Vec3; 3]]) -> Self {
        let positions: Vec<Vec3> = triangles.iter().flatten().copied().collect();
        let indices = (0..positions.len() as u32).collect();
        Self { positions, indices }
    }

    /// Two-triangle quad in the XZ plane, centered on the origin, facing +Y.
    pub fn quad(width: f32, depth: f32) -> Self {
        let (hw, hd) = (width * 0.5, depth * 0.5);
        let positions = vec![
            Vec3::new(-hw, 0.0, -hd),
            Vec3::new(-hw, 0.0, hd),
            Vec3::new(hw, 0.0, hd),
            Vec3::new(hw, 0.0, -hd),
        ];
        Self::new(positions, vec![0, 1, 2, 0, 2, 3])
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }
}

impl TriangleMesh for TriMesh {
    fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn triangle(&self, index: usize) -> [Vec3; 3] {
        let i = index * 3;
        [
            self.positions[self.indices[i] as usize],
            self.positions[self.indices[i + 1] as usize],
            self.positions[self.indices[i + 2] as usize],
        ]
    }
}
