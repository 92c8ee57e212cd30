//! Emitter shape sampler: picks emission triangles from the host mesh and
//! derives spawn points and directions from them.

use std::rc::Rc;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::mesh::TriangleMesh;
use crate::core::math::{look_rotation, random_euler_rotation, triangle_normal};
use crate::core::rng::ParticleRng;

/// How the initial direction of a particle is derived from its emission face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    /// Along the face normal.
    #[default]
    Normal,
    /// Against the face normal.
    NormalNegate,
    /// Up axis rotated by three random Euler angles.
    Random,
    /// Random direction within the face plane.
    RandomTangent,
    /// Random direction in the hemisphere of the face normal.
    RandomNormalAligned,
    /// Random direction in the hemisphere opposite the face normal.
    RandomNormalNegate,
}

/// A selected emission triangle, already rotated and scaled into emitter space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub points: [Vec3; 3],
    pub center: Vec3,
    pub normal: Vec3,
}

impl Triangle {
    pub fn new(points: [Vec3; 3]) -> Self {
        let [a, b, c] = points;
        Self {
            points,
            center: (a + b + c) / 3.0,
            normal: triangle_normal(a, b, c),
        }
    }

    /// Random point inside the triangle, relative to its center.
    ///
    /// Picks one of three vertex orderings, lerps along the first edge, then
    /// lerps from that point toward the remaining vertex. The distribution is
    /// biased toward the last vertex; emission patterns rely on that bias.
    pub fn random_offset(&self, rng: &mut ParticleRng) -> Vec3 {
        let [p1, p2, p3] = self.points;
        let (a, b, c) = match rng.index(3) {
            0 => (p1, p2, p3),
            1 => (p2, p1, p3),
            _ => (p3, p2, p1),
        };
        let edge = a.lerp(b, rng.next_f32());
        edge.lerp(c, rng.next_f32()) - self.center
    }

    /// Unit direction for a freshly emitted particle.
    pub fn direction(&self, mode: DirectionMode, rng: &mut ParticleRng) -> Vec3 {
        match mode {
            DirectionMode::Normal => self.normal,
            DirectionMode::NormalNegate => -self.normal,
            DirectionMode::Random => random_euler_rotation(rng) * Vec3::Y,
            DirectionMode::RandomTangent => {
                let tangent = look_rotation(self.normal, Vec3::Y) * Vec3::Y;
                if self.normal == Vec3::ZERO {
                    return tangent;
                }
                Quat::from_axis_angle(self.normal, rng.angle()) * tangent
            }
            DirectionMode::RandomNormalAligned => {
                let dir = random_euler_rotation(rng) * Vec3::Y;
                if dir.dot(self.normal) < 0.0 { -dir } else { dir }
            }
            DirectionMode::RandomNormalNegate => {
                let dir = random_euler_rotation(rng) * Vec3::Y;
                if dir.dot(self.normal) > 0.0 { -dir } else { dir }
            }
        }
    }
}

/// Wraps the host mesh and tracks the currently selected emission face.
///
/// Not reentrant: selection state is shared by every caller of one emitter.
#[derive(Debug, Clone)]
pub struct EmitterShape {
    mesh: Rc<dyn TriangleMesh>,
    triangle_count: usize,
    selected: Option<Triangle>,
    current_index: usize,
    cursor: usize,
    sequential: bool,
    skip_pattern: bool,
    rotation: Quat,
    scale: Vec3,
}

impl EmitterShape {
    pub fn new(mesh: Rc<dyn TriangleMesh>) -> Self {
        let triangle_count = mesh.triangle_count();
        Self {
            mesh,
            triangle_count,
            selected: None,
            current_index: 0,
            cursor: 0,
            sequential: false,
            skip_pattern: false,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Replace the mesh. Drops any cached selection and rewinds the sequential cursor.
    pub fn set_shape(&mut self, mesh: Rc<dyn TriangleMesh>) {
        self.triangle_count = mesh.triangle_count();
        self.mesh = mesh;
        self.selected = None;
        self.current_index = 0;
        self.cursor = 0;
    }

    pub fn mesh(&self) -> &Rc<dyn TriangleMesh> {
        &self.mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Sequential face walking; `skip_pattern` advances two faces at a time.
    pub fn set_sequential(&mut self, sequential: bool, skip_pattern: bool) {
        self.sequential = sequential;
        self.skip_pattern = skip_pattern;
    }

    /// Emitter rotation and scale used to bring triangles into emitter space.
    /// Translation is left to the host.
    pub fn set_transform(&mut self, rotation: Quat, scale: Vec3) {
        self.rotation = rotation;
        self.scale = scale;
    }

    /// Select the next emission face. Returns `None` for an empty mesh.
    pub fn select_next(&mut self, rng: &mut ParticleRng) -> Option<Triangle> {
        if self.triangle_count == 0 {
            return None;
        }
        let index = if self.sequential {
            let step = if self.skip_pattern { 2 } else { 1 };
            let index = self.cursor % self.triangle_count;
            self.cursor = (index + step) % self.triangle_count;
            index
        } else {
            rng.index(self.triangle_count)
        };
        Some(self.select_triangle(index))
    }

    /// Select a specific face, e.g. to revisit a particle's emission face.
    /// Panics if `index` is out of range.
    pub fn select_triangle(&mut self, index: usize) -> Triangle {
        assert!(
            index < self.triangle_count,
            "triangle index {index} out of range (count={})",
            self.triangle_count
        );
        let points = self
            .mesh
            .triangle(index)
            .map(|p| self.rotation * (p * self.scale));
        let triangle = Triangle::new(points);
        self.current_index = index;
        self.selected = Some(triangle);
        triangle
    }

    /// The current selection, if any face has been selected since the last `set_shape`.
    pub fn selected(&self) -> Option<&Triangle> {
        self.selected.as_ref()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.selected.map(|_| self.current_index)
    }

    pub fn center(&self) -> Option<Vec3> {
        self.selected.map(|t| t.center)
    }

    pub fn normal(&self) -> Option<Vec3> {
        self.selected.map(|t| t.normal)
    }

    pub fn sample_random_point(&self, rng: &mut ParticleRng) -> Option<Vec3> {
        self.selected.map(|t| t.random_offset(rng))
    }

    pub fn sample_direction(&self, mode: DirectionMode, rng: &mut ParticleRng) -> Option<Vec3> {
        self.selected.map(|t| t.direction(mode, rng))
    }

    /// Bounding center of the mesh in emitter space.
    pub fn bound_center(&self) -> Vec3 {
        self.rotation * (self.mesh.bound_center() * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::mesh::TriMesh;
    use std::f32::consts::FRAC_PI_2;

    fn four_triangles() -> Rc<dyn TriangleMesh> {
        let tri = |x: f32| [Vec3::new(x, 0.0, 0.0), Vec3::new(x, 0.0, 1.0), Vec3::new(x + 1.0, 0.0, 1.0)];
        Rc::new(TriMesh::from_triangles(&[tri(0.0), tri(1.0), tri(2.0), tri(3.0)]))
    }

    #[test]
    fn sequential_visits_in_order() {
        let mut shape = EmitterShape::new(four_triangles());
        shape.set_sequential(true, false);
        let mut rng = ParticleRng::new(1);
        let visited: Vec<usize> = (0..8)
            .map(|_| {
                shape.select_next(&mut rng);
                shape.current_index().unwrap()
            })
            .collect();
        assert_eq!(visited, vec![0, 1, 2, 3, 0, 1, 2, 3]);
    }

    #[test]
    fn sequential_skip_pattern() {
        let mut shape = EmitterShape::new(four_triangles());
        shape.set_sequential(true, true);
        let mut rng = ParticleRng::new(1);
        let visited: Vec<usize> = (0..4)
            .map(|_| {
                shape.select_next(&mut rng);
                shape.current_index().unwrap()
            })
            .collect();
        assert_eq!(visited, vec![0, 2, 0, 2]);
    }

    #[test]
    fn random_selection_in_range() {
        let mut shape = EmitterShape::new(four_triangles());
        let mut rng = ParticleRng::new(9);
        for _ in 0..100 {
            shape.select_next(&mut rng);
            assert!(shape.current_index().unwrap() < 4);
        }
    }

    #[test]
    fn no_selection_before_select() {
        let mut shape = EmitterShape::new(four_triangles());
        assert!(shape.center().is_none());
        assert!(shape.normal().is_none());
        shape.select_triangle(1);
        assert!(shape.center().is_some());
        shape.set_shape(Rc::new(TriMesh::quad(1.0, 1.0)));
        assert!(shape.selected().is_none());
    }

    #[test]
    fn empty_mesh_selects_nothing() {
        let mut shape = EmitterShape::new(Rc::new(TriMesh::default()));
        let mut rng = ParticleRng::new(1);
        assert!(shape.select_next(&mut rng).is_none());
    }

    #[test]
    fn transform_applies_rotation_and_scale() {
        let mut shape = EmitterShape::new(Rc::new(TriMesh::quad(2.0, 2.0)));
        // rotate +Y onto +Z
        shape.set_transform(Quat::from_rotation_x(FRAC_PI_2), Vec3::splat(2.0));
        let tri = shape.select_triangle(0);
        assert!((tri.normal - Vec3::Z).length() < 1e-5);
        for p in tri.points {
            assert!((p.x.abs() - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn random_offset_stays_on_triangle() {
        let mut shape = EmitterShape::new(Rc::new(TriMesh::quad(2.0, 2.0)));
        let mut rng = ParticleRng::new(11);
        let tri = shape.select_triangle(0);
        for _ in 0..200 {
            let p = tri.center + tri.random_offset(&mut rng);
            assert!(p.y.abs() < 1e-5);
            assert!(p.x >= -1.0 - 1e-5 && p.x <= 1.0 + 1e-5);
            assert!(p.z >= -1.0 - 1e-5 && p.z <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn normal_directions() {
        let mut shape = EmitterShape::new(Rc::new(TriMesh::quad(1.0, 1.0)));
        let mut rng = ParticleRng::new(3);
        let tri = shape.select_triangle(0);
        assert!((tri.direction(DirectionMode::Normal, &mut rng) - Vec3::Y).length() < 1e-6);
        assert!((tri.direction(DirectionMode::NormalNegate, &mut rng) + Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn hemisphere_directions() {
        let mut shape = EmitterShape::new(Rc::new(TriMesh::quad(1.0, 1.0)));
        let mut rng = ParticleRng::new(21);
        let tri = shape.select_triangle(1);
        for _ in 0..200 {
            assert!(tri.direction(DirectionMode::RandomNormalAligned, &mut rng).dot(tri.normal) >= 0.0);
            assert!(tri.direction(DirectionMode::RandomNormalNegate, &mut rng).dot(tri.normal) <= 0.0);
        }
    }

    #[test]
    fn tangent_directions_lie_in_face_plane() {
        let mut shape = EmitterShape::new(Rc::new(TriMesh::quad(1.0, 1.0)));
        let mut rng = ParticleRng::new(5);
        let tri = shape.select_triangle(0);
        for _ in 0..50 {
            let dir = tri.direction(DirectionMode::RandomTangent, &mut rng);
            assert!(dir.dot(tri.normal).abs() < 1e-4);
            assert!((dir.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn bound_center_follows_transform() {
        let mesh = TriMesh::from_triangles(&[[Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 2.0)]]);
        let mut shape = EmitterShape::new(Rc::new(mesh));
        shape.set_transform(Quat::IDENTITY, Vec3::splat(0.5));
        assert!((shape.bound_center() - Vec3::new(1.5, 0.0, 0.5)).length() < 1e-6);
    }
}
