//! Collision geometry queried by the physics influencer.
//!
//! Hosts plug their own geometry in through [`Collidable`]; the plane, sphere
//! and box colliders here cover the common static cases.

use std::fmt;

use glam::{Quat, Vec3};

use crate::core::error::CollisionError;

/// Transient bounding proxy built around a particle for one collision test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionProxy {
    /// World-space center.
    pub center: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
}

impl CollisionProxy {
    /// Radius of the bounding sphere around the proxy box.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.half_extents.abs().max_element()
    }
}

/// Result of a successful collision query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Closest point on the collidable's surface.
    pub point: Vec3,
    /// Unit surface normal pointing away from the collidable.
    pub normal: Vec3,
    /// Distance from the proxy center to `point`.
    pub distance: f32,
}

/// Geometry a particle can collide with.
pub trait Collidable: fmt::Debug {
    /// Test the proxy against this geometry. `Ok(None)` means no contact.
    fn collide(&self, proxy: &CollisionProxy) -> Result<Option<Contact>, CollisionError>;
}

/// Infinite plane in Hessian normal form: `dot(normal, p) = offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneCollider {
    pub normal: Vec3,
    pub offset: f32,
}

impl PlaneCollider {
    /// A zero-length normal falls back to +Y.
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self {
            normal: normal.try_normalize().unwrap_or(Vec3::Y),
            offset,
        }
    }

    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.try_normalize().unwrap_or(Vec3::Y);
        Self {
            normal,
            offset: normal.dot(point),
        }
    }

    #[inline]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }
}

impl Collidable for PlaneCollider {
    fn collide(&self, proxy: &CollisionProxy) -> Result<Option<Contact>, CollisionError> {
        let d = self.distance_to_point(proxy.center);
        if d > proxy.radius() {
            return Ok(None);
        }
        Ok(Some(Contact {
            point: proxy.center - self.normal * d,
            normal: self.normal,
            distance: d.abs(),
        }))
    }
}

/// Solid sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereCollider {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius: radius.abs() }
    }
}

impl Collidable for SphereCollider {
    fn collide(&self, proxy: &CollisionProxy) -> Result<Option<Contact>, CollisionError> {
        let offset = proxy.center - self.center;
        if offset.length() > self.radius + proxy.radius() {
            return Ok(None);
        }
        let normal = offset.try_normalize().unwrap_or(Vec3::Y);
        let point = self.center + normal * self.radius;
        Ok(Some(Contact {
            point,
            normal,
            distance: proxy.center.distance(point),
        }))
    }
}

/// Solid axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCollider {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoxCollider {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }
}

impl Collidable for BoxCollider {
    fn collide(&self, proxy: &CollisionProxy) -> Result<Option<Contact>, CollisionError> {
        let c = proxy.center;
        let closest = c.clamp(self.min, self.max);
        let offset = c - closest;
        let dist = offset.length();

        if dist > 0.0 {
            if dist > proxy.radius() {
                return Ok(None);
            }
            return Ok(Some(Contact {
                point: closest,
                normal: offset / dist,
                distance: dist,
            }));
        }

        // Center inside the box: push out through the nearest face.
        let to_min = c - self.min;
        let to_max = self.max - c;
        let faces = [
            (to_min.x, -Vec3::X),
            (to_max.x, Vec3::X),
            (to_min.y, -Vec3::Y),
            (to_max.y, Vec3::Y),
            (to_min.z, -Vec3::Z),
            (to_max.z, Vec3::Z),
        ];
        let (depth, normal) = faces
            .into_iter()
            .fold((f32::INFINITY, Vec3::Y), |best, face| if face.0 < best.0 { face } else { best });
        Ok(Some(Contact {
            point: c + normal * depth,
            normal,
            distance: depth,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy_at(center: Vec3, half: f32) -> CollisionProxy {
        CollisionProxy {
            center,
            rotation: Quat::IDENTITY,
            half_extents: Vec3::splat(half),
        }
    }

    #[test]
    fn plane_hits_within_radius() {
        let ground = PlaneCollider::new(Vec3::Y, 0.0);
        assert!(ground.collide(&proxy_at(Vec3::new(0.0, 1.0, 0.0), 0.5)).unwrap().is_none());
        let contact = ground.collide(&proxy_at(Vec3::new(3.0, 0.25, 0.0), 0.5)).unwrap().unwrap();
        assert_eq!(contact.normal, Vec3::Y);
        assert!((contact.point - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-6);
        assert!((contact.distance - 0.25).abs() < 1e-6);
    }

    #[test]
    fn plane_hits_when_below() {
        let ground = PlaneCollider::from_point_normal(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        let contact = ground.collide(&proxy_at(Vec3::new(0.0, 1.0, 0.0), 0.1)).unwrap().unwrap();
        assert!((contact.point.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn zero_normal_falls_back_to_up() {
        let plane = PlaneCollider::new(Vec3::ZERO, 1.0);
        assert_eq!(plane.normal, Vec3::Y);
    }

    #[test]
    fn sphere_contact_on_surface() {
        let ball = SphereCollider::new(Vec3::ZERO, 1.0);
        assert!(ball.collide(&proxy_at(Vec3::new(0.0, 3.0, 0.0), 0.5)).unwrap().is_none());
        let contact = ball.collide(&proxy_at(Vec3::new(0.0, 1.2, 0.0), 0.5)).unwrap().unwrap();
        assert!((contact.normal - Vec3::Y).length() < 1e-6);
        assert!((contact.point - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn box_outside_and_inside() {
        let crate_box = BoxCollider::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        assert!(crate_box.collide(&proxy_at(Vec3::new(3.0, 0.0, 0.0), 0.5)).unwrap().is_none());

        let contact = crate_box.collide(&proxy_at(Vec3::new(1.2, 0.0, 0.0), 0.5)).unwrap().unwrap();
        assert_eq!(contact.normal, Vec3::X);

        let inside = crate_box.collide(&proxy_at(Vec3::new(0.0, 0.9, 0.0), 0.1)).unwrap().unwrap();
        assert_eq!(inside.normal, Vec3::Y);
        assert!((inside.point.y - 1.0).abs() < 1e-6);
    }
}
