//! Small vector helpers on top of glam.

use glam::{EulerRot, Mat3, Quat, Vec3};

use super::rng::ParticleRng;

/// Rotation built from three independent random Euler angles in [0, 2π).
/// Not uniform over SO(3); emission directions depend on its bias.
pub fn random_euler_rotation(rng: &mut ParticleRng) -> Quat {
    let (x, y, z) = (rng.angle(), rng.angle(), rng.angle());
    Quat::from_euler(EulerRot::XYZ, x, y, z)
}

/// Orientation whose local +Z looks along `direction` with +Y as close to `up` as possible.
pub fn look_rotation(direction: Vec3, up: Vec3) -> Quat {
    let z = direction.normalize_or_zero();
    if z == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut x = up.cross(z);
    if x.length_squared() < 1e-8 {
        // up is parallel to direction
        x = Vec3::X.cross(z);
        if x.length_squared() < 1e-8 {
            x = Vec3::Z.cross(z);
        }
    }
    let x = x.normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// Unit normal of triangle (a, b, c) with counter-clockwise winding.
#[inline]
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Reflect `v` about the plane with unit normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_rotation_maps_z_to_direction() {
        let dir = Vec3::new(1.0, 0.0, 0.0);
        let q = look_rotation(dir, Vec3::Y);
        let z = q * Vec3::Z;
        assert!((z - dir).length() < 1e-5);
        let y = q * Vec3::Y;
        assert!(y.dot(dir).abs() < 1e-5);
    }

    #[test]
    fn look_rotation_handles_parallel_up() {
        let q = look_rotation(Vec3::Y, Vec3::Y);
        let z = q * Vec3::Z;
        assert!((z - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn triangle_normal_ccw() {
        let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!((n - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn reflect_flips_normal_component() {
        let r = reflect(Vec3::new(1.0, -2.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn random_rotation_preserves_length() {
        let mut rng = ParticleRng::new(5);
        for _ in 0..20 {
            let v = random_euler_rotation(&mut rng) * Vec3::Y;
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }
}
