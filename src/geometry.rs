//! Small 3D helpers shared by the sheet and handedness modules.

use glam::Vec3;

/// Vertex angle p0–p2–p1 in radians.
///
/// `p2` is the vertex; the angle is between the vectors p2→p0 and p2→p1.
pub fn angle(p0: Vec3, p1: Vec3, p2: Vec3) -> f32 {
    let v0 = p0 - p2;
    let v1 = p1 - p2;
    let denom = v0.length() * v1.length();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (v0.dot(v1) / denom).clamp(-1.0, 1.0).acos()
}

/// Unit normal of the triangle (base, a, b), oriented by (a − base) × (b − base).
pub fn triangle_normal(base: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    (a - base).cross(b - base).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_angle() {
        let a = angle(Vec3::X, Vec3::Y, Vec3::ZERO);
        assert!((a - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn straight_angle() {
        let a = angle(Vec3::X, -Vec3::X, Vec3::ZERO);
        assert!((a - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn degenerate_angle_is_zero() {
        assert_eq!(angle(Vec3::ZERO, Vec3::X, Vec3::ZERO), 0.0);
    }

    #[test]
    fn normal_is_unit_and_orthogonal() {
        let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!(n.dot(Vec3::X).abs() < 1e-6);
        assert!(n.dot(Vec3::Y).abs() < 1e-6);
    }
}
