//! Additional math helpers layered on top of `glam`.

use glam::{EulerRot, Quat, Vec3};

/// Forces a rotation's axis toward `axis` while keeping the twist
/// magnitude implied by its scalar part.
///
/// This is the soft swing approximation inherited from CCD IK solvers:
/// the vector part is overwritten with `axis * sqrt(1 - w²)`. The result
/// is intentionally *not* renormalized, so over many iterations it can
/// drift slightly off the unit sphere. Callers relying on exact cone
/// limits need a real swing/twist decomposition instead.
pub fn swing_axis_clamp(rotation: Quat, axis: Vec3) -> Quat {
    let w = rotation.w.min(1.0);
    let sin_half = (1.0 - w * w).max(0.0).sqrt();
    Quat::from_xyzw(axis.x * sin_half, axis.y * sin_half, axis.z * sin_half, w)
}

/// Clamps a rotation component-wise in Euler space (XYZ order) against
/// optional per-axis lower/upper bounds in radians.
pub fn clamp_euler(rotation: Quat, min: Option<Vec3>, max: Option<Vec3>) -> Quat {
    if min.is_none() && max.is_none() {
        return rotation;
    }

    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    let mut angles = Vec3::new(x, y, z);

    if let Some(min) = min {
        angles = angles.max(min);
    }
    if let Some(max) = max {
        angles = angles.min(max);
    }

    Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z)
}
