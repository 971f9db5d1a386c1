//! Cyclic Coordinate Descent: iterative heuristic that rotates one
//! joint at a time, tail-to-effector, to close the angular error
//! between the effector and the chain target.

use glam::Quat;

use super::chain::IkChain;
use crate::config::MIN_ROTATION_ANGLE;
use crate::core::skeleton::Skeleton;
use crate::utils::math::{clamp_euler, swing_axis_clamp};

/// Resolves the IK constraint on `chain` by mutating joint local
/// rotations in the skeleton.
///
/// Each pass walks the chain from the tail (or the bone below it when
/// the tail is locked) down to the bone above the effector; the effector
/// itself is never rotated. Per bone, the effector and target directions
/// are expressed in the bone's local frame and the bone is rotated about
/// their cross axis by the angle between them, optionally clamped into
/// `[min_angle, max_angle]`. A pass that rotates nothing ends the solve
/// early; the chain has converged or is fully locked.
///
/// Returns the number of passes that rotated at least one bone, so `0`
/// means the chain was already converged on entry.
pub fn solve_ccd_chain(
    skeleton: &mut Skeleton,
    chain: &IkChain,
    iterations: usize,
    min_angle: Option<f32>,
    max_angle: Option<f32>,
) -> usize {
    let bones = chain.bones();
    let effector = chain.effector();
    let target = chain.target;

    let start_index = if chain.lock_tail {
        bones.len().saturating_sub(2)
    } else {
        bones.len() - 1
    };

    let mut effective_passes = 0;

    for _ in 0..iterations {
        let mut rotated = false;

        // Tail-to-effector order; index 0 (the effector) is never rotated.
        for &bone in bones[1..=start_index].iter().rev() {
            let (locked, axis_limit, rotation_min, rotation_max) = match skeleton.ik_data(bone) {
                Some(data) => (
                    data.locked,
                    data.axis_limit,
                    data.rotation_min,
                    data.rotation_max,
                ),
                None => (false, None, None, None),
            };
            if locked {
                continue;
            }

            let Some(bone_world) = skeleton.world_transform(bone).copied() else {
                continue;
            };
            let Some(effector_pos) = skeleton.world_position(effector) else {
                break;
            };

            // Work in the bone's local (inverse-rotated) frame.
            let inv_rot = bone_world.rotation.inverse();
            let effector_vec = (inv_rot * (effector_pos - bone_world.position)).normalize_or_zero();
            let target_vec = (inv_rot * (target - bone_world.position)).normalize_or_zero();

            let mut angle = target_vec.dot(effector_vec).clamp(-1.0, 1.0).acos();

            // Skip changes too small to see; rotating anyway makes the
            // bone vibrate around the target.
            if angle < MIN_ROTATION_ANGLE {
                continue;
            }

            if let Some(min) = min_angle {
                angle = angle.max(min);
            }
            if let Some(max) = max_angle {
                angle = angle.min(max);
            }

            let axis = effector_vec.cross(target_vec).normalize_or_zero();
            let delta = Quat::from_axis_angle(axis, angle);

            let Some(local_rotation) = skeleton.local_rotation(bone) else {
                continue;
            };
            // Right-multiplied: the rotation applies in the bone's
            // current local frame.
            let mut rotation = local_rotation * delta;

            if let Some(axis_limit) = axis_limit {
                rotation = swing_axis_clamp(rotation, axis_limit);
            }
            rotation = clamp_euler(rotation, rotation_min, rotation_max);

            skeleton.set_local_rotation(bone, rotation);
            skeleton.update_world_transform(bone);

            rotated = true;
        }

        if !rotated {
            break;
        }
        effective_passes += 1;
    }

    effective_passes
}
