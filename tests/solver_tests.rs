use approx::assert_relative_eq;
use glam::{Quat, Vec3};
use rig_ik::{solve_ccd_chain, BoneId, ChainId, IkChain, Skeleton, Transform};

/// Straight vertical chain `b0 <- b1 <- b2 <- b3`, joints one unit
/// apart, effector tip at (0, 3, 0).
fn arm() -> (Skeleton, Vec<BoneId>) {
    let mut skeleton = Skeleton::new();
    let mut ids = Vec::new();
    let mut parent = None;
    for i in 0..4 {
        let local = if i == 0 {
            Transform::default()
        } else {
            Transform::from_position(Vec3::Y)
        };
        let id = skeleton.add_bone(parent, &format!("b{i}"), local).unwrap();
        parent = Some(id);
        ids.push(id);
    }
    (skeleton, ids)
}

fn effector_distance(skeleton: &Skeleton, chain: &IkChain) -> f32 {
    skeleton
        .world_position(chain.effector())
        .unwrap()
        .distance(chain.target)
}

#[test]
fn effector_approaches_reachable_target() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[3], 2).unwrap();
    chain.target = Vec3::new(1.5, 1.5, 0.0);

    // Bend the elbow first: from a perfectly straight rest pose the
    // first pass aligns the whole chain onto the joint-to-target ray,
    // after which every per-joint angle is zero and the solve stalls.
    skeleton.set_local_rotation(b[2], Quat::from_rotation_z(-0.5));
    skeleton.update_world_transform(b[2]);

    let before = effector_distance(&skeleton, &chain);
    chain.solve(&mut skeleton, 10);
    let after = effector_distance(&skeleton, &chain);

    assert!(after < before);
    assert!(after < 0.1, "CCD should get close to a reachable target, got {after}");
}

#[test]
fn straight_chain_aligns_onto_the_target_ray_and_stalls() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[3], 2).unwrap();
    chain.target = Vec3::new(1.5, 1.5, 0.0);

    chain.solve(&mut skeleton, 1);
    let overshoot = effector_distance(&skeleton, &chain);

    // The tail joint swung the still-straight chain onto its ray to the
    // target; with every joint angle now zero no later pass can correct
    // the overshoot.
    let passes = chain.solve(&mut skeleton, 10);
    assert_eq!(passes, 0);
    assert_relative_eq!(
        effector_distance(&skeleton, &chain),
        overshoot,
        epsilon = 1e-6
    );
}

#[test]
fn effector_bone_is_never_rotated() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[3], 2).unwrap();
    chain.target = Vec3::new(1.0, 1.0, 1.0);

    chain.solve(&mut skeleton, 10);

    assert_eq!(skeleton.local_rotation(b[3]), Some(Quat::IDENTITY));
}

#[test]
fn collinear_target_converges_on_the_first_pass() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[3], 2).unwrap();
    // Straight up, beyond reach: every per-bone angle is already zero.
    chain.target = Vec3::new(0.0, 10.0, 0.0);

    let passes = chain.solve(&mut skeleton, 5);

    assert_eq!(passes, 0, "no pass should rotate anything");
    for bone in b {
        assert_eq!(skeleton.local_rotation(bone), Some(Quat::IDENTITY));
    }
}

#[test]
fn repeated_solves_reach_a_fixed_point() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[3], 2).unwrap();
    chain.target = Vec3::new(1.2, 1.8, 0.0);

    let mut converged = false;
    for _ in 0..200 {
        if chain.solve(&mut skeleton, 3) == 0 {
            converged = true;
            break;
        }
    }

    assert!(converged, "solve must eventually rotate nothing for a fixed target");
}

#[test]
fn locked_bone_is_skipped() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[3], 2).unwrap();
    chain.target = Vec3::new(2.0, 1.0, 0.0);

    skeleton.set_bone_locked(b[2], true);
    chain.solve(&mut skeleton, 5);

    assert_eq!(skeleton.local_rotation(b[2]), Some(Quat::IDENTITY));
    assert_ne!(skeleton.local_rotation(b[1]), Some(Quat::IDENTITY));
}

#[test]
fn locked_tail_is_skipped() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[3], 2).unwrap();
    chain.target = Vec3::new(2.0, 1.0, 0.0);
    chain.lock_tail = true;

    chain.solve(&mut skeleton, 5);

    assert_eq!(skeleton.local_rotation(b[1]), Some(Quat::IDENTITY));
    assert_ne!(skeleton.local_rotation(b[2]), Some(Quat::IDENTITY));
}

#[test]
fn root_tail_locks_itself_as_a_safety_net() {
    let (mut skeleton, b) = arm();
    // Chain reaching all the way down to the skeleton root.
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[2], 2).unwrap();
    chain.target = Vec3::new(1.0, 1.0, 0.0);
    assert_eq!(chain.tail(), b[0]);

    // No manager lock pass ran; solve must still refuse to rotate the root.
    chain.solve(&mut skeleton, 5);

    assert!(skeleton.ik_data(b[0]).unwrap().locked);
    assert_eq!(skeleton.local_rotation(b[0]), Some(Quat::IDENTITY));
}

#[test]
fn size_one_chain_with_locked_tail_is_a_no_op() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[1], 1).unwrap();
    chain.target = Vec3::new(3.0, 0.0, 0.0);
    chain.lock_tail = true;

    let passes = chain.solve(&mut skeleton, 5);

    assert_eq!(passes, 0);
    for bone in b {
        assert_eq!(skeleton.local_rotation(bone), Some(Quat::IDENTITY));
    }
}

#[test]
fn max_angle_caps_per_step_rotation() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[3], 2).unwrap();
    // Far off to the side: the unclamped step would be large.
    chain.target = Vec3::new(3.0, 0.0, 0.0);

    solve_ccd_chain(&mut skeleton, &chain, 1, None, Some(0.01));

    for bone in [b[1], b[2]] {
        let (_, angle) = skeleton.local_rotation(bone).unwrap().to_axis_angle();
        assert_relative_eq!(angle, 0.01, epsilon = 1e-4);
    }
}

#[test]
fn axis_limit_forces_the_rotation_axis() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[2], 1).unwrap();
    chain.target = Vec3::new(1.0, 1.0, 0.0);

    skeleton.set_axis_limit(b[1], Some(Vec3::Z));
    chain.solve(&mut skeleton, 3);

    let rotation = skeleton.local_rotation(b[1]).unwrap();
    assert_eq!(rotation.x, 0.0);
    assert_eq!(rotation.y, 0.0);
    assert_ne!(rotation.z, 0.0);
}

#[test]
fn euler_limits_clamp_the_result() {
    let (mut skeleton, b) = arm();
    let mut chain = IkChain::new(ChainId(0), &mut skeleton, b[3], 2).unwrap();
    chain.target = Vec3::new(0.0, 0.5, 3.0);

    let bound = Vec3::splat(0.1);
    skeleton.set_rotation_limits(b[1], Some(-bound), Some(bound));
    skeleton.set_rotation_limits(b[2], Some(-bound), Some(bound));

    chain.solve(&mut skeleton, 5);

    for bone in [b[1], b[2]] {
        let (x, y, z) = skeleton
            .local_rotation(bone)
            .unwrap()
            .to_euler(glam::EulerRot::XYZ);
        for angle in [x, y, z] {
            assert!(angle.abs() <= 0.1 + 1e-4, "angle {angle} exceeds the clamp");
        }
    }
}
