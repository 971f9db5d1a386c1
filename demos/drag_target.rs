use rig_ik::*;

fn main() {
    env_logger::init();

    let mut skeleton = Skeleton::new();
    let root = skeleton
        .add_bone(None, "shoulder", Transform::default())
        .unwrap();
    let elbow = skeleton
        .add_bone(Some(root), "elbow", Transform::from_position(Vec3::Y))
        .unwrap();
    let wrist = skeleton
        .add_bone(Some(elbow), "wrist", Transform::from_position(Vec3::Y))
        .unwrap();
    let hand = skeleton
        .add_bone(Some(wrist), "hand", Transform::from_position(Vec3::Y))
        .unwrap();
    skeleton.update_all();

    let mut manager = IkManager::new();
    let chain = manager
        .create_chain_from_bone(&mut skeleton, hand, 2)
        .expect("hand is free to drive a chain");

    // Drag the target along an arc and re-solve each frame.
    for frame in 0..10 {
        let t = frame as f32 / 9.0;
        let target = Vec3::new(2.0 * t, 3.0 - t, 0.0);
        manager.chain_mut(chain).unwrap().target = target;
        manager.solve_chains(&mut skeleton, None);

        let effector = skeleton.world_position(hand).unwrap();
        println!(
            "frame {frame:2}: target {:?} -> effector {:?} (error {:.4})",
            target,
            effector,
            (effector - target).length()
        );
    }
}
