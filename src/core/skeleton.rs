//! The bone graph: a rooted tree of joints with derived world transforms
//! and the per-bone IK side-data store.

use std::collections::{HashMap, VecDeque};

use glam::{Quat, Vec3};
use log::warn;

use super::bone::{Bone, BoneId};
use super::types::Transform;
use crate::ik::chain::IkBoneData;
use crate::utils::allocator::Arena;

/// Rigid hierarchy of bones. The IK engine reads the tree freely but only
/// ever writes joint local rotations.
///
/// IK side-data lives here as a sparse map keyed by bone id rather than a
/// field on [`Bone`]: entries are created lazily the first time a chain
/// references a bone and are retained for the bone's lifetime, even after
/// every referencing chain is gone. An entry with an empty chain list is
/// treated as logically absent.
#[derive(Default)]
pub struct Skeleton {
    bones: Arena<Bone>,
    roots: Vec<BoneId>,
    ik: HashMap<BoneId, IkBoneData>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bone under `parent` (or as a new root) and returns its id.
    /// Returns `None` when the parent handle is stale.
    pub fn add_bone(
        &mut self,
        parent: Option<BoneId>,
        name: &str,
        local: Transform,
    ) -> Option<BoneId> {
        if let Some(parent) = parent {
            if !self.bones.is_valid(parent) {
                warn!("Cannot add bone \"{name}\": parent bone does not exist");
                return None;
            }
        }

        let mut bone = Bone::new(name, local);
        bone.parent = parent;
        let id = self.bones.insert(bone);
        if let Some(stored) = self.bones.get_mut(id) {
            stored.id = id;
        }

        match parent {
            Some(parent) => {
                if let Some(parent_bone) = self.bones.get_mut(parent) {
                    parent_bone.children.push(id);
                }
            }
            None => self.roots.push(id),
        }

        self.update_world_transform(id);
        Some(id)
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id)
    }

    pub fn contains(&self, id: BoneId) -> bool {
        self.bones.is_valid(id)
    }

    pub fn bone_name(&self, id: BoneId) -> &str {
        self.bones.get(id).map(|b| b.name.as_str()).unwrap_or("?")
    }

    pub fn parent_of(&self, id: BoneId) -> Option<BoneId> {
        self.bones.get(id).and_then(|b| b.parent)
    }

    pub fn children_of(&self, id: BoneId) -> &[BoneId] {
        self.bones
            .get(id)
            .map(|b| b.children.as_slice())
            .unwrap_or(&[])
    }

    /// Walks up the hierarchy to the top-most ancestor of `id`.
    pub fn root_of(&self, id: BoneId) -> BoneId {
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            current = parent;
        }
        current
    }

    /// Number of ancestors above `id` (0 for a root bone).
    pub fn ancestor_depth(&self, id: BoneId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    pub fn roots(&self) -> &[BoneId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    // --- Transforms ---

    pub fn world_transform(&self, id: BoneId) -> Option<&Transform> {
        self.bones.get(id).map(|b| &b.world)
    }

    pub fn world_position(&self, id: BoneId) -> Option<Vec3> {
        self.bones.get(id).map(|b| b.world.position)
    }

    pub fn local_rotation(&self, id: BoneId) -> Option<Quat> {
        self.bones.get(id).map(|b| b.local.rotation)
    }

    pub fn set_local_rotation(&mut self, id: BoneId, rotation: Quat) {
        if let Some(bone) = self.bones.get_mut(id) {
            bone.local.rotation = rotation;
        }
    }

    pub fn set_local_transform(&mut self, id: BoneId, local: Transform) {
        if let Some(bone) = self.bones.get_mut(id) {
            bone.local = local;
        }
    }

    /// Recomputes the world transform of `id` and every descendant.
    pub fn update_world_transform(&mut self, id: BoneId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(bone) = self.bones.get(current) else {
                continue;
            };
            let world = match bone.parent.and_then(|p| self.bones.get(p)) {
                Some(parent) => parent.world.combine(&bone.local),
                None => bone.local,
            };
            if let Some(bone) = self.bones.get_mut(current) {
                bone.world = world;
                stack.extend_from_slice(&bone.children);
            }
        }
    }

    /// Recomputes world transforms for the whole skeleton.
    pub fn update_all(&mut self) {
        let roots = self.roots.clone();
        for root in roots {
            self.update_world_transform(root);
        }
    }

    /// Applies `visitor` to the subtree under `root` in breadth-first
    /// order (parents strictly before deeper bones).
    pub fn visit_breadth_first(&self, root: BoneId, mut visitor: impl FnMut(BoneId)) {
        let mut queue = VecDeque::from([root]);
        while let Some(bone) = queue.pop_front() {
            if !self.bones.is_valid(bone) {
                continue;
            }
            visitor(bone);
            queue.extend(self.children_of(bone).iter().copied());
        }
    }

    /// Returns the bone whose world position is closest to `target`.
    pub fn closest_bone_to_point(&self, target: Vec3) -> Option<BoneId> {
        let mut closest = None;
        let mut distance = f32::INFINITY;
        for (id, bone) in self.bones.iter_with_ids() {
            let d = bone.world.position.distance(target);
            if d < distance {
                distance = d;
                closest = Some(id);
            }
        }
        closest
    }

    // --- IK side-data ---

    pub fn ik_data(&self, id: BoneId) -> Option<&IkBoneData> {
        self.ik.get(&id)
    }

    pub fn ik_data_mut(&mut self, id: BoneId) -> Option<&mut IkBoneData> {
        self.ik.get_mut(&id)
    }

    /// Side-data accessor that lazily creates the record on first touch.
    pub fn ensure_ik_data(&mut self, id: BoneId) -> &mut IkBoneData {
        self.ik.entry(id).or_default()
    }

    pub fn set_bone_locked(&mut self, id: BoneId, locked: bool) {
        self.ensure_ik_data(id).locked = locked;
    }

    pub fn set_axis_limit(&mut self, id: BoneId, axis: Option<Vec3>) {
        self.ensure_ik_data(id).axis_limit = axis;
    }

    pub fn set_rotation_limits(&mut self, id: BoneId, min: Option<Vec3>, max: Option<Vec3>) {
        let data = self.ensure_ik_data(id);
        data.rotation_min = min;
        data.rotation_max = max;
    }
}
