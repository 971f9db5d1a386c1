//! Bottom-up IK chains over a skeleton and the per-bone side-data they
//! attach to the bones they pass through.

use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

use super::solver::solve_ccd_chain;
use crate::config::MIN_CHAIN_SIZE;
use crate::core::bone::BoneId;
use crate::core::skeleton::Skeleton;

/// Identifier assigned to a chain by the [`IkManager`](super::manager::IkManager).
///
/// Ids increase monotonically within one manager generation and only
/// reset when all chains are removed at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u32);

/// IK bookkeeping attached to a bone the first time any chain references
/// it. The record persists for the bone's lifetime; an empty `chains`
/// list means no chain currently passes through.
#[derive(Debug, Clone, Default)]
pub struct IkBoneData {
    /// Every chain currently referencing this bone (non-owning relation).
    pub chains: Vec<ChainId>,
    /// When set, no chain's solve pass may rotate this bone.
    pub locked: bool,
    /// Soft swing constraint: forces rotation axes toward this direction.
    pub axis_limit: Option<Vec3>,
    /// Component-wise Euler lower bound (radians).
    pub rotation_min: Option<Vec3>,
    /// Component-wise Euler upper bound (radians).
    pub rotation_max: Option<Vec3>,
}

/// Serialized form of a chain: enough to rebuild it against an already
/// consistent skeleton on scene reload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub id: ChainId,
    pub effector: BoneId,
    pub size: usize,
}

/// An ordered run of bones from an effector (the driven end) up to a
/// tail (the anchor), plus the world-space target the effector chases.
///
/// The chain owns no bones; it references them by id and registers
/// itself in each referenced bone's [`IkBoneData`]. `bones[i + 1]` is
/// always the parent of `bones[i]`, so the chain is a contiguous
/// ancestor path that can only grow or shrink one link at a time from
/// the tail end.
#[derive(Debug, Clone)]
pub struct IkChain {
    id: ChainId,
    bones: Vec<BoneId>,
    /// World-space target point, written by the caller before a solve.
    pub target: Vec3,
    /// Set by the manager when another chain or the skeleton root owns
    /// the tail joint's rotation.
    pub lock_tail: bool,
}

impl IkChain {
    /// Builds a chain rooted at `effector` and grows it to `size` links
    /// if enough ancestors exist. Performs no conflict checking; that is
    /// the manager's job.
    pub fn new(
        id: ChainId,
        skeleton: &mut Skeleton,
        effector: BoneId,
        size: usize,
    ) -> Option<Self> {
        if !skeleton.contains(effector) {
            warn!("Cannot create IK chain: effector bone does not exist");
            return None;
        }

        skeleton.ensure_ik_data(effector).chains.push(id);
        let mut chain = Self {
            id,
            bones: vec![effector],
            target: Vec3::ZERO,
            lock_tail: false,
        };
        chain.set_size(skeleton, size);
        Some(chain)
    }

    /// Rebuilds a persisted chain by direct construction, bypassing
    /// conflict checks (the skeleton is assumed already consistent).
    pub fn from_descriptor(skeleton: &mut Skeleton, descriptor: &ChainDescriptor) -> Option<Self> {
        Self::new(descriptor.id, skeleton, descriptor.effector, descriptor.size)
    }

    pub fn descriptor(&self) -> ChainDescriptor {
        ChainDescriptor {
            id: self.id,
            effector: self.effector(),
            size: self.size(),
        }
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    /// Number of rotatable links: bone count minus the effector.
    pub fn size(&self) -> usize {
        self.bones.len() - 1
    }

    /// The driven end of the chain.
    pub fn effector(&self) -> BoneId {
        self.bones[0]
    }

    pub fn head(&self) -> BoneId {
        self.bones[0]
    }

    /// The anchor end of the chain.
    pub fn tail(&self) -> BoneId {
        self.bones[self.bones.len() - 1]
    }

    pub fn bones(&self) -> &[BoneId] {
        &self.bones
    }

    pub fn contains_bone(&self, bone: BoneId) -> bool {
        self.bones.contains(&bone)
    }

    /// The bone one link below `bone` in this chain (towards the
    /// effector), if `bone` is a non-effector member.
    pub fn child_for_bone(&self, bone: BoneId) -> Option<BoneId> {
        let index = self.bones.iter().position(|&b| b == bone)?;
        if index == 0 {
            None
        } else {
            Some(self.bones[index - 1])
        }
    }

    /// Sets the chain size and returns whether the chain was modified.
    ///
    /// Growth that runs out of ancestors stops at the skeleton root with
    /// a warning; the partial growth still counts as a modification.
    pub fn set_size(&mut self, skeleton: &mut Skeleton, size: usize) -> bool {
        if size < MIN_CHAIN_SIZE {
            warn!("IK chains cannot have a size less than {MIN_CHAIN_SIZE}");
            return false;
        }

        if size == self.size() {
            return false;
        }

        if size > self.size() {
            let missing = size - self.size();
            for _ in 0..missing {
                match skeleton.parent_of(self.tail()) {
                    Some(parent) => {
                        skeleton.ensure_ik_data(parent).chains.push(self.id);
                        self.bones.push(parent);
                    }
                    None => {
                        warn!(
                            "Not enough bones for a size of {size}, new size is {}",
                            self.size()
                        );
                        return true;
                    }
                }
            }
        } else {
            let excess = self.size() - size;
            for _ in 0..excess {
                if let Some(bone) = self.bones.pop() {
                    remove_reference(skeleton, bone, self.id);
                }
            }
        }

        true
    }

    /// Whether `delta` more ancestors exist above the current tail.
    pub fn can_increase(&self, skeleton: &Skeleton, delta: usize) -> bool {
        let mut bone = self.tail();
        for _ in 0..delta {
            match skeleton.parent_of(bone) {
                Some(parent) => bone = parent,
                None => return false,
            }
        }
        true
    }

    pub fn can_decrease(&self, delta: usize) -> bool {
        self.size() >= MIN_CHAIN_SIZE + delta
    }

    /// Runs CCD against the live skeleton, rotating non-locked bones so
    /// the effector approaches [`target`](Self::target). Returns the
    /// number of passes that rotated at least one bone.
    pub fn solve(&self, skeleton: &mut Skeleton, iterations: usize) -> usize {
        let tail = self.tail();
        // Safety net: a chain anchored at the skeleton root must never
        // rotate it, even if the manager's lock pass was skipped.
        if skeleton.parent_of(tail).is_none() {
            skeleton.ensure_ik_data(tail).locked = true;
        }

        solve_ccd_chain(skeleton, self, iterations, None, None)
    }

    /// Strips this chain from the side-data of every referenced bone.
    pub fn dispose(self, skeleton: &mut Skeleton) {
        for bone in &self.bones {
            remove_reference(skeleton, *bone, self.id);
        }
    }
}

/// Drops a single occurrence of `id` from the bone's chain list. Two
/// chain instances may carry the same id (a rejected duplicate next to
/// the tracked one); removing all occurrences would strip the survivor's
/// registration too.
fn remove_reference(skeleton: &mut Skeleton, bone: BoneId, id: ChainId) {
    if let Some(data) = skeleton.ik_data_mut(bone) {
        if let Some(position) = data.chains.iter().position(|&c| c == id) {
            data.chains.remove(position);
        }
    }
}
