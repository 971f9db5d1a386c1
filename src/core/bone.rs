use super::types::Transform;
use crate::utils::allocator::SlotId;

/// Handle to a bone stored in a [`Skeleton`](super::skeleton::Skeleton).
pub type BoneId = SlotId;

/// A joint in the rigid skeleton hierarchy.
///
/// Bones own only their local transform; the world transform is derived
/// by forward kinematics from the parent chain and cached here.
#[derive(Debug, Clone)]
pub struct Bone {
    pub id: BoneId,
    pub name: String,
    pub parent: Option<BoneId>,
    pub children: Vec<BoneId>,
    pub local: Transform,
    pub world: Transform,
}

impl Bone {
    pub fn new(name: &str, local: Transform) -> Self {
        Self {
            id: BoneId::default(),
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local,
            world: local,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
