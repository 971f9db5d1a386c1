//! Rig IK: CCD inverse kinematics for skeletal rigs.
//!
//! This crate exposes the IK engine of a rigged-scene editor: a bone
//! graph with derived world transforms, bottom-up IK chains over it, a
//! conflict-tracking chain registry, and a Cyclic Coordinate Descent
//! solver with soft axis/angle clamps.
//!
//! Typical flow: editor code creates and resizes chains through
//! [`IkManager`], writes world-space targets into the chains after a
//! transform edit, then calls [`IkManager::solve_chains`] once per
//! affected edit. Chains are solved root-to-leaf so nested chains read
//! already-finalized ancestor poses within a single pass.

pub mod config;
pub mod core;
pub mod ik;
pub mod utils;

pub use glam::{Mat4, Quat, Vec3};

pub use crate::core::{Bone, BoneId, Skeleton, Transform};
pub use crate::ik::{solve_ccd_chain, ChainDescriptor, ChainId, IkBoneData, IkChain, IkManager};
pub use crate::utils::allocator::{Arena, SlotId};
