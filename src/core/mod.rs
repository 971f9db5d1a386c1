//! Core types describing the skeleton: transforms, bones, and the graph.

pub mod types;
pub mod bone;
pub mod skeleton;

pub use types::Transform;
pub use bone::{Bone, BoneId};
pub use skeleton::Skeleton;
