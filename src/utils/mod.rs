//! Utility helpers including the bone arena, logging, and math extensions.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, SlotId};
pub use math::*;
