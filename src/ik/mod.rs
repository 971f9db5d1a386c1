//! The inverse-kinematics subsystem: chains, the chain registry, and
//! the CCD solver.

pub mod chain;
pub mod manager;
pub mod solver;

pub use chain::{ChainDescriptor, ChainId, IkBoneData, IkChain};
pub use manager::IkManager;
pub use solver::solve_ccd_chain;
