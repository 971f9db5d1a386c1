//! Global configuration constants for the Rig IK engine.

/// Number of CCD passes performed by a default chain solve.
pub const DEFAULT_SOLVER_ITERATIONS: usize = 3;

/// Chains are created with this size when none is requested.
pub const DEFAULT_CHAIN_SIZE: usize = 1;

/// Smallest legal chain size (one rotatable link above the effector).
pub const MIN_CHAIN_SIZE: usize = 1;

/// Rotations below this angle (radians) are skipped during a CCD pass to
/// prevent visible bone jitter.
pub const MIN_ROTATION_ANGLE: f32 = 1e-5;

/// Interactive edits should resolve within this budget (milliseconds);
/// batch solves that overrun it log a warning.
pub const SOLVE_BUDGET_MS: f32 = 4.0;
