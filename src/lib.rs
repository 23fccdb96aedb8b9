//! boxphys
//!
//! Impulse-based rigid body simulation for convex box and plane hulls.
//!
//! # Architecture
//!
//! The pipeline runs bottom-up each step:
//!
//! 1. **hull** - Hull topology (vertices, faces, index-based edge adjacency)
//! 2. **body** - Rigid body state, mass properties, velocity integration
//! 3. **sat** - Separating-axis search over faces and filtered edge pairs
//! 4. **contact** - Manifold generation (face clipping, edge closest points)
//! 5. **solver** - Sequential impulses with Baumgarte stabilization
//! 6. **world** - Body collection and fixed-order step orchestration
//! 7. **control** - Edge-triggered single-step / run-pause state
//!
//! No subscriber is installed by the library; enable one from `tracing` to
//! see per-step diagnostics.

pub mod body;
pub mod contact;
pub mod control;
pub mod hull;
pub mod sat;
pub mod solver;
pub mod world;

pub use body::{box_inverse_inertia, BodyType, RigidBody};
pub use contact::{generate_contacts, ContactManifold, ContactPoint, MAX_CONTACTS};
pub use control::{StepController, StepInput};
pub use hull::{box_vertices, plane_vertices, HullDescriptor, HullError, WorldHull};
pub use sat::{find_separating_axis, AxisSource, HullSide, SeparatingAxisResult};
pub use solver::{calc_baumgarte_bias, resolve_contacts};
pub use world::World;

/// Simulation tuning. Linear velocities are per-step displacements; the
/// timestep only scales orientation integration and the Baumgarte bias.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Fixed timestep in seconds. Default: 1/60.
    pub timestep: f32,
    /// Number of impulse solver iterations per manifold. Default: 10.
    pub solver_iterations: u32,
    /// Fraction of the penetration depth recovered per step. Default: 0.01.
    pub bias_factor: f32,
    /// Penetration depth tolerated without correction. Default: 0.0001.
    pub bias_slop: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            solver_iterations: 10,
            bias_factor: 0.01,
            bias_slop: 0.0001,
        }
    }
}
