//! Body collection and step orchestration.
//!
//! A step runs in a fixed order: external forces become velocities, every
//! body pair is tested and resolved, poses integrate from the resolved
//! velocities, hulls refresh, accumulators clear. Manifolds from the step
//! are kept and returned so callers can inspect or visualize them.

use tracing::debug;

use crate::body::RigidBody;
use crate::contact::{generate_contacts, ContactManifold};
use crate::sat::find_separating_axis;
use crate::solver::resolve_contacts;
use crate::SimConfig;

/// The simulation aggregate. Owns every body; handles are plain indices
/// and stay valid for the world's lifetime (bodies are never removed).
pub struct World {
    bodies: Vec<RigidBody>,
    manifolds: Vec<ContactManifold>,
    config: SimConfig,
    step_count: u64,
}

impl World {
    pub fn new(config: SimConfig) -> Self {
        Self {
            bodies: Vec::new(),
            manifolds: Vec::new(),
            config,
            step_count: 0,
        }
    }

    /// Add a body and return its handle.
    pub fn add_body(&mut self, body: RigidBody) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    #[inline]
    pub fn body(&self, handle: usize) -> &RigidBody {
        &self.bodies[handle]
    }

    #[inline]
    pub fn body_mut(&mut self, handle: usize) -> &mut RigidBody {
        &mut self.bodies[handle]
    }

    #[inline]
    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Advance the simulation one step and return the manifolds resolved
    /// during it.
    pub fn step(&mut self) -> &[ContactManifold] {
        // accumulated forces become this step's velocities
        for body in &mut self.bodies {
            let torque = body.torque_accumulator;
            let force = body.force_accumulator;
            body.predict_velocity(torque, force);
            body.commit_velocity();
        }

        self.manifolds.clear();
        let count = self.bodies.len();
        for i in 0..count {
            for j in (i + 1)..count {
                if self.bodies[i].is_static() && self.bodies[j].is_static() {
                    continue;
                }
                // keep a static body on the B side so the axis points at
                // the dynamic one
                let (a_idx, b_idx) = if self.bodies[i].is_static() {
                    (j, i)
                } else {
                    (i, j)
                };

                let axis = find_separating_axis(&self.bodies[a_idx], &self.bodies[b_idx]);
                if !axis.is_overlap() {
                    continue;
                }
                let manifold = generate_contacts(
                    &axis,
                    self.bodies[a_idx].hull(),
                    self.bodies[b_idx].hull(),
                    [a_idx, b_idx],
                );
                if manifold.is_empty() {
                    continue;
                }

                let (body_a, body_b) = pair_mut(&mut self.bodies, a_idx, b_idx);
                resolve_contacts(body_a, body_b, &manifold, &self.config);
                self.manifolds.push(manifold);
            }
        }

        let dt = self.config.timestep;
        for body in &mut self.bodies {
            if !body.is_static() {
                body.integrate_pose(dt);
                body.refresh_hull();
            }
            body.clear_accumulators();
        }

        self.step_count += 1;
        debug!(
            step = self.step_count,
            manifolds = self.manifolds.len(),
            "step complete"
        );
        &self.manifolds
    }
}

/// Disjoint mutable borrows of two bodies by index.
fn pair_mut(bodies: &mut [RigidBody], a: usize, b: usize) -> (&mut RigidBody, &mut RigidBody) {
    if a < b {
        let (low, high) = bodies.split_at_mut(b);
        (&mut low[a], &mut high[0])
    } else {
        let (low, high) = bodies.split_at_mut(a);
        (&mut high[0], &mut low[b])
    }
}
