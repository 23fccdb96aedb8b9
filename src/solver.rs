//! Sequential impulse resolution with Baumgarte stabilization.
//!
//! Impulses are accumulated per contact and clamped so the total never
//! pulls the bodies together; each iteration applies only the delta from
//! the previous total. Every applied delta routes through the bodies'
//! predict/commit velocity path, so later contacts in the same iteration
//! see the updated velocities.

use tracing::{debug, trace};

use crate::body::RigidBody;
use crate::contact::{ContactManifold, MAX_CONTACTS};
use crate::SimConfig;

/// Stabilization velocity for a penetration depth: a fraction of the
/// depth beyond the slop margin, recovered per timestep.
///
/// `bias = factor * max(0, |penetration| - slop) / dt`
pub fn calc_baumgarte_bias(penetration: f32, config: &SimConfig) -> f32 {
    let dist = (penetration.abs() - config.bias_slop).max(0.0);
    config.bias_factor * dist / config.timestep
}

/// Resolve one manifold between two bodies. Contact normals point from
/// body B toward body A; a static B contributes nothing to the effective
/// mass (infinite mass, zero inverse inertia) and receives no impulses.
pub fn resolve_contacts(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    manifold: &ContactManifold,
    config: &SimConfig,
) {
    if manifold.is_empty() {
        return;
    }

    // Effective normal mass per contact, constant across iterations:
    // k_n = 1/m_a + 1/m_b + ((I_a^-1 (r_a x n) x r_a + I_b^-1 (r_b x n) x r_b) . n)
    let inv_inertia_a = body_a.inverse_inertia_world();
    let inv_inertia_b = body_b.inverse_inertia_world();
    let mut impulse_k = [0.0f32; MAX_CONTACTS];
    for (i, contact) in manifold.contacts().iter().enumerate() {
        let n = contact.normal;
        let r_a = contact.point - body_a.position;
        let r_b = contact.point - body_b.position;
        let angular = inv_inertia_a * r_a.cross(n).cross(r_a)
            + inv_inertia_b * r_b.cross(n).cross(r_b);
        impulse_k[i] = 1.0 / body_a.mass + 1.0 / body_b.mass + angular.dot(n);
    }

    let mut impulse = [0.0f32; MAX_CONTACTS];
    for _ in 0..config.solver_iterations {
        for (j, contact) in manifold.contacts().iter().enumerate() {
            let n = contact.normal;
            let r_a = contact.point - body_a.position;
            let r_b = contact.point - body_b.position;

            // relative velocity of the contact points along the normal
            let relative = body_a.linear_velocity + body_a.angular_velocity.cross(r_a)
                - body_b.linear_velocity
                - body_b.angular_velocity.cross(r_b);

            let bias = calc_baumgarte_bias(contact.penetration, config);
            let raw = (-relative.dot(n) + bias) / impulse_k[j];

            // clamp the accumulated impulse, apply only the delta
            let old = impulse[j];
            impulse[j] = (old + raw).max(0.0);
            let delta = impulse[j] - old;
            trace!(contact = j, delta, "impulse delta");

            let impulse_vec = n * delta;
            body_a.predict_velocity(r_a.cross(impulse_vec), impulse_vec);
            body_a.commit_velocity();

            let reaction = -impulse_vec;
            body_b.predict_velocity(r_b.cross(reaction), reaction);
            body_b.commit_velocity();
        }
    }

    debug!(impulses = ?&impulse[..manifold.len()], "manifold resolved");
}
