//! Rigid body state and integration.
//!
//! Velocity updates run through a predict/commit pair so the impulse solver
//! can recompute a body's velocity mid-iteration and have later contacts see
//! the new state: [`RigidBody::predict_velocity`] fills the predicted fields
//! from an applied force/torque, [`RigidBody::commit_velocity`] promotes them
//! to the current velocities. Angular state is carried as angular momentum
//! (`L' = L + tau`, `omega = I_world^-1 * L'`).

use glam::{Mat3, Quat, Vec3};

use crate::hull::{HullDescriptor, WorldHull};

/// Whether a body integrates and receives impulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    /// Infinite mass. Never integrates, never receives impulses; the ground
    /// plane is one of these.
    Static,
}

/// Inverse inertia tensor of a solid box in body space, diagonal.
pub fn box_inverse_inertia(mass: f32, half_extents: Vec3) -> Mat3 {
    let d = half_extents * 2.0;
    let term = mass / 12.0;
    Mat3::from_diagonal(Vec3::new(
        1.0 / (term * (d.y * d.y + d.z * d.z)),
        1.0 / (term * (d.x * d.x + d.z * d.z)),
        1.0 / (term * (d.x * d.x + d.y * d.y)),
    ))
}

/// A simulated body owning its world-space hull.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub mass: f32,
    pub inverse_inertia_local: Mat3,
    pub position: Vec3,
    pub orientation: Quat,
    orientation_matrix: Mat3,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub angular_momentum: Vec3,
    predicted_linear_velocity: Vec3,
    predicted_angular_velocity: Vec3,
    predicted_angular_momentum: Vec3,
    /// External force applied next step, cleared after integration.
    pub force_accumulator: Vec3,
    /// External torque applied next step, cleared after integration.
    pub torque_accumulator: Vec3,
    base: HullDescriptor,
    hull: WorldHull,
}

impl RigidBody {
    pub fn new_dynamic(
        base: &HullDescriptor,
        position: Vec3,
        mass: f32,
        inverse_inertia_local: Mat3,
    ) -> Self {
        let mut body = Self {
            body_type: BodyType::Dynamic,
            mass,
            inverse_inertia_local,
            position,
            orientation: Quat::IDENTITY,
            orientation_matrix: Mat3::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            angular_momentum: Vec3::ZERO,
            predicted_linear_velocity: Vec3::ZERO,
            predicted_angular_velocity: Vec3::ZERO,
            predicted_angular_momentum: Vec3::ZERO,
            force_accumulator: Vec3::ZERO,
            torque_accumulator: Vec3::ZERO,
            base: base.clone(),
            hull: WorldHull::new(base),
        };
        body.refresh_hull();
        body
    }

    pub fn new_static(base: &HullDescriptor, position: Vec3) -> Self {
        let mut body = Self::new_dynamic(base, position, f32::INFINITY, Mat3::ZERO);
        body.body_type = BodyType::Static;
        body
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    /// Orientation as a rotation matrix, kept in sync with the quaternion.
    #[inline]
    pub fn orientation_matrix(&self) -> Mat3 {
        self.orientation_matrix
    }

    #[inline]
    pub fn hull(&self) -> &WorldHull {
        &self.hull
    }

    /// Inverse inertia in world space: `R * I0^-1 * R^T`.
    #[inline]
    pub fn inverse_inertia_world(&self) -> Mat3 {
        self.orientation_matrix * self.inverse_inertia_local * self.orientation_matrix.transpose()
    }

    /// Queue an external force for the next step.
    pub fn apply_force(&mut self, force: Vec3) {
        self.force_accumulator += force;
    }

    /// Queue an external torque for the next step.
    pub fn apply_torque(&mut self, torque: Vec3) {
        self.torque_accumulator += torque;
    }

    pub fn clear_accumulators(&mut self) {
        self.force_accumulator = Vec3::ZERO;
        self.torque_accumulator = Vec3::ZERO;
    }

    /// Compute predicted velocities from an applied torque and force:
    /// `L' = L + tau`, `omega' = I_world^-1 * L'`, `v' = v + f/m`.
    pub fn predict_velocity(&mut self, torque: Vec3, force: Vec3) {
        if self.is_static() {
            return;
        }
        self.predicted_angular_momentum = self.angular_momentum + torque;
        self.predicted_angular_velocity =
            self.inverse_inertia_world() * self.predicted_angular_momentum;
        self.predicted_linear_velocity = self.linear_velocity + force / self.mass;
    }

    /// Promote predicted velocities to the current ones.
    pub fn commit_velocity(&mut self) {
        self.linear_velocity = self.predicted_linear_velocity;
        self.angular_velocity = self.predicted_angular_velocity;
        self.angular_momentum = self.predicted_angular_momentum;
    }

    /// Advance position and orientation from the predicted velocities, then
    /// re-sync the orientation matrix. Velocities are per-step quantities;
    /// `dt` only scales the quaternion derivative.
    pub fn integrate_pose(&mut self, dt: f32) {
        if self.is_static() {
            return;
        }
        self.commit_velocity();

        self.position += self.predicted_linear_velocity;

        // q' = normalize(q + 0.5 * dt * omega_quat * q)
        let omega = self.predicted_angular_velocity;
        if omega.length_squared() > 1e-10 {
            let omega_quat = Quat::from_xyzw(omega.x, omega.y, omega.z, 0.0);
            let q_dot = omega_quat * self.orientation * 0.5;
            self.orientation = Quat::from_xyzw(
                self.orientation.x + q_dot.x * dt,
                self.orientation.y + q_dot.y * dt,
                self.orientation.z + q_dot.z * dt,
                self.orientation.w + q_dot.w * dt,
            )
            .normalize();
        }
        self.orientation_matrix = Mat3::from_quat(self.orientation);
    }

    /// Place the body at a pose directly, re-syncing the orientation matrix
    /// and the world hull. For setup and teleports, not integration.
    pub fn set_pose(&mut self, position: Vec3, orientation: Quat) {
        self.position = position;
        self.orientation = orientation;
        self.orientation_matrix = Mat3::from_quat(orientation);
        self.refresh_hull();
    }

    /// Rewrite the owned world hull from the base topology and current pose.
    /// Must run once per step before any separating-axis query.
    pub fn refresh_hull(&mut self) {
        self.hull
            .refresh(&self.base, self.position, self.orientation_matrix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hull::box_vertices;

    fn unit_box_body(position: Vec3) -> RigidBody {
        let base = HullDescriptor::box_hull(&box_vertices(Vec3::splat(0.5))).unwrap();
        RigidBody::new_dynamic(&base, position, 1.0, box_inverse_inertia(1.0, Vec3::splat(0.5)))
    }

    #[test]
    fn test_unit_box_inverse_inertia() {
        // I = (1/12) * m * (1 + 1) = 1/6 about every axis
        let inv = box_inverse_inertia(1.0, Vec3::splat(0.5));
        let eps = 1e-5;
        assert!((inv.x_axis.x - 6.0).abs() < eps);
        assert!((inv.y_axis.y - 6.0).abs() < eps);
        assert!((inv.z_axis.z - 6.0).abs() < eps);
    }

    #[test]
    fn test_force_accumulates_into_velocity() {
        let mut body = unit_box_body(Vec3::new(0.0, 5.0, 0.0));
        for _ in 0..10 {
            body.predict_velocity(Vec3::ZERO, Vec3::new(0.0, -0.001, 0.0));
            body.integrate_pose(1.0 / 60.0);
        }
        // velocity is per-step: after 10 steps v = -0.01, y dropped by sum 1..=10
        assert!((body.linear_velocity.y + 0.01).abs() < 1e-6);
        assert!(body.position.y < 5.0);
    }

    #[test]
    fn test_static_body_never_moves() {
        let base = HullDescriptor::box_hull(&box_vertices(Vec3::splat(0.5))).unwrap();
        let mut body = RigidBody::new_static(&base, Vec3::ZERO);
        body.predict_velocity(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        body.integrate_pose(1.0 / 60.0);
        assert_eq!(body.position, Vec3::ZERO);
        assert_eq!(body.linear_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_torque_spins_through_angular_momentum() {
        let mut body = unit_box_body(Vec3::ZERO);
        body.predict_velocity(Vec3::new(0.0, 0.01, 0.0), Vec3::ZERO);
        body.integrate_pose(1.0 / 60.0);

        assert!((body.angular_momentum.y - 0.01).abs() < 1e-6);
        // omega = I^-1 * L = 6 * 0.01
        assert!((body.angular_velocity.y - 0.06).abs() < 1e-5);
        assert!(body.orientation != Quat::IDENTITY);
        // matrix cache stays in sync
        let eps = 1e-5;
        let diff = body.orientation_matrix() - Mat3::from_quat(body.orientation);
        assert!(diff.x_axis.length() < eps && diff.y_axis.length() < eps);
    }

    #[test]
    fn test_hull_refresh_follows_pose() {
        let mut body = unit_box_body(Vec3::ZERO);
        body.position = Vec3::new(0.0, 3.0, 0.0);
        body.refresh_hull();
        // vertex 0 = (0.5, -0.5, -0.5) translated up
        assert!((body.hull().position(0) - Vec3::new(0.5, 2.5, -0.5)).length() < 1e-6);
    }
}
