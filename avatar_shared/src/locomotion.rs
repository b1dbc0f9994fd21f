//! Locomotion integrator.
//!
//! Turns held intents and frame time into velocity, position and facing.
//! Forward/backward accelerate along the facing; left/right yaw the facing
//! directly. Position is clamped to the square arena after every step.

use std::f32::consts::PI;

use crate::{
    config::LocomotionConfig,
    fsm::StateName,
    input::InputState,
    math::{Quat, Vec3},
};

/// Result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    /// Per-axis speed: x lateral, y vertical, z forward.
    pub velocity: Vec3,
    pub position: Vec3,
    pub orientation: Quat,
}

/// Clamps the horizontal components into `[-half, half]`.
pub fn clamp_to_arena(p: Vec3, half: f32) -> Vec3 {
    Vec3::new(p.x.clamp(-half, half), p.y, p.z.clamp(-half, half))
}

/// Limits a damping delta so it can bring `v` to zero but not past it.
fn no_overshoot(delta: f32, v: f32) -> f32 {
    delta.signum() * delta.abs().min(v.abs())
}

#[derive(Debug, Clone)]
pub struct LocomotionIntegrator {
    cfg: LocomotionConfig,
    velocity: Vec3,
    position: Vec3,
    orientation: Quat,
}

impl LocomotionIntegrator {
    pub fn new(cfg: LocomotionConfig) -> Self {
        Self {
            cfg,
            velocity: Vec3::ZERO,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn snapshot(&self) -> Kinematics {
        Kinematics {
            velocity: self.velocity,
            position: self.position,
            orientation: self.orientation,
        }
    }

    /// Moves the avatar; out-of-arena targets are clamped.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = clamp_to_arena(position, self.cfg.arena_half_extent);
    }

    /// Acceleration for this tick. `mode` is the state active at tick start.
    pub fn acceleration(&self, input: &InputState, mode: StateName) -> Vec3 {
        if mode == StateName::Jump {
            return Vec3::ZERO;
        }
        if input.run() {
            self.cfg.acceleration * self.cfg.run_multiplier
        } else {
            self.cfg.acceleration
        }
    }

    pub fn advance(&mut self, dt: f32, input: &InputState, mode: StateName) -> Kinematics {
        let dt = dt.max(0.0);

        let v = self.velocity;
        let damp = v.mul_elem(self.cfg.deceleration) * dt;
        self.velocity += Vec3::new(
            no_overshoot(damp.x, v.x),
            no_overshoot(damp.y, v.y),
            no_overshoot(damp.z, v.z),
        );

        let acc = self.acceleration(input, mode);
        if input.forward() {
            self.velocity.z += acc.z * dt;
        }
        if input.backward() {
            self.velocity.z -= acc.z * dt;
        }

        // Yaw rate comes from the base tuning, unaffected by run or jump.
        let yaw_step = 4.0 * PI * dt * self.cfg.acceleration.y;
        if input.left() {
            self.orientation = self.orientation * Quat::from_axis_angle(Vec3::Y, yaw_step);
        }
        if input.right() {
            self.orientation = self.orientation * Quat::from_axis_angle(Vec3::Y, -yaw_step);
        }
        self.orientation = self.orientation.normalize();

        let forward = self.orientation.rotate(Vec3::Z).normalize_or_zero();
        let lateral = self.orientation.rotate(Vec3::X).normalize_or_zero();
        let moved = self.position + forward * (self.velocity.z * dt) + lateral * (self.velocity.x * dt);
        self.position = clamp_to_arena(moved, self.cfg.arena_half_extent);

        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Intent;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const DT: f32 = 1.0 / 60.0;

    fn integrator() -> LocomotionIntegrator {
        LocomotionIntegrator::new(LocomotionConfig::default())
    }

    #[test]
    fn forward_accelerates_along_facing() {
        let mut loco = integrator();
        let k = loco.advance(DT, &InputState::with(Intent::FORWARD), StateName::Walk);
        assert!((k.velocity.z - 100.0 * DT).abs() < 1e-4);
        assert!((k.position.z - 100.0 * DT * DT).abs() < 1e-5);
        assert_eq!(k.position.x, 0.0);
    }

    #[test]
    fn run_doubles_and_jump_zeroes_acceleration() {
        let input = InputState::with(Intent::FORWARD | Intent::RUN);
        let loco = integrator();
        assert_eq!(loco.acceleration(&input, StateName::Run).z, 200.0);
        assert_eq!(loco.acceleration(&input, StateName::Jump), Vec3::ZERO);

        let mut loco = integrator();
        for held in [Intent::FORWARD, Intent::BACKWARD, Intent::LEFT | Intent::FORWARD | Intent::RUN] {
            let k = loco.advance(DT, &InputState::with(held), StateName::Jump);
            assert_eq!(k.velocity.z, 0.0);
        }
    }

    #[test]
    fn backward_reverses_direction() {
        let mut loco = integrator();
        for _ in 0..10 {
            loco.advance(DT, &InputState::with(Intent::BACKWARD), StateName::Walk);
        }
        assert!(loco.velocity().z < 0.0);
        assert!(loco.position().z < 0.0);
    }

    #[test]
    fn left_yaws_counter_clockwise_seen_from_above() {
        let mut loco = integrator();
        loco.advance(0.5, &InputState::with(Intent::LEFT), StateName::Idle);
        // 4π * 0.5 * 0.25 = π/2: facing +Z turns to +X.
        let facing = loco.orientation().rotate(Vec3::Z);
        assert!(facing.abs_diff_eq(Vec3::X, 1e-5), "{facing:?}");
        assert_eq!(loco.velocity(), Vec3::ZERO);

        loco.advance(0.5, &InputState::with(Intent::RIGHT), StateName::Idle);
        assert!(loco.orientation().rotate(Vec3::Z).abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn damping_decays_without_reversing() {
        let mut loco = integrator();
        for _ in 0..30 {
            loco.advance(DT, &InputState::with(Intent::FORWARD | Intent::RUN), StateName::Run);
        }
        let mut prev = loco.velocity().z;
        assert!(prev > 0.0);
        for _ in 0..600 {
            let v = loco.advance(DT, &InputState::new(), StateName::Idle).velocity.z;
            assert!(v >= 0.0 && v <= prev);
            prev = v;
        }
        assert!(prev < 1e-3, "{prev}");
    }

    #[test]
    fn huge_frame_damps_to_zero_not_past_it() {
        let mut loco = integrator();
        for _ in 0..10 {
            loco.advance(DT, &InputState::with(Intent::FORWARD), StateName::Walk);
        }
        let k = loco.advance(10.0, &InputState::new(), StateName::Idle);
        assert_eq!(k.velocity.z, 0.0);
    }

    #[test]
    fn position_stays_in_arena_for_random_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut loco = integrator();
        for _ in 0..20_000 {
            let held = Intent::from_bits_truncate(rng.gen::<u8>());
            let dt = rng.gen_range(0.0..0.25f32);
            let mode = StateName::ALL[rng.gen_range(0..4)];
            let p = loco.advance(dt, &InputState::with(held), mode).position;
            assert!((-250.0..=250.0).contains(&p.x), "{p:?}");
            assert!((-250.0..=250.0).contains(&p.z), "{p:?}");
        }
    }

    #[test]
    fn teleport_clamps_silently() {
        let mut loco = integrator();
        loco.teleport(Vec3::new(900.0, 3.0, -1000.0));
        assert_eq!(loco.position(), Vec3::new(250.0, 3.0, -250.0));
    }
}
