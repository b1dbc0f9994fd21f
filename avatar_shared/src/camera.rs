//! Third-person camera follow.
//!
//! Each tick the ideal camera position and aim point are rebuilt from the
//! avatar pose, then approached with `t = 1 - base^dt`. The approach is
//! framerate independent and a large `dt` snaps onto the target instead of
//! overshooting.

use crate::{
    config::CameraConfig,
    math::{Quat, Vec3},
};

/// Camera position and aim point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

#[derive(Debug, Clone)]
pub struct CameraFollowController {
    cfg: CameraConfig,
    current: CameraPose,
}

impl CameraFollowController {
    /// Starts at the origin, looking at the origin.
    pub fn new(cfg: CameraConfig) -> Self {
        Self {
            cfg,
            current: CameraPose::default(),
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.current
    }

    /// Target pose for the given avatar placement, before smoothing.
    pub fn ideal(&self, avatar_position: Vec3, avatar_orientation: Quat) -> CameraPose {
        CameraPose {
            position: avatar_orientation.rotate(self.cfg.offset) + avatar_position,
            look_at: avatar_orientation.rotate(self.cfg.look_at) + avatar_position,
        }
    }

    /// Interpolation factor for a frame of `dt` seconds.
    pub fn smoothing(&self, dt: f32) -> f32 {
        (1.0 - self.cfg.smoothing_base.powf(dt.max(0.0))).clamp(0.0, 1.0)
    }

    pub fn advance(&mut self, dt: f32, avatar_position: Vec3, avatar_orientation: Quat) -> CameraPose {
        let ideal = self.ideal(avatar_position, avatar_orientation);
        let t = self.smoothing(dt);
        self.current = CameraPose {
            position: self.current.position.lerp(ideal.position, t),
            look_at: self.current.look_at.lerp(ideal.look_at, t),
        };
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn controller() -> CameraFollowController {
        CameraFollowController::new(CameraConfig::default())
    }

    #[test]
    fn ideal_offset_sits_behind_and_above() {
        let cam = controller();
        let ideal = cam.ideal(Vec3::new(10.0, 0.0, 5.0), Quat::IDENTITY);
        assert_eq!(ideal.position, Vec3::new(-5.0, 20.0, -25.0));
        assert_eq!(ideal.look_at, Vec3::new(10.0, 10.0, 55.0));
    }

    #[test]
    fn ideal_follows_avatar_facing() {
        let cam = controller();
        let turned = Quat::from_axis_angle(Vec3::Y, PI);
        let ideal = cam.ideal(Vec3::ZERO, turned);
        assert!(ideal.position.abs_diff_eq(Vec3::new(15.0, 20.0, 30.0), 1e-4));
        assert!(ideal.look_at.abs_diff_eq(Vec3::new(0.0, 10.0, -50.0), 1e-4));
    }

    #[test]
    fn large_dt_snaps_to_target() {
        let mut cam = controller();
        let pos = Vec3::new(200.0, 0.0, -200.0);
        let pose = cam.advance(100.0, pos, Quat::IDENTITY);
        let ideal = cam.ideal(pos, Quat::IDENTITY);
        assert!(pose.position.abs_diff_eq(ideal.position, 1e-3));
        assert!(pose.look_at.abs_diff_eq(ideal.look_at, 1e-3));
    }

    #[test]
    fn small_steps_approach_monotonically() {
        let mut cam = controller();
        let target = cam.ideal(Vec3::ZERO, Quat::IDENTITY).position;
        let mut prev = cam.pose().position.distance(target);
        for _ in 0..240 {
            let d = cam.advance(1.0 / 60.0, Vec3::ZERO, Quat::IDENTITY).position.distance(target);
            assert!(d <= prev);
            prev = d;
        }
        assert!(prev < 1e-2, "{prev}");
    }

    #[test]
    fn smoothing_is_framerate_independent() {
        let cam = controller();
        let one = cam.smoothing(0.1);
        let two = cam.smoothing(0.05);
        // Two half steps leave the same remainder as one full step.
        assert!(((1.0 - two) * (1.0 - two) - (1.0 - one)).abs() < 1e-6);
        assert_eq!(cam.smoothing(0.0), 0.0);
    }
}
