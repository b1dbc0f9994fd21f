//! Configuration system.
//!
//! Loads avatar tuning from JSON strings (file IO left to app). Every field
//! has a default, so an empty object `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Highest accepted display frame rate.
pub const MAX_FRAME_HZ: u32 = 1000;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub locomotion: LocomotionConfig,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    /// Display frame rate used by the fixed-step clock and the paced loop.
    pub frame_hz: u32,
    /// Clip set delivered by the asset feed.
    pub clips: Vec<ClipSpec>,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            locomotion: LocomotionConfig::default(),
            camera: CameraConfig::default(),
            animation: AnimationConfig::default(),
            frame_hz: 60,
            clips: default_clips(),
        }
    }
}

impl AvatarConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Rejects settings the run loop cannot honour.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=MAX_FRAME_HZ).contains(&self.frame_hz),
            "frame_hz must be within 1..={MAX_FRAME_HZ}, got {}",
            self.frame_hz
        );
        Ok(())
    }

    /// Frame duration in seconds implied by `frame_hz`.
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_hz.max(1) as f32
    }
}

/// Locomotion tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Per-axis damping rates (lateral, vertical, forward); negative values damp.
    pub deceleration: Vec3,
    /// Per-axis acceleration; `y` doubles as the yaw rate.
    pub acceleration: Vec3,
    /// Acceleration multiplier while the run modifier is held.
    pub run_multiplier: f32,
    /// Half extent of the square arena on X and Z.
    pub arena_half_extent: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            deceleration: Vec3::new(-0.0005, -0.0001, -5.0),
            acceleration: Vec3::new(1.0, 0.25, 100.0),
            run_multiplier: 2.0,
            arena_half_extent: 250.0,
        }
    }
}

/// Third-person camera tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera position in avatar-local space.
    pub offset: Vec3,
    /// Aim point in avatar-local space.
    pub look_at: Vec3,
    /// Fraction of the remaining distance left after one second.
    pub smoothing_base: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(-15.0, 20.0, -30.0),
            look_at: Vec3::new(0.0, 10.0, 50.0),
            smoothing_base: 0.001,
        }
    }
}

/// Crossfade durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Any transition into or out of Jump.
    pub jump_blend: f32,
    /// Transitions among Idle, Walk and Run.
    pub locomotion_blend: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            jump_blend: 0.2,
            locomotion_blend: 0.5,
        }
    }
}

/// A named clip and when the asset feed delivers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSpec {
    pub name: String,
    /// Clip length in seconds.
    pub duration: f32,
    /// Frames to wait before the clip "finishes loading".
    #[serde(default)]
    pub delay_frames: u32,
}

fn default_clips() -> Vec<ClipSpec> {
    [("idle", 2.0, 1), ("walk", 1.0, 2), ("run", 0.7, 3), ("jump", 1.1, 4)]
        .into_iter()
        .map(|(name, duration, delay_frames)| ClipSpec {
            name: name.to_string(),
            duration,
            delay_frames,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = AvatarConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, AvatarConfig::default());
        assert_eq!(cfg.locomotion.arena_half_extent, 250.0);
        assert_eq!(cfg.clips.len(), 4);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = AvatarConfig::from_json_str(
            r#"{ "frame_hz": 30, "camera": { "smoothing_base": 0.01 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.frame_hz, 30);
        assert_eq!(cfg.camera.smoothing_base, 0.01);
        assert_eq!(cfg.camera.offset, Vec3::new(-15.0, 20.0, -30.0));
        assert!((cfg.frame_dt() - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn frame_rate_must_be_positive_and_bounded() {
        assert!(AvatarConfig::default().validate().is_ok());
        for frame_hz in [0, MAX_FRAME_HZ + 1, u32::MAX] {
            let cfg = AvatarConfig {
                frame_hz,
                ..AvatarConfig::default()
            };
            assert!(cfg.validate().is_err(), "{frame_hz} accepted");
        }
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(AvatarConfig::from_json_str("{ frame_hz: }").is_err());
    }
}
