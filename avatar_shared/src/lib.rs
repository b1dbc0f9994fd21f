//! `avatar_shared`
//!
//! Core of a third-person avatar: held-key intents, locomotion, the
//! Idle/Walk/Run/Jump animation state machine and the follow camera.
//!
//! Design goals:
//! - Deterministic, single-threaded, one tick per display frame.
//! - Renderer and asset IO stay behind small collaborator types
//!   (`scene`, `assets`, `mixer`).
//! - No `unsafe`.

pub mod assets;
pub mod camera;
pub mod character;
pub mod config;
pub mod event;
pub mod fsm;
pub mod input;
pub mod locomotion;
pub mod math;
pub mod mixer;
pub mod registry;
pub mod scene;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::camera::{CameraFollowController, CameraPose};
    pub use crate::character::Character;
    pub use crate::config::*;
    pub use crate::event::*;
    pub use crate::fsm::{StateName, Transition};
    pub use crate::input::{InputState, Intent};
    pub use crate::locomotion::Kinematics;
    pub use crate::math::*;
    pub use crate::scene::{HeadlessScene, SceneBackend};
}
