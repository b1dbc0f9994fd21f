//! `avatar_client`
//!
//! Client-side systems:
//! - Raw key mapping and scripted input replay
//! - Frame clocks (fixed step, wall time)
//! - The owned `App` context and its per-frame run loop

pub mod app;
pub mod clock;
pub mod input;

pub use app::App;
