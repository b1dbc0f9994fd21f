//! Frame clocks.
//!
//! A clock hands the run loop the elapsed time since the previous frame,
//! in seconds.

use std::time::Instant;

pub trait FrameClock {
    fn tick(&mut self) -> f32;
}

/// Constant step; deterministic headless runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    dt: f32,
}

impl FixedClock {
    pub fn new(dt: f32) -> Self {
        Self { dt: dt.max(0.0) }
    }

    pub fn from_hz(hz: u32) -> Self {
        Self::new(1.0 / hz.max(1) as f32)
    }
}

impl FrameClock for FixedClock {
    fn tick(&mut self) -> f32 {
        self.dt
    }
}

/// Wall time between calls. The first frame reports zero.
#[derive(Debug, Default)]
pub struct WallClock {
    last: Option<Instant>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameClock for WallClock {
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self
            .last
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last = Some(now);
        dt
    }
}
