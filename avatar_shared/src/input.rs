//! Held-key intents.
//!
//! Input is a pure level signal: a press sets the intent, a release clears
//! it. There is no debouncing or repeat suppression. Mapping raw keys onto
//! intents is the client's job.

bitflags::bitflags! {
    /// Movement intents.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Intent: u8 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const JUMP = 1 << 4;
        const RUN = 1 << 5;
    }
}

/// Current held intents, sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    held: Intent,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input with exactly `held` set.
    pub fn with(held: Intent) -> Self {
        Self { held }
    }

    pub fn press(&mut self, intent: Intent) {
        self.held.insert(intent);
    }

    pub fn release(&mut self, intent: Intent) {
        self.held.remove(intent);
    }

    pub fn set(&mut self, intent: Intent, pressed: bool) {
        self.held.set(intent, pressed);
    }

    pub fn held(&self) -> Intent {
        self.held
    }

    pub fn forward(&self) -> bool {
        self.held.contains(Intent::FORWARD)
    }

    pub fn backward(&self) -> bool {
        self.held.contains(Intent::BACKWARD)
    }

    pub fn left(&self) -> bool {
        self.held.contains(Intent::LEFT)
    }

    pub fn right(&self) -> bool {
        self.held.contains(Intent::RIGHT)
    }

    pub fn jump(&self) -> bool {
        self.held.contains(Intent::JUMP)
    }

    pub fn run(&self) -> bool {
        self.held.contains(Intent::RUN)
    }

    /// Forward or backward held.
    pub fn moving(&self) -> bool {
        self.held.intersects(Intent::FORWARD | Intent::BACKWARD)
    }
}
