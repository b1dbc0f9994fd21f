//! Input handling.
//!
//! Maps raw keyboard events onto held intents. The layout is fixed (AZERTY
//! movement keys) and not configurable:
//!
//! | Key   | Intent   |
//! |-------|----------|
//! | Z     | forward  |
//! | S     | backward |
//! | Q     | left     |
//! | D     | right    |
//! | Space | jump     |
//! | Shift | run      |
//!
//! Headless runs replay an [`InputScript`] of timed key events instead.

use avatar_shared::input::{InputState, Intent};
use serde::{Deserialize, Serialize};

/// Keys the avatar reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Z,
    S,
    Q,
    D,
    Space,
    Shift,
}

impl Key {
    /// Resolves a DOM-style key code; unmapped codes are ignored.
    pub fn from_code(code: u32) -> Option<Key> {
        match code {
            90 => Some(Key::Z),
            83 => Some(Key::S),
            81 => Some(Key::Q),
            68 => Some(Key::D),
            32 => Some(Key::Space),
            16 => Some(Key::Shift),
            _ => None,
        }
    }

    pub fn intent(self) -> Intent {
        match self {
            Key::Z => Intent::FORWARD,
            Key::S => Intent::BACKWARD,
            Key::Q => Intent::LEFT,
            Key::D => Intent::RIGHT,
            Key::Space => Intent::JUMP,
            Key::Shift => Intent::RUN,
        }
    }
}

/// Key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self { key, pressed: true }
    }

    pub fn up(key: Key) -> Self {
        Self { key, pressed: false }
    }
}

/// Applies a key event to the held intents.
pub fn apply_key_event(input: &mut InputState, event: KeyEvent) {
    input.set(event.key.intent(), event.pressed);
}

/// Applies a raw key code; returns false when the code is not mapped.
pub fn apply_key_code(input: &mut InputState, code: u32, pressed: bool) -> bool {
    match Key::from_code(code) {
        Some(key) => {
            apply_key_event(input, KeyEvent { key, pressed });
            true
        }
        None => false,
    }
}

/// A key event scheduled on a frame; frame 0 is the first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedKey {
    pub frame: u64,
    #[serde(flatten)]
    pub event: KeyEvent,
}

/// Timed key events replayed by headless runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputScript {
    events: Vec<ScriptedKey>,
}

impl InputScript {
    pub fn new(mut events: Vec<ScriptedKey>) -> Self {
        events.sort_by_key(|e| e.frame);
        Self { events }
    }

    /// Parses `[{ "frame": 10, "key": "Z", "pressed": true }, ...]`.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        let events: Vec<ScriptedKey> = serde_json::from_str(s)?;
        Ok(Self::new(events))
    }

    /// Walk, sprint, stop, jump, then turn in place.
    pub fn demo() -> Self {
        let at = |frame, event| ScriptedKey { frame, event };
        Self::new(vec![
            at(10, KeyEvent::down(Key::Z)),
            at(70, KeyEvent::down(Key::Shift)),
            at(150, KeyEvent::up(Key::Shift)),
            at(200, KeyEvent::up(Key::Z)),
            at(260, KeyEvent::down(Key::Space)),
            at(264, KeyEvent::up(Key::Space)),
            at(360, KeyEvent::down(Key::Q)),
            at(420, KeyEvent::up(Key::Q)),
        ])
    }

    /// Events scheduled for `frame`, in script order.
    pub fn events_at(&self, frame: u64) -> impl Iterator<Item = KeyEvent> + '_ {
        self.events
            .iter()
            .filter(move |e| e.frame == frame)
            .map(|e| e.event)
    }

    pub fn last_frame(&self) -> Option<u64> {
        self.events.last().map(|e| e.frame)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
