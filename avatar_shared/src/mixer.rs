//! Animation playback.
//!
//! A headless mixer that owns clips and their playback actions. It tracks
//! time, weight and fades for each action; it does not sample poses, which
//! is the renderer's business.
//!
//! Completion of a play-once action is reported through [`FinishToken`]s:
//! a caller subscribes on one action and gets one token back, and the same
//! token is what it hands back to unsubscribe. `update` reports each live
//! subscription at most once per finish.

use tracing::debug;

/// Index of a clip owned by the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipId(pub u32);

/// Index of a playback action owned by the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(pub u32);

/// Handle for one "finished" subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FinishToken(pub u64);

/// Animation clip metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    /// Length in seconds.
    pub duration: f32,
}

impl Clip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Repeat,
    /// Play once, then stop (or hold the last pose when clamped).
    Once,
}

/// Raised by [`AnimationMixer::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finished {
    pub action: ActionId,
    pub token: FinishToken,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

/// Playback state of one clip.
#[derive(Debug, Clone)]
pub struct Action {
    clip: ClipId,
    duration: f32,
    time: f32,
    time_scale: f32,
    weight: f32,
    fade_factor: f32,
    fade: Option<Fade>,
    enabled: bool,
    running: bool,
    paused: bool,
    loop_mode: LoopMode,
    clamp_when_finished: bool,
    finished: bool,
}

impl Action {
    fn new(clip: ClipId, duration: f32) -> Self {
        Self {
            clip,
            duration,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            fade_factor: 1.0,
            fade: None,
            enabled: true,
            running: false,
            paused: false,
            loop_mode: LoopMode::Repeat,
            clamp_when_finished: false,
            finished: false,
        }
    }

    pub fn clip(&self) -> ClipId {
        self.clip
    }

    pub fn clip_duration(&self) -> f32 {
        self.duration
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Weight after fading; zero while disabled.
    pub fn effective_weight(&self) -> f32 {
        if self.enabled {
            self.weight * self.fade_factor
        } else {
            0.0
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn play(&mut self) {
        self.running = true;
    }

    /// Rewinds to the start and clears finish/pause/fade state.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.enabled = true;
        self.paused = false;
        self.finished = false;
        self.fade = None;
        self.fade_factor = 1.0;
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time.max(0.0);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_effective_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    pub fn set_effective_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    pub fn set_loop(&mut self, mode: LoopMode, clamp_when_finished: bool) {
        self.loop_mode = mode;
        self.clamp_when_finished = clamp_when_finished;
    }

    fn fade_in(&mut self, duration: f32) {
        self.fade_factor = 0.0;
        self.fade = Some(Fade {
            from: 0.0,
            to: 1.0,
            elapsed: 0.0,
            duration,
        });
    }

    fn fade_out(&mut self, duration: f32) {
        self.fade = Some(Fade {
            from: self.fade_factor,
            to: 0.0,
            elapsed: 0.0,
            duration,
        });
    }

    /// Advances the fade; returns true once a fade-out completed.
    fn step_fade(&mut self, dt: f32) -> bool {
        let Some(fade) = self.fade.as_mut() else {
            return false;
        };
        fade.elapsed += dt;
        let k = if fade.duration > 0.0 {
            (fade.elapsed / fade.duration).min(1.0)
        } else {
            1.0
        };
        self.fade_factor = fade.from + (fade.to - fade.from) * k;
        if k < 1.0 {
            return false;
        }
        let faded_out = fade.to <= 0.0;
        self.fade = None;
        faded_out
    }

    /// Advances playback time; returns true on the tick a play-once action ends.
    fn step_time(&mut self, dt: f32) -> bool {
        self.time += dt * self.time_scale;
        match self.loop_mode {
            LoopMode::Repeat => {
                if self.duration > 0.0 {
                    self.time = self.time.rem_euclid(self.duration);
                }
                false
            }
            LoopMode::Once => {
                if self.time < self.duration {
                    return false;
                }
                self.time = self.duration;
                if self.clamp_when_finished {
                    self.paused = true;
                } else {
                    self.enabled = false;
                    self.running = false;
                }
                !std::mem::replace(&mut self.finished, true)
            }
        }
    }
}

/// Owns clips, actions and finish subscriptions.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    clips: Vec<Clip>,
    actions: Vec<Action>,
    subscriptions: Vec<(FinishToken, ActionId)>,
    next_token: u64,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_clip(&mut self, clip: Clip) -> ClipId {
        let id = ClipId(self.clips.len() as u32);
        self.clips.push(clip);
        id
    }

    /// Adds a clip together with its action.
    pub fn add_clip_action(&mut self, clip: Clip) -> (ClipId, ActionId) {
        let duration = clip.duration;
        let clip = self.add_clip(clip);
        let action = ActionId(self.actions.len() as u32);
        self.actions.push(Action::new(clip, duration));
        (clip, action)
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(id.0 as usize)
    }

    /// Returns the action bound to `clip`, creating it on first use.
    pub fn clip_action(&mut self, clip: ClipId) -> Option<ActionId> {
        if let Some(idx) = self.actions.iter().position(|a| a.clip == clip) {
            return Some(ActionId(idx as u32));
        }
        let duration = self.clip(clip)?.duration;
        let id = ActionId(self.actions.len() as u32);
        self.actions.push(Action::new(clip, duration));
        Some(id)
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id.0 as usize)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        self.actions.get_mut(id.0 as usize)
    }

    /// Fades `to` in and `from` out over `duration` seconds.
    pub fn crossfade(&mut self, from: ActionId, to: ActionId, duration: f32) {
        if from == to {
            return;
        }
        if let Some(prev) = self.action_mut(from) {
            prev.fade_out(duration);
        }
        if let Some(next) = self.action_mut(to) {
            next.fade_in(duration);
        }
    }

    pub fn subscribe_finished(&mut self, action: ActionId) -> FinishToken {
        let token = FinishToken(self.next_token);
        self.next_token += 1;
        self.subscriptions.push((token, action));
        token
    }

    /// Returns false if the token was not subscribed.
    pub fn unsubscribe(&mut self, token: FinishToken) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|(t, _)| *t != token);
        self.subscriptions.len() != before
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Advances every running action by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Vec<Finished> {
        let mut finished_actions = Vec::new();
        for (idx, action) in self.actions.iter_mut().enumerate() {
            if !action.running {
                continue;
            }
            if action.step_fade(dt) {
                action.enabled = false;
                action.running = false;
                continue;
            }
            if !action.enabled || action.paused {
                continue;
            }
            if action.step_time(dt) {
                finished_actions.push(ActionId(idx as u32));
            }
        }

        let mut events = Vec::new();
        for action in finished_actions {
            debug!(action = action.0, "action finished");
            events.extend(
                self.subscriptions
                    .iter()
                    .filter(|(_, a)| *a == action)
                    .map(|(token, _)| Finished {
                        action,
                        token: *token,
                    }),
            );
        }
        events
    }
}
