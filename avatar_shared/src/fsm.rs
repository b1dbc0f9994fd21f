//! Animation state machine.
//!
//! Four mutually exclusive modes: Idle, Walk, Run and Jump. Each state decides
//! its own outgoing transition from the sampled input; the machine applies it,
//! runs `exit` on the old state and `enter` on the new one, and drives the
//! crossfade in the mixer.
//!
//! Jump is one-shot: it subscribes to its action's finish signal on entry and
//! only leaves through [`StateMachine::handle_finished`] with that same token.

use std::{fmt, str::FromStr};

use tracing::{debug, warn};

use crate::{
    config::AnimationConfig,
    input::InputState,
    mixer::{ActionId, AnimationMixer, FinishToken, LoopMode},
    registry::{AnimationRegistry, RegistryError},
};

/// State identifiers; also the animation names the registry is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateName {
    Idle,
    Walk,
    Run,
    Jump,
}

impl StateName {
    pub const ALL: [StateName; 4] = [
        StateName::Idle,
        StateName::Walk,
        StateName::Run,
        StateName::Jump,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StateName::Idle => "idle",
            StateName::Walk => "walk",
            StateName::Run => "run",
            StateName::Jump => "jump",
        }
    }

    fn instantiate(self) -> State {
        match self {
            StateName::Idle => State::Idle,
            StateName::Walk => State::Walk,
            StateName::Run => State::Run,
            StateName::Jump => State::Jump { finish: None },
        }
    }

    /// The gait whose footfall phase carries over on entry.
    fn footfall_sibling(self) -> Option<StateName> {
        match self {
            StateName::Walk => Some(StateName::Run),
            StateName::Run => Some(StateName::Walk),
            _ => None,
        }
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateName {
    type Err = StateNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StateName::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| StateNameError(s.to_string()))
    }
}

/// Requested state is not one of the four known states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateNameError(pub String);

impl fmt::Display for StateNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown state '{}'", self.0)
    }
}

impl std::error::Error for StateNameError {}

/// Crossfade length for a transition.
pub fn blend_duration(cfg: &AnimationConfig, from: StateName, to: StateName) -> f32 {
    if from == StateName::Jump || to == StateName::Jump {
        cfg.jump_blend
    } else {
        cfg.locomotion_blend
    }
}

/// What the state machine needs from its owner for one call.
pub struct StateContext<'a> {
    pub registry: &'a AnimationRegistry,
    pub mixer: &'a mut AnimationMixer,
    pub blend: &'a AnimationConfig,
}

/// A completed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<StateName>,
    pub to: StateName,
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Idle,
    Walk,
    Run,
    Jump { finish: Option<FinishToken> },
}

impl State {
    fn name(&self) -> StateName {
        match self {
            State::Idle => StateName::Idle,
            State::Walk => StateName::Walk,
            State::Run => StateName::Run,
            State::Jump { .. } => StateName::Jump,
        }
    }

    fn enter(&mut self, prev: Option<(StateName, ActionId)>, action: ActionId, ctx: &mut StateContext<'_>) {
        let name = self.name();
        if let State::Jump { finish } = self {
            *finish = Some(ctx.mixer.subscribe_finished(action));
            if let Some(a) = ctx.mixer.action_mut(action) {
                a.reset();
                a.set_loop(LoopMode::Once, true);
            }
        }

        let Some((prev_name, prev_action)) = prev else {
            if let Some(a) = ctx.mixer.action_mut(action) {
                a.play();
            }
            return;
        };

        let prev_time = ctx.mixer.action(prev_action).map(|a| (a.time(), a.clip_duration()));
        if let Some(a) = ctx.mixer.action_mut(action) {
            match (name, prev_time) {
                (_, Some((time, prev_duration)))
                    if name.footfall_sibling() == Some(prev_name) && prev_duration > 0.0 =>
                {
                    a.set_enabled(true);
                    a.set_time(time * (a.clip_duration() / prev_duration));
                }
                _ => {
                    a.set_enabled(true);
                    a.set_time(0.0);
                    a.set_effective_time_scale(1.0);
                    a.set_effective_weight(1.0);
                }
            }
        }

        let duration = blend_duration(ctx.blend, prev_name, name);
        ctx.mixer.crossfade(prev_action, action, duration);
        if let Some(a) = ctx.mixer.action_mut(action) {
            a.play();
        }
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        if let State::Jump { finish } = self {
            if let Some(token) = finish.take() {
                ctx.mixer.unsubscribe(token);
            }
        }
    }

    fn update(&mut self, _dt: f32, input: &InputState) -> Option<StateName> {
        match self {
            State::Idle => {
                if input.moving() {
                    Some(StateName::Walk)
                } else if input.jump() {
                    Some(StateName::Jump)
                } else {
                    None
                }
            }
            State::Walk => match (input.moving(), input.run()) {
                (true, true) => Some(StateName::Run),
                (true, false) => None,
                (false, _) => Some(StateName::Idle),
            },
            State::Run => match (input.moving(), input.run()) {
                (true, false) => Some(StateName::Walk),
                (true, true) => None,
                (false, _) => Some(StateName::Idle),
            },
            State::Jump { .. } => None,
        }
    }
}

/// Holds exactly one active state once initialized.
#[derive(Debug, Default)]
pub struct StateMachine {
    current: Option<State>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> Option<StateName> {
        self.current.as_ref().map(State::name)
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    /// Token the active Jump state is waiting on.
    pub fn pending_finish(&self) -> Option<FinishToken> {
        match self.current {
            Some(State::Jump { finish }) => finish,
            _ => None,
        }
    }

    /// Switches to `name`. Re-selecting the active state is a no-op and
    /// returns `Ok(None)`. The first activation requires a complete registry.
    pub fn set_state(
        &mut self,
        name: StateName,
        ctx: &mut StateContext<'_>,
    ) -> Result<Option<Transition>, RegistryError> {
        let prev_name = self.current_state();
        if prev_name == Some(name) {
            return Ok(None);
        }
        if prev_name.is_none() {
            if let Some(missing) = ctx.registry.missing().first() {
                return Err(RegistryError::Missing(*missing));
            }
        }

        let action = ctx.registry.entry(name)?.action;
        let prev = prev_name
            .map(|p| ctx.registry.entry(p).map(|e| (p, e.action)))
            .transpose()?;

        if let Some(old) = self.current.as_mut() {
            old.exit(ctx);
        }
        let mut next = name.instantiate();
        next.enter(prev, action, ctx);
        self.current = Some(next);

        debug!(from = ?prev_name, to = %name, "State transition");
        Ok(Some(Transition {
            from: prev_name,
            to: name,
        }))
    }

    /// Like [`set_state`](Self::set_state), resolving the name first.
    pub fn set_state_by_name(
        &mut self,
        name: &str,
        ctx: &mut StateContext<'_>,
    ) -> anyhow::Result<Option<Transition>> {
        let name: StateName = name.parse()?;
        Ok(self.set_state(name, ctx)?)
    }

    /// Lets the active state evaluate its transitions.
    pub fn update(&mut self, dt: f32, input: &InputState, ctx: &mut StateContext<'_>) -> Option<Transition> {
        let next = self.current.as_mut()?.update(dt, input)?;
        self.apply(next, ctx)
    }

    /// Completion signal from the mixer. Only the token held by the active
    /// Jump state moves the machine (back to Idle); anything else is ignored.
    pub fn handle_finished(&mut self, token: FinishToken, ctx: &mut StateContext<'_>) -> Option<Transition> {
        if self.pending_finish() != Some(token) {
            warn!(token = token.0, state = ?self.current_state(), "Ignoring stale completion signal");
            return None;
        }
        self.apply(StateName::Idle, ctx)
    }

    /// Internal transition; a failure leaves the active state in place.
    fn apply(&mut self, next: StateName, ctx: &mut StateContext<'_>) -> Option<Transition> {
        match self.set_state(next, ctx) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, from = ?self.current_state(), to = %next, "Transition failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        input::Intent,
        mixer::Clip,
        registry::AnimationEntry,
    };

    struct Rig {
        registry: AnimationRegistry,
        mixer: AnimationMixer,
        blend: AnimationConfig,
        fsm: StateMachine,
    }

    impl Rig {
        fn new() -> Self {
            let mut mixer = AnimationMixer::new();
            let mut registry = AnimationRegistry::new();
            for (name, duration) in [("idle", 2.0), ("walk", 1.0), ("run", 0.5), ("jump", 0.8)] {
                let clip = mixer.add_clip(Clip::new(name, duration));
                let action = mixer.clip_action(clip).unwrap();
                registry.insert(name, AnimationEntry { clip, action }).unwrap();
            }
            let mut rig = Self {
                registry,
                mixer,
                blend: AnimationConfig::default(),
                fsm: StateMachine::new(),
            };
            rig.set(StateName::Idle);
            rig
        }

        fn ctx(&mut self) -> (&mut StateMachine, StateContext<'_>) {
            (
                &mut self.fsm,
                StateContext {
                    registry: &self.registry,
                    mixer: &mut self.mixer,
                    blend: &self.blend,
                },
            )
        }

        fn set(&mut self, name: StateName) -> Option<Transition> {
            let (fsm, mut ctx) = self.ctx();
            fsm.set_state(name, &mut ctx).unwrap()
        }

        fn step(&mut self, held: Intent) -> Option<StateName> {
            let (fsm, mut ctx) = self.ctx();
            fsm.update(1.0 / 60.0, &InputState::with(held), &mut ctx);
            fsm.current_state()
        }

        fn action(&self, name: StateName) -> &crate::mixer::Action {
            let id = self.registry.entry(name).unwrap().action;
            self.mixer.action(id).unwrap()
        }
    }

    #[test]
    fn state_names_parse() {
        assert_eq!("run".parse::<StateName>(), Ok(StateName::Run));
        assert_eq!("swim".parse::<StateName>(), Err(StateNameError("swim".into())));
        assert_eq!(StateName::Jump.to_string(), "jump");
    }

    #[test]
    fn first_activation_needs_complete_registry() {
        let mut mixer = AnimationMixer::new();
        let mut registry = AnimationRegistry::new();
        let clip = mixer.add_clip(Clip::new("idle", 1.0));
        let action = mixer.clip_action(clip).unwrap();
        registry.insert("idle", AnimationEntry { clip, action }).unwrap();
        let blend = AnimationConfig::default();
        let mut ctx = StateContext {
            registry: &registry,
            mixer: &mut mixer,
            blend: &blend,
        };
        let mut fsm = StateMachine::new();
        assert_eq!(
            fsm.set_state(StateName::Idle, &mut ctx),
            Err(RegistryError::Missing(StateName::Walk))
        );
        assert!(!fsm.is_initialized());
    }

    #[test]
    fn first_activation_plays_without_fade() {
        let rig = Rig::new();
        let idle = rig.action(StateName::Idle);
        assert!(idle.is_running());
        assert!(!idle.is_fading());
        assert_eq!(idle.effective_weight(), 1.0);
    }

    #[test]
    fn transition_table() {
        let mut rig = Rig::new();
        assert_eq!(rig.step(Intent::empty()), Some(StateName::Idle));
        assert_eq!(rig.step(Intent::FORWARD), Some(StateName::Walk));
        assert_eq!(rig.step(Intent::FORWARD), Some(StateName::Walk));
        assert_eq!(rig.step(Intent::FORWARD | Intent::RUN), Some(StateName::Run));
        assert_eq!(rig.step(Intent::BACKWARD | Intent::RUN), Some(StateName::Run));
        assert_eq!(rig.step(Intent::FORWARD), Some(StateName::Walk));
        assert_eq!(rig.step(Intent::LEFT | Intent::RIGHT), Some(StateName::Idle));
        assert_eq!(rig.step(Intent::JUMP), Some(StateName::Jump));
        assert_eq!(rig.step(Intent::FORWARD | Intent::RUN), Some(StateName::Jump));
        assert_eq!(rig.step(Intent::empty()), Some(StateName::Jump));
    }

    #[test]
    fn run_drops_straight_to_idle() {
        let mut rig = Rig::new();
        rig.step(Intent::FORWARD);
        rig.step(Intent::FORWARD | Intent::RUN);
        assert_eq!(rig.step(Intent::RUN), Some(StateName::Idle));
    }

    #[test]
    fn movement_wins_over_jump_from_idle() {
        let mut rig = Rig::new();
        assert_eq!(rig.step(Intent::FORWARD | Intent::JUMP), Some(StateName::Walk));
    }

    #[test]
    fn reselecting_active_state_is_noop() {
        let mut rig = Rig::new();
        rig.mixer.update(0.3);
        let before = rig.action(StateName::Idle).time();
        assert_eq!(rig.set(StateName::Idle), None);
        assert_eq!(rig.fsm.current_state(), Some(StateName::Idle));
        assert_eq!(rig.action(StateName::Idle).time(), before);
        assert!(!rig.action(StateName::Idle).is_fading());
    }

    #[test]
    fn walk_to_run_preserves_footfall_phase() {
        let mut rig = Rig::new();
        rig.set(StateName::Walk);
        rig.mixer.update(0.4);
        let walk_time = rig.action(StateName::Walk).time();
        rig.set(StateName::Run);
        let run_time = rig.action(StateName::Run).time();
        assert!((run_time - walk_time * (0.5 / 1.0)).abs() < 1e-6, "{run_time}");
        assert!(run_time > 0.0);

        rig.mixer.update(0.1);
        let run_time = rig.action(StateName::Run).time();
        rig.set(StateName::Walk);
        let walk_time = rig.action(StateName::Walk).time();
        assert!((walk_time - run_time * (1.0 / 0.5)).abs() < 1e-6, "{walk_time}");
    }

    #[test]
    fn idle_to_walk_restarts_walk() {
        let mut rig = Rig::new();
        rig.set(StateName::Walk);
        rig.mixer.update(0.3);
        rig.set(StateName::Idle);
        rig.set(StateName::Walk);
        let walk = rig.action(StateName::Walk);
        assert_eq!(walk.time(), 0.0);
        assert_eq!(walk.time_scale(), 1.0);
        assert!(walk.is_fading());
    }

    #[test]
    fn blend_duration_belongs_to_transition() {
        let cfg = AnimationConfig::default();
        assert_eq!(blend_duration(&cfg, StateName::Idle, StateName::Jump), 0.2);
        assert_eq!(blend_duration(&cfg, StateName::Jump, StateName::Idle), 0.2);
        assert_eq!(blend_duration(&cfg, StateName::Walk, StateName::Run), 0.5);
        assert_eq!(blend_duration(&cfg, StateName::Idle, StateName::Walk), 0.5);
    }

    #[test]
    fn jump_returns_to_idle_only_on_its_token() {
        let mut rig = Rig::new();
        rig.set(StateName::Jump);
        let token = rig.fsm.pending_finish().unwrap();
        assert_eq!(rig.mixer.subscription_count(), 1);
        assert_eq!(rig.action(StateName::Jump).loop_mode(), LoopMode::Once);

        let (fsm, mut ctx) = rig.ctx();
        assert_eq!(fsm.handle_finished(FinishToken(token.0 + 100), &mut ctx), None);
        assert_eq!(fsm.current_state(), Some(StateName::Jump));

        let t = fsm.handle_finished(token, &mut ctx).unwrap();
        assert_eq!(t.to, StateName::Idle);
        assert_eq!(fsm.handle_finished(token, &mut ctx), None);
        assert_eq!(fsm.current_state(), Some(StateName::Idle));
        assert_eq!(rig.mixer.subscription_count(), 0);
    }

    #[test]
    fn jump_completion_through_mixer() {
        let mut rig = Rig::new();
        rig.set(StateName::Jump);
        let mut fired = 0;
        for _ in 0..120 {
            let events = rig.mixer.update(1.0 / 60.0);
            let (fsm, mut ctx) = rig.ctx();
            for e in events {
                if fsm.handle_finished(e.token, &mut ctx).is_some() {
                    fired += 1;
                }
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(rig.fsm.current_state(), Some(StateName::Idle));
    }

    #[test]
    fn leaving_jump_early_releases_subscription() {
        let mut rig = Rig::new();
        rig.set(StateName::Jump);
        let token = rig.fsm.pending_finish().unwrap();
        rig.set(StateName::Walk);
        assert_eq!(rig.mixer.subscription_count(), 0);
        let (fsm, mut ctx) = rig.ctx();
        assert_eq!(fsm.handle_finished(token, &mut ctx), None);
        assert_eq!(fsm.current_state(), Some(StateName::Walk));
    }

    #[test]
    fn jump_entry_restores_weight_and_time_scale() {
        let mut rig = Rig::new();
        let id = rig.registry.entry(StateName::Jump).unwrap().action;
        let jump = rig.mixer.action_mut(id).unwrap();
        jump.set_effective_weight(0.3);
        jump.set_effective_time_scale(2.5);
        rig.set(StateName::Jump);
        let jump = rig.action(StateName::Jump);
        assert_eq!(jump.time(), 0.0);
        assert_eq!(jump.time_scale(), 1.0);
        assert!(jump.is_fading());
        rig.mixer.update(1.0);
        assert_eq!(rig.action(StateName::Jump).effective_weight(), 1.0);
    }

    #[test]
    fn failed_transition_keeps_current_state() {
        let mut rig = Rig::new();
        let empty = AnimationRegistry::new();
        let mut ctx = StateContext {
            registry: &empty,
            mixer: &mut rig.mixer,
            blend: &rig.blend,
        };
        let walk = InputState::with(Intent::FORWARD);
        assert_eq!(rig.fsm.update(1.0 / 60.0, &walk, &mut ctx), None);
        assert_eq!(rig.fsm.current_state(), Some(StateName::Idle));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut rig = Rig::new();
        let (fsm, mut ctx) = rig.ctx();
        assert!(fsm.set_state_by_name("crouch", &mut ctx).is_err());
        assert_eq!(fsm.current_state(), Some(StateName::Idle));
        assert!(fsm.set_state_by_name("walk", &mut ctx).unwrap().is_some());
    }
}
