//! Player character.
//!
//! Owns the animation registry, the mixer, the state machine and the
//! locomotion integrator, and runs them in a fixed order each tick:
//!
//! 1. capture the active state (the integrator sees the tick-start state)
//! 2. integrate locomotion
//! 3. let the state machine evaluate its transitions
//! 4. advance the mixer and feed finish signals back to the machine
//!
//! Nothing moves until every animation has been registered.

use tracing::{info, warn};

use crate::{
    config::{AnimationConfig, AvatarConfig},
    event::{AnimationsReady, ClipRegistered, EventBus, StateChanged},
    fsm::{StateContext, StateMachine, StateName},
    input::InputState,
    locomotion::{Kinematics, LocomotionIntegrator},
    math::{Quat, Vec3},
    mixer::{AnimationMixer, Clip},
    registry::{AnimationEntry, AnimationRegistry, RegistryError},
};

pub struct Character {
    blend: AnimationConfig,
    registry: AnimationRegistry,
    mixer: AnimationMixer,
    fsm: StateMachine,
    locomotion: LocomotionIntegrator,
    events: EventBus,
}

impl Character {
    pub fn new(cfg: &AvatarConfig) -> Self {
        Self {
            blend: cfg.animation,
            registry: AnimationRegistry::new(),
            mixer: AnimationMixer::new(),
            fsm: StateMachine::new(),
            locomotion: LocomotionIntegrator::new(cfg.locomotion),
            events: EventBus::default(),
        }
    }

    /// Registers a freshly loaded clip under its name. Once all four states
    /// are covered the machine enters Idle.
    pub fn on_clip_loaded(&mut self, clip: Clip) -> Result<(), RegistryError> {
        if self.registry.get(&clip.name).is_some() {
            warn!(name = %clip.name, "Clip already registered; ignoring reload");
            return Err(RegistryError::Duplicate(clip.name));
        }
        let name = clip.name.clone();
        let (clip_id, action) = self.mixer.add_clip_action(clip);
        self.registry.insert(&name, AnimationEntry { clip: clip_id, action })?;
        self.events.push(ClipRegistered { name });

        if !self.fsm.is_initialized() && self.registry.is_complete() {
            let mut ctx = StateContext {
                registry: &self.registry,
                mixer: &mut self.mixer,
                blend: &self.blend,
            };
            if let Some(t) = self.fsm.set_state(StateName::Idle, &mut ctx)? {
                info!(initial = %t.to, "Animations ready");
                self.events.push(AnimationsReady { initial: t.to });
                self.events.push(StateChanged(t));
            }
        }
        Ok(())
    }

    /// Runs one tick. Returns `None` (and does nothing) until the
    /// animations are ready.
    pub fn advance(&mut self, dt: f32, input: &InputState) -> Option<Kinematics> {
        let mode = self.fsm.current_state()?;
        let kinematics = self.locomotion.advance(dt, input, mode);

        let mut ctx = StateContext {
            registry: &self.registry,
            mixer: &mut self.mixer,
            blend: &self.blend,
        };
        if let Some(t) = self.fsm.update(dt, input, &mut ctx) {
            self.events.push(StateChanged(t));
        }
        for finished in ctx.mixer.update(dt) {
            if let Some(t) = self.fsm.handle_finished(finished.token, &mut ctx) {
                self.events.push(StateChanged(t));
            }
        }
        Some(kinematics)
    }

    pub fn state(&self) -> Option<StateName> {
        self.fsm.current_state()
    }

    pub fn is_ready(&self) -> bool {
        self.fsm.is_initialized()
    }

    pub fn position(&self) -> Vec3 {
        self.locomotion.position()
    }

    pub fn orientation(&self) -> Quat {
        self.locomotion.orientation()
    }

    pub fn kinematics(&self) -> Kinematics {
        self.locomotion.snapshot()
    }

    pub fn teleport(&mut self, position: Vec3) {
        self.locomotion.teleport(position);
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.fsm
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }
}
