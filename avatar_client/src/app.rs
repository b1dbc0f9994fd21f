//! Application context and run loop.
//!
//! `App` is the one owned object built at startup. It holds the held-key
//! intents, the character, the follow camera, the asset feed and the scene,
//! and runs them once per frame in a fixed order:
//!
//! - deliver clips that finished loading
//! - apply scripted key events for this frame
//! - advance the character (locomotion, state machine, mixer)
//! - advance the camera from the avatar's new pose
//! - push transforms to the scene and render

use std::time::Duration;

use avatar_shared::{
    assets::ClipFeed,
    camera::{CameraFollowController, CameraPose},
    character::Character,
    config::AvatarConfig,
    event::{AnimationsReady, ClipRegistered, StateChanged},
    fsm::StateName,
    input::InputState,
    locomotion::Kinematics,
    scene::{ObjectId, SceneBackend},
};
use tracing::{debug, info, warn};

use crate::{
    clock::{FixedClock, FrameClock, WallClock},
    input::{apply_key_code, apply_key_event, InputScript, KeyEvent},
};

/// What one frame produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub dt: f32,
    pub state: Option<StateName>,
    pub kinematics: Kinematics,
    pub camera: CameraPose,
}

pub struct App<S: SceneBackend> {
    cfg: AvatarConfig,
    input: InputState,
    character: Character,
    camera: CameraFollowController,
    feed: ClipFeed,
    scene: S,
    avatar: ObjectId,
    script: InputScript,
    frame: u64,
    stop_requested: bool,
}

impl<S: SceneBackend> App<S> {
    pub fn new(cfg: AvatarConfig, mut scene: S, script: InputScript) -> Self {
        let avatar = scene.add_object("avatar");
        Self {
            input: InputState::new(),
            character: Character::new(&cfg),
            camera: CameraFollowController::new(cfg.camera),
            feed: ClipFeed::from_specs(&cfg.clips),
            scene,
            avatar,
            script,
            frame: 0,
            stop_requested: false,
            cfg,
        }
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.cfg
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn avatar_object(&self) -> ObjectId {
        self.avatar
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn handle_key(&mut self, event: KeyEvent) {
        apply_key_event(&mut self.input, event);
    }

    /// Raw key code from a windowing layer; unmapped keys are ignored.
    pub fn handle_key_code(&mut self, code: u32, pressed: bool) {
        if !apply_key_code(&mut self.input, code, pressed) {
            debug!(code, "Unmapped key");
        }
    }

    /// Makes the run loop exit before its next frame.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Runs one frame with `dt` seconds of elapsed time.
    pub fn step(&mut self, dt: f32) -> FrameReport {
        // Script frames are zero-based: frame 0 applies on the first step.
        let scripted: Vec<KeyEvent> = self.script.events_at(self.frame).collect();
        self.frame += 1;

        for clip in self.feed.poll() {
            if let Err(e) = self.character.on_clip_loaded(clip) {
                warn!(error = %e, "Clip rejected");
            }
        }

        for event in scripted {
            self.handle_key(event);
        }

        let input = self.input;
        let kinematics = self
            .character
            .advance(dt, &input)
            .unwrap_or_else(|| self.character.kinematics());
        let camera = self
            .camera
            .advance(dt, self.character.position(), self.character.orientation());

        self.scene
            .set_transform(self.avatar, kinematics.position, kinematics.orientation);
        self.scene.set_camera(camera);
        self.scene.render();

        self.log_events();

        FrameReport {
            frame: self.frame,
            dt,
            state: self.character.state(),
            kinematics,
            camera,
        }
    }

    fn log_events(&mut self) {
        let events = self.character.events_mut();
        for ClipRegistered { name } in events.drain::<ClipRegistered>() {
            debug!(%name, "Clip loaded");
        }
        for ready in events.drain::<AnimationsReady>() {
            info!(initial = %ready.initial, "Character ready");
        }
        for StateChanged(t) in events.drain::<StateChanged>() {
            info!(frame = self.frame, from = ?t.from, to = %t.to, "Animation state changed");
        }
    }

    /// Steps until `max_frames` more frames ran or a stop was requested.
    /// Returns the number of frames run.
    pub fn run(&mut self, clock: &mut impl FrameClock, max_frames: u64) -> u64 {
        let start = self.frame;
        info!(max_frames, "Run loop started");
        while !self.stop_requested && self.frame - start < max_frames {
            let dt = clock.tick();
            let report = self.step(dt);
            if report.frame % 60 == 0 {
                debug!(
                    frame = report.frame,
                    state = ?report.state,
                    x = report.kinematics.position.x,
                    z = report.kinematics.position.z,
                    "Frame"
                );
            }
        }
        let ran = self.frame - start;
        info!(frames = ran, "Run loop stopped");
        ran
    }

    /// Deterministic run at the configured frame rate.
    pub fn run_fixed(&mut self, max_frames: u64) -> u64 {
        let mut clock = FixedClock::from_hz(self.cfg.frame_hz);
        self.run(&mut clock, max_frames)
    }

    /// Runs paced by a tokio interval at `frame_hz`, feeding wall time.
    pub async fn run_realtime(&mut self, max_frames: u64) -> u64 {
        let period = Duration::from_secs_f32(self.cfg.frame_dt()).max(Duration::from_nanos(1));
        let mut interval = tokio::time::interval(period);
        let mut clock = WallClock::new();
        let start = self.frame;
        info!(max_frames, hz = self.cfg.frame_hz, "Realtime loop started");
        while !self.stop_requested && self.frame - start < max_frames {
            interval.tick().await;
            let dt = clock.tick();
            self.step(dt);
        }
        let ran = self.frame - start;
        info!(frames = ran, "Realtime loop stopped");
        ran
    }
}
