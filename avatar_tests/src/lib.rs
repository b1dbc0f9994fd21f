//! Shared fixtures for the integration tests under `tests/`.

use avatar_client::{input::InputScript, App};
use avatar_shared::{
    character::Character, config::AvatarConfig, mixer::Clip, scene::HeadlessScene,
};

pub const DT: f32 = 1.0 / 60.0;

/// Installs a test-writer subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// A character with all four clips registered, already in Idle.
pub fn loaded_character(cfg: &AvatarConfig) -> anyhow::Result<Character> {
    let mut character = Character::new(cfg);
    for spec in &cfg.clips {
        character.on_clip_loaded(Clip::new(spec.name.clone(), spec.duration))?;
    }
    anyhow::ensure!(character.is_ready(), "character not ready after loading clips");
    Ok(character)
}

/// A headless app on default settings.
pub fn headless_app(script: InputScript) -> App<HeadlessScene> {
    App::new(AvatarConfig::default(), HeadlessScene::default(), script)
}

/// Steps `app` until its clips are in and the character is idle.
pub fn warm_up(app: &mut App<HeadlessScene>) -> anyhow::Result<()> {
    for _ in 0..32 {
        if app.character().is_ready() {
            return Ok(());
        }
        app.step(DT);
    }
    anyhow::bail!("clips never finished loading")
}
