//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p avatar_client -- [--config avatar.json] [--script keys.json]
//!                                 [--frames 600] [--hz 60] [--realtime]
//!
//! Runs the avatar headless: clips arrive from the asset feed, the input
//! script is replayed frame by frame, and transitions are logged. Without
//! `--script` a built-in demo walks, sprints, jumps and turns.
//!
//! Set `RUST_LOG=debug` to see per-second frame status.

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use avatar_client::{app::App, input::InputScript};
use avatar_shared::{config::AvatarConfig, scene::HeadlessScene};
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
    frames: u64,
    hz: Option<u32>,
    realtime: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut parsed = Args {
        config: None,
        script: None,
        frames: 600,
        hz: None,
        realtime: false,
    };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                parsed.config = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--script" if i + 1 < args.len() => {
                parsed.script = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--frames" if i + 1 < args.len() => {
                parsed.frames = args[i + 1].parse().context("parse --frames")?;
                i += 2;
            }
            "--hz" if i + 1 < args.len() => {
                parsed.hz = Some(args[i + 1].parse().context("parse --hz")?);
                i += 2;
            }
            "--realtime" => {
                parsed.realtime = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    Ok(parsed)
}

fn load_config(args: &Args) -> anyhow::Result<AvatarConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            AvatarConfig::from_json_str(&text).context("parse config")?
        }
        None => AvatarConfig::default(),
    };
    if let Some(hz) = args.hz {
        cfg.frame_hz = hz;
    }
    cfg.validate().context("invalid config")?;
    Ok(cfg)
}

fn load_script(args: &Args) -> anyhow::Result<InputScript> {
    match &args.script {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read script {}", path.display()))?;
            InputScript::from_json_str(&text).context("parse script")
        }
        None => Ok(InputScript::demo()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;
    let cfg = load_config(&args)?;
    let script = load_script(&args)?;
    info!(
        frames = args.frames,
        hz = cfg.frame_hz,
        scripted_keys = script.len(),
        realtime = args.realtime,
        "Starting client"
    );

    let mut app = App::new(cfg, HeadlessScene::default(), script);
    let ran = if args.realtime {
        app.run_realtime(args.frames).await
    } else {
        app.run_fixed(args.frames)
    };

    let k = app.character().kinematics();
    info!(
        frames = ran,
        state = ?app.character().state(),
        x = k.position.x,
        z = k.position.z,
        rendered = app.scene().frames_rendered(),
        "Client finished"
    );
    Ok(())
}
