use skyisle::config::{LoadedConfig, ViewerConfig};
use skyisle::core::{Viewer, ViewerError, ViewerResult};
use skyisle::scene::{CameraMove, Turn};
use std::path::PathBuf;

const USAGE: &str = "usage: skyisle [MODEL.gltf] [--config PATH] [--frames N]";

/// 命令行参数
struct Args {
    model: Option<PathBuf>,
    config: Option<PathBuf>,
    frames: u32,
}

fn parse_args() -> ViewerResult<Args> {
    let mut args = Args {
        model: None,
        config: None,
        frames: 600,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--frames" => {
                args.frames = iter
                    .next()
                    .and_then(|value| value.parse().ok())
                    .ok_or_else(|| ViewerError::General(USAGE.to_string()))?;
            }
            "--config" => {
                args.config = Some(
                    iter.next()
                        .map(PathBuf::from)
                        .ok_or_else(|| ViewerError::General(USAGE.to_string()))?,
                );
            }
            "-h" | "--help" => return Err(ViewerError::General(USAGE.to_string())),
            _ => args.model = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

fn run() -> ViewerResult<()> {
    let args = parse_args()?;

    let loaded = match &args.config {
        Some(path) => LoadedConfig {
            config: ViewerConfig::from_file(path)?,
            source: Some(path.clone()),
            skipped: Vec::new(),
        },
        None => ViewerConfig::load_or_default(),
    };
    let mut config = loaded.config;
    config.apply_env_overrides();
    Viewer::initialize_logging(&config.logging);
    for (path, e) in &loaded.skipped {
        tracing::warn!(target: "viewer", path = %path.display(), "Ignoring config file: {}", e);
    }
    match loaded.source {
        Some(path) => tracing::info!(target: "viewer", "Loaded config from {}", path.display()),
        None => tracing::info!(target: "viewer", "Using default configuration"),
    }

    let mut viewer = Viewer::new(config)?;

    if let Some(model) = &args.model {
        #[cfg(feature = "gltf")]
        viewer.load_character(model)?;
        #[cfg(not(feature = "gltf"))]
        tracing::warn!(target: "viewer", "Built without glTF support, ignoring {}", model.display());
    }

    // 简单的飞行路线：一直向前，每 240 帧向右转一次
    viewer.run_headless(args.frames, 1.0 / 60.0, |frame, camera| {
        if frame > 0 && frame % 240 == 0 {
            camera.rotate(Turn::YawRight);
        }
        camera.move_camera(CameraMove::Forward);
    })?;

    let camera = viewer.camera();
    tracing::info!(
        target: "viewer",
        eye = ?camera.eye,
        centre = %viewer.grid().controller.centre(),
        "Viewer shutting down"
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Viewer failed: {}", e);
        std::process::exit(1);
    }
}
