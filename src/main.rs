// SPDX-License-Identifier: GPL-3.0-only

use camera_mirror::{Config, PreviewGravity, SessionPreset};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "camera-mirror")]
#[command(about = "Mirrored camera preview with camera switching")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    preview: PreviewArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras and the camera permission status
    List,

    /// Show the preview of one camera without the menu
    Preview {
        /// Camera index to use (from 'camera-mirror list')
        #[arg(short, long, default_value = "0")]
        camera: usize,
    },
}

/// Preview settings overriding the config file
///
/// Global, so they are accepted before or after the subcommand.
#[derive(Args, Clone, Debug, Default)]
struct PreviewArgs {
    /// Show the camera image unmirrored
    #[arg(long, global = true)]
    no_mirror: bool,

    /// How the preview fills its window: fill, fit or stretch
    #[arg(long, global = true)]
    gravity: Option<PreviewGravity>,

    /// Capture resolution bound: low, medium, high or max
    #[arg(long, global = true)]
    preset: Option<SessionPreset>,

    /// GStreamer video sink used for the preview window
    #[arg(long, global = true)]
    sink: Option<String>,
}

impl PreviewArgs {
    fn apply(&self, config: &mut Config) {
        if self.no_mirror {
            config.mirror_preview = false;
        }
        if let Some(gravity) = self.gravity {
            config.preview_gravity = gravity;
        }
        if let Some(preset) = self.preset {
            config.session_preset = preset;
        }
        if let Some(sink) = &self.sink {
            config.video_sink = sink.clone();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The menu owns the terminal, so its logs go to a file
    let log_file = cli.command.is_none().then(menu_log_path);
    init_logging(log_file.as_deref())?;

    let mut config = Config::load()?;
    cli.preview.apply(&mut config);

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Preview { camera }) => cli::run_preview(&config, camera),
        None => {
            let result = camera_mirror::terminal::run(&config);
            if let (Err(_), Some(path)) = (&result, &log_file) {
                eprintln!("Log written to {}", path.display());
            }
            Ok(result?)
        }
    }
}

fn menu_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(camera_mirror::constants::APP_ID)
        .join("camera-mirror.log")
}

/// Set up tracing
///
/// Set RUST_LOG to control the level, e.g. `RUST_LOG=camera_mirror=debug`.
fn init_logging(file: Option<&std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    match file {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let file = std::fs::File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
