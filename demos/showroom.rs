//! Showroom
//!
//! Opens the product landing page (orbit or AR viewer, depending on what the
//! platform supports) or the showcase page with its "Explore" camera move.
//!
//! ```text
//! showroom [--config FILE] [--model PATH] [--user-agent UA] [--simulate-ar] [landing|showcase]
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use showroom_core::{ArRuntime, NoArRuntime, ShowroomConfig, SimulatedArRuntime, ViewModeSelector};
use showroom_io::AssetSource;
use showroom_viewer::{CapabilityQuery, Experience, LandingExperience, ShowcaseExperience, ViewerApp};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "showroom.toml";
/// Until the window reports its size
const INITIAL_ASPECT_RATIO: f32 = 16.0 / 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Page {
    /// Heading, tagline and the orbit or AR viewer
    Landing,
    /// Fixed model with the one-shot explore transition
    Showcase,
}

#[derive(Parser, Debug)]
#[command(name = "showroom")]
#[command(about = "3D and AR product viewer", version)]
struct Cli {
    /// Configuration file; `showroom.toml` is used if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to display (.obj, .glb or .gltf); overrides the configuration
    #[arg(short, long)]
    model: Option<String>,

    /// User agent used for platform detection
    #[arg(long)]
    user_agent: Option<String>,

    /// Pretend the device supports immersive AR sessions
    #[arg(long)]
    simulate_ar: bool,

    /// Page to open
    #[arg(value_enum, default_value = "landing")]
    page: Page,
}

fn load_config(path: Option<&PathBuf>) -> Result<ShowroomConfig> {
    match path {
        Some(path) => ShowroomConfig::load(path).with_context(|| format!("Failed to load {}", path.display())),
        None if std::path::Path::new(DEFAULT_CONFIG).exists() => {
            ShowroomConfig::load(DEFAULT_CONFIG).with_context(|| format!("Failed to load {}", DEFAULT_CONFIG))
        }
        None => {
            log::info!("No configuration file, using defaults");
            Ok(ShowroomConfig::default())
        }
    }
}

fn default_user_agent() -> String {
    format!("showroom/{} ({})", env!("CARGO_PKG_VERSION"), std::env::consts::OS)
}

fn run<R>(cli: &Cli, mut config: ShowroomConfig, runtime: R) -> Result<()>
where
    R: ArRuntime + Clone + Send + 'static,
{
    let model = cli.model.clone().or_else(|| {
        config
            .model
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
    });

    let source = match model.as_deref().map(AssetSource::parse) {
        Some(AssetSource::Url(url)) => {
            log::warn!("Remote models cannot be displayed here; {} is only offered to external AR viewers", url);
            config.ar_asset_url = url;
            None
        }
        other => other,
    };

    let experience = match cli.page {
        Page::Landing => {
            let user_agent = cli.user_agent.clone().unwrap_or_else(default_user_agent);
            let selector = ViewModeSelector::from_user_agent(&user_agent, config.ar_asset_url.clone());
            let landing = LandingExperience::new(&config, selector, source, INITIAL_ASPECT_RATIO)
                .with_capability_query(CapabilityQuery::spawn(&runtime));
            Experience::Landing(landing)
        }
        Page::Showcase => Experience::Showcase(ShowcaseExperience::new(&config, source, INITIAL_ASPECT_RATIO)),
    };

    log::info!("Controls: left drag orbits, right drag pans, scroll zooms, R resets the camera, Esc quits");
    ViewerApp::new(experience, runtime).run()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("Showroom v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref())?;

    if cli.simulate_ar {
        run(&cli, config, SimulatedArRuntime::new(true))
    } else {
        run(&cli, config, NoArRuntime)
    }
}
