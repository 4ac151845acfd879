mod narration;
mod session;
mod weather;

use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use huella_game::constants::DEFAULT_PROGRESS_FILE;
use huella_game::{ChallengeCatalog, JsonFileStorage, ProgressStore};

use narration::{ConsoleNarrator, SpeechCommand};
use session::Session;
use weather::{DEFAULT_TIMEOUT_SECS, DEFAULT_WEATHER_URL, WttrClient};

#[derive(Debug, Parser)]
#[command(name = "huella", version)]
#[command(about = "Daily eco challenges with points, CO2 savings, a minigame and the weather")]
struct Args {
    /// JSON file holding your progress
    #[arg(long, env = "HUELLA_STATE_FILE", default_value = DEFAULT_PROGRESS_FILE)]
    state_file: PathBuf,

    /// Base URL of the wttr.in compatible weather service
    #[arg(long, env = "HUELLA_WEATHER_URL", default_value = DEFAULT_WEATHER_URL)]
    weather_url: String,

    /// Weather request timeout in seconds
    #[arg(long, env = "HUELLA_WEATHER_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    weather_timeout_secs: u64,

    /// Seed for reproducible challenge draws and minigame rounds
    #[arg(long, env = "HUELLA_SEED")]
    seed: Option<u64>,

    /// Replace the bundled challenge list with a JSON catalog file
    #[arg(long, env = "HUELLA_CATALOG")]
    catalog: Option<PathBuf>,

    /// Program that reads messages aloud, e.g. "espeak -v es"
    #[arg(long, env = "HUELLA_SPEECH_COMMAND")]
    speech_command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    announce_banner();

    let storage = JsonFileStorage::new(&args.state_file);
    let store = ProgressStore::open(storage)
        .with_context(|| format!("opening progress file {}", args.state_file.display()))?;
    let weather = WttrClient::new(
        args.weather_url.clone(),
        Duration::from_secs(args.weather_timeout_secs),
    )
    .context("building weather client")?;
    let narrator = ConsoleNarrator::new(stdout())
        .with_speech(args.speech_command.as_deref().and_then(SpeechCommand::parse));

    let mut session = Session::new(store, weather, narrator, io::stdin().lock());
    if let Some(path) = args.catalog.as_ref() {
        session = session.with_catalog(load_catalog(path)?);
    }
    if let Some(seed) = args.seed {
        log::info!("using seed {seed}");
        session = session.with_seed(seed);
    }
    session.run().await?;

    let record = session.store().record();
    log::info!(
        "session finished with {} points and {:.1} kg CO2",
        record.points(),
        record.co2_total()
    );
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn announce_banner() {
    println!("{}", "🌱 Huella: tu reto ecológico diario".bright_green().bold());
    println!("{}", "==================================".green());
}

fn load_catalog(path: &Path) -> Result<ChallengeCatalog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading challenge catalog {}", path.display()))?;
    ChallengeCatalog::from_json(&json)
        .with_context(|| format!("parsing challenge catalog {}", path.display()))
}
