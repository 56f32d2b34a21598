use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use enu_engine::{kana, replay, score, InputLayout, SnapDirection};
use enu_schema::{Config, Metadata, Milliseconds, ModCombo};
use tracing_subscriber::EnvFilter;

mod report;

/// Track length assumed when `--duration` is not given.
const DEFAULT_DURATION_MS: Milliseconds = 600_000;

#[derive(Debug, Parser)]
#[command(name = "enu")]
#[command(about = "Typing beatmap tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a beatmap and write it as JSON.
    Parse {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_DURATION_MS)]
        duration: Milliseconds,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show keypress density per line and for the whole beatmap.
    Info {
        beatmap: PathBuf,
        #[arg(long, default_value_t = DEFAULT_DURATION_MS)]
        duration: Milliseconds,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Level metadata JSON (title and artist).
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
    /// Print a beatmap in canonical form.
    Format {
        input: PathBuf,
        #[arg(long, default_value_t = DEFAULT_DURATION_MS)]
        duration: Milliseconds,
    },
    /// List the accepted spellings of each kana in `text`.
    Romanize {
        text: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Re-score a recorded replay against a beatmap.
    Replay {
        beatmap: PathBuf,
        replay: PathBuf,
        #[arg(long, default_value_t = DEFAULT_DURATION_MS)]
        duration: Milliseconds,
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        #[arg(long)]
        hidden: bool,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the final statistics as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Beat-snap a time against the beatmap's timing points.
    Snap {
        beatmap: PathBuf,
        #[arg(long)]
        time: Milliseconds,
        #[arg(long, default_value_t = 4)]
        divisor: u32,
        #[arg(long, value_enum, default_value_t = Direction::Nearest)]
        direction: Direction,
        #[arg(long, default_value_t = DEFAULT_DURATION_MS)]
        duration: Milliseconds,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    Nearest,
    Forward,
    Backward,
}

impl From<Direction> for SnapDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Nearest => SnapDirection::Nearest,
            Direction::Forward => SnapDirection::Forward,
            Direction::Backward => SnapDirection::Backward,
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Parse {
            input,
            output,
            duration,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let beatmap = enu_engine::parse_file(&input, duration, &config.respelling)
                .with_context(|| format!("parse failed: {}", input.display()))?;

            let json = serde_json::to_string_pretty(&beatmap).context("failed to serialize beatmap")?;
            let out_path = output.unwrap_or_else(|| default_output_path(&input));
            fs::write(&out_path, json)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
        }
        Command::Info {
            beatmap,
            duration,
            config,
            metadata,
        } => {
            let config = load_config(config.as_deref())?;
            let map = enu_engine::parse_file(&beatmap, duration, &config.respelling)
                .with_context(|| format!("parse failed: {}", beatmap.display()))?;
            let metadata = metadata.as_deref().map(load_metadata).transpose()?;

            if let Some(metadata) = &metadata {
                println!("Title:  {}", metadata.display_title(&config));
                println!("Artist: {}", metadata.display_artist(&config));
            }
            report::print_beatmap_info(&map, InputLayout::from_config(&config));
        }
        Command::Format { input, duration } => {
            let beatmap = enu_engine::parse_file(&input, duration, &Config::default().respelling)
                .with_context(|| format!("parse failed: {}", input.display()))?;
            print!("{}", enu_engine::serialize(&beatmap));
        }
        Command::Romanize { text, config } => {
            let config = load_config(config.as_deref())?;
            for k in kana::parse_kana(&text, None, &config.respelling) {
                println!("{}\t{}", k.text, k.romanizations.join(" "));
            }
        }
        Command::Replay {
            beatmap,
            replay: replay_path,
            duration,
            speed,
            hidden,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let map = enu_engine::parse_file(&beatmap, duration, &config.respelling)
                .with_context(|| format!("parse failed: {}", beatmap.display()))?;
            let src = fs::read_to_string(&replay_path)
                .with_context(|| format!("failed to read: {}", replay_path.display()))?;
            let events = replay::deserialize_replay(&src)
                .with_context(|| format!("invalid replay: {}", replay_path.display()))?;
            let multiplier = score::score_multiplier(speed, &ModCombo { hidden })
                .context("invalid playback speed")?;

            let state = replay::simulate_replay(&map, &config, multiplier, &events);
            if json {
                let out = serde_json::to_string_pretty(&state.stats).context("failed to serialize stats")?;
                println!("{out}");
            } else {
                report::print_replay_report(&state, events.len());
            }
        }
        Command::Snap {
            beatmap,
            time,
            divisor,
            direction,
            duration,
        } => {
            let map = enu_engine::parse_file(&beatmap, duration, &Config::default().respelling)
                .with_context(|| format!("parse failed: {}", beatmap.display()))?;
            let snapped = enu_engine::time_index::snap(
                &map.timing_points,
                divisor,
                time,
                direction.into(),
                map.duration,
            );
            println!("{snapped}");
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let src = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    serde_json::from_str(&src).with_context(|| format!("invalid config: {}", path.display()))
}

fn load_metadata(path: &Path) -> anyhow::Result<Metadata> {
    let src = fs::read_to_string(path)
        .with_context(|| format!("failed to read metadata: {}", path.display()))?;
    serde_json::from_str(&src).with_context(|| format!("invalid metadata: {}", path.display()))
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("beatmap.json");
    out
}
