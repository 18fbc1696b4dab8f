use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use trajectory_engine::logging::initialize_logging;
use trajectory_engine::{
    filter_records, sequence_records, PerformanceRecord, PlayerKey, PlayerRegistry, PricedPlayer,
    TrajectoryConfig, TrajectoryEngine, ValuationRequest,
};

#[derive(Parser, Debug)]
#[command(name = "trajectory-engine")]
#[command(about = "Recompute player price trajectories from performance history")]
#[command(version)]
struct Cli {
    /// TOML configuration file (TRAJECTORY__* environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every position of one player's trajectory
    Explain(PlayerArgs),

    /// Print only the latest price for one player
    Current(PlayerArgs),

    /// Value every player in a registry file
    Batch {
        /// JSON array of performance records
        #[arg(short, long)]
        records: PathBuf,

        /// JSON registry file with players, base prices and aliases
        #[arg(long)]
        registry: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug)]
struct PlayerArgs {
    /// JSON array of performance records
    #[arg(short, long)]
    records: PathBuf,

    /// Player name as it appears in the feed
    #[arg(short, long)]
    player: String,

    /// Team name or abbreviation
    #[arg(short, long)]
    team: String,

    /// Price before the first record
    #[arg(short, long)]
    base_price: i64,

    /// Other names the feed uses for this player
    #[arg(long = "alias")]
    aliases: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = TrajectoryConfig::load(cli.config.as_deref())?;
    initialize_logging(&config.logging)?;
    info!("Loaded configuration: {:?}", config.valuation);

    if let Err(e) = run(cli.command, config).await {
        error!("❌ {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(command: Command, config: TrajectoryConfig) -> anyhow::Result<()> {
    match command {
        Command::Config => {
            print!("{}", config.to_toml()?);
        }
        Command::Explain(args) => {
            let engine = TrajectoryEngine::new(config)?;
            let records = load_records(&args.records).await?;
            let request = player_request(&args);

            let trajectory = engine.value_player(&request, &records)?;
            println!("{}", serde_json::to_string_pretty(&trajectory)?);
        }
        Command::Current(args) => {
            let engine = TrajectoryEngine::new(config)?;
            let records = load_records(&args.records).await?;
            let request = player_request(&args);

            let filtered = filter_records(&records, &request.key, &request.accepted_names);
            let sequenced = sequence_records(filtered.records);
            let player = PricedPlayer::new(request.key.clone(), request.base_price)
                .with_eligibility(
                    sequenced.records.len(),
                    engine.config().valuation.min_qualifying_games,
                );

            let snapshot = engine.current_price(&player, &sequenced.records)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Batch { records, registry } => {
            let engine = TrajectoryEngine::new(config)?;
            let records = load_records(&records).await?;

            let mut players = PlayerRegistry::new();
            players.load_from_file(&registry).await?;

            let requests: Vec<ValuationRequest> = players
                .players()
                .into_iter()
                .map(|p| ValuationRequest::from_registry(&players, p))
                .collect();

            // Valuation is CPU-bound; keep it off the async workers.
            let report =
                tokio::task::spawn_blocking(move || engine.value_batch(&requests, &records))
                    .await
                    .context("Batch valuation task failed")?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn player_request(args: &PlayerArgs) -> ValuationRequest {
    ValuationRequest {
        key: PlayerKey::new(args.player.clone(), args.team.clone()),
        base_price: args.base_price,
        accepted_names: args.aliases.clone(),
    }
}

async fn load_records(path: &Path) -> anyhow::Result<Vec<PerformanceRecord>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    let records: Vec<PerformanceRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse records in {}", path.display()))?;
    info!("Loaded {} performance records from {}", records.len(), path.display());
    Ok(records)
}
