use clap::{Parser, Subcommand};
use gfxswap_cache::{Bitmap, CacheManager, GraphicCacheConfig};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "gfxswap")]
#[command(about = "Inspect and exercise the graphic swap cache", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the configuration resolved from the environment
    Config,

    /// Register synthetic bitmaps, age them and run one sweep
    Simulate {
        /// Number of bitmaps to register
        #[arg(long, default_value_t = 3)]
        count: usize,

        /// Size of each bitmap in bytes
        #[arg(long, default_value_t = 500_000)]
        size: u32,

        /// Memory limit in bytes, overriding the environment
        #[arg(long)]
        limit: Option<i64>,

        /// How long ago the bitmaps were last used, in seconds
        #[arg(long, default_value_t = 60)]
        idle_secs: u64,

        /// Number of bitmaps held busy by an active operation
        #[arg(long, default_value_t = 0)]
        active: usize,
    },
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    gfxswap_core::tracing::init()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Config => {
            let config = GraphicCacheConfig::load();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Simulate {
            count,
            size,
            limit,
            idle_secs,
            active,
        } => simulate(count, size, limit, idle_secs, active)?,
    }

    Ok(())
}

fn simulate(
    count: usize,
    size: u32,
    limit: Option<i64>,
    idle_secs: u64,
    active: usize,
) -> eyre::Result<()> {
    let mut config = GraphicCacheConfig::load();
    if let Some(limit) = limit {
        config.memory_limit = limit;
    }
    let manager = CacheManager::new_manual(config);

    let graphics: Vec<_> = (0..count)
        .map(|_| manager.new_bitmap(Bitmap::new(size, 1, 8)))
        .collect();

    let now = Instant::now();
    let last_used = now
        .checked_sub(Duration::from_secs(idle_secs))
        .unwrap_or(now);
    for graphic in &graphics {
        graphic.mark_used_at(last_used);
    }

    let _operations: Vec<_> = graphics
        .iter()
        .take(active)
        .map(|graphic| graphic.begin_operation())
        .collect();

    tracing::info!(
        count,
        size,
        used = manager.used_bytes(),
        limit = manager.config().memory_limit,
        "Running graphic memory sweep"
    );
    manager.reduce_graphic_memory();

    println!("{}", serde_json::to_string_pretty(&manager.statistics())?);
    Ok(())
}
