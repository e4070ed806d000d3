use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rankr::{
    count_by_category, import_files, open_database, rebalance_input, recompute, verify_count,
    Config, Parameter, RecomputeRequest, RunOutcome, WeightSet,
};

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clear the store and reload it from ranking CSV files
    Import {
        /// Source files; category and year come from each file name
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List or recompute rankings for a year and category
    Rank {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        category: String,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        state: Option<String>,
        /// tlr,rp,go,oi,pr (omit for the historical listing)
        #[arg(long)]
        weights: Option<String>,
        /// Only print the first N rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Change one weight and balance the others toward 100
    Rebalance {
        /// tlr,rp,go,oi,pr (defaults to 30,30,20,10,10)
        #[arg(long)]
        weights: Option<String>,
        #[arg(long)]
        parameter: String,
        #[arg(long)]
        value: String,
    },
    /// Record counts per category and year
    Stats,
}

#[derive(Parser, Debug)]
#[command(name = "rankr")]
#[command(about = "Institution ranking recomputation CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Database path (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Import { files } => run_import(&config, &files),
        Commands::Rank {
            year,
            category,
            region,
            state,
            weights,
            limit,
        } => {
            let mut request = RecomputeRequest::new(year, category);
            request.region = region;
            request.state = state;
            if let Some(raw) = weights {
                request.weights = Some(parse_weights(&raw)?);
            }
            run_rank(&config, &request, limit)
        }
        Commands::Rebalance {
            weights,
            parameter,
            value,
        } => run_rebalance(weights.as_deref(), &parameter, &value),
        Commands::Stats => run_stats(&config),
    }
}

fn parse_weights(raw: &str) -> Result<WeightSet> {
    WeightSet::parse_csv(raw)
        .with_context(|| format!("Invalid weights '{}': expected tlr,rp,go,oi,pr", raw))
}

fn run_import(config: &Config, files: &[PathBuf]) -> Result<()> {
    println!("🗄️  Import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut conn = open_database(&config.database_path)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    println!("✓ Database ready: {}", config.database_path.display());

    let report = import_files(&mut conn, files)?;

    println!("\n📂 Files:");
    for file in &report.files {
        let icon = match file.outcome {
            RunOutcome::Imported => "✓",
            RunOutcome::Skipped => "⚠️",
            RunOutcome::Failed => "❌",
        };
        match &file.message {
            Some(message) => println!("  {} {} - {}", icon, file.file_name, message),
            None => println!(
                "  {} {} - {} accepted, {} rejected, {} unknown states",
                icon, file.file_name, file.accepted, file.rejected, file.unknown_states
            ),
        }
    }

    println!("\n🔍 Store contents:");
    for count in &report.counts {
        println!("  {:<12} {}  {:>5} records", count.category, count.year, count.count);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "✅ {} records from {} file(s) ({} skipped, {} failed)",
        report.total_records,
        report.imported_files(),
        report.skipped_files(),
        report.failed_files()
    );

    Ok(())
}

fn run_rank(config: &Config, request: &RecomputeRequest, limit: Option<usize>) -> Result<()> {
    let conn = open_database(&config.database_path)?;
    let rows = recompute(&conn, request)?;

    println!(
        "{:>5} {:>5} {:>8} {:>8}  {:<50} {}",
        "rank", "was", "score", "was", "institution", "state"
    );
    for row in rows.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{:>5} {:>5} {:>8.2} {:>8.2}  {:<50} {}",
            row.computed_rank,
            row.original_rank,
            row.computed_score,
            row.original_score,
            row.institution,
            row.state
        );
    }
    println!("\n{} institutions", rows.len());

    Ok(())
}

fn run_rebalance(weights: Option<&str>, parameter: &str, value: &str) -> Result<()> {
    let current = match weights {
        Some(raw) => parse_weights(raw)?,
        None => WeightSet::default(),
    };
    let parameter = Parameter::parse(parameter)
        .with_context(|| format!("Unknown parameter '{}': expected tlr, rp, go, oi or pr", parameter))?;

    let balanced = rebalance_input(&current, parameter, value);

    for p in Parameter::ALL {
        println!("  {:<4} {:>3} → {:>3}", p.code(), current.get(p), balanced.get(p));
    }
    println!("  total {:>3}", balanced.total());

    Ok(())
}

fn run_stats(config: &Config) -> Result<()> {
    let conn = open_database(&config.database_path)?;

    println!("📊 {} records", verify_count(&conn)?);
    for count in count_by_category(&conn)? {
        println!("  {:<12} {}  {:>5}", count.category, count.year, count.count);
    }

    Ok(())
}
