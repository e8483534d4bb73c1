use clap::{Parser, Subcommand};
use cli::{
    AppConfig, BatchManifest, ConfigFile, StripeRecord, append_record,
    batch::{measure_areas, run_manifest, stripe_analyzer},
    interactive::InteractiveSession,
};
use color_eyre::eyre::Result;
use specimen::{AnalysisCommand, ThresholdSpec};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure stripe coverage of one image from the stripe input directory
    Stripe {
        /// Image base name, without directory or extension
        name: String,
        /// Margin below the brightest pixel (adaptive when omitted)
        #[arg(short, long, allow_hyphen_values = true)]
        threshold: Option<i32>,
        /// Directory to write intermediate images to
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },
    /// Analyse stripe images one at a time from a prompt
    Interactive,
    /// Measure silhouette areas of every image in the area input directory
    Area {
        /// Images analysed at once (defaults to `max_workers`)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Directory to write intermediate images to
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },
    /// Run the jobs listed in a manifest file
    Batch {
        /// Path to the TOML or JSON manifest
        manifest: PathBuf,
    },
    /// Print the JSON schemas of analysis commands and the configuration
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Stripe { name, threshold, dump_dir } => {
            measure_stripe(&config, &name, threshold, dump_dir.as_deref())?;
        }
        Commands::Interactive => {
            let analyzer = stripe_analyzer(&config, None);
            let stdin = std::io::stdin();
            let saved = InteractiveSession::new(stdin.lock(), std::io::stdout(), &config.stripe, &analyzer).run()?;
            info!("Saved {} result(s)", saved);
        }
        Commands::Area { jobs, dump_dir } => {
            measure_areas(&config, jobs, dump_dir).await?;
        }
        Commands::Batch { manifest: manifest_path } => {
            let manifest = BatchManifest::from_file(&manifest_path)?;
            info!("Running {} job(s) from {}", manifest.jobs.len(), manifest_path.display());
            run_manifest(&config, &manifest);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&AnalysisCommand::schema())?);
            println!("{}", serde_json::to_string_pretty(&schemars::schema_for!(AppConfig))?);
        }
    }

    Ok(())
}

fn measure_stripe(
    config: &AppConfig,
    name: &str,
    threshold: Option<i32>,
    dump_dir: Option<&Path>,
) -> Result<()> {
    let path = config.stripe.image_path(name);
    info!("Processing {}", path.display());

    let image = specimen::load_image(&path)?;
    let analyzer = stripe_analyzer(config, dump_dir.map(|dir| (dir, name)));
    let coverage = analyzer.analyze(&image, ThresholdSpec::from(threshold))?;
    info!(
        "White stripe pixels in the region of interest: {}/{}",
        coverage.white_pixel_count, coverage.total_pixel_count
    );

    append_record(
        &config.stripe.results_path,
        &StripeRecord {
            file_name: name.to_string(),
            coverage,
        },
    )?;
    info!("Results for {} have been saved to {}", name, config.stripe.results_path.display());
    Ok(())
}
