use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fnol_triage::{
    AnthropicClient, AnthropicConfig, PipelineConfig, PipelineReport, read_claims_file,
    run_pipeline_until,
};

#[derive(Parser)]
#[command(name = "fnol-triage")]
#[command(author, version, about = "First-notice-of-loss claim triage pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, assess and route a batch of claim reports
    Process {
        /// Input file of claim reports, separated by lines of --- or ===
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the JSON report
        #[arg(short, long, default_value = "triage_report.json")]
        output: PathBuf,

        /// Review each extraction and refine it once
        #[arg(long)]
        feedback_loop: bool,

        /// Maximum concurrent model calls per stage
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Model override (defaults to FNOL_MODEL or the built-in default)
        #[arg(long)]
        model: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show how an input file splits into claims without calling the model
    Inspect {
        /// Input file of claim reports
        #[arg(short, long)]
        input: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            feedback_loop,
            concurrency,
            model,
            verbose,
        } => {
            setup_logging(verbose);
            process_claims(input, output, feedback_loop, concurrency, model).await
        }
        Commands::Inspect { input, verbose } => {
            setup_logging(verbose);
            inspect_claims(input)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn process_claims(
    input: PathBuf,
    output: PathBuf,
    feedback_loop: bool,
    concurrency: usize,
    model: Option<String>,
) -> Result<()> {
    info!("Loading claims from {:?}", input);
    let claims = read_claims_file(&input).context("Failed to load claims")?;
    info!("Loaded {} claims", claims.len());

    let mut api_config = AnthropicConfig::from_env()?;
    if let Some(model) = model {
        api_config = api_config.with_model(model);
    }
    let client = AnthropicClient::new(api_config)?;

    let config = PipelineConfig::default()
        .with_feedback_loop(feedback_loop)
        .with_concurrency(concurrency);

    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let result = run_pipeline_until(&client, &claims, &config, cancel)
        .await
        .context("Pipeline failed")?;

    let report = PipelineReport::new(result, client.model(), feedback_loop);
    report.write_json(&output)?;
    info!("Report written to {:?}", output);

    print!("{}", report.format_summary());
    Ok(())
}

fn inspect_claims(input: PathBuf) -> Result<()> {
    info!("Inspecting claims from {:?}", input);
    let claims = read_claims_file(&input).context("Failed to load claims")?;

    println!("Claim File Analysis");
    println!("===================");
    println!("Claims: {}", claims.len());
    println!();

    for claim in &claims {
        let words = claim.text.split_whitespace().count();
        let first_line = claim.text.lines().next().unwrap_or_default();
        let preview: String = first_line.chars().take(60).collect();
        let ellipsis = if first_line.chars().count() > 60 { "..." } else { "" };
        println!(
            "{}: {} lines, {} words | {}{}",
            claim.claim_id,
            claim.text.lines().count(),
            words,
            preview,
            ellipsis
        );
    }

    Ok(())
}
