use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use nestegg::api::{MonteCarloPayload, build_monte_carlo_response, run_http_server, validate_input};
use nestegg::config::ServerConfig;
use nestegg::core::{CancellationFlag, ProjectionInput, project, simulate, summarize};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    version,
    about = "Retirement nest egg projections and Monte Carlo inflation simulations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API.
    Serve(ServerConfig),
    /// Print the deterministic year-by-year projection.
    Project(ProjectArgs),
    /// Print Monte Carlo percentile bands per year.
    MonteCarlo(MonteCarloArgs),
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// JSON input file in the calculator's camelCase shape, or '-' for stdin.
    #[arg(long)]
    input: PathBuf,
    /// Print final balance, peak balance and total withdrawals instead of rows.
    #[arg(long)]
    summary: bool,
}

#[derive(Args, Debug)]
struct MonteCarloArgs {
    /// JSON input file in the calculator's camelCase shape, or '-' for stdin.
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value_t = 500)]
    iterations: u32,
    #[arg(long, help = "Base seed; a random one is drawn and reported when omitted")]
    seed: Option<u64>,
    #[arg(long, help = "Calendar year to histogram")]
    histogram_year: Option<i32>,
    #[arg(long)]
    histogram_bins: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Serve(config) => run_http_server(config)
            .await
            .context("HTTP server failed"),
        Command::Project(args) => {
            let input = read_input(&args.input)?;
            if let Err(msg) = validate_input(&input) {
                bail!(msg);
            }
            let rows = project(&input);
            if args.summary {
                print_json(&summarize(&rows))
            } else {
                print_json(&rows)
            }
        }
        Command::MonteCarlo(args) => {
            let input = read_input(&args.input)?;
            let payload = MonteCarloPayload {
                input,
                iterations: Some(args.iterations),
                seed: args.seed,
                histogram_year: args.histogram_year,
                histogram_bins: args.histogram_bins,
            };
            let request = match payload.into_request(&ServerConfig::default()) {
                Ok(request) => request,
                Err(msg) => bail!(msg),
            };
            let result = simulate(&request.input, &request.config, &CancellationFlag::new())?;
            print_json(&build_monte_carlo_response(result, request.histogram))
        }
    }
}

fn read_input(path: &Path) -> Result<ProjectionInput> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read input from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).context("input is not a valid projection input")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}
