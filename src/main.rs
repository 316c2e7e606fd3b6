use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use urban_carbon::io::{load_parameters_or_default, PARAMETERS_FILE_NAME};
use urban_carbon::output::{create_timestamped_run_dir, export_results};
use urban_carbon::web::{self, ResultsView};
use urban_carbon::{reference_scenarios, run_scenarios, SimConfig};

#[derive(Debug, Parser)]
#[command(author, version, about = "City CO2 emission projection under policy scenarios")]
struct Cli {
    /// Model parameter table; defaults are used when the file is missing
    #[arg(long, default_value = PARAMETERS_FILE_NAME)]
    params: PathBuf,

    /// Directory holding the scenario adjustment tables
    #[arg(long, default_value = ".")]
    inputs: PathBuf,

    /// Output base directory; each run gets a timestamped subdirectory
    #[arg(long, default_value = "output-urban-carbon")]
    output: PathBuf,

    /// Number of simulated years
    #[arg(long)]
    time_steps: Option<usize>,

    /// Step size used in the rate arithmetic [years]
    #[arg(long)]
    dt: Option<f64>,

    /// Address for the results page
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Do not serve the results page even if the parameters enable it
    #[arg(long, default_value_t = false)]
    no_serve: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "urban_carbon=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let params = load_parameters_or_default(&cli.params)
        .with_context(|| format!("failed to load {}", cli.params.display()))?;
    let mut options = params.output_options();
    if cli.no_serve {
        options.serve_view = false;
    }

    let mut config = SimConfig::default();
    if let Some(v) = cli.time_steps {
        config.time_steps = v;
    }
    if let Some(v) = cli.dt {
        config.dt = v;
    }
    config.validate_for(params.start_year)?;

    let scenarios = reference_scenarios(&cli.inputs);
    let results = run_scenarios(&params, &scenarios, &config)
        .context("failed to load scenario adjustments")?;

    let run_dir = create_timestamped_run_dir(&cli.output)
        .with_context(|| format!("failed to create run directory under {}", cli.output.display()))?;
    let files = export_results(&run_dir, &params, options, &config, &results)?;

    println!(
        "Simulation complete. Scenarios: {} | Skipped: {} | Years: {}",
        results.len(),
        results.skipped.len(),
        config.time_steps
    );
    for run in &results.runs {
        if let Some(last) = run.final_point() {
            println!(
                "{}: cumulative CO2 by {} = {:.3e} t",
                run.name, last.year, last.cumulative_emission
            );
        }
    }
    println!("Run directory: {}", files.output_dir.display());
    if let Some(path) = &files.results_csv {
        println!("CSV: {}", path.display());
    }
    if let Some(path) = &files.chart {
        println!("Chart: {}", path.display());
    }
    println!("Summary: {}", files.summary.display());

    if options.serve_view {
        let view = ResultsView::new(config.years(params.start_year), &results, files.chart.clone());
        let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
        runtime
            .block_on(web::serve(cli.bind, view))
            .with_context(|| format!("results page failed on {}", cli.bind))?;
    }

    Ok(())
}
