use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::Writer;
use plotters::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::io::csv_error;
use crate::params::{ModelParameters, OutputOptions};
use crate::scenario::ScenarioResults;
use crate::sim::{SimConfig, StepRecord};
use crate::CarbonError;

pub const RESULTS_CSV_NAME: &str = "carbon_emission_results.csv";
pub const TRAJECTORIES_CSV_NAME: &str = "scenario_trajectories.csv";
pub const CHART_NAME: &str = "carbon_emission_results.png";
pub const SUMMARY_NAME: &str = "summary.json";

const CHART_SIZE: (u32, u32) = (1200, 800);
const CHART_TITLE: &str = "City CO2 Emission Prediction under Different Scenarios";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputFiles {
    pub output_dir: PathBuf,
    pub results_csv: Option<PathBuf>,
    pub trajectories_csv: Option<PathBuf>,
    pub chart: Option<PathBuf>,
    pub summary: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub final_year: Option<i32>,
    pub final_cumulative_emission: Option<f64>,
    pub peak_annual_emission: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub parameters: ModelParameters,
    pub options: OutputOptions,
    pub sim: SimConfig,
    pub scenarios: Vec<ScenarioSummary>,
    pub skipped: Vec<String>,
    pub outputs: OutputFiles,
}

impl RunSummary {
    pub fn new(
        params: &ModelParameters,
        options: OutputOptions,
        config: &SimConfig,
        results: &ScenarioResults,
        outputs: OutputFiles,
    ) -> Self {
        let scenarios = results
            .runs
            .iter()
            .map(|run| {
                let last = run.final_point();
                ScenarioSummary {
                    name: run.name.clone(),
                    final_year: last.map(|p| p.year),
                    final_cumulative_emission: last.map(|p| p.cumulative_emission),
                    peak_annual_emission: run
                        .records
                        .iter()
                        .map(|r| r.annual_emission)
                        .reduce(f64::max),
                }
            })
            .collect();

        Self {
            generated_at: Utc::now().to_rfc3339(),
            parameters: *params,
            options,
            sim: *config,
            scenarios,
            skipped: results.skipped.clone(),
            outputs,
        }
    }
}

/// Create a fresh `<base>/<UTC timestamp>` directory, suffixing on collision.
pub fn create_timestamped_run_dir(base: &Path) -> Result<PathBuf, CarbonError> {
    fs::create_dir_all(base)?;

    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let mut run_dir = base.join(&timestamp);
    let mut counter = 1_u32;

    while run_dir.exists() {
        run_dir = base.join(format!("{timestamp}-{counter:02}"));
        counter += 1;
    }

    fs::create_dir_all(&run_dir)?;
    Ok(run_dir)
}

fn ensure_len(context: &str, expected: usize, got: usize) -> Result<(), CarbonError> {
    if expected == got {
        return Ok(());
    }

    Err(CarbonError::LengthMismatch {
        context: context.to_string(),
        expected,
        got,
    })
}

fn plot_error<E: std::fmt::Display>(err: E) -> CarbonError {
    CarbonError::Plot(err.to_string())
}

/// Wide results table: `Year` followed by one column per simulated scenario.
pub fn write_results_csv(
    path: &Path,
    years: &[i32],
    results: &ScenarioResults,
) -> Result<(), CarbonError> {
    for run in &results.runs {
        ensure_len(&run.name, years.len(), run.records.len())?;
    }

    let write = || -> Result<(), csv::Error> {
        let mut writer = Writer::from_path(path)?;

        let mut header = vec!["Year".to_string()];
        header.extend(results.names().map(str::to_string));
        writer.write_record(&header)?;

        for (idx, year) in years.iter().enumerate() {
            let mut record = vec![year.to_string()];
            record.extend(
                results
                    .runs
                    .iter()
                    .map(|run| run.records[idx].cumulative_emission.to_string()),
            );
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    };

    write().map_err(csv_error(path))
}

/// One row of the trajectories table
#[derive(Debug, Serialize)]
struct TrajectoryRow<'a> {
    scenario: &'a str,
    year: i32,
    population: f64,
    gdp_per_capita: f64,
    energy_intensity: f64,
    fossil_fuel_ratio: f64,
    population_growth_rate: f64,
    gdp_growth_rate: f64,
    energy_intensity_decrease_rate: f64,
    fossil_fuel_decrease_rate: f64,
    gdp: f64,
    energy_consumption: f64,
    fossil_fuel_consumption: f64,
    annual_emission: f64,
    cumulative_emission: f64,
}

impl<'a> TrajectoryRow<'a> {
    fn new(scenario: &'a str, record: &StepRecord) -> Self {
        Self {
            scenario,
            year: record.year,
            population: record.population,
            gdp_per_capita: record.gdp_per_capita,
            energy_intensity: record.energy_intensity,
            fossil_fuel_ratio: record.fossil_fuel_ratio,
            population_growth_rate: record.population_growth_rate,
            gdp_growth_rate: record.gdp_growth_rate,
            energy_intensity_decrease_rate: record.energy_intensity_decrease_rate,
            fossil_fuel_decrease_rate: record.fossil_fuel_decrease_rate,
            gdp: record.gdp,
            energy_consumption: record.energy_consumption,
            fossil_fuel_consumption: record.fossil_fuel_consumption,
            annual_emission: record.annual_emission,
            cumulative_emission: record.cumulative_emission,
        }
    }
}

/// Long-form table with every state variable, one row per scenario and year.
pub fn write_trajectories_csv(path: &Path, results: &ScenarioResults) -> Result<(), CarbonError> {
    let write = || -> Result<(), csv::Error> {
        let mut writer = Writer::from_path(path)?;

        for run in &results.runs {
            for record in &run.records {
                writer.serialize(TrajectoryRow::new(&run.name, record))?;
            }
        }

        writer.flush()?;
        Ok(())
    };

    write().map_err(csv_error(path))
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), CarbonError> {
    let data = serde_json::to_string_pretty(summary)?;
    fs::write(path, data)?;
    Ok(())
}

fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    if !span.is_finite() {
        return (min, max);
    }
    if span.abs() < f64::EPSILON * max.abs().max(1.0) {
        return (min - 1.0, max + 1.0);
    }
    let padded = max + span * 0.05;
    if padded.is_finite() {
        (min, padded)
    } else {
        (min, max)
    }
}

pub fn render_chart(path: &Path, years: &[i32], results: &ScenarioResults) -> Result<(), CarbonError> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let x_min = years.first().copied().unwrap_or(0);
    let x_max = years
        .last()
        .copied()
        .unwrap_or(x_min)
        .max(x_min.saturating_add(1));

    let values = results
        .runs
        .iter()
        .flat_map(|run| run.records.iter().map(|r| r.cumulative_emission))
        .filter(|v| v.is_finite());
    let (y_min, y_max) = values.fold((0.0_f64, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (y_min, y_max) = padded_range(y_min, y_max.max(y_min));

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 30).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(110)
        .build_cartesian_2d(f64::from(x_min)..f64::from(x_max), y_min..y_max)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("CO2 Emission (tons)")
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.3e}"))
        .draw()
        .map_err(plot_error)?;

    for (idx, run) in results.runs.iter().enumerate() {
        let color = Palette99::pick(idx);
        chart
            .draw_series(LineSeries::new(
                run.records
                    .iter()
                    .filter(|r| r.cumulative_emission.is_finite())
                    .map(|r| (f64::from(r.year), r.cumulative_emission)),
                color.stroke_width(2),
            ))
            .map_err(plot_error)?
            .label(run.name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 25, y)], Palette99::pick(idx).stroke_width(3))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Write every output enabled by `options` into `run_dir`.
///
/// The summary is always written; table and chart follow their options.
pub fn export_results(
    run_dir: &Path,
    params: &ModelParameters,
    options: OutputOptions,
    config: &SimConfig,
    results: &ScenarioResults,
) -> Result<OutputFiles, CarbonError> {
    fs::create_dir_all(run_dir)?;
    let years = config.years(params.start_year);

    let mut files = OutputFiles {
        output_dir: run_dir.to_path_buf(),
        summary: run_dir.join(SUMMARY_NAME),
        ..OutputFiles::default()
    };

    if options.emit_table {
        let results_csv = run_dir.join(RESULTS_CSV_NAME);
        write_results_csv(&results_csv, &years, results)?;
        info!(path = %results_csv.display(), "wrote results table");

        let trajectories_csv = run_dir.join(TRAJECTORIES_CSV_NAME);
        write_trajectories_csv(&trajectories_csv, results)?;
        info!(path = %trajectories_csv.display(), "wrote scenario trajectories");

        files.results_csv = Some(results_csv);
        files.trajectories_csv = Some(trajectories_csv);
    }

    if options.render_chart {
        let chart = run_dir.join(CHART_NAME);
        render_chart(&chart, &years, results)?;
        info!(path = %chart.display(), "rendered emission chart");
        files.chart = Some(chart);
    }

    let summary = RunSummary::new(params, options, config, results, files.clone());
    write_summary(&files.summary, &summary)?;
    info!(path = %files.summary.display(), "wrote run summary");

    Ok(files)
}
