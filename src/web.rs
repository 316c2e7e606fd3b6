//! Read-only results page
//!
//! Serves the emission table, the rendered chart and a JSON view of the
//! series. Everything is built from the in-memory results of the run.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::scenario::ScenarioResults;
use crate::sim::EmissionSeries;
use crate::CarbonError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub name: String,
    pub points: EmissionSeries,
}

/// Snapshot of a finished run as shown by the web view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub years: Vec<i32>,
    pub scenarios: Vec<SeriesView>,
    pub skipped: Vec<String>,
    #[serde(skip)]
    pub chart: Option<PathBuf>,
}

impl ResultsView {
    pub fn new(years: Vec<i32>, results: &ScenarioResults, chart: Option<PathBuf>) -> Self {
        Self {
            years,
            scenarios: results
                .runs
                .iter()
                .map(|run| SeriesView {
                    name: run.name.clone(),
                    points: run.series(),
                })
                .collect(),
            skipped: results.skipped.clone(),
            chart,
        }
    }
}

type SharedView = Arc<ResultsView>;

pub fn router(view: ResultsView) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/results", get(results_json))
        .route("/chart.png", get(chart_png))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(view))
}

pub async fn serve(addr: SocketAddr, view: ResultsView) -> Result<(), CarbonError> {
    let listener = TcpListener::bind(addr).await?;
    info!("results page: http://{}", listener.local_addr()?);
    axum::serve(listener, router(view)).await?;
    Ok(())
}

async fn index(State(view): State<SharedView>) -> Html<String> {
    Html(render_page(&view))
}

async fn results_json(State(view): State<SharedView>) -> Json<ResultsView> {
    Json(view.as_ref().clone())
}

async fn chart_png(State(view): State<SharedView>) -> Response {
    let Some(path) = view.chart.as_ref() else {
        return (StatusCode::NOT_FOUND, "chart was not rendered").into_response();
    };

    match tokio::fs::read(path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(err) => {
            warn!(path = %path.display(), "failed to read chart: {err}");
            (StatusCode::NOT_FOUND, "chart unavailable").into_response()
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn render_page(view: &ResultsView) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>City CO2 Emission Prediction</title>\n\
         <style>body{font-family:sans-serif;margin:2em}\
         table{border-collapse:collapse}\
         th,td{border:1px solid #999;padding:4px 10px;text-align:right}</style>\n\
         </head>\n<body>\n<h1>City CO2 Emission Prediction under Different Scenarios</h1>\n",
    );

    if view.chart.is_some() {
        html.push_str("<img src=\"/chart.png\" alt=\"Cumulative CO2 emission chart\">\n");
    }

    if view.scenarios.is_empty() {
        html.push_str("<p>No scenario produced results.</p>\n");
    } else {
        html.push_str("<table>\n<tr><th>Year</th>");
        for series in &view.scenarios {
            let _ = write!(html, "<th>{}</th>", escape_html(&series.name));
        }
        html.push_str("</tr>\n");

        for (idx, year) in view.years.iter().enumerate() {
            let _ = write!(html, "<tr><td>{year}</td>");
            for series in &view.scenarios {
                match series.points.get(idx) {
                    Some(point) => {
                        let _ = write!(html, "<td>{}</td>", point.cumulative_emission);
                    }
                    None => html.push_str("<td></td>"),
                }
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>\n");
    }

    if !view.skipped.is_empty() {
        let names: Vec<String> = view.skipped.iter().map(|name| escape_html(name)).collect();
        let _ = writeln!(html, "<p>Skipped (no adjustment data): {}</p>", names.join(", "));
    }

    html.push_str("</body>\n</html>\n");
    html
}
