use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{
    Inputs, MonthlyRecord, ProjectionError, YearMonth, monthly_rate, project, project_from,
    tick_positions,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const DEFAULT_HORIZON_MONTHS: u32 = 120;
const MAX_EXTRA_MULTIPLIER: f64 = 10.0;
const MAX_AMOUNT: f64 = 1.0e12;
const MAX_RATE_PERCENT: f64 = 100.0;
const LATEST_TARGET_YEAR: i32 = 2085;

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = 1000.0, help = "Current investment amount")]
    pub starting_balance: f64,
    #[arg(long, default_value_t = 100.0, help = "Monthly contribution")]
    pub monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Yearly increase of the monthly contribution in percent, applied each January"
    )]
    pub contribution_growth: f64,
    #[arg(long, default_value_t = 5.0, help = "Expected yearly return in percent")]
    pub expected_return: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Extra December contribution as a multiple of the monthly contribution (0-10)"
    )]
    pub extra_multiplier: f64,
    #[arg(long, help = "Last projected month as YYYY-MM; defaults to ten years out")]
    pub target_month: Option<YearMonth>,
}

#[derive(Debug, Clone)]
struct ProjectionRequest {
    inputs: Inputs,
    target: YearMonth,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    starting_balance: Option<f64>,
    monthly_contribution: Option<f64>,
    contribution_growth: Option<f64>,
    expected_return: Option<f64>,
    extra_multiplier: Option<f64>,
    target_month: Option<YearMonth>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    start_month: YearMonth,
    target_month: YearMonth,
    monthly_return_rate: Decimal,
    records: Vec<MonthlyRecord>,
    tick_positions: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_args() -> ProjectArgs {
    ProjectArgs {
        starting_balance: 1000.0,
        monthly_contribution: 100.0,
        contribution_growth: 2.0,
        expected_return: 5.0,
        extra_multiplier: 1.0,
        target_month: None,
    }
}

fn to_decimal(name: &str, value: f64, max: f64) -> Result<Decimal, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{name} must be a finite number >= 0"));
    }
    if value > max {
        return Err(format!("{name} must be between 0 and {max}"));
    }
    Decimal::from_f64(value).ok_or_else(|| format!("{name} is out of range"))
}

fn build_request(args: ProjectArgs, today: YearMonth) -> Result<ProjectionRequest, String> {
    let starting_balance =
        to_decimal("--starting-balance", args.starting_balance, MAX_AMOUNT)?;
    let base_monthly_contribution =
        to_decimal("--monthly-contribution", args.monthly_contribution, MAX_AMOUNT)?;
    let contribution_growth = to_decimal(
        "--contribution-growth",
        args.contribution_growth,
        MAX_RATE_PERCENT,
    )?;
    let expected_return =
        to_decimal("--expected-return", args.expected_return, MAX_RATE_PERCENT)?;
    let extra_multiplier =
        to_decimal("--extra-multiplier", args.extra_multiplier, MAX_EXTRA_MULTIPLIER)?;

    let target = args
        .target_month
        .unwrap_or_else(|| today.add_months(DEFAULT_HORIZON_MONTHS));
    if target.year() > LATEST_TARGET_YEAR {
        return Err(format!(
            "--target-month must be no later than {LATEST_TARGET_YEAR}-12"
        ));
    }

    Ok(ProjectionRequest {
        inputs: Inputs {
            starting_balance,
            base_monthly_contribution,
            annual_contribution_growth_rate: contribution_growth / Decimal::ONE_HUNDRED,
            annual_return_rate: expected_return / Decimal::ONE_HUNDRED,
            extra_contribution_multiplier: extra_multiplier,
        },
        target,
    })
}

fn request_from_payload(
    payload: ProjectPayload,
    today: YearMonth,
) -> Result<ProjectionRequest, String> {
    let mut args = default_args();

    if let Some(v) = payload.starting_balance {
        args.starting_balance = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.contribution_growth {
        args.contribution_growth = v;
    }
    if let Some(v) = payload.expected_return {
        args.expected_return = v;
    }
    if let Some(v) = payload.extra_multiplier {
        args.extra_multiplier = v;
    }
    if payload.target_month.is_some() {
        args.target_month = payload.target_month;
    }

    build_request(args, today)
}

fn build_response(
    request: &ProjectionRequest,
    start: YearMonth,
) -> Result<ProjectResponse, ProjectionError> {
    let records = project_from(&request.inputs, start, request.target)?;
    Ok(ProjectResponse {
        start_month: start,
        target_month: request.target,
        monthly_return_rate: monthly_rate(request.inputs.annual_return_rate)?,
        tick_positions: tick_positions(records.len()),
        records,
    })
}

/// Runs a projection for the command line and renders it as a table, or as
/// JSON when `json` is set.
pub fn render_projection(args: ProjectArgs, json: bool) -> Result<String, String> {
    let request = build_request(args, YearMonth::current())?;
    let records = project(&request.inputs, request.target).map_err(|e| e.to_string())?;

    if json {
        return serde_json::to_string_pretty(&records).map_err(|e| e.to_string());
    }
    Ok(records_table(&records).to_string())
}

fn records_table(records: &[MonthlyRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Date",
        "Balance",
        "Contributions",
        "Interest Earned",
        "Total Contributions",
    ]);
    for record in records {
        table.add_row(vec![
            record.period.to_string(),
            format!("{:.2}", record.balance),
            format!("{:.2}", record.contribution),
            format!("{:.2}", record.interest_earned),
            format!("{:.2}", record.cumulative_contribution),
        ]);
    }
    table
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Projection HTTP API listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, router()).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let today = YearMonth::current();
    let request = match request_from_payload(payload, today) {
        Ok(request) => request,
        Err(msg) => {
            tracing::warn!(error = %msg, "rejected projection request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };
    tracing::debug!(start = %today, target = %request.target, "running projection");

    match build_response(&request, today) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => {
            tracing::warn!(error = %err, "projection failed");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn request_from_json(json: &str, today: YearMonth) -> Result<ProjectionRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    request_from_payload(payload, today)
}
