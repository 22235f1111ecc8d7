//! Dashboard server
//!
//! Every request re-runs the assessment pipeline with the submitted inputs.
//! `/` renders the HTML dashboard, `/api/assessment` returns the same result
//! as JSON.

use crate::FireWatchError;
use crate::config::{DefaultsConfig, MAX_REGION_RADIUS_KM, MIN_REGION_RADIUS_KM, ServerConfig};
use crate::map::{escape_html, leaflet_head};
use crate::models::Timeframe;
use crate::pipeline::{Assessment, AssessmentRequest, AssessmentService};
use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const RADIUS_STEP_KM: u32 = 10;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AssessmentService>,
    pub defaults: DefaultsConfig,
}

/// Dashboard form fields, all optional
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub location: Option<String>,
    pub radius_km: Option<u32>,
    pub timeframe: Option<Timeframe>,
    /// Checkbox value, present when ticked
    pub dark: Option<String>,
    pub fire: Option<String>,
}

impl DashboardParams {
    fn into_request(self, defaults: &DefaultsConfig) -> AssessmentRequest {
        // an unticked checkbox is only distinguishable from a first visit by the other fields
        let submitted = self.location.is_some();
        AssessmentRequest {
            location: self
                .location
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| defaults.location.clone()),
            radius_km: self.radius_km.unwrap_or(defaults.region_radius_km),
            timeframe: self.timeframe.unwrap_or(defaults.timeframe),
            dark_mode: self.dark.is_some() || (defaults.dark_mode && !submitted),
            selected_fire: self.fire.filter(|f| !f.is_empty()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard))
        .route("/api/assessment", get(assessment))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        .with_state(state)
}

pub async fn run(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Dashboard running at http://{}", addr);
    axum::serve(listener, router(state))
        .await
        .context("Dashboard server failed")
}

fn status_for(error: &FireWatchError) -> StatusCode {
    match error {
        FireWatchError::Validation { .. } => StatusCode::BAD_REQUEST,
        FireWatchError::LocationNotFound { .. } => StatusCode::NOT_FOUND,
        FireWatchError::Geocoding { .. } | FireWatchError::RemoteSensing { .. } => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn assessment(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let request = params.into_request(&state.defaults);
    match state.service.assess(&request).await {
        Ok(assessment) => Json(assessment).into_response(),
        Err(e) => {
            warn!("Assessment failed: {}", e);
            (
                status_for(&e),
                Json(json!({ "error": e.user_message() })),
            )
                .into_response()
        }
    }
}

async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let request = params.into_request(&state.defaults);
    match state.service.assess(&request).await {
        Ok(assessment) => Html(render_dashboard(&request, Some(&assessment), None)).into_response(),
        Err(e) => {
            warn!("Assessment failed: {}", e);
            (
                status_for(&e),
                Html(render_dashboard(&request, None, Some(&e.user_message()))),
            )
                .into_response()
        }
    }
}

fn render_dashboard(
    request: &AssessmentRequest,
    assessment: Option<&Assessment>,
    error: Option<&str>,
) -> String {
    let mut sidebar = String::new();
    let _ = write!(
        sidebar,
        r#"<form method="get" action="/">
<h2>Location &amp; Filters</h2>
<label>Location <input type="text" name="location" value="{location}"></label>
<label>Region radius (km) <input type="number" id="radius-number" name="radius_km" min="{min}" max="{max}" step="{step}" value="{radius}"></label>
<input type="range" id="radius-slider" min="{min}" max="{max}" step="{step}" value="{radius}">
<fieldset><legend>Fire Alert Timeframe</legend>
"#,
        location = escape_html(&request.location),
        min = MIN_REGION_RADIUS_KM,
        max = MAX_REGION_RADIUS_KM,
        step = RADIUS_STEP_KM,
        radius = request.radius_km,
    );
    for timeframe in Timeframe::ALL {
        let checked = if timeframe == request.timeframe { " checked" } else { "" };
        let _ = writeln!(
            sidebar,
            r#"<label><input type="radio" name="timeframe" value="{}"{checked}> {}</label>"#,
            timeframe.slug(),
            timeframe.label()
        );
    }
    let dark_checked = if request.dark_mode { " checked" } else { "" };
    let _ = writeln!(
        sidebar,
        r#"</fieldset>
<label><input type="checkbox" name="dark"{dark_checked}> Dark Mode</label>"#
    );

    if let Some(assessment) = assessment.filter(|a| !a.fires.is_empty()) {
        sidebar.push_str("<label>Select Fire Location <select name=\"fire\" onchange=\"this.form.submit()\">\n");
        for label in assessment.fires.labels() {
            let selected = if assessment.selected_label.as_deref() == Some(label) {
                " selected"
            } else {
                ""
            };
            let label = escape_html(label);
            let _ = writeln!(sidebar, r#"<option value="{label}"{selected}>{label}</option>"#);
        }
        sidebar.push_str("</select></label>\n");
    }
    sidebar.push_str("<button type=\"submit\">Refresh</button>\n</form>\n");

    let mut main = String::new();
    if let Some(message) = error {
        let _ = writeln!(main, r#"<div class="error">{}</div>"#, escape_html(message));
    }

    if let Some(assessment) = assessment {
        match &assessment.weather {
            Some(weather) => {
                let _ = write!(
                    sidebar,
                    r#"<h2>Weather Conditions</h2>
<dl class="weather-metric">
<dt>Temperature</dt><dd>{}</dd>
<dt>Humidity</dt><dd>{}%</dd>
<dt>Wind Speed</dt><dd>{} m/s</dd>
<dt>Wind Direction</dt><dd>{}</dd>
</dl>
"#,
                    weather.format_temperature(),
                    weather.humidity,
                    weather.wind_speed,
                    weather.format_wind()
                );
            }
            None => sidebar.push_str("<div class=\"error\">No weather data</div>\n"),
        }

        if let Some(prediction) = &assessment.prediction {
            let _ = write!(
                main,
                r#"<h2>Wildfire Spread Prediction</h2>
<div class="success">Predicted Burned Area: {:.2} sq.km</div>
<div class="info">Spread Direction: {} ({}°)</div>
"#,
                prediction.burned_area_km2, prediction.spread.direction, prediction.spread.bearing_deg
            );
        }

        let _ = write!(
            main,
            "<h2>Wildfire Detection Map</h2>\n<p>{} fire points near {}</p>\n{}\n",
            assessment.fires.len(),
            escape_html(&assessment.location.display_name()),
            assessment.map.to_html_fragment("map")
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>FireWatch</title>
{head}
<style>
body {{ display: flex; margin: 0; font-family: sans-serif; }}
aside {{ width: 320px; padding: 1rem; }}
main {{ flex: 1; padding: 1rem; }}
label {{ display: block; margin: 0.5rem 0; }}
.error {{ color: #b00020; }}
.success {{ color: #1b5e20; font-weight: bold; }}
.weather-metric {{ font-size: 0.85rem; line-height: 1.2; }}
</style>
</head>
<body>
<aside>
{sidebar}</aside>
<main>
<h1>Global Wildfire Risk &amp; Real-Time Fire Alert System</h1>
{main}</main>
<script>
const number = document.getElementById("radius-number");
const slider = document.getElementById("radius-slider");
number.addEventListener("input", () => {{ slider.value = number.value; }});
slider.addEventListener("input", () => {{ number.value = slider.value; }});
</script>
</body>
</html>
"#,
        head = leaflet_head(),
    )
}
