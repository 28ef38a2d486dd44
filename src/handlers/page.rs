//! Server-rendered query page.

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::error::{GeoMeshError, Result};
use crate::models::Query;
use crate::service::{EMPTY_QUERY_MESSAGE, QueryReport};

pub const DEFAULT_LATITUDE: &str = "30.3753";
pub const DEFAULT_LONGITUDE: &str = "69.3451";

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub facility_count: usize,
    pub question: String,
    pub latitude: String,
    pub longitude: String,
    pub warning: Option<String>,
    pub report: Option<ReportView>,
}

/// Display-ready pieces of a [`QueryReport`].
pub struct ReportView {
    pub facility_name: String,
    pub location: String,
    pub distance: String,
    pub ai_text: String,
    pub ai_failed: bool,
    pub map_json: String,
}

impl ReportView {
    fn new(report: &QueryReport, map_json: String) -> Self {
        let [lat, lon] = report.facility.location();
        Self {
            facility_name: report.facility.name.clone(),
            location: format!("[{lat}, {lon}]"),
            distance: format!("{:.1} km", report.distance_km),
            ai_text: report.response.text().into_owned(),
            ai_failed: !report.response.is_success(),
            map_json,
        }
    }
}

impl IndexTemplate {
    fn new(facility_count: usize, question: String, latitude: String, longitude: String) -> Self {
        Self {
            title: "AI-Powered Geospatial Mesh Network",
            subtitle: "Connect With World without Internet",
            facility_count,
            question,
            latitude,
            longitude,
            warning: None,
            report: None,
        }
    }
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Response {
    let page = IndexTemplate::new(
        state.service.index().len(),
        String::new(),
        DEFAULT_LATITUDE.to_string(),
        DEFAULT_LONGITUDE.to_string(),
    );
    render(&page)
}

/// `POST /query`
pub async fn submit_query(State(state): State<AppState>, Form(form): Form<QueryForm>) -> Response {
    let mut page = IndexTemplate::new(
        state.service.index().len(),
        form.question.clone(),
        form.latitude.clone(),
        form.longitude.clone(),
    );

    match parse_form(&form) {
        Err(message) => page.warning = Some(message),
        Ok(query) => match state.service.answer(&query).await {
            Ok(report) => match build_view(&state, &report) {
                Ok(view) => page.report = Some(view),
                Err(e) => page.warning = Some(e.to_string()),
            },
            Err(GeoMeshError::Validation(message)) => page.warning = Some(message),
            Err(e) => page.warning = Some(e.to_string()),
        },
    }

    render(&page)
}

fn build_view(state: &AppState, report: &QueryReport) -> Result<ReportView> {
    let map_json = state.service.map_view(Some(report.position)).to_script_json()?;
    Ok(ReportView::new(report, map_json))
}

fn parse_form(form: &QueryForm) -> std::result::Result<Query, String> {
    if form.question.trim().is_empty() {
        return Err(EMPTY_QUERY_MESSAGE.to_string());
    }
    let latitude = parse_number(&form.latitude, "Latitude")?;
    let longitude = parse_number(&form.longitude, "Longitude")?;
    Ok(Query::new(form.question.clone(), latitude, longitude))
}

fn parse_number(raw: &str, label: &str) -> std::result::Result<f64, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("{label} must be a number, got '{raw}'."))
}

fn render(page: &IndexTemplate) -> Response {
    match page.render().map_err(GeoMeshError::from) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Page render failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
