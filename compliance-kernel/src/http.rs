/**
 * API REST COMPLIANCE - Serveur HTTP du kernel
 *
 * RÔLE :
 * Expose les vues dérivées du parc (dashboard, appareils, politiques, rapports)
 * et les actions administratives simulées au format JSON.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum avec middleware auth API key
 * - Routes : /health, /system, /dashboard, /devices, /policies, /alerts,
 *   /insights, /reports, /actions, /notifications
 * - Lecture seule sur le dataset : les actions produisent une notification, rien d'autre
 *
 * SÉCURITÉ :
 * - Header x-api-key obligatoire sur toutes routes sauf /health
 * - Sans COMPLIANCE_API_KEY configurée, tout accès est refusé
 */

use crate::health::{HealthTracker, KernelHealth};
use crate::notifications::NotificationHub;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use compliance_core::aggregator::{
    compliance_chart, featured_insights, install_breakdown, ChartSlice, DeviceDetail, InstallBreakdown,
};
use compliance_core::{
    simulate, ActionError, ActionRequest, Alert, AppInstallStatus, Application, ComplianceAggregator,
    DashboardSummary, Device, DeviceFilter, Insight, Notification, Policy, PolicyFilter,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

const FEATURED_INSIGHTS: usize = 3;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: ComplianceAggregator,
    pub notifications: NotificationHub,
    pub health_tracker: HealthTracker,
    pub api_key: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
}

impl From<ActionError> for ApiError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::AlreadyResolved(_) | ActionError::NothingToRemediate { .. } => {
                ApiError::Conflict(err.to_string())
            }
            ActionError::DeviceNotFound(_)
            | ActionError::PolicyNotFound(_)
            | ActionError::AlertNotFound(_)
            | ActionError::InsightNotFound(_) => ApiError::NotFound(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        };
        (code, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardView {
    summary: DashboardSummary,
    compliance_chart: Vec<ChartSlice>,
    insights: Vec<Insight>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationReport {
    application: Application,
    install_statuses: Vec<AppInstallStatus>,
    breakdown: InstallBreakdown,
}

#[derive(Debug, Deserialize)]
struct TopParams { n: Option<usize> }

#[derive(Debug, Deserialize)]
struct SearchParams { search: Option<String> }

#[derive(Debug, Deserialize)]
struct LimitParams { limit: Option<usize> }

async fn require_api_key(State(app): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    // Health check toujours accessible
    if req.uri().path().starts_with("/health") {
        return Ok(next.run(req).await);
    }

    let Some(expected) = app.api_key.as_deref() else {
        warn!("SECURITY: COMPLIANCE_API_KEY not set - API access denied");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let ok = req.headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !ok {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/dashboard", get(get_dashboard))
        .route("/devices", get(list_devices))
        .route("/devices/{id}", get(get_device))
        .route("/policies", get(list_policies))
        .route("/policies/top", get(top_policies))
        .route("/alerts", get(list_alerts))
        .route("/insights", get(list_insights))
        .route("/reports/applications", get(list_applications))
        .route("/reports/applications/{id}", get(get_application_report))
        .route("/actions", post(run_action))
        .route("/notifications", get(list_notifications))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_api_key))
        .with_state(app_state)
}

// GET /system/health (état du kernel)
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health(&app.aggregator, &app.notifications))
}

// GET /dashboard (cartes + graphique + insights)
async fn get_dashboard(State(app): State<AppState>) -> Json<DashboardView> {
    let summary = app.aggregator.summary();
    let compliance_chart = compliance_chart(&summary.device_stats);
    let insights = featured_insights(&app.aggregator.dataset().insights, FEATURED_INSIGHTS).to_vec();
    Json(DashboardView { summary, compliance_chart, insights })
}

// GET /devices?search=&status=&type=&os=
async fn list_devices(State(app): State<AppState>, Query(filter): Query<DeviceFilter>) -> Json<Vec<Device>> {
    Json(app.aggregator.devices(&filter).into_iter().cloned().collect())
}

// GET /devices/{id} (détail + politiques + alertes)
async fn get_device(State(app): State<AppState>, Path(id): Path<String>) -> Result<Json<DeviceDetail>, ApiError> {
    app.aggregator
        .device_detail(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Device not found: {id}")))
}

// GET /policies?search=&type=
async fn list_policies(State(app): State<AppState>, Query(filter): Query<PolicyFilter>) -> Json<Vec<Policy>> {
    Json(app.aggregator.policies(&filter).into_iter().cloned().collect())
}

// GET /policies/top?n=
async fn top_policies(State(app): State<AppState>, Query(params): Query<TopParams>) -> Json<Vec<Policy>> {
    let n = params.n.unwrap_or(app.aggregator.options().top_policies);
    Json(app.aggregator.top_policies(n).into_iter().cloned().collect())
}

async fn list_alerts(State(app): State<AppState>) -> Json<Vec<Alert>> {
    Json(app.aggregator.dataset().alerts.clone())
}

async fn list_insights(State(app): State<AppState>) -> Json<Vec<Insight>> {
    Json(app.aggregator.dataset().insights.clone())
}

// GET /reports/applications?search=
async fn list_applications(
    State(app): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Application>> {
    Json(app.aggregator.applications(params.search.as_deref()).into_iter().cloned().collect())
}

// GET /reports/applications/{id} (statut d'installation par appareil)
async fn get_application_report(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationReport>, ApiError> {
    let application = app
        .aggregator
        .application(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Application not found: {id}")))?;
    let statuses = app.aggregator.install_statuses(&id);
    let breakdown = install_breakdown(statuses.iter().copied());

    Ok(Json(ApplicationReport {
        application: application.clone(),
        install_statuses: statuses.into_iter().cloned().collect(),
        breakdown,
    }))
}

// POST /actions (action simulée => notification)
async fn run_action(
    State(app): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let notification = simulate(app.aggregator.dataset(), &request)?;
    app.notifications.dispatch(notification.clone());
    Ok((StatusCode::ACCEPTED, Json(notification)))
}

// GET /notifications?limit=
async fn list_notifications(
    State(app): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<Notification>> {
    Json(app.notifications.recent(params.limit.unwrap_or(20)))
}
