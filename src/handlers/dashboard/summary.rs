// handlers/dashboard/summary.rs - GET /dashboard
use axum::extract::{Extension, State};
use serde::Serialize;

use crate::auth::Session;
use crate::database::DashboardSummary;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub user: Session,
    pub summary: DashboardSummary,
}

/// GET /dashboard - shelter totals for the signed-in staff member
pub async fn dashboard(State(state): State<AppState>, Extension(session): Extension<Session>) -> ApiResult<DashboardPage> {
    let summary = state.store.dashboard_summary().await?;
    Ok(ApiResponse::success(DashboardPage { user: session, summary }))
}
