// handlers/dashboard/sponsorships.rs - /dashboard/sponsorships[/:id]
use axum::extract::State;
use uuid::Uuid;

use crate::database::models::{Sponsorship, SponsorshipFilter, SponsorshipInput};
use crate::error::ApiError;
use crate::middleware::extract::{Json, Path, Query};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /dashboard/sponsorships - `?active=true` for current ones only
pub async fn sponsorship_list(
    State(state): State<AppState>,
    Query(filter): Query<SponsorshipFilter>,
) -> ApiResult<Vec<Sponsorship>> {
    let sponsorships = state.store.list_sponsorships(&filter).await?;
    Ok(ApiResponse::success(sponsorships))
}

pub async fn sponsorship_get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Sponsorship> {
    state
        .store
        .get_sponsorship(id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("Sponsorship {} not found", id)))
}

pub async fn sponsorship_create(
    State(state): State<AppState>,
    Json(mut input): Json<SponsorshipInput>,
) -> ApiResult<Sponsorship> {
    input.validate()?;
    let sponsorship = state.store.create_sponsorship(&input).await?;
    Ok(ApiResponse::created(sponsorship))
}

pub async fn sponsorship_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut input): Json<SponsorshipInput>,
) -> ApiResult<Sponsorship> {
    input.validate()?;
    let sponsorship = state.store.update_sponsorship(id, &input).await?;
    Ok(ApiResponse::success(sponsorship))
}

pub async fn sponsorship_delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.store.delete_sponsorship(id).await?;
    Ok(ApiResponse::no_content())
}
