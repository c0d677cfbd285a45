// handlers/dashboard/donations.rs - /dashboard/donations[/:id]
use axum::extract::State;
use uuid::Uuid;

use crate::database::models::{Donation, DonationInput};
use crate::error::ApiError;
use crate::middleware::extract::{Json, Path};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub async fn donation_list(State(state): State<AppState>) -> ApiResult<Vec<Donation>> {
    let donations = state.store.list_donations().await?;
    Ok(ApiResponse::success(donations))
}

pub async fn donation_get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Donation> {
    state
        .store
        .get_donation(id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("Donation {} not found", id)))
}

pub async fn donation_create(State(state): State<AppState>, Json(mut input): Json<DonationInput>) -> ApiResult<Donation> {
    input.validate()?;
    let donation = state.store.create_donation(&input).await?;
    Ok(ApiResponse::created(donation))
}

pub async fn donation_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut input): Json<DonationInput>,
) -> ApiResult<Donation> {
    input.validate()?;
    let donation = state.store.update_donation(id, &input).await?;
    Ok(ApiResponse::success(donation))
}

pub async fn donation_delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.store.delete_donation(id).await?;
    Ok(ApiResponse::no_content())
}
