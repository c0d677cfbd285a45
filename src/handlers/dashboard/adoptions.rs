// handlers/dashboard/adoptions.rs - /dashboard/adoptions[/:id[/status]]
use axum::extract::State;
use uuid::Uuid;

use crate::database::models::{AdoptionFilter, AdoptionRequest, AdoptionRequestInput, AdoptionReview};
use crate::error::ApiError;
use crate::middleware::extract::{Json, Path, Query};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /dashboard/adoptions - optionally `?status=` and `?animal_id=`
pub async fn adoption_list(
    State(state): State<AppState>,
    Query(filter): Query<AdoptionFilter>,
) -> ApiResult<Vec<AdoptionRequest>> {
    let requests = state.store.list_adoption_requests(&filter).await?;
    Ok(ApiResponse::success(requests))
}

/// GET /dashboard/adoptions/:id
pub async fn adoption_get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<AdoptionRequest> {
    state
        .store
        .get_adoption_request(id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("Adoption request {} not found", id)))
}

/// POST /dashboard/adoptions - record an application for an animal
pub async fn adoption_create(
    State(state): State<AppState>,
    Json(mut input): Json<AdoptionRequestInput>,
) -> ApiResult<AdoptionRequest> {
    input.validate()?;

    // Missing animal is 400, adopted animal is 409; both checked under the store's lock
    let request = state.store.create_adoption_request(&input).await?;
    Ok(ApiResponse::created(request))
}

/// PUT /dashboard/adoptions/:id/status - approve, reject or withdraw a pending request
pub async fn adoption_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(review): Json<AdoptionReview>,
) -> ApiResult<AdoptionRequest> {
    let request = state.store.review_adoption_request(id, review.status).await?;
    Ok(ApiResponse::success(request))
}

/// DELETE /dashboard/adoptions/:id
pub async fn adoption_delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.store.delete_adoption_request(id).await?;
    Ok(ApiResponse::no_content())
}
