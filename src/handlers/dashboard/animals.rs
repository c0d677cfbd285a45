// handlers/dashboard/animals.rs - /dashboard/animals[/:id]
use axum::extract::State;
use uuid::Uuid;

use crate::database::models::{Animal, AnimalFilter, AnimalInput};
use crate::error::ApiError;
use crate::middleware::extract::{Json, Path, Query};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /dashboard/animals - all animals, optionally `?status=`
pub async fn animal_list(State(state): State<AppState>, Query(filter): Query<AnimalFilter>) -> ApiResult<Vec<Animal>> {
    let animals = state.store.list_animals(&filter).await?;
    Ok(ApiResponse::success(animals))
}

/// GET /dashboard/animals/:id
pub async fn animal_get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Animal> {
    state
        .store
        .get_animal(id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("Animal {} not found", id)))
}

/// POST /dashboard/animals - intake a new animal
pub async fn animal_create(State(state): State<AppState>, Json(mut input): Json<AnimalInput>) -> ApiResult<Animal> {
    input.validate()?;
    let animal = state.store.create_animal(&input).await?;
    Ok(ApiResponse::created(animal))
}

/// PUT /dashboard/animals/:id - replace an animal record
pub async fn animal_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut input): Json<AnimalInput>,
) -> ApiResult<Animal> {
    input.validate()?;
    let animal = state.store.update_animal(id, &input).await?;
    Ok(ApiResponse::success(animal))
}

/// DELETE /dashboard/animals/:id - also removes its adoption requests and sponsorships
pub async fn animal_delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.store.delete_animal(id).await?;
    Ok(ApiResponse::no_content())
}
