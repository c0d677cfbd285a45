// handlers/dashboard/expenses.rs - /dashboard/expenses[/:id]
use axum::extract::State;
use uuid::Uuid;

use crate::database::models::{Expense, ExpenseFilter, ExpenseInput};
use crate::error::ApiError;
use crate::middleware::extract::{Json, Path, Query};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /dashboard/expenses - optionally `?category=` and `?animal_id=`
pub async fn expense_list(State(state): State<AppState>, Query(filter): Query<ExpenseFilter>) -> ApiResult<Vec<Expense>> {
    let expenses = state.store.list_expenses(&filter).await?;
    Ok(ApiResponse::success(expenses))
}

pub async fn expense_get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Expense> {
    state
        .store
        .get_expense(id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("Expense {} not found", id)))
}

pub async fn expense_create(State(state): State<AppState>, Json(mut input): Json<ExpenseInput>) -> ApiResult<Expense> {
    input.validate()?;
    let expense = state.store.create_expense(&input).await?;
    Ok(ApiResponse::created(expense))
}

pub async fn expense_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut input): Json<ExpenseInput>,
) -> ApiResult<Expense> {
    input.validate()?;
    let expense = state.store.update_expense(id, &input).await?;
    Ok(ApiResponse::success(expense))
}

pub async fn expense_delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.store.delete_expense(id).await?;
    Ok(ApiResponse::no_content())
}
