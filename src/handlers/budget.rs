use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::models::{
    ApiResponse, DailyBudgetResponse, MonthlyBudgetResponse, UpdateDailyBudgetRequest,
    UpdateMonthlyBudgetRequest,
};

use super::api::{service_error_to_response, ApiError, ApiState, AuthMember};

/// Query parameters for the monthly budget lookup; defaults to the
/// current month when absent.
#[derive(Debug, Deserialize)]
pub struct MonthlyBudgetQuery {
    pub month: Option<String>,
}

/// Query parameters for the daily budget lookup; defaults to today.
#[derive(Debug, Deserialize)]
pub struct DailyBudgetQuery {
    pub date: Option<String>,
}

/// Get the monthly budget with remaining amount and utilization rate
#[instrument(name = "get_monthly_budget", skip(state), fields(member_id = %member.member_id))]
pub async fn get_monthly(
    State(state): State<ApiState>,
    member: AuthMember,
    Query(query): Query<MonthlyBudgetQuery>,
) -> Result<Json<ApiResponse<MonthlyBudgetResponse>>, ApiError> {
    info!("Getting monthly budget");

    let month = query
        .month
        .unwrap_or_else(|| Utc::now().date_naive().format("%Y-%m").to_string());

    match state
        .budget_service
        .get_monthly(&member.member_id, &month)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to get monthly budget: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Update the monthly budget amount
#[instrument(name = "update_monthly_budget", skip(state, request), fields(member_id = %member.member_id, month = %month))]
pub async fn update_monthly(
    State(state): State<ApiState>,
    member: AuthMember,
    Path(month): Path<String>,
    Json(request): Json<UpdateMonthlyBudgetRequest>,
) -> Result<Json<ApiResponse<MonthlyBudgetResponse>>, ApiError> {
    info!("Updating monthly budget");

    match state
        .budget_service
        .update_monthly(&member.member_id, &month, request)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to update monthly budget: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get the daily budget with its meal breakdown
#[instrument(name = "get_daily_budget", skip(state), fields(member_id = %member.member_id))]
pub async fn get_daily(
    State(state): State<ApiState>,
    member: AuthMember,
    Query(query): Query<DailyBudgetQuery>,
) -> Result<Json<ApiResponse<DailyBudgetResponse>>, ApiError> {
    info!("Getting daily budget");

    let date = query
        .date
        .unwrap_or_else(|| Utc::now().date_naive().format("%Y-%m-%d").to_string());

    match state
        .budget_service
        .get_daily(&member.member_id, &date)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to get daily budget: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Update the daily budget amount and its per-meal split
#[instrument(name = "update_daily_budget", skip(state, request), fields(member_id = %member.member_id, date = %date))]
pub async fn update_daily(
    State(state): State<ApiState>,
    member: AuthMember,
    Path(date): Path<String>,
    Json(request): Json<UpdateDailyBudgetRequest>,
) -> Result<Json<ApiResponse<DailyBudgetResponse>>, ApiError> {
    info!("Updating daily budget");

    match state
        .budget_service
        .update_daily(&member.member_id, &date, request)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to update daily budget: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
