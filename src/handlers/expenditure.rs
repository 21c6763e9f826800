use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::models::{
    parse_date, ApiResponse, CreateExpenditureRequest, ExpenditureFilters,
    ExpenditureListResponse, ExpenditureResponse, MealType, ParseSmsRequest, ParsedSms,
    ServiceError, UpdateExpenditureRequest,
};

use super::api::{service_error_to_response, ApiError, ApiState, AuthMember};

/// Query parameters for listing expenditures
#[derive(Debug, Deserialize)]
pub struct ListExpendituresQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub meal_type: Option<MealType>,
}

impl ListExpendituresQuery {
    fn into_filters(self) -> Result<ExpenditureFilters, ServiceError> {
        let mut filters = ExpenditureFilters {
            meal_type: self.meal_type,
            ..Default::default()
        };
        if let Some(value) = self.start_date {
            filters.start_date =
                Some(parse_date(&value).map_err(|_| ServiceError::InvalidDateFormat { value })?);
        }
        if let Some(value) = self.end_date {
            filters.end_date =
                Some(parse_date(&value).map_err(|_| ServiceError::InvalidDateFormat { value })?);
        }
        Ok(filters)
    }
}

/// Record a manual expenditure
#[instrument(name = "create_expenditure", skip(state, request), fields(
    member_id = %member.member_id,
    amount = %request.amount,
))]
pub async fn create(
    State(state): State<ApiState>,
    member: AuthMember,
    Json(request): Json<CreateExpenditureRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenditureResponse>>), ApiError> {
    info!("Creating expenditure");

    match state
        .expenditure_service
        .create(&member.member_id, request)
        .await
    {
        Ok(response) => Ok((StatusCode::CREATED, Json(ApiResponse::success(response)))),
        Err(err) => {
            error!("Failed to create expenditure: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Parse a card-authorization SMS without persisting anything
#[instrument(name = "parse_sms", skip(state, request), fields(member_id = %member.member_id))]
pub async fn parse_sms(
    State(state): State<ApiState>,
    member: AuthMember,
    Json(request): Json<ParseSmsRequest>,
) -> Result<Json<ApiResponse<ParsedSms>>, ApiError> {
    info!("Parsing card SMS");

    match state.expenditure_service.parse_sms(request).await {
        Ok(parsed) => Ok(Json(ApiResponse::success(parsed))),
        Err(err) => {
            error!("Failed to parse SMS: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// List the member's expenditures, newest first
#[instrument(name = "list_expenditures", skip(state, query), fields(member_id = %member.member_id))]
pub async fn list(
    State(state): State<ApiState>,
    member: AuthMember,
    Query(query): Query<ListExpendituresQuery>,
) -> Result<Json<ApiResponse<ExpenditureListResponse>>, ApiError> {
    info!("Listing expenditures");

    let filters = query.into_filters().map_err(service_error_to_response)?;

    match state
        .expenditure_service
        .list(&member.member_id, filters)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to list expenditures: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get one expenditure; only the owner may read it
#[instrument(name = "get_expenditure", skip(state), fields(
    member_id = %member.member_id,
    expenditure_id = %expenditure_id,
))]
pub async fn get(
    State(state): State<ApiState>,
    member: AuthMember,
    Path(expenditure_id): Path<String>,
) -> Result<Json<ApiResponse<ExpenditureResponse>>, ApiError> {
    match state
        .expenditure_service
        .get(&member.member_id, &expenditure_id)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to get expenditure: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Update the classification fields of an expenditure
#[instrument(name = "update_expenditure", skip(state, request), fields(
    member_id = %member.member_id,
    expenditure_id = %expenditure_id,
))]
pub async fn update(
    State(state): State<ApiState>,
    member: AuthMember,
    Path(expenditure_id): Path<String>,
    Json(request): Json<UpdateExpenditureRequest>,
) -> Result<Json<ApiResponse<ExpenditureResponse>>, ApiError> {
    info!("Updating expenditure");

    match state
        .expenditure_service
        .update(&member.member_id, &expenditure_id, request)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to update expenditure: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Soft-delete an expenditure; used budget amounts are not rolled back
#[instrument(name = "delete_expenditure", skip(state), fields(
    member_id = %member.member_id,
    expenditure_id = %expenditure_id,
))]
pub async fn delete(
    State(state): State<ApiState>,
    member: AuthMember,
    Path(expenditure_id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    info!("Deleting expenditure");

    match state
        .expenditure_service
        .delete(&member.member_id, &expenditure_id)
        .await
    {
        Ok(()) => Ok(Json(ApiResponse::success(Value::Null))),
        Err(err) => {
            error!("Failed to delete expenditure: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
