use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, info, instrument};

use crate::models::{
    AddressResponse, ApiResponse, MemberResponse, PolicyAgreement, PolicyAgreementRequest,
    RegisterAddressRequest, SetupBudgetRequest, SetupBudgetResponse, UpdateProfileRequest,
};

use super::api::{service_error_to_response, ApiError, ApiState, AuthMember};

/// Set the member's nickname
#[instrument(name = "update_profile", skip(state, request), fields(member_id = %member.member_id))]
pub async fn update_profile(
    State(state): State<ApiState>,
    member: AuthMember,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<MemberResponse>>, ApiError> {
    info!("Updating profile");

    match state
        .onboarding_service
        .update_profile(&member.member_id, request)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to update profile: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Register an address; the first one becomes the primary address
#[instrument(name = "register_address", skip(state, request), fields(member_id = %member.member_id))]
pub async fn register_address(
    State(state): State<ApiState>,
    member: AuthMember,
    Json(request): Json<RegisterAddressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AddressResponse>>), ApiError> {
    info!("Registering address");

    match state
        .onboarding_service
        .register_address(&member.member_id, request)
        .await
    {
        Ok(response) => Ok((StatusCode::CREATED, Json(ApiResponse::success(response)))),
        Err(err) => {
            error!("Failed to register address: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Create the initial budget plan for the rest of the current month
#[instrument(name = "setup_budget", skip(state, request), fields(member_id = %member.member_id))]
pub async fn setup_budget(
    State(state): State<ApiState>,
    member: AuthMember,
    Json(request): Json<SetupBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SetupBudgetResponse>>), ApiError> {
    info!("Setting up budget plan");

    match state
        .onboarding_service
        .setup_budget(&member.member_id, request)
        .await
    {
        Ok(response) => Ok((StatusCode::CREATED, Json(ApiResponse::success(response)))),
        Err(err) => {
            error!("Failed to set up budget plan: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Record policy agreements; all required policies must be agreed
#[instrument(name = "agree_policies", skip(state, request), fields(member_id = %member.member_id))]
pub async fn agree_policies(
    State(state): State<ApiState>,
    member: AuthMember,
    Json(request): Json<PolicyAgreementRequest>,
) -> Result<Json<ApiResponse<Vec<PolicyAgreement>>>, ApiError> {
    info!("Recording policy agreements");

    match state
        .onboarding_service
        .agree_policies(&member.member_id, request)
        .await
    {
        Ok(agreements) => Ok(Json(ApiResponse::success(agreements))),
        Err(err) => {
            error!("Failed to record agreements: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
