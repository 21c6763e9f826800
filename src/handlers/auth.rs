use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, info, instrument};

use crate::models::{ApiResponse, LoginRequest, SignupRequest, TokenResponse};

use super::api::{service_error_to_response, ApiError, ApiState};

/// Register a new member and return their first token
#[instrument(name = "signup", skip(state, request), fields(email = %request.email))]
pub async fn signup(
    State(state): State<ApiState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    info!("Processing signup");

    match state.auth_service.signup(request).await {
        Ok(token) => Ok((StatusCode::CREATED, Json(ApiResponse::success(token)))),
        Err(err) => {
            error!("Signup failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Exchange email and password for a token
#[instrument(name = "login", skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<ApiState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    info!("Processing login");

    match state.auth_service.login(request).await {
        Ok(token) => Ok(Json(ApiResponse::success(token))),
        Err(err) => {
            error!("Login failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
