use axum::{extract::State, response::Json};
use tracing::{error, info, instrument};

use crate::models::{ApiResponse, DashboardResponse};

use super::api::{service_error_to_response, ApiError, ApiState, AuthMember};

/// The home dashboard for the authenticated member
#[instrument(name = "home_dashboard", skip(state), fields(member_id = %member.member_id))]
pub async fn dashboard(
    State(state): State<ApiState>,
    member: AuthMember,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    info!("Getting home dashboard");

    match state.home_service.dashboard(&member.member_id).await {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to build dashboard: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
