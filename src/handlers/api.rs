use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::Value;
use std::sync::Arc;

use crate::models::{ApiResponse, ServiceError};
use crate::services::{
    AuthService, BudgetService, CartService, CatalogService, ExpenditureService, HomeService,
    OnboardingService,
};

use super::{auth, budget, cart, catalog, expenditure, home, onboarding};

/// Shared application state containing all services
#[derive(Clone)]
pub struct ApiState {
    pub auth_service: Arc<AuthService>,
    pub onboarding_service: Arc<OnboardingService>,
    pub budget_service: Arc<BudgetService>,
    pub cart_service: Arc<CartService>,
    pub catalog_service: Arc<CatalogService>,
    pub expenditure_service: Arc<ExpenditureService>,
    pub home_service: Arc<HomeService>,
}

/// Error half of every handler result: status code plus the error envelope
pub type ApiError = (StatusCode, Json<ApiResponse<Value>>);

/// Map a service error onto its HTTP status and response envelope
pub fn service_error_to_response(err: ServiceError) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiResponse::from_service_error(&err)))
}

/// Authenticated member extracted from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct AuthMember {
    pub member_id: String,
}

#[async_trait]
impl FromRequestParts<ApiState> for AuthMember {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| service_error_to_response(ServiceError::InvalidToken))?;

        let member_id = state
            .auth_service
            .verify_token(token)
            .map_err(service_error_to_response)?;

        Ok(AuthMember { member_id })
    }
}

/// Create the API router with all versioned endpoints
pub fn create_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/onboarding/profile", post(onboarding::update_profile))
        .route(
            "/api/v1/onboarding/address",
            post(onboarding::register_address),
        )
        .route("/api/v1/onboarding/budget", post(onboarding::setup_budget))
        .route(
            "/api/v1/onboarding/policy-agreement",
            post(onboarding::agree_policies),
        )
        .route("/api/v1/budgets/monthly", get(budget::get_monthly))
        .route("/api/v1/budgets/monthly/:month", put(budget::update_monthly))
        .route("/api/v1/budgets/daily", get(budget::get_daily))
        .route("/api/v1/budgets/daily/:date", put(budget::update_daily))
        .route("/api/v1/cart", get(cart::get_carts))
        .route("/api/v1/cart/items", post(cart::add_item))
        .route(
            "/api/v1/cart/items/:food_id",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/api/v1/cart/checkout", post(cart::checkout))
        .route(
            "/api/v1/expenditures",
            post(expenditure::create).get(expenditure::list),
        )
        .route(
            "/api/v1/expenditures/parse-sms",
            post(expenditure::parse_sms),
        )
        .route(
            "/api/v1/expenditures/:expenditure_id",
            get(expenditure::get)
                .put(expenditure::update)
                .delete(expenditure::delete),
        )
        .route("/api/v1/foods", get(catalog::list_foods))
        .route("/api/v1/foods/:food_id", get(catalog::get_food))
        .route("/api/v1/stores", get(catalog::list_stores))
        .route("/api/v1/stores/:store_id", get(catalog::get_store))
        .route("/api/v1/home/dashboard", get(home::dashboard))
        .with_state(state)
}
