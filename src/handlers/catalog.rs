use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use tracing::{error, info, instrument};

use crate::models::{
    ApiResponse, CatalogFilters, Food, FoodListResponse, Store, StoreListResponse,
};

use super::api::{service_error_to_response, ApiError, ApiState, AuthMember};

/// List foods matching the name/category filters
#[instrument(name = "list_foods", skip(state), fields(member_id = %member.member_id))]
pub async fn list_foods(
    State(state): State<ApiState>,
    member: AuthMember,
    Query(filters): Query<CatalogFilters>,
) -> Result<Json<ApiResponse<FoodListResponse>>, ApiError> {
    info!("Listing foods");

    match state.catalog_service.list_foods(filters).await {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to list foods: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get one food by id
#[instrument(name = "get_food", skip(state), fields(member_id = %member.member_id, food_id = %food_id))]
pub async fn get_food(
    State(state): State<ApiState>,
    member: AuthMember,
    Path(food_id): Path<String>,
) -> Result<Json<ApiResponse<Food>>, ApiError> {
    match state.catalog_service.get_food(&food_id).await {
        Ok(food) => Ok(Json(ApiResponse::success(food))),
        Err(err) => {
            error!("Failed to get food: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// List stores matching the name/category filters
#[instrument(name = "list_stores", skip(state), fields(member_id = %member.member_id))]
pub async fn list_stores(
    State(state): State<ApiState>,
    member: AuthMember,
    Query(filters): Query<CatalogFilters>,
) -> Result<Json<ApiResponse<StoreListResponse>>, ApiError> {
    info!("Listing stores");

    match state.catalog_service.list_stores(filters).await {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to list stores: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get one store by id
#[instrument(name = "get_store", skip(state), fields(member_id = %member.member_id, store_id = %store_id))]
pub async fn get_store(
    State(state): State<ApiState>,
    member: AuthMember,
    Path(store_id): Path<String>,
) -> Result<Json<ApiResponse<Store>>, ApiError> {
    match state.catalog_service.get_store(&store_id).await {
        Ok(store) => Ok(Json(ApiResponse::success(store))),
        Err(err) => {
            error!("Failed to get store: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
