use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::models::{
    AddCartItemRequest, AddCartItemResponse, ApiResponse, CartResponse, CheckoutRequest,
    CheckoutResponse, UpdateCartItemRequest,
};

use super::api::{service_error_to_response, ApiError, ApiState, AuthMember};

/// Query parameters for removing a cart item
#[derive(Debug, Deserialize)]
pub struct RemoveCartItemQuery {
    pub store_id: String,
}

/// List all carts of the member
#[instrument(name = "get_carts", skip(state), fields(member_id = %member.member_id))]
pub async fn get_carts(
    State(state): State<ApiState>,
    member: AuthMember,
) -> Result<Json<ApiResponse<Vec<CartResponse>>>, ApiError> {
    info!("Getting carts");

    match state.cart_service.get_carts(&member.member_id).await {
        Ok(carts) => Ok(Json(ApiResponse::success(carts))),
        Err(err) => {
            error!("Failed to get carts: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Add an item to the cart for the requested store
#[instrument(name = "add_cart_item", skip(state, request), fields(
    member_id = %member.member_id,
    store_id = %request.store_id,
    food_id = %request.food_id,
    quantity = %request.quantity,
))]
pub async fn add_item(
    State(state): State<ApiState>,
    member: AuthMember,
    Json(request): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AddCartItemResponse>>), ApiError> {
    info!("Adding item to cart");

    match state.cart_service.add_item(&member.member_id, request).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(ApiResponse::success(response)))),
        Err(err) => {
            error!("Failed to add item to cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Set the quantity of a cart item; zero removes it
#[instrument(name = "update_cart_item", skip(state, request), fields(
    member_id = %member.member_id,
    food_id = %food_id,
    quantity = %request.quantity,
))]
pub async fn update_item(
    State(state): State<ApiState>,
    member: AuthMember,
    Path(food_id): Path<String>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<ApiResponse<CartResponse>>, ApiError> {
    info!("Updating cart item");

    match state
        .cart_service
        .update_item(&member.member_id, &food_id, request)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to update cart item: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Remove an item from the cart; the cart is deleted when it empties
#[instrument(name = "remove_cart_item", skip(state), fields(
    member_id = %member.member_id,
    store_id = %query.store_id,
    food_id = %food_id,
))]
pub async fn remove_item(
    State(state): State<ApiState>,
    member: AuthMember,
    Path(food_id): Path<String>,
    Query(query): Query<RemoveCartItemQuery>,
) -> Result<Json<ApiResponse<CartResponse>>, ApiError> {
    info!("Removing cart item");

    match state
        .cart_service
        .remove_item(&member.member_id, &query.store_id, &food_id)
        .await
    {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(err) => {
            error!("Failed to remove cart item: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Check out the cart into an expenditure
#[instrument(name = "checkout_cart", skip(state, request), fields(
    member_id = %member.member_id,
    store_id = %request.store_id,
))]
pub async fn checkout(
    State(state): State<ApiState>,
    member: AuthMember,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResponse>>), ApiError> {
    info!("Checking out cart");

    match state.cart_service.checkout(&member.member_id, request).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(ApiResponse::success(response)))),
        Err(err) => {
            error!("Failed to check out cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
