use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    validate_amount, validate_cart_quantity, validate_memo, AddCartItemRequest,
    AddCartItemResponse, Cart, CartResponse, CheckoutRequest, CheckoutResponse, Expenditure,
    ExpenditureItem, ServiceError, ServiceResult, UpdateCartItemRequest,
};
use crate::repositories::{
    BudgetRepository, CartRepository, CatalogRepository, ExpenditureRepository,
};
use crate::services::budget_service::apply_spending;

/// Service for carts and checkout. A member holds at most one active cart,
/// bound to a single store; adding from another store requires replacing it.
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    catalog_repository: Arc<dyn CatalogRepository>,
    budget_repository: Arc<dyn BudgetRepository>,
    expenditure_repository: Arc<dyn ExpenditureRepository>,
}

impl CartService {
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        catalog_repository: Arc<dyn CatalogRepository>,
        budget_repository: Arc<dyn BudgetRepository>,
        expenditure_repository: Arc<dyn ExpenditureRepository>,
    ) -> Self {
        Self {
            cart_repository,
            catalog_repository,
            budget_repository,
            expenditure_repository,
        }
    }

    /// All carts a member currently holds
    #[instrument(skip(self), fields(member_id = %member_id))]
    pub async fn get_carts(&self, member_id: &str) -> ServiceResult<Vec<CartResponse>> {
        info!("Getting carts");

        let carts = self.cart_repository.find_carts(member_id).await?;

        Ok(carts.iter().map(Cart::to_response).collect())
    }

    /// Add an item to the member's cart at the requested store. A cart held
    /// at a different store blocks the add unless `replace_cart` is set.
    #[instrument(skip(self, request), fields(member_id = %member_id, store_id = %request.store_id, food_id = %request.food_id))]
    pub async fn add_item(
        &self,
        member_id: &str,
        request: AddCartItemRequest,
    ) -> ServiceResult<AddCartItemResponse> {
        info!("Adding item to cart");

        validate_cart_quantity(request.quantity)?;

        let store = self
            .catalog_repository
            .find_store(&request.store_id)
            .await?
            .ok_or_else(|| ServiceError::StoreNotFound {
                store_id: request.store_id.clone(),
            })?;

        let food = self
            .catalog_repository
            .find_food(&request.food_id)
            .await?
            .ok_or_else(|| ServiceError::FoodNotFound {
                food_id: request.food_id.clone(),
            })?;

        let existing_carts = self.cart_repository.find_carts(member_id).await?;
        let other_store_carts: Vec<&Cart> = existing_carts
            .iter()
            .filter(|cart| cart.store_id != store.store_id && !cart.is_empty())
            .collect();

        let mut replaced_cart = false;
        if !other_store_carts.is_empty() {
            if !request.replace_cart {
                return Err(ServiceError::CartConflict {
                    store_id: other_store_carts[0].store_id.clone(),
                });
            }
            for cart in other_store_carts {
                warn!(store_id = %cart.store_id, "Replacing cart held at another store");
                self.cart_repository
                    .delete_cart(member_id, &cart.store_id)
                    .await?;
            }
            replaced_cart = true;
        }

        let mut cart = match self
            .cart_repository
            .find_cart(member_id, &store.store_id)
            .await?
        {
            Some(cart) => cart,
            None => Cart::new(member_id.to_string(), store.store_id.clone()),
        };

        cart.add_item(
            food.food_id.clone(),
            food.name.clone(),
            food.effective_price(),
            request.quantity,
        );

        let cart = self.cart_repository.save_cart(cart).await?;

        info!("Item added to cart");
        Ok(AddCartItemResponse {
            cart: cart.to_response(),
            replaced_cart,
        })
    }

    /// Set the quantity of a cart item; zero removes it. An emptied cart
    /// is deleted.
    #[instrument(skip(self, request), fields(member_id = %member_id, food_id = %food_id, quantity = request.quantity))]
    pub async fn update_item(
        &self,
        member_id: &str,
        food_id: &str,
        request: UpdateCartItemRequest,
    ) -> ServiceResult<CartResponse> {
        info!("Updating cart item quantity");

        if request.quantity > 0 {
            validate_cart_quantity(request.quantity)?;
        }

        let mut cart = self
            .cart_repository
            .find_cart(member_id, &request.store_id)
            .await?
            .ok_or_else(|| ServiceError::CartNotFound {
                store_id: request.store_id.clone(),
            })?;

        if !cart.update_item_quantity(food_id, request.quantity) {
            return Err(ServiceError::CartItemNotFound {
                food_id: food_id.to_string(),
            });
        }

        let cart = self.persist_or_delete(member_id, cart).await?;

        info!("Cart item updated");
        Ok(cart.to_response())
    }

    /// Remove an item from the cart. An emptied cart is deleted.
    #[instrument(skip(self), fields(member_id = %member_id, store_id = %store_id, food_id = %food_id))]
    pub async fn remove_item(
        &self,
        member_id: &str,
        store_id: &str,
        food_id: &str,
    ) -> ServiceResult<CartResponse> {
        info!("Removing item from cart");

        let mut cart = self
            .cart_repository
            .find_cart(member_id, store_id)
            .await?
            .ok_or_else(|| ServiceError::CartNotFound {
                store_id: store_id.to_string(),
            })?;

        if !cart.remove_item(food_id) {
            return Err(ServiceError::CartItemNotFound {
                food_id: food_id.to_string(),
            });
        }

        let cart = self.persist_or_delete(member_id, cart).await?;

        info!("Cart item removed");
        Ok(cart.to_response())
    }

    /// Convert the cart into an expenditure: charge the final amount against
    /// the member's budgets, record the expenditure and clear the cart.
    #[instrument(skip(self, request), fields(member_id = %member_id, store_id = %request.store_id))]
    pub async fn checkout(
        &self,
        member_id: &str,
        request: CheckoutRequest,
    ) -> ServiceResult<CheckoutResponse> {
        info!("Checking out cart");

        validate_amount("discount_amount", request.discount_amount)?;
        validate_memo(&request.memo)?;

        let store = self
            .catalog_repository
            .find_store(&request.store_id)
            .await?
            .ok_or_else(|| ServiceError::StoreNotFound {
                store_id: request.store_id.clone(),
            })?;

        let cart = self
            .cart_repository
            .find_cart(member_id, &store.store_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or_else(|| ServiceError::CartNotFound {
                store_id: store.store_id.clone(),
            })?;

        let subtotal = cart.subtotal();
        if request.discount_amount > subtotal {
            return Err(ServiceError::ValidationError {
                message: format!(
                    "discount {} exceeds cart subtotal {}",
                    request.discount_amount, subtotal
                ),
            });
        }
        let final_amount = subtotal - request.discount_amount;

        let now = Utc::now();
        let budget_summary = apply_spending(
            self.budget_repository.as_ref(),
            member_id,
            now.date_naive(),
            request.meal_type,
            final_amount,
        )
        .await?;

        let items: Vec<ExpenditureItem> = cart
            .items
            .iter()
            .map(|item| ExpenditureItem {
                food_id: Some(item.food_id.clone()),
                name: item.food_name.clone(),
                price: item.price,
                quantity: item.quantity,
            })
            .collect();

        let expenditure = Expenditure::new(
            member_id.to_string(),
            Some(store.store_id.clone()),
            store.name.clone(),
            final_amount,
            request.discount_amount,
            request.meal_type,
            store.primary_category().map(str::to_string),
            request.memo,
            now,
            items,
        );
        let expenditure = self.expenditure_repository.save_expenditure(expenditure).await?;

        self.cart_repository
            .delete_cart(member_id, &store.store_id)
            .await?;

        info!(expenditure_id = %expenditure.expenditure_id, "Checkout completed");
        Ok(CheckoutResponse {
            expenditure_id: expenditure.expenditure_id,
            store_id: store.store_id,
            store_name: store.name,
            items: cart.items,
            subtotal,
            discount_amount: request.discount_amount,
            final_amount,
            budget_summary,
            created_at: expenditure.created_at,
        })
    }

    async fn persist_or_delete(&self, member_id: &str, cart: Cart) -> ServiceResult<Cart> {
        if cart.is_empty() {
            self.cart_repository
                .delete_cart(member_id, &cart.store_id)
                .await?;
            Ok(cart)
        } else {
            Ok(self.cart_repository.save_cart(cart).await?)
        }
    }
}
