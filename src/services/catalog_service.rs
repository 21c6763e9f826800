use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    CatalogFilters, Food, FoodListResponse, ServiceError, ServiceResult, Store, StoreListResponse,
};
use crate::repositories::CatalogRepository;

/// Read-only catalog browsing over foods and stores
pub struct CatalogService {
    catalog_repository: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(catalog_repository: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog_repository }
    }

    #[instrument(skip(self))]
    pub async fn list_foods(&self, filters: CatalogFilters) -> ServiceResult<FoodListResponse> {
        info!("Listing foods");

        let foods = self.catalog_repository.find_foods(&filters).await?;

        Ok(FoodListResponse {
            total_count: foods.len(),
            foods,
        })
    }

    #[instrument(skip(self), fields(food_id = %food_id))]
    pub async fn get_food(&self, food_id: &str) -> ServiceResult<Food> {
        self.catalog_repository
            .find_food(food_id)
            .await?
            .ok_or_else(|| ServiceError::FoodNotFound {
                food_id: food_id.to_string(),
            })
    }

    #[instrument(skip(self))]
    pub async fn list_stores(&self, filters: CatalogFilters) -> ServiceResult<StoreListResponse> {
        info!("Listing stores");

        let stores = self.catalog_repository.find_stores(&filters).await?;

        Ok(StoreListResponse {
            total_count: stores.len(),
            stores,
        })
    }

    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn get_store(&self, store_id: &str) -> ServiceResult<Store> {
        self.catalog_repository
            .find_store(store_id)
            .await?
            .ok_or_else(|| ServiceError::StoreNotFound {
                store_id: store_id.to_string(),
            })
    }
}
