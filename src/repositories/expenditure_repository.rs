use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::{
    attr_bool, attr_datetime, attr_n, attr_opt_s, attr_s, dynamodb_span, map_dynamodb_error,
};
use crate::models::{
    Expenditure, ExpenditureFilters, ExpenditureItem, MealType, RepositoryResult,
};

/// Global secondary index resolving an expenditure by id alone
pub const EXPENDITURE_ID_INDEX: &str = "expenditure_id-index";

/// Trait defining the interface for expenditure data access operations.
/// Expenditures are keyed by (member_id, expenditure_id); deleted records
/// stay in the table with the deleted flag set.
#[async_trait]
pub trait ExpenditureRepository: Send + Sync {
    /// Resolve an expenditure by id regardless of owner. Callers enforce
    /// ownership themselves so a non-owner can be told apart from a miss.
    async fn find_expenditure(
        &self,
        expenditure_id: &str,
    ) -> RepositoryResult<Option<Expenditure>>;

    /// A member's non-deleted expenditures matching the filters, newest first
    async fn find_expenditures(
        &self,
        member_id: &str,
        filters: &ExpenditureFilters,
    ) -> RepositoryResult<Vec<Expenditure>>;

    async fn save_expenditure(&self, expenditure: Expenditure) -> RepositoryResult<Expenditure>;
}

/// DynamoDB implementation of the ExpenditureRepository trait
pub struct DynamoDbExpenditureRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbExpenditureRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn expenditure_to_item(
        &self,
        expenditure: &Expenditure,
    ) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert(
            "member_id".to_string(),
            AttributeValue::S(expenditure.member_id.clone()),
        );
        item.insert(
            "expenditure_id".to_string(),
            AttributeValue::S(expenditure.expenditure_id.clone()),
        );
        if let Some(store_id) = &expenditure.store_id {
            item.insert("store_id".to_string(), AttributeValue::S(store_id.clone()));
        }
        item.insert(
            "store_name".to_string(),
            AttributeValue::S(expenditure.store_name.clone()),
        );
        item.insert(
            "amount".to_string(),
            AttributeValue::N(expenditure.amount.to_string()),
        );
        item.insert(
            "discount_amount".to_string(),
            AttributeValue::N(expenditure.discount_amount.to_string()),
        );
        if let Some(meal_type) = expenditure.meal_type {
            item.insert(
                "meal_type".to_string(),
                AttributeValue::S(meal_type.to_string()),
            );
        }
        if let Some(category) = &expenditure.category {
            item.insert("category".to_string(), AttributeValue::S(category.clone()));
        }
        if let Some(memo) = &expenditure.memo {
            item.insert("memo".to_string(), AttributeValue::S(memo.clone()));
        }
        item.insert(
            "spent_at".to_string(),
            AttributeValue::S(expenditure.spent_at.to_rfc3339()),
        );

        let items: Vec<AttributeValue> = expenditure
            .items
            .iter()
            .map(|line| {
                let mut line_map = HashMap::new();
                if let Some(food_id) = &line.food_id {
                    line_map.insert("food_id".to_string(), AttributeValue::S(food_id.clone()));
                }
                line_map.insert("name".to_string(), AttributeValue::S(line.name.clone()));
                line_map.insert(
                    "price".to_string(),
                    AttributeValue::N(line.price.to_string()),
                );
                line_map.insert(
                    "quantity".to_string(),
                    AttributeValue::N(line.quantity.to_string()),
                );
                AttributeValue::M(line_map)
            })
            .collect();
        item.insert("items".to_string(), AttributeValue::L(items));

        item.insert(
            "deleted".to_string(),
            AttributeValue::Bool(expenditure.deleted),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(expenditure.created_at.to_rfc3339()),
        );

        item
    }

    pub fn item_to_expenditure(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<Expenditure> {
        let meal_type = attr_opt_s(&item, "meal_type").and_then(|s| MealType::from_str(&s).ok());

        let items = item
            .get("items")
            .and_then(|v| v.as_l().ok())
            .map(|list| {
                list.iter()
                    .filter_map(|line_attr| {
                        line_attr
                            .as_m()
                            .ok()
                            .and_then(|m| self.map_to_expenditure_item(m).ok())
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Expenditure {
            expenditure_id: attr_s(&item, "expenditure_id")?,
            member_id: attr_s(&item, "member_id")?,
            store_id: attr_opt_s(&item, "store_id"),
            store_name: attr_s(&item, "store_name")?,
            amount: attr_n(&item, "amount")?,
            discount_amount: attr_n(&item, "discount_amount")?,
            meal_type,
            category: attr_opt_s(&item, "category"),
            memo: attr_opt_s(&item, "memo"),
            spent_at: attr_datetime(&item, "spent_at")?,
            items,
            deleted: attr_bool(&item, "deleted")?,
            created_at: attr_datetime(&item, "created_at")?,
        })
    }

    pub fn map_to_expenditure_item(
        &self,
        line_map: &HashMap<String, AttributeValue>,
    ) -> RepositoryResult<ExpenditureItem> {
        Ok(ExpenditureItem {
            food_id: attr_opt_s(line_map, "food_id"),
            name: attr_s(line_map, "name")?,
            price: attr_n(line_map, "price")?,
            quantity: attr_n(line_map, "quantity")?,
        })
    }

    fn matches_filters(expenditure: &Expenditure, filters: &ExpenditureFilters) -> bool {
        if expenditure.deleted {
            return false;
        }
        let spent_date = expenditure.spent_at.date_naive();
        if let Some(start) = filters.start_date {
            if spent_date < start {
                return false;
            }
        }
        if let Some(end) = filters.end_date {
            if spent_date > end {
                return false;
            }
        }
        if let Some(meal_type) = filters.meal_type {
            if expenditure.meal_type != Some(meal_type) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl ExpenditureRepository for DynamoDbExpenditureRepository {
    #[instrument(skip(self), fields(table = %self.table_name, expenditure_id = %expenditure_id))]
    async fn find_expenditure(
        &self,
        expenditure_id: &str,
    ) -> RepositoryResult<Option<Expenditure>> {
        info!("Finding expenditure");

        let query_span = dynamodb_span("Query", &self.table_name, &self.region);

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .index_name(EXPENDITURE_ID_INDEX)
                .key_condition_expression("expenditure_id = :expenditure_id")
                .expression_attribute_values(
                    ":expenditure_id",
                    AttributeValue::S(expenditure_id.to_string()),
                )
                .limit(1)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        match response.items.and_then(|items| items.into_iter().next()) {
            Some(item) => Ok(Some(self.item_to_expenditure(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filters), fields(table = %self.table_name, member_id = %member_id))]
    async fn find_expenditures(
        &self,
        member_id: &str,
        filters: &ExpenditureFilters,
    ) -> RepositoryResult<Vec<Expenditure>> {
        info!("Finding expenditures");

        let query_span = dynamodb_span("Query", &self.table_name, &self.region);

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("member_id = :member_id")
                .expression_attribute_values(
                    ":member_id",
                    AttributeValue::S(member_id.to_string()),
                )
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        let mut expenditures = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_expenditure(item) {
                    Ok(expenditure) => {
                        if Self::matches_filters(&expenditure, filters) {
                            expenditures.push(expenditure);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse expenditure item: {}", e);
                        continue;
                    }
                }
            }
        }

        expenditures.sort_by(|a, b| b.spent_at.cmp(&a.spent_at));

        info!("Found {} expenditures", expenditures.len());
        Ok(expenditures)
    }

    #[instrument(skip(self, expenditure), fields(table = %self.table_name, member_id = %expenditure.member_id, expenditure_id = %expenditure.expenditure_id))]
    async fn save_expenditure(&self, expenditure: Expenditure) -> RepositoryResult<Expenditure> {
        info!("Saving expenditure");

        let item = self.expenditure_to_item(&expenditure);
        let put_span = dynamodb_span("PutItem", &self.table_name, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("Expenditure saved successfully");
        Ok(expenditure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_client;
    use chrono::{TimeZone, Utc};

    fn repo() -> DynamoDbExpenditureRepository {
        DynamoDbExpenditureRepository::new(
            test_client(),
            "test-expenditures".to_string(),
            "us-east-1".to_string(),
        )
    }

    fn sample_expenditure() -> Expenditure {
        Expenditure::new(
            "M001".to_string(),
            Some("S001".to_string()),
            "김밥천국".to_string(),
            17_000,
            1_000,
            Some(MealType::Lunch),
            Some("한식".to_string()),
            Some("점심 회식".to_string()),
            Utc.with_ymd_and_hms(2025, 8, 25, 12, 30, 0).unwrap(),
            vec![
                ExpenditureItem {
                    food_id: Some("F001".to_string()),
                    name: "김밥".to_string(),
                    price: 3_000,
                    quantity: 2,
                },
                ExpenditureItem {
                    food_id: None,
                    name: "라면".to_string(),
                    price: 4_000,
                    quantity: 3,
                },
            ],
        )
    }

    #[test]
    fn test_expenditure_round_trip() {
        let repo = repo();
        let expenditure = sample_expenditure();

        let item = repo.expenditure_to_item(&expenditure);
        let converted = repo.item_to_expenditure(item).unwrap();

        assert_eq!(converted.expenditure_id, expenditure.expenditure_id);
        assert_eq!(converted.store_id.as_deref(), Some("S001"));
        assert_eq!(converted.amount, 17_000);
        assert_eq!(converted.meal_type, Some(MealType::Lunch));
        assert_eq!(converted.items.len(), 2);
        assert_eq!(converted.items[1].food_id, None);
        assert!(!converted.deleted);
    }

    #[test]
    fn test_manual_expenditure_without_store() {
        let repo = repo();
        let mut expenditure = sample_expenditure();
        expenditure.store_id = None;

        let item = repo.expenditure_to_item(&expenditure);
        assert!(!item.contains_key("store_id"));

        let converted = repo.item_to_expenditure(item).unwrap();
        assert!(converted.store_id.is_none());
    }

    #[test]
    fn test_filters_exclude_deleted_records() {
        let mut expenditure = sample_expenditure();
        expenditure.mark_deleted();

        assert!(!DynamoDbExpenditureRepository::matches_filters(
            &expenditure,
            &ExpenditureFilters::default()
        ));
    }

    #[test]
    fn test_filters_by_date_range_and_meal() {
        let expenditure = sample_expenditure();

        let in_range = ExpenditureFilters {
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 8, 1),
            end_date: chrono::NaiveDate::from_ymd_opt(2025, 8, 31),
            meal_type: Some(MealType::Lunch),
        };
        assert!(DynamoDbExpenditureRepository::matches_filters(
            &expenditure,
            &in_range
        ));

        let wrong_meal = ExpenditureFilters {
            meal_type: Some(MealType::Dinner),
            ..Default::default()
        };
        assert!(!DynamoDbExpenditureRepository::matches_filters(
            &expenditure,
            &wrong_meal
        ));

        let before_range = ExpenditureFilters {
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 9, 1),
            ..Default::default()
        };
        assert!(!DynamoDbExpenditureRepository::matches_filters(
            &expenditure,
            &before_range
        ));
    }
}
