use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::{attr_n, attr_s, dynamodb_span, map_dynamodb_error};
use crate::models::{DailyBudget, MealBudget, MealType, MonthlyBudget, RepositoryError, RepositoryResult};

/// Trait defining the interface for budget data access operations.
///
/// All three budget kinds live in one table keyed by member_id with a
/// sort key of `MONTH#<YYYY-MM>`, `DAY#<YYYY-MM-DD>` or
/// `MEAL#<YYYY-MM-DD>#<meal>`.
#[async_trait]
pub trait BudgetRepository: Send + Sync {
    async fn find_monthly(
        &self,
        member_id: &str,
        month: &str,
    ) -> RepositoryResult<Option<MonthlyBudget>>;

    async fn save_monthly(&self, budget: MonthlyBudget) -> RepositoryResult<MonthlyBudget>;

    async fn find_daily(
        &self,
        member_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DailyBudget>>;

    async fn save_daily(&self, budget: DailyBudget) -> RepositoryResult<DailyBudget>;

    /// All meal budgets of one date
    async fn find_meal_budgets(
        &self,
        member_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<MealBudget>>;

    async fn find_meal_budget(
        &self,
        member_id: &str,
        date: NaiveDate,
        meal_type: MealType,
    ) -> RepositoryResult<Option<MealBudget>>;

    async fn save_meal_budget(&self, budget: MealBudget) -> RepositoryResult<MealBudget>;
}

/// DynamoDB implementation of the BudgetRepository trait
pub struct DynamoDbBudgetRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

fn month_key(month: &str) -> String {
    format!("MONTH#{}", month)
}

fn day_key(date: NaiveDate) -> String {
    format!("DAY#{}", date.format("%Y-%m-%d"))
}

fn meal_key(date: NaiveDate, meal_type: MealType) -> String {
    format!("MEAL#{}#{}", date.format("%Y-%m-%d"), meal_type)
}

impl DynamoDbBudgetRepository {
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

    fn base_item(member_id: &str, budget_key: String, amount: i64, used_amount: i64) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "member_id".to_string(),
            AttributeValue::S(member_id.to_string()),
        );
        item.insert("budget_key".to_string(), AttributeValue::S(budget_key));
        item.insert("amount".to_string(), AttributeValue::N(amount.to_string()));
        item.insert(
            "used_amount".to_string(),
            AttributeValue::N(used_amount.to_string()),
        );
        item
    }

    pub fn monthly_to_item(&self, budget: &MonthlyBudget) -> HashMap<String, AttributeValue> {
        Self::base_item(
            &budget.member_id,
            month_key(&budget.budget_month),
            budget.amount,
            budget.used_amount,
        )
    }

    pub fn daily_to_item(&self, budget: &DailyBudget) -> HashMap<String, AttributeValue> {
        Self::base_item(
            &budget.member_id,
            day_key(budget.budget_date),
            budget.amount,
            budget.used_amount,
        )
    }

    pub fn meal_to_item(&self, budget: &MealBudget) -> HashMap<String, AttributeValue> {
        Self::base_item(
            &budget.member_id,
            meal_key(budget.budget_date, budget.meal_type),
            budget.amount,
            budget.used_amount,
        )
    }

    pub fn item_to_monthly(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<MonthlyBudget> {
        let budget_key = attr_s(&item, "budget_key")?;
        let budget_month = budget_key
            .strip_prefix("MONTH#")
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: format!("Not a monthly budget key: {}", budget_key),
            })?
            .to_string();

        Ok(MonthlyBudget {
            member_id: attr_s(&item, "member_id")?,
            budget_month,
            amount: attr_n(&item, "amount")?,
            used_amount: attr_n(&item, "used_amount")?,
        })
    }

    pub fn item_to_daily(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<DailyBudget> {
        let budget_key = attr_s(&item, "budget_key")?;
        let budget_date = budget_key
            .strip_prefix("DAY#")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .ok_or_else(|| RepositoryError::InvalidQuery {
                message: format!("Not a daily budget key: {}", budget_key),
            })?;

        Ok(DailyBudget {
            member_id: attr_s(&item, "member_id")?,
            budget_date,
            amount: attr_n(&item, "amount")?,
            used_amount: attr_n(&item, "used_amount")?,
        })
    }

    pub fn item_to_meal(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<MealBudget> {
        let budget_key = attr_s(&item, "budget_key")?;
        let parts: Vec<&str> = budget_key.splitn(3, '#').collect();
        let (budget_date, meal_type) = match parts.as_slice() {
            ["MEAL", date, meal] => (
                NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
                MealType::from_str(meal).ok(),
            ),
            _ => (None, None),
        };

        let (budget_date, meal_type) = budget_date.zip(meal_type).ok_or_else(|| {
            RepositoryError::InvalidQuery {
                message: format!("Not a meal budget key: {}", budget_key),
            }
        })?;

        Ok(MealBudget {
            member_id: attr_s(&item, "member_id")?,
            budget_date,
            meal_type,
            amount: attr_n(&item, "amount")?,
            used_amount: attr_n(&item, "used_amount")?,
        })
    }

    async fn get_by_key(
        &self,
        member_id: &str,
        budget_key: String,
    ) -> RepositoryResult<Option<HashMap<String, AttributeValue>>> {
        let get_span = dynamodb_span("GetItem", &self.table_name, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("member_id", AttributeValue::S(member_id.to_string()))
                .key("budget_key", AttributeValue::S(budget_key))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(get_span)
        .await?;

        Ok(response.item)
    }

    async fn put(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<()> {
        let put_span = dynamodb_span("PutItem", &self.table_name, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))?;
            Ok(())
        }
        .instrument(put_span)
        .await
    }
}

#[async_trait]
impl BudgetRepository for DynamoDbBudgetRepository {
    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id, month = %month))]
    async fn find_monthly(
        &self,
        member_id: &str,
        month: &str,
    ) -> RepositoryResult<Option<MonthlyBudget>> {
        info!("Finding monthly budget");
        match self.get_by_key(member_id, month_key(month)).await? {
            Some(item) => Ok(Some(self.item_to_monthly(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, budget), fields(table = %self.table_name, member_id = %budget.member_id, month = %budget.budget_month))]
    async fn save_monthly(&self, budget: MonthlyBudget) -> RepositoryResult<MonthlyBudget> {
        info!("Saving monthly budget");
        self.put(self.monthly_to_item(&budget)).await?;
        Ok(budget)
    }

    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id, date = %date))]
    async fn find_daily(
        &self,
        member_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DailyBudget>> {
        info!("Finding daily budget");
        match self.get_by_key(member_id, day_key(date)).await? {
            Some(item) => Ok(Some(self.item_to_daily(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, budget), fields(table = %self.table_name, member_id = %budget.member_id, date = %budget.budget_date))]
    async fn save_daily(&self, budget: DailyBudget) -> RepositoryResult<DailyBudget> {
        info!("Saving daily budget");
        self.put(self.daily_to_item(&budget)).await?;
        Ok(budget)
    }

    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id, date = %date))]
    async fn find_meal_budgets(
        &self,
        member_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<MealBudget>> {
        info!("Finding meal budgets for date");

        let query_span = dynamodb_span("Query", &self.table_name, &self.region);
        let prefix = format!("MEAL#{}#", date.format("%Y-%m-%d"));

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression(
                    "member_id = :member_id AND begins_with(budget_key, :prefix)",
                )
                .expression_attribute_values(
                    ":member_id",
                    AttributeValue::S(member_id.to_string()),
                )
                .expression_attribute_values(":prefix", AttributeValue::S(prefix))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(e.into()))
        }
        .instrument(query_span)
        .await?;

        let mut budgets = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_meal(item) {
                    Ok(budget) => budgets.push(budget),
                    Err(e) => {
                        warn!("Failed to parse meal budget item: {}", e);
                        continue;
                    }
                }
            }
        }

        // stable breakfast/lunch/dinner order
        budgets.sort_by_key(|b| MealType::ALL.iter().position(|m| *m == b.meal_type));

        info!("Found {} meal budgets", budgets.len());
        Ok(budgets)
    }

    #[instrument(skip(self), fields(table = %self.table_name, member_id = %member_id, date = %date, meal = %meal_type))]
    async fn find_meal_budget(
        &self,
        member_id: &str,
        date: NaiveDate,
        meal_type: MealType,
    ) -> RepositoryResult<Option<MealBudget>> {
        info!("Finding meal budget");
        match self.get_by_key(member_id, meal_key(date, meal_type)).await? {
            Some(item) => Ok(Some(self.item_to_meal(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, budget), fields(table = %self.table_name, member_id = %budget.member_id, date = %budget.budget_date, meal = %budget.meal_type))]
    async fn save_meal_budget(&self, budget: MealBudget) -> RepositoryResult<MealBudget> {
        info!("Saving meal budget");
        self.put(self.meal_to_item(&budget)).await?;
        Ok(budget)
    }
}
