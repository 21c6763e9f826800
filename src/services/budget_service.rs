use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    parse_date, parse_month, validate_amount, BudgetSummary, DailyBudgetResponse, MealBudget,
    MealType, MonthlyBudgetResponse, ServiceError, ServiceResult, UpdateDailyBudgetRequest,
    UpdateMonthlyBudgetRequest,
};
use crate::repositories::BudgetRepository;

/// Service for reading and updating budgets
pub struct BudgetService {
    budget_repository: Arc<dyn BudgetRepository>,
}

impl BudgetService {
    pub fn new(budget_repository: Arc<dyn BudgetRepository>) -> Self {
        Self { budget_repository }
    }

    #[instrument(skip(self), fields(member_id = %member_id, month = %month))]
    pub async fn get_monthly(
        &self,
        member_id: &str,
        month: &str,
    ) -> ServiceResult<MonthlyBudgetResponse> {
        info!("Getting monthly budget");

        let month = parse_month(month).map_err(|_| ServiceError::InvalidDateFormat {
            value: month.to_string(),
        })?;

        let budget = self
            .budget_repository
            .find_monthly(member_id, &month)
            .await?
            .ok_or(ServiceError::MonthlyBudgetNotFound { month })?;

        Ok(budget.to_response())
    }

    /// Change a monthly cap; the used amount is untouched
    #[instrument(skip(self, request), fields(member_id = %member_id, month = %month))]
    pub async fn update_monthly(
        &self,
        member_id: &str,
        month: &str,
        request: UpdateMonthlyBudgetRequest,
    ) -> ServiceResult<MonthlyBudgetResponse> {
        info!("Updating monthly budget");

        let month = parse_month(month).map_err(|_| ServiceError::InvalidDateFormat {
            value: month.to_string(),
        })?;
        validate_amount("amount", request.amount)?;

        let mut budget = self
            .budget_repository
            .find_monthly(member_id, &month)
            .await?
            .ok_or(ServiceError::MonthlyBudgetNotFound { month })?;

        budget.amount = request.amount;
        let budget = self.budget_repository.save_monthly(budget).await?;

        info!("Monthly budget updated");
        Ok(budget.to_response())
    }

    #[instrument(skip(self), fields(member_id = %member_id, date = %date))]
    pub async fn get_daily(
        &self,
        member_id: &str,
        date: &str,
    ) -> ServiceResult<DailyBudgetResponse> {
        info!("Getting daily budget");

        let date = parse_date_param(date)?;

        let budget = self
            .budget_repository
            .find_daily(member_id, date)
            .await?
            .ok_or(ServiceError::DailyBudgetNotFound { date })?;

        let meal_budgets = self
            .budget_repository
            .find_meal_budgets(member_id, date)
            .await?;

        Ok(budget.to_response(&meal_budgets))
    }

    /// Change a daily cap and its per-meal split. The split must add up to
    /// the daily amount. Every meal type is rewritten, so a meal omitted
    /// from the request gets a zero cap instead of keeping a stale amount;
    /// existing used amounts are preserved.
    #[instrument(skip(self, request), fields(member_id = %member_id, date = %date))]
    pub async fn update_daily(
        &self,
        member_id: &str,
        date: &str,
        request: UpdateDailyBudgetRequest,
    ) -> ServiceResult<DailyBudgetResponse> {
        info!("Updating daily budget");

        let date = parse_date_param(date)?;
        validate_amount("amount", request.amount)?;
        validate_meal_split(request.amount, &request.meal_budgets)?;

        let mut budget = self
            .budget_repository
            .find_daily(member_id, date)
            .await?
            .ok_or(ServiceError::DailyBudgetNotFound { date })?;

        budget.amount = request.amount;
        let budget = self.budget_repository.save_daily(budget).await?;

        let mut meal_budgets = Vec::new();
        for meal_type in MealType::ALL {
            let amount = request.meal_budgets.get(&meal_type).copied().unwrap_or(0);
            let mut meal_budget = match self
                .budget_repository
                .find_meal_budget(member_id, date, meal_type)
                .await?
            {
                Some(existing) => existing,
                None => MealBudget::new(member_id.to_string(), date, meal_type, 0),
            };
            meal_budget.amount = amount;
            meal_budgets.push(self.budget_repository.save_meal_budget(meal_budget).await?);
        }

        info!("Daily budget updated");
        Ok(budget.to_response(&meal_budgets))
    }
}

fn parse_date_param(value: &str) -> ServiceResult<NaiveDate> {
    parse_date(value).map_err(|_| ServiceError::InvalidDateFormat {
        value: value.to_string(),
    })
}

/// Meal amounts must be non-negative and add up to the daily amount
pub(crate) fn validate_meal_split(
    daily_amount: i64,
    meal_budgets: &HashMap<MealType, i64>,
) -> ServiceResult<()> {
    for (meal_type, amount) in meal_budgets {
        if *amount < 0 {
            return Err(ServiceError::InvalidBudget {
                message: format!("{} budget cannot be negative", meal_type),
            });
        }
    }

    let meal_total: i64 = meal_budgets.values().sum();
    if meal_total != daily_amount {
        return Err(ServiceError::InvalidBudget {
            message: format!(
                "meal budgets total {} does not equal daily budget {}",
                meal_total, daily_amount
            ),
        });
    }

    Ok(())
}

/// Iterate meal amounts in breakfast, lunch, dinner order
pub(crate) fn ordered_meal_amounts(
    meal_budgets: &HashMap<MealType, i64>,
) -> impl Iterator<Item = (MealType, i64)> + '_ {
    MealType::ALL
        .into_iter()
        .filter_map(|meal_type| meal_budgets.get(&meal_type).map(|amount| (meal_type, *amount)))
}

/// Record spending against the budgets covering `date`. The monthly and
/// daily budgets must exist; the meal budget is updated only when one is
/// set for that meal. Returns remaining amounts before and after.
pub(crate) async fn apply_spending(
    budget_repository: &dyn BudgetRepository,
    member_id: &str,
    date: NaiveDate,
    meal_type: Option<MealType>,
    amount: i64,
) -> ServiceResult<BudgetSummary> {
    let month = date.format("%Y-%m").to_string();

    let mut monthly = budget_repository
        .find_monthly(member_id, &month)
        .await?
        .ok_or(ServiceError::MonthlyBudgetNotFound { month })?;

    let mut daily = budget_repository
        .find_daily(member_id, date)
        .await?
        .ok_or(ServiceError::DailyBudgetNotFound { date })?;

    let meal = match meal_type {
        Some(meal_type) => {
            budget_repository
                .find_meal_budget(member_id, date, meal_type)
                .await?
        }
        None => None,
    };

    let monthly_before = monthly.remaining();
    let daily_before = daily.remaining();
    let meal_before = meal.as_ref().map(MealBudget::remaining);

    monthly.add_used_amount(amount);
    daily.add_used_amount(amount);

    let monthly = budget_repository.save_monthly(monthly).await?;
    let daily = budget_repository.save_daily(daily).await?;

    let meal_after = match meal {
        Some(mut meal_budget) => {
            meal_budget.add_used_amount(amount);
            let saved = budget_repository.save_meal_budget(meal_budget).await?;
            Some(saved.remaining())
        }
        None => None,
    };

    Ok(BudgetSummary {
        meal_budget_before: meal_before,
        meal_budget_after: meal_after,
        daily_budget_before: daily_before,
        daily_budget_after: daily.remaining(),
        monthly_budget_before: monthly_before,
        monthly_budget_after: monthly.remaining(),
    })
}
