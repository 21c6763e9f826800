use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::enums::MealType;

/// Spending cap for one member over one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBudget {
    pub member_id: String,
    /// `YYYY-MM`
    pub budget_month: String,
    pub amount: i64,
    pub used_amount: i64,
}

/// Spending cap for one member on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBudget {
    pub member_id: String,
    pub budget_date: NaiveDate,
    pub amount: i64,
    pub used_amount: i64,
}

/// Per-meal slice of a daily budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealBudget {
    pub member_id: String,
    pub budget_date: NaiveDate,
    pub meal_type: MealType,
    pub amount: i64,
    pub used_amount: i64,
}

/// remaining may go negative once spending exceeds the cap
pub fn remaining(amount: i64, used_amount: i64) -> i64 {
    amount - used_amount
}

/// Percentage of the budget already used, rounded to 2 decimal places
/// with midpoint-away-from-zero. Zero when the budget amount is zero.
pub fn utilization_rate(amount: i64, used_amount: i64) -> Decimal {
    if amount == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(used_amount) * Decimal::from(100) / Decimal::from(amount))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl MonthlyBudget {
    pub fn new(member_id: String, budget_month: String, amount: i64) -> Self {
        Self {
            member_id,
            budget_month,
            amount,
            used_amount: 0,
        }
    }

    pub fn add_used_amount(&mut self, spent: i64) {
        self.used_amount += spent;
    }

    pub fn remaining(&self) -> i64 {
        remaining(self.amount, self.used_amount)
    }

    pub fn utilization_rate(&self) -> Decimal {
        utilization_rate(self.amount, self.used_amount)
    }

    pub fn to_response(&self) -> MonthlyBudgetResponse {
        MonthlyBudgetResponse {
            budget_month: self.budget_month.clone(),
            amount: self.amount,
            used_amount: self.used_amount,
            remaining: self.remaining(),
            utilization_rate: self.utilization_rate(),
        }
    }
}

impl DailyBudget {
    pub fn new(member_id: String, budget_date: NaiveDate, amount: i64) -> Self {
        Self {
            member_id,
            budget_date,
            amount,
            used_amount: 0,
        }
    }

    pub fn add_used_amount(&mut self, spent: i64) {
        self.used_amount += spent;
    }

    pub fn remaining(&self) -> i64 {
        remaining(self.amount, self.used_amount)
    }

    pub fn utilization_rate(&self) -> Decimal {
        utilization_rate(self.amount, self.used_amount)
    }
}

impl MealBudget {
    pub fn new(member_id: String, budget_date: NaiveDate, meal_type: MealType, amount: i64) -> Self {
        Self {
            member_id,
            budget_date,
            meal_type,
            amount,
            used_amount: 0,
        }
    }

    pub fn add_used_amount(&mut self, spent: i64) {
        self.used_amount += spent;
    }

    pub fn remaining(&self) -> i64 {
        remaining(self.amount, self.used_amount)
    }

    pub fn to_response(&self) -> MealBudgetResponse {
        MealBudgetResponse {
            meal_type: self.meal_type,
            amount: self.amount,
            used_amount: self.used_amount,
            remaining: self.remaining(),
        }
    }
}

// REQUEST / RESPONSE MODELS

/// Initial budget setup during onboarding: one monthly cap plus a daily cap
/// split across the three meals, applied from today to the end of the month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupBudgetRequest {
    pub monthly_budget: i64,
    pub daily_budget: i64,
    pub meal_budgets: HashMap<MealType, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMonthlyBudgetRequest {
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDailyBudgetRequest {
    pub amount: i64,
    pub meal_budgets: HashMap<MealType, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyBudgetResponse {
    pub budget_month: String,
    pub amount: i64,
    pub used_amount: i64,
    pub remaining: i64,
    pub utilization_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealBudgetResponse {
    pub meal_type: MealType,
    pub amount: i64,
    pub used_amount: i64,
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBudgetResponse {
    pub budget_date: NaiveDate,
    pub amount: i64,
    pub used_amount: i64,
    pub remaining: i64,
    pub utilization_rate: Decimal,
    pub meal_budgets: Vec<MealBudgetResponse>,
}

/// Result of the onboarding budget setup: the month's cap plus today's
/// daily budget with its meal split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupBudgetResponse {
    pub monthly_budget: MonthlyBudgetResponse,
    pub daily_budget: DailyBudgetResponse,
}

impl DailyBudget {
    pub fn to_response(&self, meal_budgets: &[MealBudget]) -> DailyBudgetResponse {
        DailyBudgetResponse {
            budget_date: self.budget_date,
            amount: self.amount,
            used_amount: self.used_amount,
            remaining: self.remaining(),
            utilization_rate: self.utilization_rate(),
            meal_budgets: meal_budgets.iter().map(|mb| mb.to_response()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_remaining_arithmetic() {
        let mut budget = DailyBudget::new("M001".to_string(), date(2025, 8, 25), 10_000);
        assert_eq!(budget.remaining(), 10_000);

        budget.add_used_amount(4_000);
        assert_eq!(budget.remaining(), 6_000);

        budget.add_used_amount(8_000);
        assert_eq!(budget.remaining(), -2_000);
    }

    #[test]
    fn test_utilization_rate_two_decimals() {
        assert_eq!(utilization_rate(30_000, 10_000), dec!(33.33));
        assert_eq!(utilization_rate(3, 1), dec!(33.33));
        assert_eq!(utilization_rate(10_000, 10_000), dec!(100.00));
        assert_eq!(utilization_rate(10_000, 12_500), dec!(125.00));
    }

    #[test]
    fn test_utilization_rate_midpoint_rounds_away_from_zero() {
        // 1/800 * 100 = 0.125 -> 0.13
        assert_eq!(utilization_rate(800, 1), dec!(0.13));
    }

    #[test]
    fn test_utilization_rate_zero_budget() {
        assert_eq!(utilization_rate(0, 5_000), Decimal::ZERO);
    }

    #[test]
    fn test_monthly_budget_response() {
        let mut budget = MonthlyBudget::new("M001".to_string(), "2025-08".to_string(), 300_000);
        budget.add_used_amount(100_000);

        let response = budget.to_response();
        assert_eq!(response.remaining, 200_000);
        assert_eq!(response.utilization_rate, dec!(33.33));
    }

    #[test]
    fn test_daily_budget_response_includes_meals() {
        let daily = DailyBudget::new("M001".to_string(), date(2025, 8, 25), 10_000);
        let meals = vec![
            MealBudget::new("M001".to_string(), date(2025, 8, 25), MealType::Breakfast, 3_000),
            MealBudget::new("M001".to_string(), date(2025, 8, 25), MealType::Lunch, 4_000),
            MealBudget::new("M001".to_string(), date(2025, 8, 25), MealType::Dinner, 3_000),
        ];

        let response = daily.to_response(&meals);
        assert_eq!(response.meal_budgets.len(), 3);
        assert_eq!(response.meal_budgets[1].amount, 4_000);
    }
}
