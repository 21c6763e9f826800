use serde::{Deserialize, Serialize};

use super::budget::{DailyBudgetResponse, MonthlyBudgetResponse};
use super::enums::MealType;
use super::member::AddressResponse;

/// The home dashboard: who and where the member is, plus how today and the
/// current month are tracking. Budget sections are absent until the member
/// has set up a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub nickname: String,
    pub primary_address: AddressResponse,
    pub monthly_budget: Option<MonthlyBudgetResponse>,
    pub daily_budget: Option<DailyBudgetResponse>,
    pub today_spent: i64,
    pub meal_spending: Vec<MealSpendingSummary>,
}

/// Today's spending for one meal against its budget, when one is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSpendingSummary {
    pub meal_type: MealType,
    pub spent: i64,
    pub budget_amount: Option<i64>,
    pub remaining: Option<i64>,
}
