use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    DashboardResponse, Expenditure, ExpenditureFilters, MealSpendingSummary, MealType,
    ServiceError, ServiceResult,
};
use crate::repositories::{
    AddressRepository, BudgetRepository, ExpenditureRepository, MemberRepository,
};

/// Service assembling the home dashboard
pub struct HomeService {
    member_repository: Arc<dyn MemberRepository>,
    address_repository: Arc<dyn AddressRepository>,
    budget_repository: Arc<dyn BudgetRepository>,
    expenditure_repository: Arc<dyn ExpenditureRepository>,
}

impl HomeService {
    pub fn new(
        member_repository: Arc<dyn MemberRepository>,
        address_repository: Arc<dyn AddressRepository>,
        budget_repository: Arc<dyn BudgetRepository>,
        expenditure_repository: Arc<dyn ExpenditureRepository>,
    ) -> Self {
        Self {
            member_repository,
            address_repository,
            budget_repository,
            expenditure_repository,
        }
    }

    /// Today's spending picture for the member: nickname, primary address,
    /// the current month's budget, today's budget with its meal split and
    /// today's per-meal spending.
    #[instrument(skip(self), fields(member_id = %member_id))]
    pub async fn dashboard(&self, member_id: &str) -> ServiceResult<DashboardResponse> {
        info!("Building home dashboard");

        let member = self
            .member_repository
            .find_member(member_id)
            .await?
            .ok_or_else(|| ServiceError::MemberNotFound {
                member_id: member_id.to_string(),
            })?;

        let primary_address = self
            .address_repository
            .find_primary_address(member_id)
            .await?
            .ok_or(ServiceError::AddressNotFound)?;

        let today = Utc::now().date_naive();
        let month = today.format("%Y-%m").to_string();

        let monthly_budget = self
            .budget_repository
            .find_monthly(member_id, &month)
            .await?
            .map(|budget| budget.to_response());

        let daily = self.budget_repository.find_daily(member_id, today).await?;
        let meal_budgets = self
            .budget_repository
            .find_meal_budgets(member_id, today)
            .await?;
        let daily_budget = daily.map(|budget| budget.to_response(&meal_budgets));

        let today_filters = ExpenditureFilters {
            start_date: Some(today),
            end_date: Some(today),
            meal_type: None,
        };
        let today_expenditures = self
            .expenditure_repository
            .find_expenditures(member_id, &today_filters)
            .await?;

        let today_spent: i64 = today_expenditures.iter().map(|e| e.amount).sum();

        let meal_spending = MealType::ALL
            .into_iter()
            .map(|meal_type| {
                let spent = spent_for_meal(&today_expenditures, meal_type);
                let budget_amount = meal_budgets
                    .iter()
                    .find(|mb| mb.meal_type == meal_type)
                    .map(|mb| mb.amount);
                MealSpendingSummary {
                    meal_type,
                    spent,
                    budget_amount,
                    remaining: budget_amount.map(|amount| amount - spent),
                }
            })
            .collect();

        info!("Dashboard assembled");
        Ok(DashboardResponse {
            nickname: member.nickname,
            primary_address: primary_address.to_response(),
            monthly_budget,
            daily_budget,
            today_spent,
            meal_spending,
        })
    }
}

fn spent_for_meal(expenditures: &[Expenditure], meal_type: MealType) -> i64 {
    expenditures
        .iter()
        .filter(|e| e.meal_type == Some(meal_type))
        .map(|e| e.amount)
        .sum()
}
