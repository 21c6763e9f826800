use chrono::{Datelike, Days, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    validate_amount, validate_nickname, AddressHistory, AddressResponse, DailyBudget, MealBudget,
    MemberResponse, MonthlyBudget, PolicyAgreement, PolicyAgreementRequest, RegisterAddressRequest,
    ServiceError, ServiceResult, SetupBudgetRequest, SetupBudgetResponse, UpdateProfileRequest,
};
use crate::repositories::{AddressRepository, BudgetRepository, MemberRepository, PolicyRepository};
use crate::services::budget_service::{ordered_meal_amounts, validate_meal_split};

/// Service for the post-signup onboarding steps: profile, address,
/// initial budget plan and policy agreements.
pub struct OnboardingService {
    member_repository: Arc<dyn MemberRepository>,
    address_repository: Arc<dyn AddressRepository>,
    budget_repository: Arc<dyn BudgetRepository>,
    policy_repository: Arc<dyn PolicyRepository>,
}

impl OnboardingService {
    pub fn new(
        member_repository: Arc<dyn MemberRepository>,
        address_repository: Arc<dyn AddressRepository>,
        budget_repository: Arc<dyn BudgetRepository>,
        policy_repository: Arc<dyn PolicyRepository>,
    ) -> Self {
        Self {
            member_repository,
            address_repository,
            budget_repository,
            policy_repository,
        }
    }

    /// Set the member's nickname; nicknames are unique across members
    #[instrument(skip(self, request), fields(member_id = %member_id))]
    pub async fn update_profile(
        &self,
        member_id: &str,
        request: UpdateProfileRequest,
    ) -> ServiceResult<MemberResponse> {
        info!("Updating member profile");

        validate_nickname(&request.nickname)?;
        let nickname = request.nickname.trim().to_string();

        let mut member = self
            .member_repository
            .find_member(member_id)
            .await?
            .ok_or_else(|| ServiceError::MemberNotFound {
                member_id: member_id.to_string(),
            })?;

        if member.nickname != nickname && self.member_repository.nickname_exists(&nickname).await? {
            return Err(ServiceError::DuplicateNickname { nickname });
        }

        member.nickname = nickname;
        let member = self.member_repository.save_member(member).await?;

        info!("Profile updated");
        Ok(member.to_response())
    }

    /// Register an address. The member's first address becomes primary.
    #[instrument(skip(self, request), fields(member_id = %member_id))]
    pub async fn register_address(
        &self,
        member_id: &str,
        request: RegisterAddressRequest,
    ) -> ServiceResult<AddressResponse> {
        info!("Registering address");

        if request.road_address.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Road address cannot be empty".to_string(),
            });
        }
        if request.alias.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Address alias cannot be empty".to_string(),
            });
        }

        if self
            .member_repository
            .find_member(member_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::MemberNotFound {
                member_id: member_id.to_string(),
            });
        }

        let existing = self.address_repository.find_addresses(member_id).await?;

        let mut address = AddressHistory::new(
            member_id.to_string(),
            request.alias.trim().to_string(),
            request.road_address.trim().to_string(),
            request.detail,
            request.kind,
        );
        address.is_primary = existing.is_empty();

        let address = self.address_repository.save_address(address).await?;

        info!("Address registered");
        Ok(address.to_response())
    }

    /// Create the initial budget plan: one monthly cap for the current month
    /// plus a daily cap with its meal split for every remaining day of the
    /// month. Fails when a plan already exists.
    #[instrument(skip(self, request), fields(member_id = %member_id))]
    pub async fn setup_budget(
        &self,
        member_id: &str,
        request: SetupBudgetRequest,
    ) -> ServiceResult<SetupBudgetResponse> {
        info!("Setting up initial budget plan");

        validate_amount("monthly_budget", request.monthly_budget)?;
        validate_amount("daily_budget", request.daily_budget)?;
        validate_meal_split(request.daily_budget, &request.meal_budgets)?;

        let today = Utc::now().date_naive();
        let month = today.format("%Y-%m").to_string();

        if self
            .budget_repository
            .find_monthly(member_id, &month)
            .await?
            .is_some()
        {
            return Err(ServiceError::MonthlyBudgetAlreadyExists { month });
        }

        if self
            .budget_repository
            .find_daily(member_id, today)
            .await?
            .is_some()
        {
            return Err(ServiceError::DailyBudgetAlreadyExists { date: today });
        }

        let monthly = self
            .budget_repository
            .save_monthly(MonthlyBudget::new(
                member_id.to_string(),
                month,
                request.monthly_budget,
            ))
            .await?;

        let mut today_daily = None;
        let mut today_meals = Vec::new();

        let mut date = today;
        let last_day = end_of_month(today);
        while date <= last_day {
            let daily = self
                .budget_repository
                .save_daily(DailyBudget::new(
                    member_id.to_string(),
                    date,
                    request.daily_budget,
                ))
                .await?;

            let mut meals = Vec::new();
            for (meal_type, amount) in ordered_meal_amounts(&request.meal_budgets) {
                let meal = self
                    .budget_repository
                    .save_meal_budget(MealBudget::new(
                        member_id.to_string(),
                        date,
                        meal_type,
                        amount,
                    ))
                    .await?;
                meals.push(meal);
            }

            if date == today {
                today_daily = Some(daily);
                today_meals = meals;
            }

            date = match date.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => break,
            };
        }

        let daily_budget = today_daily
            .ok_or_else(|| ServiceError::Configuration {
                message: "Budget plan produced no daily budget for today".to_string(),
            })?
            .to_response(&today_meals);

        info!("Budget plan created");
        Ok(SetupBudgetResponse {
            monthly_budget: monthly.to_response(),
            daily_budget,
        })
    }

    /// Record policy agreements. Every required policy must be agreed to.
    #[instrument(skip(self, request), fields(member_id = %member_id))]
    pub async fn agree_policies(
        &self,
        member_id: &str,
        request: PolicyAgreementRequest,
    ) -> ServiceResult<Vec<PolicyAgreement>> {
        info!("Recording policy agreements");

        let policies = self.policy_repository.find_policies().await?;

        for item in &request.agreements {
            if !policies.iter().any(|p| p.policy_id == item.policy_id) {
                return Err(ServiceError::PolicyNotFound {
                    policy_id: item.policy_id.clone(),
                });
            }
        }

        for policy in policies.iter().filter(|p| p.required) {
            let agreed = request
                .agreements
                .iter()
                .any(|item| item.policy_id == policy.policy_id && item.agreed);
            if !agreed {
                return Err(ServiceError::RequiredPolicyNotAgreed {
                    policy_id: policy.policy_id.clone(),
                });
            }
        }

        let now = Utc::now();
        let mut saved = Vec::new();
        for item in request.agreements {
            let agreement = PolicyAgreement {
                member_id: member_id.to_string(),
                policy_id: item.policy_id,
                agreed: item.agreed,
                agreed_at: now,
            };
            saved.push(self.policy_repository.save_agreement(agreement).await?);
        }

        info!("Policy agreements recorded");
        Ok(saved)
    }
}

fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}
