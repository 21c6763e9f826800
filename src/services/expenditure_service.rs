use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    validate_amount, validate_memo, CreateExpenditureRequest, Expenditure, ExpenditureFilters,
    ExpenditureListResponse, ExpenditureResponse, ParseSmsRequest, ParsedSms, ServiceError,
    ServiceResult, UpdateExpenditureRequest,
};
use crate::repositories::{BudgetRepository, ExpenditureRepository};
use crate::services::budget_service::apply_spending;
use crate::services::sms_parser::{parse_card_sms, SmsParsingClient};

/// Service for expenditure records: manual entry, SMS parsing, listing,
/// updates and soft deletion.
pub struct ExpenditureService {
    expenditure_repository: Arc<dyn ExpenditureRepository>,
    budget_repository: Arc<dyn BudgetRepository>,
    sms_client: Arc<dyn SmsParsingClient>,
}

impl ExpenditureService {
    pub fn new(
        expenditure_repository: Arc<dyn ExpenditureRepository>,
        budget_repository: Arc<dyn BudgetRepository>,
        sms_client: Arc<dyn SmsParsingClient>,
    ) -> Self {
        Self {
            expenditure_repository,
            budget_repository,
            sms_client,
        }
    }

    /// Record a manually entered expenditure and charge it against the
    /// budgets covering its date.
    #[instrument(skip(self, request), fields(member_id = %member_id, amount = request.amount))]
    pub async fn create(
        &self,
        member_id: &str,
        request: CreateExpenditureRequest,
    ) -> ServiceResult<ExpenditureResponse> {
        info!("Creating expenditure");

        if request.store_name.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Store name cannot be empty".to_string(),
            });
        }
        validate_amount("amount", request.amount)?;
        validate_amount("discount_amount", request.discount_amount)?;
        validate_memo(&request.memo)?;

        let expenditure = Expenditure::new(
            member_id.to_string(),
            None,
            request.store_name.trim().to_string(),
            request.amount,
            request.discount_amount,
            request.meal_type,
            request.category,
            request.memo,
            request.spent_at,
            request
                .items
                .into_iter()
                .map(|item| item.into_item())
                .collect(),
        );
        expenditure.validate_item_total()?;

        apply_spending(
            self.budget_repository.as_ref(),
            member_id,
            expenditure.spent_at.date_naive(),
            expenditure.meal_type,
            expenditure.amount,
        )
        .await?;

        let expenditure = self
            .expenditure_repository
            .save_expenditure(expenditure)
            .await?;

        info!(expenditure_id = %expenditure.expenditure_id, "Expenditure created");
        Ok(expenditure.to_response())
    }

    /// Parse a card-authorization SMS. The built-in vendor patterns run
    /// first; an external parsing client is the fallback. Nothing is
    /// persisted.
    #[instrument(skip(self, request))]
    pub async fn parse_sms(&self, request: ParseSmsRequest) -> ServiceResult<ParsedSms> {
        info!("Parsing card SMS");

        let message = request.message.trim();
        if message.is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Message cannot be empty".to_string(),
            });
        }

        if let Some(parsed) = parse_card_sms(message) {
            info!(vendor = %parsed.vendor, "SMS parsed by vendor pattern");
            return Ok(parsed);
        }

        match self.sms_client.parse(message).await {
            Ok(parsed) => {
                info!("SMS parsed by fallback client");
                Ok(parsed)
            }
            Err(e) => {
                warn!("SMS parsing failed: {}", e);
                Err(ServiceError::SmsParsingFailed)
            }
        }
    }

    /// List a member's expenditures, newest first
    #[instrument(skip(self, filters), fields(member_id = %member_id))]
    pub async fn list(
        &self,
        member_id: &str,
        filters: ExpenditureFilters,
    ) -> ServiceResult<ExpenditureListResponse> {
        info!("Listing expenditures");

        if let (Some(start), Some(end)) = (filters.start_date, filters.end_date) {
            if start > end {
                return Err(ServiceError::InvalidDateRange { start, end });
            }
        }

        let expenditures = self
            .expenditure_repository
            .find_expenditures(member_id, &filters)
            .await?;

        let total_count = expenditures.len();
        Ok(ExpenditureListResponse {
            expenditures: expenditures
                .iter()
                .map(Expenditure::to_response)
                .collect(),
            total_count,
        })
    }

    #[instrument(skip(self), fields(member_id = %member_id, expenditure_id = %expenditure_id))]
    pub async fn get(
        &self,
        member_id: &str,
        expenditure_id: &str,
    ) -> ServiceResult<ExpenditureResponse> {
        let expenditure = self.find_active(member_id, expenditure_id).await?;
        Ok(expenditure.to_response())
    }

    /// Reclassify an expenditure. The amount and items are immutable;
    /// budgets are not recharged.
    #[instrument(skip(self, request), fields(member_id = %member_id, expenditure_id = %expenditure_id))]
    pub async fn update(
        &self,
        member_id: &str,
        expenditure_id: &str,
        request: UpdateExpenditureRequest,
    ) -> ServiceResult<ExpenditureResponse> {
        info!("Updating expenditure");

        validate_memo(&request.memo)?;

        let mut expenditure = self.find_active(member_id, expenditure_id).await?;

        if let Some(meal_type) = request.meal_type {
            expenditure.meal_type = Some(meal_type);
        }
        if let Some(category) = request.category {
            expenditure.category = Some(category);
        }
        if let Some(memo) = request.memo {
            expenditure.memo = Some(memo);
        }

        let expenditure = self
            .expenditure_repository
            .save_expenditure(expenditure)
            .await?;

        info!("Expenditure updated");
        Ok(expenditure.to_response())
    }

    /// Soft-delete an expenditure. Used budget amounts are not rolled back.
    #[instrument(skip(self), fields(member_id = %member_id, expenditure_id = %expenditure_id))]
    pub async fn delete(&self, member_id: &str, expenditure_id: &str) -> ServiceResult<()> {
        info!("Deleting expenditure");

        let mut expenditure = self.find_active(member_id, expenditure_id).await?;
        expenditure.mark_deleted();
        self.expenditure_repository
            .save_expenditure(expenditure)
            .await?;

        info!("Expenditure soft-deleted");
        Ok(())
    }

    /// Resolve a live expenditure for the given member. The record is
    /// looked up by id alone so a record owned by someone else answers
    /// with AccessDenied rather than a not-found.
    async fn find_active(
        &self,
        member_id: &str,
        expenditure_id: &str,
    ) -> ServiceResult<Expenditure> {
        let expenditure = self
            .expenditure_repository
            .find_expenditure(expenditure_id)
            .await?
            .ok_or_else(|| ServiceError::ExpenditureNotFound {
                expenditure_id: expenditure_id.to_string(),
            })?;

        if !expenditure.is_owned_by(member_id) {
            return Err(ServiceError::AccessDenied {
                resource: format!("expenditure {}", expenditure_id),
            });
        }

        if expenditure.deleted {
            return Err(ServiceError::ExpenditureNotFound {
                expenditure_id: expenditure_id.to_string(),
            });
        }

        Ok(expenditure)
    }
}
