// Services module - business logic layer

pub mod auth_service;
pub mod budget_service;
pub mod cart_service;
pub mod catalog_service;
pub mod expenditure_service;
pub mod home_service;
pub mod onboarding_service;
pub mod sms_parser;

pub use auth_service::AuthService;
pub use budget_service::BudgetService;
pub use cart_service::CartService;
pub use catalog_service::CatalogService;
pub use expenditure_service::ExpenditureService;
pub use home_service::HomeService;
pub use onboarding_service::OnboardingService;
pub use sms_parser::{DisabledSmsParsingClient, SmsParsingClient};
