pub mod api;
pub mod auth;
pub mod budget;
pub mod cart;
pub mod catalog;
pub mod expenditure;
pub mod health;
pub mod home;
pub mod metrics;
pub mod middleware;
pub mod onboarding;

pub use api::{create_api_router, ApiState, AuthMember};
pub use health::{liveness, readiness};
pub use metrics::metrics_handler;
