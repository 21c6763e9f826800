use chrono::NaiveDate;
use thiserror::Error;

/// Service-level errors that can occur in business logic.
///
/// Each variant maps to exactly one envelope error code and HTTP status,
/// see [`ServiceError::error_code`] and [`ServiceError::status_code`].
#[derive(Debug, Error)]
pub enum ServiceError {
    // 400
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Invalid date format: {value}")]
    InvalidDateFormat { value: String },

    #[error("Invalid date range: {start} > {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    // 401
    #[error("Invalid token")]
    InvalidToken,

    #[error("Expired token")]
    ExpiredToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    // 403
    #[error("Account locked after repeated failed logins")]
    AccountLocked,

    #[error("Access denied to resource {resource}")]
    AccessDenied { resource: String },

    // 404
    #[error("Member not found: {member_id}")]
    MemberNotFound { member_id: String },

    #[error("Food not found: {food_id}")]
    FoodNotFound { food_id: String },

    #[error("Store not found: {store_id}")]
    StoreNotFound { store_id: String },

    #[error("Expenditure not found: {expenditure_id}")]
    ExpenditureNotFound { expenditure_id: String },

    #[error("Cart not found for store: {store_id}")]
    CartNotFound { store_id: String },

    #[error("Cart item not found: food_id={food_id}")]
    CartItemNotFound { food_id: String },

    #[error("Monthly budget not found for month: {month}")]
    MonthlyBudgetNotFound { month: String },

    #[error("Daily budget not found for date: {date}")]
    DailyBudgetNotFound { date: NaiveDate },

    #[error("No primary address registered")]
    AddressNotFound,

    #[error("Policy not found: {policy_id}")]
    PolicyNotFound { policy_id: String },

    // 409
    #[error("Email already registered: {email}")]
    DuplicateEmail { email: String },

    #[error("Nickname already taken: {nickname}")]
    DuplicateNickname { nickname: String },

    #[error("Cart already exists for a different store: {store_id}")]
    CartConflict { store_id: String },

    #[error("Monthly budget already exists for month: {month}")]
    MonthlyBudgetAlreadyExists { month: String },

    #[error("Daily budget already exists for date: {date}")]
    DailyBudgetAlreadyExists { date: NaiveDate },

    // 422
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Password must be 8-20 characters with a letter, a digit and a special character")]
    InvalidPasswordFormat,

    #[error("Invalid email format: {email}")]
    InvalidEmailFormat { email: String },

    #[error("Meal budgets must sum to the daily budget: {message}")]
    InvalidBudget { message: String },

    #[error("Required policy not agreed: {policy_id}")]
    RequiredPolicyNotAgreed { policy_id: String },

    #[error("Could not parse SMS message")]
    SmsParsingFailed,

    // 500
    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("External service error: {service}: {message}")]
    ExternalService { service: String, message: String },
}

impl ServiceError {
    /// Envelope error code (`E400`..`E500`) for this error.
    pub fn error_code(&self) -> &'static str {
        use ServiceError::*;
        match self {
            BadRequest { .. } | InvalidDateFormat { .. } | InvalidDateRange { .. } => "E400",
            InvalidToken | ExpiredToken | InvalidCredentials => "E401",
            AccountLocked | AccessDenied { .. } => "E403",
            MemberNotFound { .. }
            | FoodNotFound { .. }
            | StoreNotFound { .. }
            | ExpenditureNotFound { .. }
            | CartNotFound { .. }
            | CartItemNotFound { .. }
            | MonthlyBudgetNotFound { .. }
            | DailyBudgetNotFound { .. }
            | AddressNotFound
            | PolicyNotFound { .. } => "E404",
            DuplicateEmail { .. }
            | DuplicateNickname { .. }
            | CartConflict { .. }
            | MonthlyBudgetAlreadyExists { .. }
            | DailyBudgetAlreadyExists { .. } => "E409",
            ValidationError { .. }
            | InvalidPasswordFormat
            | InvalidEmailFormat { .. }
            | InvalidBudget { .. }
            | RequiredPolicyNotAgreed { .. }
            | SmsParsingFailed => "E422",
            Repository { .. } | Configuration { .. } | ExternalService { .. } => "E500",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self.error_code() {
            "E400" => 400,
            "E401" => 401,
            "E403" => 403,
            "E404" => 404,
            "E409" => 409,
            "E422" => 422,
            _ => 500,
        }
    }
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("Item not found")]
    NotFound,

    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("DynamoDB table not found: {table_name}. Ensure the table exists and IAM permissions are correct.")]
    TableNotFound { table_name: String },

    #[error("Invalid query parameters: {message}")]
    InvalidQuery { message: String },

    #[error("Timeout occurred during operation")]
    Timeout,
}

/// Validation errors for input data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Invalid field value: {field}={value}, reason={reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field too long: {field}, max_length={max_length}, actual_length={actual_length}")]
    TooLong {
        field: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("Invalid format: {field}, expected={expected}")]
    InvalidFormat { field: String, expected: String },

    #[error("Value out of range: {field}, min={min}, max={max}, value={value}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
        value: String,
    },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
