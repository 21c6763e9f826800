use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    validate_email, validate_password, LoginRequest, Member, MemberCredentials, ServiceError,
    ServiceResult, SignupRequest, TokenResponse,
};
use crate::repositories::MemberRepository;

/// Bearer token claims. `sub` carries the member id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Service for signup, login and token handling
pub struct AuthService {
    member_repository: Arc<dyn MemberRepository>,
    jwt_secret: String,
    token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(
        member_repository: Arc<dyn MemberRepository>,
        jwt_secret: String,
        token_ttl_seconds: i64,
    ) -> Self {
        Self {
            member_repository,
            jwt_secret,
            token_ttl_seconds,
        }
    }

    /// Register a new member and return an access token
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: SignupRequest) -> ServiceResult<TokenResponse> {
        info!("Signing up new member");

        validate_email(&request.email).map_err(|_| ServiceError::InvalidEmailFormat {
            email: request.email.clone(),
        })?;
        validate_password(&request.password).map_err(|_| ServiceError::InvalidPasswordFormat)?;

        if request.name.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Name cannot be empty".to_string(),
            });
        }

        if self
            .member_repository
            .find_credentials(&request.email)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateEmail {
                email: request.email,
            });
        }

        let password_hash = hash_password(&request.password)?;

        let member = Member::new(request.email.clone(), request.name.trim().to_string());
        let member = self.member_repository.save_member(member).await?;

        let credentials =
            MemberCredentials::new(request.email, member.member_id.clone(), password_hash);
        self.member_repository.save_credentials(credentials).await?;

        info!("Member signed up successfully");
        self.issue_token(&member.member_id)
    }

    /// Authenticate a member and return an access token. Five consecutive
    /// failures lock the account.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<TokenResponse> {
        info!("Logging in member");

        let mut credentials = match self
            .member_repository
            .find_credentials(&request.email)
            .await?
        {
            Some(credentials) => credentials,
            None => return Err(ServiceError::InvalidCredentials),
        };

        if credentials.locked {
            warn!("Login attempt on locked account");
            return Err(ServiceError::AccountLocked);
        }

        if !verify_password(&request.password, &credentials.password_hash)? {
            let locked_now = credentials.record_failure();
            self.member_repository.save_credentials(credentials).await?;

            if locked_now {
                warn!("Account locked after repeated failures");
                return Err(ServiceError::AccountLocked);
            }
            return Err(ServiceError::InvalidCredentials);
        }

        credentials.record_success();
        let credentials = self.member_repository.save_credentials(credentials).await?;

        info!("Member logged in successfully");
        self.issue_token(&credentials.member_id)
    }

    /// Issue a signed HS256 token for a member
    pub fn issue_token(&self, member_id: &str) -> ServiceResult<TokenResponse> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: member_id.to_string(),
            iat: now,
            exp: now + self.token_ttl_seconds,
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Configuration {
            message: format!("Token signing failed: {}", e),
        })?;

        Ok(TokenResponse {
            member_id: member_id.to_string(),
            access_token,
            expires_in_seconds: self.token_ttl_seconds.max(0) as u64,
        })
    }

    /// Verify a bearer token and return the member id it was issued for
    pub fn verify_token(&self, token: &str) -> ServiceResult<String> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::ExpiredToken,
            _ => ServiceError::InvalidToken,
        })?;

        Ok(data.claims.sub)
    }
}

fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Configuration {
            message: format!("Password hashing failed: {}", e),
        })
}

fn verify_password(password: &str, password_hash: &str) -> ServiceResult<bool> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| ServiceError::Configuration {
        message: format!("Stored password hash is invalid: {}", e),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
