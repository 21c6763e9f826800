use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AddressKind, RecommendationType};

/// A registered member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: String,
    pub email: String,
    pub name: String,
    pub nickname: String,
    pub recommendation_type: RecommendationType,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Create a new member; the nickname starts out as the display name.
    pub fn new(email: String, name: String) -> Self {
        Self {
            member_id: Uuid::new_v4().to_string(),
            email,
            nickname: name.clone(),
            name,
            recommendation_type: RecommendationType::Balanced,
            created_at: Utc::now(),
        }
    }

    pub fn to_response(&self) -> MemberResponse {
        MemberResponse {
            member_id: self.member_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            nickname: self.nickname.clone(),
            recommendation_type: self.recommendation_type,
            created_at: self.created_at,
        }
    }
}

/// Login credentials stored separately from the member profile.
/// The account locks once `failed_attempts` reaches the lockout threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberCredentials {
    pub email: String,
    pub member_id: String,
    pub password_hash: String,
    pub failed_attempts: u32,
    pub locked: bool,
}

impl MemberCredentials {
    pub const MAX_FAILED_ATTEMPTS: u32 = 5;

    pub fn new(email: String, member_id: String, password_hash: String) -> Self {
        Self {
            email,
            member_id,
            password_hash,
            failed_attempts: 0,
            locked: false,
        }
    }

    /// Record a failed login. Returns true when this failure locked the account.
    pub fn record_failure(&mut self) -> bool {
        self.failed_attempts += 1;
        if self.failed_attempts >= Self::MAX_FAILED_ATTEMPTS {
            self.locked = true;
        }
        self.locked
    }

    pub fn record_success(&mut self) {
        self.failed_attempts = 0;
    }
}

/// A saved address of a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressHistory {
    pub address_id: String,
    pub member_id: String,
    pub alias: String,
    pub road_address: String,
    pub detail: Option<String>,
    pub kind: AddressKind,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl AddressHistory {
    pub fn new(
        member_id: String,
        alias: String,
        road_address: String,
        detail: Option<String>,
        kind: AddressKind,
    ) -> Self {
        Self {
            address_id: Uuid::new_v4().to_string(),
            member_id,
            alias,
            road_address,
            detail,
            kind,
            is_primary: false,
            created_at: Utc::now(),
        }
    }
}

/// A terms-of-service policy members agree to during onboarding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub policy_id: String,
    pub title: String,
    pub content: String,
    pub required: bool,
}

/// A member's agreement record for one policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAgreement {
    pub member_id: String,
    pub policy_id: String,
    pub agreed: bool,
    pub agreed_at: DateTime<Utc>,
}

// REQUEST / RESPONSE MODELS

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub member_id: String,
    pub access_token: String,
    pub expires_in_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    pub member_id: String,
    pub email: String,
    pub name: String,
    pub nickname: String,
    pub recommendation_type: RecommendationType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAddressRequest {
    pub alias: String,
    pub road_address: String,
    pub detail: Option<String>,
    pub kind: AddressKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressResponse {
    pub address_id: String,
    pub alias: String,
    pub road_address: String,
    pub detail: Option<String>,
    pub kind: AddressKind,
    pub is_primary: bool,
}

impl AddressHistory {
    pub fn to_response(&self) -> AddressResponse {
        AddressResponse {
            address_id: self.address_id.clone(),
            alias: self.alias.clone(),
            road_address: self.road_address.clone(),
            detail: self.detail.clone(),
            kind: self.kind,
            is_primary: self.is_primary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyAgreementRequest {
    pub agreements: Vec<PolicyAgreementItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyAgreementItem {
    pub policy_id: String,
    pub agreed: bool,
}
