//! Church member record.

use crate::model::validation::{
    require_positive_id, validate_email, validate_optional_max, validate_required_text,
    ValidationError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage-assigned church member identifier.
pub type MemberId = i64;

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 255;
const PHONE_MAX_CHARS: usize = 20;
const ADDRESS_MAX_CHARS: usize = 500;
const BIOGRAPHY_MAX_CHARS: usize = 5000;

/// Persisted church member with contact details and biography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurchMember {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    /// Primary sort and range-query key.
    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful update.
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied member fields for create and update.
///
/// `joined_at` defaults to the creation time when absent and is ignored by
/// updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurchMemberDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

impl ChurchMemberDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Trims `name` and `email`; the trimmed form is what gets validated and stored.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }

    /// Checks structural rules in field order, reporting the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required_text("name", &self.name, NAME_MIN_CHARS, NAME_MAX_CHARS)?;
        validate_email(&self.email)?;
        validate_optional_max("phone", self.phone.as_deref(), PHONE_MAX_CHARS)?;
        validate_optional_max("address", self.address.as_deref(), ADDRESS_MAX_CHARS)?;
        validate_optional_max("biography", self.biography.as_deref(), BIOGRAPHY_MAX_CHARS)
    }

    /// Applies creation defaults: `joined_at` falls back to `now`.
    pub fn into_new(self, now: DateTime<Utc>) -> NewChurchMember {
        let draft = self.normalized();
        NewChurchMember {
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            biography: draft.biography,
            joined_at: draft.joined_at.unwrap_or(now),
            created_at: now,
        }
    }
}

/// Validated draft with creation defaults applied, ready for insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChurchMember {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub biography: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn validate_member_id(id: MemberId) -> Result<(), ValidationError> {
    require_positive_id("member", id)
}
