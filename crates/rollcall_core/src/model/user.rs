//! User record.

use crate::model::validation::{
    require_positive_id, validate_email, validate_required_text, ValidationError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage-assigned user identifier.
pub type UserId = i64;

const NAME_MAX_CHARS: usize = 255;

/// Persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Natural key used for conflict detection.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied user fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
}

impl UserDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Trims `name` and `email`; the trimmed form is what gets validated and stored.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }

    /// Checks structural rules: non-blank name of at most 255 chars and a
    /// well-formed email.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required_text("name", &self.name, 1, NAME_MAX_CHARS)?;
        validate_email(&self.email)
    }

    /// Applies creation defaults.
    pub fn into_new(self, created_at: DateTime<Utc>) -> NewUser {
        let draft = self.normalized();
        NewUser {
            name: draft.name,
            email: draft.email,
            created_at,
        }
    }
}

/// Validated draft with creation timestamp applied, ready for insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Rejects non-positive user ids.
pub(crate) fn validate_user_id(id: UserId) -> Result<(), ValidationError> {
    require_positive_id("user", id)
}

#[cfg(test)]
mod tests {
    use super::UserDraft;
    use crate::model::validation::ValidationError;

    #[test]
    fn blank_name_is_required() {
        let err = UserDraft::new("   ", "ann@example.com")
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::Required { field: "name" });
    }

    #[test]
    fn single_char_name_is_accepted() {
        UserDraft::new("A", "a@example.com").validate().unwrap();
    }

    #[test]
    fn into_new_stores_trimmed_name_and_email() {
        let created_at = chrono::Utc::now();
        let new = UserDraft::new("  Ann  ", " ann@example.com ").into_new(created_at);
        assert_eq!(new.name, "Ann");
        assert_eq!(new.email, "ann@example.com");
    }

    #[test]
    fn malformed_email_is_rejected() {
        let err = UserDraft::new("Ann", "ann-at-example.com")
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidEmail);
    }
}
