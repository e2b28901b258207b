//! User use-case service.

use crate::db::QueryContext;
use crate::model::user::{validate_user_id, User, UserDraft, UserId};
use crate::repo::user_repo::UserRepository;
use crate::service::{ServiceError, ServiceResult};
use chrono::{SubsecRound, Utc};
use log::{debug, info};

/// Use-case service for users.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and inserts a user, returning its new id.
    ///
    /// Fails with `Conflict` when the email is already registered.
    pub fn create(&self, ctx: &QueryContext, draft: UserDraft) -> ServiceResult<UserId> {
        let draft = draft.normalized();
        draft.validate()?;
        if self.repo.get_by_email(ctx, &draft.email)?.is_some() {
            debug!("event=user_create module=service status=conflict");
            return Err(ServiceError::Conflict { field: "email" });
        }

        let id = self
            .repo
            .create(ctx, &draft.into_new(Utc::now().trunc_subsecs(3)))?;
        info!("event=user_create module=service status=ok user_id={id}");
        Ok(id)
    }

    /// Returns `Ok(None)` when no user has this id.
    pub fn get(&self, ctx: &QueryContext, id: UserId) -> ServiceResult<Option<User>> {
        validate_user_id(id)?;
        Ok(self.repo.get_by_id(ctx, id)?)
    }

    /// Replaces name and email of an existing user.
    ///
    /// The uniqueness lookup runs only when the email actually changes.
    pub fn update(&self, ctx: &QueryContext, id: UserId, draft: &UserDraft) -> ServiceResult<()> {
        validate_user_id(id)?;
        let draft = draft.clone().normalized();
        draft.validate()?;

        let existing = self
            .repo
            .get_by_id(ctx, id)?
            .ok_or(ServiceError::NotFound { entity: "user", id })?;
        if draft.email != existing.email && self.repo.get_by_email(ctx, &draft.email)?.is_some() {
            debug!("event=user_update module=service status=conflict user_id={id}");
            return Err(ServiceError::Conflict { field: "email" });
        }

        self.repo.update(ctx, id, &draft)?;
        info!("event=user_update module=service status=ok user_id={id}");
        Ok(())
    }

    /// Deletes by id; deleting a missing id succeeds.
    pub fn delete(&self, ctx: &QueryContext, id: UserId) -> ServiceResult<()> {
        validate_user_id(id)?;
        self.repo.delete(ctx, id)?;
        info!("event=user_delete module=service status=ok user_id={id}");
        Ok(())
    }

    pub fn list(&self, ctx: &QueryContext) -> ServiceResult<Vec<User>> {
        Ok(self.repo.list(ctx)?)
    }
}
