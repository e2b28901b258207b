//! Church member use-case service.
//!
//! # Invariants
//! - Validation runs before any repository call.
//! - `joined_at` defaults to the creation time when the caller omits it.
//! - Range queries require `start <= end`.

use crate::db::QueryContext;
use crate::model::church_member::{validate_member_id, ChurchMember, ChurchMemberDraft, MemberId};
use crate::model::validation::validate_range;
use crate::repo::church_member_repo::ChurchMemberRepository;
use crate::service::{ServiceError, ServiceResult};
use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, info};

/// Use-case service for church members.
pub struct ChurchMemberService<R: ChurchMemberRepository> {
    repo: R,
}

impl<R: ChurchMemberRepository> ChurchMemberService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and inserts a member, returning its new id.
    pub fn create(&self, ctx: &QueryContext, draft: ChurchMemberDraft) -> ServiceResult<MemberId> {
        let draft = draft.normalized();
        draft.validate()?;
        if self.repo.get_by_email(ctx, &draft.email)?.is_some() {
            debug!("event=member_create module=service status=conflict");
            return Err(ServiceError::Conflict { field: "email" });
        }

        let id = self
            .repo
            .create(ctx, &draft.into_new(Utc::now().trunc_subsecs(3)))?;
        info!("event=member_create module=service status=ok member_id={id}");
        Ok(id)
    }

    /// Returns `Ok(None)` when no member has this id.
    pub fn get(&self, ctx: &QueryContext, id: MemberId) -> ServiceResult<Option<ChurchMember>> {
        validate_member_id(id)?;
        Ok(self.repo.get_by_id(ctx, id)?)
    }

    /// Replaces contact details of an existing member.
    pub fn update(
        &self,
        ctx: &QueryContext,
        id: MemberId,
        draft: &ChurchMemberDraft,
    ) -> ServiceResult<()> {
        validate_member_id(id)?;
        let draft = draft.clone().normalized();
        draft.validate()?;

        let existing = self
            .repo
            .get_by_id(ctx, id)?
            .ok_or(ServiceError::NotFound {
                entity: "member",
                id,
            })?;
        if draft.email != existing.email && self.repo.get_by_email(ctx, &draft.email)?.is_some() {
            debug!("event=member_update module=service status=conflict member_id={id}");
            return Err(ServiceError::Conflict { field: "email" });
        }

        self.repo.update(ctx, id, &draft)?;
        info!("event=member_update module=service status=ok member_id={id}");
        Ok(())
    }

    /// Deletes by id; deleting a missing id succeeds.
    pub fn delete(&self, ctx: &QueryContext, id: MemberId) -> ServiceResult<()> {
        validate_member_id(id)?;
        self.repo.delete(ctx, id)?;
        info!("event=member_delete module=service status=ok member_id={id}");
        Ok(())
    }

    /// All members, newest `joined_at` first.
    pub fn list(&self, ctx: &QueryContext) -> ServiceResult<Vec<ChurchMember>> {
        Ok(self.repo.list(ctx)?)
    }

    /// Members joined within `start..=end`, newest first.
    pub fn list_by_joined_range(
        &self,
        ctx: &QueryContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<ChurchMember>> {
        validate_range(start, end)?;
        Ok(self.repo.list_by_joined_range(ctx, start, end)?)
    }
}
