//! Church member repository contract and SQLite implementation.

use crate::db::{Executor, OptionalRow, QueryContext};
use crate::model::church_member::{ChurchMember, ChurchMemberDraft, MemberId, NewChurchMember};
use crate::repo::{timestamp_column, to_epoch_ms, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

const INSERT_SQL: &str = "INSERT INTO church_members (
    name,
    email,
    phone,
    address,
    biography,
    joined_at,
    created_at,
    updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
RETURNING id;";

const SELECT_BY_ID_SQL: &str = "SELECT
    id, name, email, phone, address, biography, joined_at, created_at, updated_at
FROM church_members
WHERE id = ?1;";

const SELECT_BY_EMAIL_SQL: &str = "SELECT
    id, name, email, phone, address, biography, joined_at, created_at, updated_at
FROM church_members
WHERE email = ?1;";

const UPDATE_SQL: &str = "UPDATE church_members
SET
    name = ?1,
    email = ?2,
    phone = ?3,
    address = ?4,
    biography = ?5,
    updated_at = ?6
WHERE id = ?7;";

const DELETE_SQL: &str = "DELETE FROM church_members WHERE id = ?1;";

const LIST_SQL: &str = "SELECT
    id, name, email, phone, address, biography, joined_at, created_at, updated_at
FROM church_members
ORDER BY joined_at DESC, id ASC;";

const LIST_BY_JOINED_RANGE_SQL: &str = "SELECT
    id, name, email, phone, address, biography, joined_at, created_at, updated_at
FROM church_members
WHERE joined_at >= ?1
  AND joined_at <= ?2
ORDER BY joined_at DESC, id ASC;";

/// Data access contract for church members.
pub trait ChurchMemberRepository {
    /// Inserts a member and returns the storage-assigned id.
    ///
    /// `updated_at` starts equal to `created_at`.
    fn create(&self, ctx: &QueryContext, member: &NewChurchMember) -> RepoResult<MemberId>;
    fn get_by_id(&self, ctx: &QueryContext, id: MemberId) -> RepoResult<Option<ChurchMember>>;
    fn get_by_email(&self, ctx: &QueryContext, email: &str) -> RepoResult<Option<ChurchMember>>;
    /// Replaces contact fields and refreshes `updated_at`.
    ///
    /// `joined_at` and `created_at` are left untouched.
    fn update(&self, ctx: &QueryContext, id: MemberId, draft: &ChurchMemberDraft)
        -> RepoResult<()>;
    /// Deletes unconditionally; a missing id is not an error.
    fn delete(&self, ctx: &QueryContext, id: MemberId) -> RepoResult<()>;
    /// All members, newest `joined_at` first.
    fn list(&self, ctx: &QueryContext) -> RepoResult<Vec<ChurchMember>>;
    /// Members with `start <= joined_at <= end`, newest first.
    ///
    /// Callers wanting whole-day semantics widen `end` themselves.
    fn list_by_joined_range(
        &self,
        ctx: &QueryContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<ChurchMember>>;
}

/// SQLite-backed church member repository over any executor.
#[derive(Debug, Clone)]
pub struct SqliteChurchMemberRepository<E> {
    exec: E,
}

impl<E: Executor> SqliteChurchMemberRepository<E> {
    pub fn new(exec: E) -> Self {
        Self { exec }
    }

    fn fetch_members<P: rusqlite::Params>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: P,
    ) -> RepoResult<Vec<ChurchMember>> {
        let members = self.exec.fetch_many(ctx, sql, params, |rows| {
            let mut members = Vec::new();
            while let Some(row) = rows.next()? {
                members.push(parse_member_row(row)?);
            }
            Ok(members)
        })?;
        Ok(members)
    }
}

impl<E: Executor> ChurchMemberRepository for SqliteChurchMemberRepository<E> {
    fn create(&self, ctx: &QueryContext, member: &NewChurchMember) -> RepoResult<MemberId> {
        let id = self.exec.fetch_one(
            ctx,
            INSERT_SQL,
            params![
                member.name,
                member.email,
                member.phone.as_deref(),
                member.address.as_deref(),
                member.biography.as_deref(),
                to_epoch_ms(member.joined_at),
                to_epoch_ms(member.created_at),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_by_id(&self, ctx: &QueryContext, id: MemberId) -> RepoResult<Option<ChurchMember>> {
        self.exec
            .fetch_one(ctx, SELECT_BY_ID_SQL, [id], parse_member_row)
            .optional()
            .map_err(RepoError::from)
    }

    fn get_by_email(&self, ctx: &QueryContext, email: &str) -> RepoResult<Option<ChurchMember>> {
        self.exec
            .fetch_one(ctx, SELECT_BY_EMAIL_SQL, [email], parse_member_row)
            .optional()
            .map_err(RepoError::from)
    }

    fn update(
        &self,
        ctx: &QueryContext,
        id: MemberId,
        draft: &ChurchMemberDraft,
    ) -> RepoResult<()> {
        self.exec.execute(
            ctx,
            UPDATE_SQL,
            params![
                draft.name,
                draft.email,
                draft.phone.as_deref(),
                draft.address.as_deref(),
                draft.biography.as_deref(),
                to_epoch_ms(Utc::now()),
                id,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, ctx: &QueryContext, id: MemberId) -> RepoResult<()> {
        self.exec.execute(ctx, DELETE_SQL, [id])?;
        Ok(())
    }

    fn list(&self, ctx: &QueryContext) -> RepoResult<Vec<ChurchMember>> {
        self.fetch_members(ctx, LIST_SQL, [])
    }

    fn list_by_joined_range(
        &self,
        ctx: &QueryContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<ChurchMember>> {
        self.fetch_members(
            ctx,
            LIST_BY_JOINED_RANGE_SQL,
            [to_epoch_ms(start), to_epoch_ms(end)],
        )
    }
}

fn parse_member_row(row: &Row<'_>) -> rusqlite::Result<ChurchMember> {
    Ok(ChurchMember {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        address: row.get("address")?,
        biography: row.get("biography")?,
        joined_at: timestamp_column(row, "joined_at")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}
