//! User repository contract and SQLite implementation.

use crate::db::{Executor, OptionalRow, QueryContext};
use crate::model::user::{NewUser, User, UserDraft, UserId};
use crate::repo::{timestamp_column, to_epoch_ms, RepoError, RepoResult};
use rusqlite::{params, Row};

const INSERT_SQL: &str = "INSERT INTO users (name, email, created_at)
VALUES (?1, ?2, ?3)
RETURNING id;";

const SELECT_BY_ID_SQL: &str = "SELECT id, name, email, created_at
FROM users
WHERE id = ?1;";

const SELECT_BY_EMAIL_SQL: &str = "SELECT id, name, email, created_at
FROM users
WHERE email = ?1;";

const UPDATE_SQL: &str = "UPDATE users
SET name = ?1, email = ?2
WHERE id = ?3;";

const DELETE_SQL: &str = "DELETE FROM users WHERE id = ?1;";

const LIST_SQL: &str = "SELECT id, name, email, created_at
FROM users
ORDER BY id ASC;";

/// Data access contract for users.
pub trait UserRepository {
    /// Inserts a user and returns the storage-assigned id.
    fn create(&self, ctx: &QueryContext, user: &NewUser) -> RepoResult<UserId>;
    fn get_by_id(&self, ctx: &QueryContext, id: UserId) -> RepoResult<Option<User>>;
    /// Exact, case-sensitive email lookup used for conflict detection.
    fn get_by_email(&self, ctx: &QueryContext, email: &str) -> RepoResult<Option<User>>;
    /// Replaces `name` and `email`; `created_at` is never touched.
    fn update(&self, ctx: &QueryContext, id: UserId, draft: &UserDraft) -> RepoResult<()>;
    /// Deletes unconditionally; a missing id is not an error.
    fn delete(&self, ctx: &QueryContext, id: UserId) -> RepoResult<()>;
    /// All users ordered by ascending id.
    fn list(&self, ctx: &QueryContext) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository over any executor.
#[derive(Debug, Clone)]
pub struct SqliteUserRepository<E> {
    exec: E,
}

impl<E: Executor> SqliteUserRepository<E> {
    pub fn new(exec: E) -> Self {
        Self { exec }
    }
}

impl<E: Executor> UserRepository for SqliteUserRepository<E> {
    fn create(&self, ctx: &QueryContext, user: &NewUser) -> RepoResult<UserId> {
        let id = self.exec.fetch_one(
            ctx,
            INSERT_SQL,
            params![user.name, user.email, to_epoch_ms(user.created_at)],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_by_id(&self, ctx: &QueryContext, id: UserId) -> RepoResult<Option<User>> {
        self.exec
            .fetch_one(ctx, SELECT_BY_ID_SQL, [id], parse_user_row)
            .optional()
            .map_err(RepoError::from)
    }

    fn get_by_email(&self, ctx: &QueryContext, email: &str) -> RepoResult<Option<User>> {
        self.exec
            .fetch_one(ctx, SELECT_BY_EMAIL_SQL, [email], parse_user_row)
            .optional()
            .map_err(RepoError::from)
    }

    fn update(&self, ctx: &QueryContext, id: UserId, draft: &UserDraft) -> RepoResult<()> {
        self.exec
            .execute(ctx, UPDATE_SQL, params![draft.name, draft.email, id])?;
        Ok(())
    }

    fn delete(&self, ctx: &QueryContext, id: UserId) -> RepoResult<()> {
        self.exec.execute(ctx, DELETE_SQL, [id])?;
        Ok(())
    }

    fn list(&self, ctx: &QueryContext) -> RepoResult<Vec<User>> {
        let users = self.exec.fetch_many(ctx, LIST_SQL, [], |rows| {
            let mut users = Vec::new();
            while let Some(row) = rows.next()? {
                users.push(parse_user_row(row)?);
            }
            Ok(users)
        })?;
        Ok(users)
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}
