//! Persistence and use-case core for the rollcall users and church members service.
//! Boundaries call into [`service`]; everything below it stays storage-agnostic
//! except [`db`].

pub mod boundary;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{
    open_database, open_database_in_memory, Database, DbError, PoolConfig, QueryContext,
    UnitOfWork,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{ChurchMember, ChurchMemberDraft, MemberId, User, UserDraft, UserId};
pub use repo::church_member_repo::{ChurchMemberRepository, SqliteChurchMemberRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::church_member_service::ChurchMemberService;
pub use service::user_service::UserService;
pub use service::{ErrorKind, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
