//! Domain records for users and church members.
//!
//! # Responsibility
//! - Define persisted records and the caller-supplied drafts they come from.
//! - Own structural validation rules applied before any storage access.
//!
//! # Invariants
//! - `id` is assigned by storage exactly once and never reused.
//! - `created_at` is set once at creation and never mutated.

pub mod church_member;
pub mod user;
pub mod validation;

pub use church_member::{ChurchMember, ChurchMemberDraft, MemberId, NewChurchMember};
pub use user::{NewUser, User, UserDraft, UserId};
pub use validation::{is_valid_email, ValidationError};
