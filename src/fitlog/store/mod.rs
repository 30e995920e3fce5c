//! Data access for user records.
//!
//! Handlers only see the [`UserStore`] trait; the process entry point decides
//! which implementation backs it.

mod postgres;
pub use self::postgres::PgStore;

#[cfg(test)]
pub(crate) mod memory;

use crate::fitlog::user::{NewUser, User};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Which record to look for. Each variant is one query; there is no way to
/// mix an id and a username in one lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Id(Uuid),
    Username(String),
    /// Match on username or email; a `None` side never matches.
    UsernameOrEmail {
        username: Option<String>,
        email: Option<String>,
    },
}

/// Projection and expansion applied to a found record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    without_version: bool,
    populate: bool,
}

impl FindOptions {
    /// Leave the internal version out of the result.
    #[must_use]
    pub const fn without_version(mut self) -> Self {
        self.without_version = true;
        self
    }

    /// Expand `cardio` and `resistance` into full entries.
    #[must_use]
    pub const fn populate(mut self) -> Self {
        self.populate = true;
        self
    }

    #[must_use]
    pub const fn excludes_version(&self) -> bool {
        self.without_version
    }

    #[must_use]
    pub const fn populates(&self) -> bool {
        self.populate
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{field} already exists")]
    Conflict { field: String },
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            let field = conflicting_field(&err);
            return Self::Conflict { field };
        }
        Self::Unexpected(anyhow::Error::new(err))
    }
}

#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// Find at most one record matching `filter`.
    async fn find_one(
        &self,
        filter: &UserFilter,
        options: FindOptions,
    ) -> Result<Option<User>, StoreError>;

    /// Validate, hash the credential and insert a new record.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Cheap reachability check for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Field named by a unique constraint, `users_<field>_key` by convention.
fn conflicting_field(err: &sqlx::Error) -> String {
    let constraint = match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    };

    constraint
        .map(|name| {
            let name = name.strip_prefix("users_").unwrap_or(name);
            name.strip_suffix("_key").unwrap_or(name).to_string()
        })
        .unwrap_or_else(|| "record".to_string())
}
