//! The user record and the rules a new record must satisfy.
//!
//! Credentials are stored as argon2id PHC strings. Hashing and verification
//! are CPU bound, so both run on the blocking pool.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// A reference to a related collection, either the bare ids or the full entries.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Related<T> {
    Ids(Vec<Uuid>),
    Expanded(Vec<T>),
}

impl<T> Default for Related<T> {
    fn default() -> Self {
        Self::Ids(Vec::new())
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Cardio {
    pub id: Uuid,
    pub name: String,
    pub distance: f64,
    /// Minutes
    pub duration: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Resistance {
    pub id: Uuid,
    pub name: String,
    pub weight: f64,
    pub sets: i32,
    pub reps: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    /// Internal record version, absent when projected out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[schema(value_type = Vec<Object>)]
    pub cardio: Related<Cardio>,
    #[schema(value_type = Vec<Object>)]
    pub resistance: Related<Resistance>,
}

impl User {
    /// Check a plaintext candidate against the stored credential.
    ///
    /// # Errors
    /// Returns an error if the stored hash is unreadable or the blocking task fails.
    pub async fn is_correct_password(&self, candidate: &str) -> Result<bool> {
        let stored = self.password.clone();
        let candidate = candidate.to_owned();

        tokio::task::spawn_blocking(move || verify_password(&candidate, &stored))
            .await
            .context("password verification task failed")?
    }
}

/// Registration payload as received; every field is optional so missing
/// fields surface as validation messages rather than extractor rejections.
#[derive(ToSchema, Deserialize, Default, Clone)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: Option<String>,
    #[schema(format = Password)]
    pub password: Option<String>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A registration payload that passed validation; username and email are trimmed.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidNewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Apply the record rules, collecting every failing field message in field order.
    ///
    /// # Errors
    /// Returns the list of messages when any rule fails.
    pub fn validate(&self) -> Result<ValidNewUser, Vec<String>> {
        let mut messages = Vec::new();

        let username = self.username.as_deref().map(str::trim).unwrap_or_default();
        if username.is_empty() {
            messages.push("username is required".to_string());
        }

        let email = self.email.as_deref().map(str::trim).unwrap_or_default();
        if email.is_empty() {
            messages.push("email is required".to_string());
        } else if !valid_email(email) {
            messages.push("Must use a valid email address".to_string());
        }

        let password = self.password.as_deref().unwrap_or_default();
        if password.is_empty() {
            messages.push("password is required".to_string());
        }

        if messages.is_empty() {
            Ok(ValidNewUser {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
        } else {
            Err(messages)
        }
    }
}

static EMAIL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));

#[must_use]
pub fn valid_email(email: &str) -> bool {
    EMAIL.as_ref().is_ok_and(|re| re.is_match(email))
}

/// Hash a plaintext password into an argon2id PHC string.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("failed to hash password: {e}"))
    })
    .await
    .context("password hashing task failed")?
}

fn verify_password(candidate: &str, stored: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| anyhow!("invalid stored password hash: {e}"))?;

    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}
