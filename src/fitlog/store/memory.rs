//! In-process [`UserStore`] used by handler tests.

use super::{FindOptions, StoreError, UserFilter, UserStore};
use crate::fitlog::user::{hash_password, Cardio, NewUser, Related, Resistance, User};
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    cardio: Vec<(Uuid, Cardio)>,
    resistance: Vec<(Uuid, Resistance)>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn add_cardio(&self, user_id: Uuid, entry: Cardio) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.cardio.push((user_id, entry));
        }
    }

    pub fn add_resistance(&self, user_id: Uuid, entry: Resistance) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.resistance.push((user_id, entry));
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unexpected(anyhow!("memory store poisoned")))
    }
}

fn matches(user: &User, filter: &UserFilter) -> bool {
    match filter {
        UserFilter::Id(id) => user.id == *id,
        UserFilter::Username(username) => user.username == *username,
        UserFilter::UsernameOrEmail { username, email } => {
            username.as_deref() == Some(user.username.as_str())
                || email.as_deref() == Some(user.email.as_str())
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_one(
        &self,
        filter: &UserFilter,
        options: FindOptions,
    ) -> Result<Option<User>, StoreError> {
        let tables = self.lock()?;

        let Some(mut user) = tables.users.iter().find(|u| matches(u, filter)).cloned() else {
            return Ok(None);
        };

        let cardio = tables
            .cardio
            .iter()
            .filter(|(owner, _)| *owner == user.id)
            .map(|(_, entry)| entry.clone());
        let resistance = tables
            .resistance
            .iter()
            .filter(|(owner, _)| *owner == user.id)
            .map(|(_, entry)| entry.clone());

        if options.populates() {
            user.cardio = Related::Expanded(cardio.collect());
            user.resistance = Related::Expanded(resistance.collect());
        } else {
            user.cardio = Related::Ids(cardio.map(|entry| entry.id).collect());
            user.resistance = Related::Ids(resistance.map(|entry| entry.id).collect());
        }

        if options.excludes_version() {
            user.version = None;
        }

        Ok(Some(user))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let valid = new_user.validate().map_err(StoreError::Validation)?;
        let password = hash_password(valid.password).await?;

        let mut tables = self.lock()?;

        if tables.users.iter().any(|u| u.username == valid.username) {
            return Err(StoreError::Conflict {
                field: "username".to_string(),
            });
        }
        if tables.users.iter().any(|u| u.email == valid.email) {
            return Err(StoreError::Conflict {
                field: "email".to_string(),
            });
        }

        let user = User {
            id: Uuid::now_v7(),
            username: valid.username,
            email: valid.email,
            password,
            version: Some(0),
            cardio: Related::default(),
            resistance: Related::default(),
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

/// A store whose every call fails, for exercising the 500 paths.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl UserStore for FailingStore {
    async fn find_one(
        &self,
        _filter: &UserFilter,
        _options: FindOptions,
    ) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unexpected(anyhow!("connection refused")))
    }

    async fn create(&self, _new_user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Unexpected(anyhow!("connection refused")))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unexpected(anyhow!("connection refused")))
    }
}
