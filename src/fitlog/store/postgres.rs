use super::{FindOptions, StoreError, UserFilter, UserStore};
use crate::fitlog::user::{hash_password, Cardio, NewUser, Related, Resistance, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions, PgRow},
    query::Query,
    Connection, PgPool, Postgres, Row,
};
use std::time::Duration;
use tracing::{debug, info_span, instrument, Instrument};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Postgres-backed [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a bounded pool to `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema. Every statement is idempotent.
    ///
    /// # Errors
    /// Returns an error if any statement fails.
    pub async fn apply_schema(&self) -> Result<()> {
        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
        }

        debug!("Schema applied");

        Ok(())
    }

    async fn cardio_entries(&self, user_id: Uuid) -> Result<Vec<Cardio>, sqlx::Error> {
        let query = r"
            SELECT id, name, distance, duration, date
            FROM cardio
            WHERE user_id = $1
            ORDER BY date, id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Cardio {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    distance: row.try_get("distance")?,
                    duration: row.try_get("duration")?,
                    date: row.try_get("date")?,
                })
            })
            .collect()
    }

    async fn resistance_entries(&self, user_id: Uuid) -> Result<Vec<Resistance>, sqlx::Error> {
        let query = r"
            SELECT id, name, weight, sets, reps, date
            FROM resistance
            WHERE user_id = $1
            ORDER BY date, id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Resistance {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    weight: row.try_get("weight")?,
                    sets: row.try_get("sets")?,
                    reps: row.try_get("reps")?,
                    date: row.try_get("date")?,
                })
            })
            .collect()
    }

    async fn related_ids(&self, table: RelatedTable, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let query = match table {
            RelatedTable::Cardio => "SELECT id FROM cardio WHERE user_id = $1 ORDER BY date, id",
            RelatedTable::Resistance => {
                "SELECT id FROM resistance WHERE user_id = $1 ORDER BY date, id"
            }
        };
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_scalar::<_, Uuid>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
    }
}

#[derive(Debug, Clone, Copy)]
enum RelatedTable {
    Cardio,
    Resistance,
}

fn select_user(filter: &UserFilter) -> (&'static str, Query<'_, Postgres, PgArguments>) {
    match filter {
        UserFilter::Id(id) => {
            let query = "SELECT id, username, email, password, version FROM users WHERE id = $1";
            (query, sqlx::query(query).bind(*id))
        }
        UserFilter::Username(username) => {
            let query =
                "SELECT id, username, email, password, version FROM users WHERE username = $1";
            (query, sqlx::query(query).bind(username.as_str()))
        }
        UserFilter::UsernameOrEmail { username, email } => {
            let query = r"
                SELECT id, username, email, password, version
                FROM users
                WHERE username = $1 OR email = $2
                ORDER BY created_at
                LIMIT 1
            ";
            (
                query,
                sqlx::query(query)
                    .bind(username.as_deref())
                    .bind(email.as_deref()),
            )
        }
    }
}

fn user_from_row(row: &PgRow, options: FindOptions) -> Result<User, sqlx::Error> {
    let version: i32 = row.try_get("version")?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        version: (!options.excludes_version()).then_some(version),
        cardio: Related::default(),
        resistance: Related::default(),
    })
}

#[async_trait]
impl UserStore for PgStore {
    #[instrument(skip(self))]
    async fn find_one(
        &self,
        filter: &UserFilter,
        options: FindOptions,
    ) -> Result<Option<User>, StoreError> {
        if let UserFilter::UsernameOrEmail {
            username: None,
            email: None,
        } = filter
        {
            return Ok(None);
        }

        let (statement, query) = select_user(filter);
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = statement
        );

        let Some(row) = query.fetch_optional(&self.pool).instrument(span).await? else {
            return Ok(None);
        };

        let mut user = user_from_row(&row, options)?;

        if options.populates() {
            user.cardio = Related::Expanded(self.cardio_entries(user.id).await?);
            user.resistance = Related::Expanded(self.resistance_entries(user.id).await?);
        } else {
            user.cardio = Related::Ids(self.related_ids(RelatedTable::Cardio, user.id).await?);
            user.resistance =
                Related::Ids(self.related_ids(RelatedTable::Resistance, user.id).await?);
        }

        Ok(Some(user))
    }

    #[instrument(skip(self))]
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let valid = new_user.validate().map_err(StoreError::Validation)?;
        let password = hash_password(valid.password).await?;

        let query = r"
            INSERT INTO users (id, username, email, password)
            VALUES ($1, $2, $3, $4)
            RETURNING version
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        let id = Uuid::now_v7();
        let row = sqlx::query(query)
            .bind(id)
            .bind(&valid.username)
            .bind(&valid.email)
            .bind(&password)
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;

        Ok(User {
            id,
            username: valid.username,
            email: valid.email,
            password,
            version: Some(row.try_get("version")?),
            cardio: Related::default(),
            resistance: Related::default(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;

        Ok(())
    }
}

/// Split a schema file into statements. Statements end with `;` at the end
/// of a line; `--` comment lines are dropped.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

#[cfg(all(test, unix))]
mod integration;
