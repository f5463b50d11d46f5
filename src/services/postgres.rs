use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{CandidateQuery, MatchRecord, MatchStatus, PairKey, Profile, User};
use crate::services::store::{MatchStore, StoreError, UserStore};

const USER_COLUMNS: &str = r#"
    u.id, u.email, u.is_verified, u.created_at,
    p.user_id AS profile_user_id, p.name, p.age, p.gender, p.bio, p.program,
    p.graduation_year, p.interests, p.photos, p.latitude, p.longitude, p.last_active
"#;

/// PostgreSQL-backed user and match store
///
/// Pair uniqueness is enforced by the `UNIQUE (user_low, user_high)`
/// constraint on `match_records`.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store from settings, applying pool defaults
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Insert a user account without a profile
    ///
    /// Account creation belongs to the registration flow; this exists for
    /// seeding and tests.
    pub async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, is_verified, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.is_verified)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        if let Some(profile) = &user.profile {
            self.save_profile(&user.id, profile).await?;
        }

        Ok(())
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let profile_user_id: Option<String> = row.try_get("profile_user_id")?;

    let profile = match profile_user_id {
        Some(_) => {
            let age: i32 = row.try_get("age")?;
            Some(Profile {
                name: row.try_get("name")?,
                age: u32::try_from(age)
                    .map_err(|_| StoreError::InvalidRow(format!("negative age {}", age)))?,
                gender: row.try_get("gender")?,
                bio: row.try_get("bio")?,
                program: row.try_get("program")?,
                graduation_year: row.try_get("graduation_year")?,
                interests: row.try_get("interests")?,
                photos: row.try_get("photos")?,
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
                last_active: row.try_get("last_active")?,
            })
        }
        None => None,
    };

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
        profile,
    })
}

fn record_from_row(row: &PgRow) -> Result<MatchRecord, StoreError> {
    Ok(MatchRecord {
        id: row.try_get("id")?,
        initiator_id: row.try_get("initiator_id")?,
        target_id: row.try_get("target_id")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn age_param(age: u32) -> i32 {
    i32::try_from(age).unwrap_or(i32::MAX)
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let query = format!(
            "SELECT {} FROM users u LEFT JOIN profiles p ON p.user_id = u.id WHERE u.id = $1",
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn query_users(&self, query: &CandidateQuery) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE u.id <> $1
              AND p.age BETWEEN $2 AND $3
              AND ($4::TEXT IS NULL OR p.gender = $4)
            ORDER BY u.id COLLATE "C"
            LIMIT $5
            "#,
            USER_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(&query.exclude_user_id)
            .bind(age_param(query.min_age))
            .bind(age_param(query.max_age))
            .bind(query.gender.as_deref())
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let users: Result<Vec<User>, _> = rows.iter().map(user_from_row).collect();
        let users = users?;

        tracing::debug!(
            "Candidate query excluding {} returned {} rows",
            query.exclude_user_id,
            users.len()
        );

        Ok(users)
    }

    async fn save_profile(&self, id: &str, profile: &Profile) -> Result<bool, StoreError> {
        let exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        if !exists {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO profiles (
                user_id, name, age, gender, bio, program, graduation_year,
                interests, photos, latitude, longitude, last_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                age = EXCLUDED.age,
                gender = EXCLUDED.gender,
                bio = EXCLUDED.bio,
                program = EXCLUDED.program,
                graduation_year = EXCLUDED.graduation_year,
                interests = EXCLUDED.interests,
                photos = EXCLUDED.photos,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                last_active = EXCLUDED.last_active
            "#,
        )
        .bind(id)
        .bind(&profile.name)
        .bind(age_param(profile.age))
        .bind(&profile.gender)
        .bind(&profile.bio)
        .bind(&profile.program)
        .bind(profile.graduation_year)
        .bind(&profile.interests)
        .bind(&profile.photos)
        .bind(profile.latitude)
        .bind(profile.longitude)
        .bind(profile.last_active)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn find_by_unordered_pair(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let key = PairKey::new(a, b);

        let row = sqlx::query(
            r#"
            SELECT id, initiator_id, target_id, status, created_at, updated_at
            FROM match_records
            WHERE user_low = $1 AND user_high = $2
            "#,
        )
        .bind(&key.low)
        .bind(&key.high)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn insert(&self, record: &MatchRecord) -> Result<(), StoreError> {
        let key = record.pair_key();

        let result = sqlx::query(
            r#"
            INSERT INTO match_records (
                id, initiator_id, target_id, user_low, user_high, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(&record.initiator_id)
        .bind(&record.target_id)
        .bind(&key.low)
        .bind(&key.high)
        .bind(record.status)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Conflict(format!(
                    "match record already exists for {} / {}",
                    key.low, key.high
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: MatchStatus,
        status: MatchStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE match_records
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(status)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
