//! User persistence.
//!
//! Handlers only see the [`UserStore`] trait. [`PgUserStore`] backs it with
//! Postgres; addresses are embedded in the row as a JSONB array.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::auth::Role;
use crate::error::{ApiError, Result};
use crate::models::{Address, Avatar, NewUser, ProfileChanges, User};

/// Storage operations the user routes depend on
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Stored bcrypt hash for a user. Kept off [`User`] so it cannot be serialized by accident.
    async fn password_hash(&self, id: Uuid) -> Result<Option<String>>;

    /// Persist an activated registration. A taken email is `AlreadyExists`.
    async fn create(&self, new_user: NewUser) -> Result<User>;

    /// Overwrite name, email and phone. Other columns are left alone.
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User>;

    async fn update_avatar(&self, id: Uuid, avatar: &Avatar) -> Result<User>;

    /// Merge into the embedded address with the same id, or append it.
    /// The address must already carry an id.
    async fn upsert_address(&self, user_id: Uuid, address: &Address) -> Result<Option<User>>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;

    /// Remove one embedded address. Returns the refreshed user, if it exists.
    async fn pull_address(&self, user_id: Uuid, address_id: &str) -> Result<Option<User>>;

    async fn list_newest_first(&self) -> Result<Vec<User>>;

    /// Returns whether a record was deleted
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

const USER_COLUMNS: &str =
    "id, name, email, avatar_public_id, avatar_url, phone_number, role, addresses, created_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    avatar_public_id: String,
    avatar_url: String,
    phone_number: Option<String>,
    role: String,
    addresses: Json<Vec<Address>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = ApiError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role: Role = row.role.parse().map_err(ApiError::Internal)?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            avatar: Avatar {
                public_id: row.avatar_public_id,
                url: row.avatar_url,
            },
            phone_number: row.phone_number,
            role,
            addresses: row.addresses.0,
            created_at: row.created_at,
        })
    }
}

fn unique_violation_as_conflict(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::already_exists("User")
        }
        _ => ApiError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn password_hash(&self, id: Uuid) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(hash)
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = User::from_new(&new_user);
        let query = format!(
            "INSERT INTO users (id, name, email, password_hash, avatar_public_id, avatar_url, role, addresses, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&new_user.password_hash)
            .bind(&user.avatar.public_id)
            .bind(&user.avatar.url)
            .bind(user.role.as_str())
            .bind(Json(&user.addresses))
            .bind(user.created_at)
            .fetch_one(&self.db)
            .await
            .map_err(unique_violation_as_conflict)?
            .try_into()
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User> {
        let query = format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 phone_number = COALESCE($4, phone_number)
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.phone_number)
            .fetch_optional(&self.db)
            .await
            .map_err(unique_violation_as_conflict)?
            .ok_or_else(|| ApiError::not_found("User"))?
            .try_into()
    }

    async fn update_avatar(&self, id: Uuid, avatar: &Avatar) -> Result<User> {
        let query = format!(
            "UPDATE users SET avatar_public_id = $2, avatar_url = $3 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(&avatar.public_id)
            .bind(&avatar.url)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("User"))?
            .try_into()
    }

    async fn upsert_address(&self, user_id: Uuid, address: &Address) -> Result<Option<User>> {
        // `||` keeps stored keys the patch omits; unset fields are not serialized.
        let query = format!(
            "UPDATE users
             SET addresses = CASE
                 WHEN EXISTS (SELECT 1 FROM jsonb_array_elements(addresses) AS a WHERE a->>'id' = $2)
                 THEN (SELECT jsonb_agg(CASE WHEN e.a->>'id' = $2 THEN e.a || $3 ELSE e.a END ORDER BY e.n)
                       FROM jsonb_array_elements(addresses) WITH ORDINALITY AS e(a, n))
                 ELSE addresses || jsonb_build_array($3)
             END
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(user_id)
            .bind(&address.id)
            .bind(Json(address))
            .fetch_optional(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("User"));
        }
        Ok(())
    }

    async fn pull_address(&self, user_id: Uuid, address_id: &str) -> Result<Option<User>> {
        let query = format!(
            "UPDATE users
             SET addresses = COALESCE(
                 (SELECT jsonb_agg(a) FROM jsonb_array_elements(addresses) AS a WHERE a->>'id' <> $2),
                 '[]'::jsonb)
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(user_id)
            .bind(address_id)
            .fetch_optional(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_newest_first(&self) -> Result<Vec<User>> {
        let query = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.db)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
