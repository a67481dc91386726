/// User records and bearer-token lookup
///
/// Credential issuance and rotation happen outside this service; the store
/// only resolves API tokens to users for ownership checks.
use crate::db::models::{User, UserRole};
use crate::error::ApiResult;
use crate::store::parse_datetime;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserStore {
    db: SqlitePool,
}

impl UserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a user with a fresh API token
    pub async fn create(&self, name: &str, email: &str, role: UserRole) -> ApiResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_lowercase(),
            api_token: Uuid::new_v4().simple().to_string(),
            role,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, api_token, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.api_token)
        .bind(user.role.as_str())
        .bind(user.created_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(user)
    }

    /// Resolve a bearer token to its user
    pub async fn find_by_token(&self, token: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, api_token, role, created_at FROM users WHERE api_token = ?",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        row.map(parse_user).transpose()
    }

    pub async fn find_by_id(&self, id: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, api_token, role, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(parse_user).transpose()
    }
}

fn parse_user(row: sqlx::sqlite::SqliteRow) -> ApiResult<User> {
    let role: String = row.get("role");
    let created_at: String = row.get("created_at");

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        api_token: row.get("api_token"),
        role: UserRole::from_str(&role)?,
        created_at: parse_datetime(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> UserStore {
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                api_token TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'user',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        UserStore::new(db)
    }

    #[tokio::test]
    async fn test_create_and_find_by_token() {
        let store = memory_store().await;

        let user = store
            .create("Ada", "ada@example.com", UserRole::User)
            .await
            .unwrap();

        let found = store.find_by_token(&user.api_token).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, UserRole::User);

        assert!(store.find_by_token("bogus").await.unwrap().is_none());
    }
}
