/// Request link store: legacy slug-keyed submission links
use crate::db::models::RequestLink;
use crate::error::{ApiError, ApiResult};
use crate::store::{parse_datetime, parse_opt_datetime};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewRequestLink {
    pub owner_id: String,
    pub slug: String,
    pub template_id: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestLinkUpdate {
    pub is_active: Option<bool>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
}

#[derive(Clone)]
pub struct RequestLinkStore {
    db: SqlitePool,
}

impl RequestLinkStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewRequestLink) -> ApiResult<RequestLink> {
        if self.find_by_slug(&new.slug).await?.is_some() {
            return Err(ApiError::Conflict("Slug already exists".to_string()));
        }

        if let Some(expiry) = new.expiry_date {
            if expiry <= Utc::now() {
                return Err(ApiError::Validation(
                    "Expiry date must be in the future".to_string(),
                ));
            }
        }

        let link = RequestLink {
            id: Uuid::new_v4().to_string(),
            owner_id: new.owner_id,
            slug: new.slug,
            template_id: new.template_id,
            expiry_date: new.expiry_date,
            max_uses: new.max_uses,
            uses: 0,
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO request_links
            (id, owner_id, slug, template_id, expiry_date, max_uses, uses, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&link.id)
        .bind(&link.owner_id)
        .bind(&link.slug)
        .bind(&link.template_id)
        .bind(link.expiry_date.map(|dt| dt.to_rfc3339()))
        .bind(link.max_uses)
        .bind(link.uses)
        .bind(link.is_active)
        .bind(link.created_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(link)
    }

    pub async fn find_by_slug(&self, slug: &str) -> ApiResult<Option<RequestLink>> {
        let row = sqlx::query(&select_sql("WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_link).transpose()
    }

    pub async fn find_by_id(&self, id: &str) -> ApiResult<Option<RequestLink>> {
        let row = sqlx::query(&select_sql("WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_link).transpose()
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> ApiResult<Vec<RequestLink>> {
        let rows = sqlx::query(&select_sql("WHERE owner_id = ? ORDER BY created_at DESC"))
            .bind(owner_id)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(parse_link).collect()
    }

    pub async fn count_active_for_owner(&self, owner_id: &str) -> ApiResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM request_links WHERE owner_id = ? AND is_active = 1",
        )
        .bind(owner_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.get("count"))
    }

    pub async fn update(&self, id: &str, update: RequestLinkUpdate) -> ApiResult<RequestLink> {
        let mut link = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Link not found".to_string()))?;

        if let Some(expiry) = update.expiry_date {
            if expiry <= Utc::now() {
                return Err(ApiError::Validation(
                    "Expiry date must be in the future".to_string(),
                ));
            }
            link.expiry_date = Some(expiry);
        }
        if let Some(is_active) = update.is_active {
            link.is_active = is_active;
        }
        if let Some(max_uses) = update.max_uses {
            link.max_uses = Some(max_uses);
        }

        sqlx::query(
            "UPDATE request_links SET is_active = ?, expiry_date = ?, max_uses = ? WHERE id = ?",
        )
        .bind(link.is_active)
        .bind(link.expiry_date.map(|dt| dt.to_rfc3339()))
        .bind(link.max_uses)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(link)
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM request_links WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Link not found".to_string()));
        }

        Ok(())
    }

    /// Plain counter bump, one per accepted submission citing the slug.
    /// Not atomic with the validity check; see RequestLink::is_valid.
    pub async fn increment_uses(&self, slug: &str) -> ApiResult<()> {
        sqlx::query("UPDATE request_links SET uses = uses + 1 WHERE slug = ?")
            .bind(slug)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

fn select_sql(clause: &str) -> String {
    format!(
        r#"
        SELECT id, owner_id, slug, template_id, expiry_date, max_uses, uses,
               is_active, created_at
        FROM request_links {}
        "#,
        clause
    )
}

fn parse_link(row: sqlx::sqlite::SqliteRow) -> ApiResult<RequestLink> {
    let created_at: String = row.get("created_at");

    Ok(RequestLink {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        slug: row.get("slug"),
        template_id: row.get("template_id"),
        expiry_date: parse_opt_datetime(row.try_get("expiry_date").ok()),
        max_uses: row.try_get("max_uses").ok(),
        uses: row.get("uses"),
        is_active: row.get("is_active"),
        created_at: parse_datetime(&created_at)?,
    })
}

#[cfg(test)]
pub(crate) async fn create_table(db: &SqlitePool) {
    sqlx::query(
        r#"
        CREATE TABLE request_links (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            template_id TEXT,
            expiry_date TEXT,
            max_uses INTEGER,
            uses INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> RequestLinkStore {
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        create_table(&db).await;
        RequestLinkStore::new(db)
    }

    fn sample(slug: &str) -> NewRequestLink {
        NewRequestLink {
            owner_id: "owner1".to_string(),
            slug: slug.to_string(),
            template_id: None,
            expiry_date: None,
            max_uses: None,
        }
    }

    #[tokio::test]
    async fn test_slug_must_be_unique() {
        let store = memory_store().await;
        store.create(sample("my-product")).await.unwrap();

        let err = store.create(sample("my-product")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_link_validity_rules() {
        let store = memory_store().await;
        let mut new = sample("limited");
        new.max_uses = Some(1);
        let link = store.create(new).await.unwrap();
        assert!(link.is_valid());

        store.increment_uses("limited").await.unwrap();
        let link = store.find_by_slug("limited").await.unwrap().unwrap();
        assert_eq!(link.uses, 1);
        assert!(!link.is_valid());
    }

    #[tokio::test]
    async fn test_deactivated_link_is_invalid() {
        let store = memory_store().await;
        let link = store.create(sample("paused")).await.unwrap();

        let link = store
            .update(
                &link.id,
                RequestLinkUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!link.is_valid());
    }
}
