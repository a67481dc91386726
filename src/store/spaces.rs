/// Space store: tenant collection configurations
use crate::db::models::{CollectionType, ExtraField, Space, Theme};
use crate::error::{ApiError, ApiResult};
use crate::store::{parse_datetime, parse_opt_datetime};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Fields accepted when creating a space
#[derive(Debug, Clone)]
pub struct NewSpace {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub header_title: Option<String>,
    pub header_message: Option<String>,
    pub question_list: Vec<String>,
    pub collect_extras: Vec<ExtraField>,
    pub collection_type: CollectionType,
    pub theme: Theme,
    pub button_color: String,
    pub language: String,
    pub auto_translate: bool,
    pub template_id: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
}

/// Partial update accepted by the dashboard
#[derive(Debug, Clone, Default)]
pub struct SpaceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
}

#[derive(Clone)]
pub struct SpaceStore {
    db: SqlitePool,
}

impl SpaceStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewSpace) -> ApiResult<Space> {
        // Expiry, once set, must lie in the future at write time
        if let Some(expiry) = new.expiry_date {
            if expiry <= Utc::now() {
                return Err(ApiError::Validation(
                    "Expiry date must be in the future".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let space = Space {
            id: Uuid::new_v4().to_string(),
            owner_id: new.owner_id,
            name: new.name,
            description: new.description,
            logo: new.logo,
            header_title: new.header_title,
            header_message: new.header_message,
            question_list: new.question_list,
            collect_extras: new.collect_extras,
            collection_type: new.collection_type,
            theme: new.theme,
            button_color: new.button_color,
            language: new.language,
            auto_translate: new.auto_translate,
            template_id: new.template_id,
            expiry_date: new.expiry_date,
            max_uses: new.max_uses,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO spaces
            (id, owner_id, name, description, logo, header_title, header_message,
             question_list, collect_extras, collection_type, theme, button_color,
             language, auto_translate, template_id, expiry_date, max_uses,
             is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&space.id)
        .bind(&space.owner_id)
        .bind(&space.name)
        .bind(&space.description)
        .bind(&space.logo)
        .bind(&space.header_title)
        .bind(&space.header_message)
        .bind(serde_json::to_string(&space.question_list).unwrap_or_default())
        .bind(serde_json::to_string(&space.collect_extras).unwrap_or_default())
        .bind(space.collection_type.as_str())
        .bind(space.theme.as_str())
        .bind(&space.button_color)
        .bind(&space.language)
        .bind(space.auto_translate)
        .bind(&space.template_id)
        .bind(space.expiry_date.map(|dt| dt.to_rfc3339()))
        .bind(space.max_uses)
        .bind(space.is_active)
        .bind(space.created_at.to_rfc3339())
        .bind(space.updated_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(space)
    }

    /// Owner-scoped lookup, active spaces only
    pub async fn find_active_for_owner(
        &self,
        space_id: &str,
        owner_id: &str,
    ) -> ApiResult<Option<Space>> {
        let row = sqlx::query(&select_sql("WHERE id = ? AND owner_id = ? AND is_active = 1"))
            .bind(space_id)
            .bind(owner_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_space).transpose()
    }

    /// Owner-scoped lookup regardless of active flag (update/delete paths)
    pub async fn find_for_owner(&self, space_id: &str, owner_id: &str) -> ApiResult<Option<Space>> {
        let row = sqlx::query(&select_sql("WHERE id = ? AND owner_id = ?"))
            .bind(space_id)
            .bind(owner_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_space).transpose()
    }

    /// Public lookup for the submission form; inactive spaces are invisible
    pub async fn find_public(&self, space_id: &str) -> ApiResult<Option<Space>> {
        let row = sqlx::query(&select_sql("WHERE id = ? AND is_active = 1"))
            .bind(space_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_space).transpose()
    }

    /// Lookup without scoping; used by the embed pipeline to resolve a
    /// widget's parent space
    pub async fn find_by_id(&self, space_id: &str) -> ApiResult<Option<Space>> {
        let row = sqlx::query(&select_sql("WHERE id = ?"))
            .bind(space_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_space).transpose()
    }

    pub async fn list_for_owner(
        &self,
        owner_id: &str,
        page: u32,
        limit: u32,
    ) -> ApiResult<Vec<Space>> {
        let offset = (page.saturating_sub(1)) * limit;
        let rows = sqlx::query(&select_sql(
            "WHERE owner_id = ? AND is_active = 1 ORDER BY created_at DESC LIMIT ? OFFSET ?",
        ))
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(parse_space).collect()
    }

    pub async fn count_for_owner(&self, owner_id: &str) -> ApiResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM spaces WHERE owner_id = ? AND is_active = 1",
        )
        .bind(owner_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.get("count"))
    }

    pub async fn update(
        &self,
        space_id: &str,
        owner_id: &str,
        update: SpaceUpdate,
    ) -> ApiResult<Space> {
        let mut space = self
            .find_for_owner(space_id, owner_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Space not found".to_string()))?;

        if let Some(expiry) = update.expiry_date {
            if expiry <= Utc::now() {
                return Err(ApiError::Validation(
                    "Expiry date must be in the future".to_string(),
                ));
            }
        }

        if let Some(name) = update.name {
            space.name = name;
        }
        if let Some(description) = update.description {
            space.description = Some(description);
        }
        if let Some(expiry) = update.expiry_date {
            space.expiry_date = Some(expiry);
        }
        if let Some(max_uses) = update.max_uses {
            space.max_uses = Some(max_uses);
        }
        space.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE spaces
            SET name = ?, description = ?, expiry_date = ?, max_uses = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&space.name)
        .bind(&space.description)
        .bind(space.expiry_date.map(|dt| dt.to_rfc3339()))
        .bind(space.max_uses)
        .bind(space.updated_at.to_rfc3339())
        .bind(space_id)
        .bind(owner_id)
        .execute(&self.db)
        .await?;

        Ok(space)
    }

    /// Soft delete: flip `is_active`, never remove the row
    pub async fn soft_delete(&self, space_id: &str, owner_id: &str) -> ApiResult<()> {
        let result = sqlx::query(
            "UPDATE spaces SET is_active = 0, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(space_id)
        .bind(owner_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Space not found".to_string()));
        }

        Ok(())
    }
}

fn select_sql(clause: &str) -> String {
    format!(
        r#"
        SELECT id, owner_id, name, description, logo, header_title, header_message,
               question_list, collect_extras, collection_type, theme, button_color,
               language, auto_translate, template_id, expiry_date, max_uses,
               is_active, created_at, updated_at
        FROM spaces {}
        "#,
        clause
    )
}

fn parse_space(row: sqlx::sqlite::SqliteRow) -> ApiResult<Space> {
    let question_list: String = row.get("question_list");
    let collect_extras: String = row.get("collect_extras");
    let collection_type: String = row.get("collection_type");
    let theme: String = row.get("theme");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Space {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        logo: row.get("logo"),
        header_title: row.get("header_title"),
        header_message: row.get("header_message"),
        question_list: serde_json::from_str(&question_list)
            .map_err(|e| ApiError::Internal(format!("Invalid question list: {}", e)))?,
        collect_extras: serde_json::from_str(&collect_extras)
            .map_err(|e| ApiError::Internal(format!("Invalid collect extras: {}", e)))?,
        collection_type: CollectionType::from_str(&collection_type)?,
        theme: Theme::from_str(&theme)?,
        button_color: row.get("button_color"),
        language: row.get("language"),
        auto_translate: row.get("auto_translate"),
        template_id: row.get("template_id"),
        expiry_date: parse_opt_datetime(row.try_get("expiry_date").ok()),
        max_uses: row.try_get("max_uses").ok(),
        is_active: row.get("is_active"),
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

#[cfg(test)]
pub(crate) async fn create_table(db: &SqlitePool) {
    sqlx::query(
        r#"
        CREATE TABLE spaces (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            logo TEXT,
            header_title TEXT,
            header_message TEXT,
            question_list TEXT NOT NULL,
            collect_extras TEXT NOT NULL DEFAULT '[]',
            collection_type TEXT NOT NULL DEFAULT 'text-and-video',
            theme TEXT NOT NULL DEFAULT 'light',
            button_color TEXT NOT NULL DEFAULT '#00A676',
            language TEXT NOT NULL DEFAULT 'en',
            auto_translate INTEGER NOT NULL DEFAULT 0,
            template_id TEXT,
            expiry_date TEXT,
            max_uses INTEGER,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await
    .unwrap();
}

#[cfg(test)]
pub(crate) fn sample_space(owner_id: &str) -> NewSpace {
    NewSpace {
        owner_id: owner_id.to_string(),
        name: "Acme feedback".to_string(),
        description: None,
        logo: None,
        header_title: None,
        header_message: None,
        question_list: vec!["What changed for you?".to_string()],
        collect_extras: vec![ExtraField::Name, ExtraField::Email],
        collection_type: CollectionType::TextAndStar,
        theme: Theme::Light,
        button_color: "#00A676".to_string(),
        language: "en".to_string(),
        auto_translate: false,
        template_id: None,
        expiry_date: None,
        max_uses: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SpaceStore {
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        create_table(&db).await;
        SpaceStore::new(db)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = memory_store().await;
        let space = store.create(sample_space("owner1")).await.unwrap();

        let found = store
            .find_active_for_owner(&space.id, "owner1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Acme feedback");
        assert_eq!(found.collection_type, CollectionType::TextAndStar);
        assert_eq!(found.question_list.len(), 1);

        // Other owners can't see it
        assert!(store
            .find_active_for_owner(&space.id, "owner2")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_past_expiry() {
        let store = memory_store().await;
        let mut new = sample_space("owner1");
        new.expiry_date = Some(Utc::now() - chrono::Duration::days(1));

        assert!(store.create(new).await.is_err());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_public() {
        let store = memory_store().await;
        let space = store.create(sample_space("owner1")).await.unwrap();

        assert!(store.find_public(&space.id).await.unwrap().is_some());

        store.soft_delete(&space.id, "owner1").await.unwrap();

        assert!(store.find_public(&space.id).await.unwrap().is_none());
        // Row still exists for the owner-agnostic lookup
        let raw = store.find_by_id(&space.id).await.unwrap().unwrap();
        assert!(!raw.is_active);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let store = memory_store().await;
        let space = store.create(sample_space("owner1")).await.unwrap();

        let updated = store
            .update(
                &space.id,
                "owner1",
                SpaceUpdate {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.question_list, space.question_list);
    }
}
