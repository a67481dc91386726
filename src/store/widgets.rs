/// Widget store: published embed configurations
///
/// Settings reach this store already parsed into their typed variant, so a
/// row can only ever hold settings that validated against the widget type.
use crate::db::models::{Widget, WidgetKind, WidgetStatus};
use crate::error::{ApiError, ApiResult};
use crate::store::parse_datetime;
use crate::widget::settings::WidgetSettings;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewWidget {
    pub space_id: String,
    pub name: String,
    pub settings: WidgetSettings,
    pub created_by: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct WidgetUpdate {
    pub name: Option<String>,
    pub settings: Option<WidgetSettings>,
    pub status: Option<WidgetStatus>,
}

#[derive(Clone)]
pub struct WidgetStore {
    db: SqlitePool,
}

impl WidgetStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewWidget) -> ApiResult<Widget> {
        let now = Utc::now();
        let widget = Widget {
            id: Uuid::new_v4().to_string(),
            space_id: new.space_id,
            name: new.name,
            kind: new.settings.kind(),
            design_template: new.settings.design_template().to_string(),
            settings: new.settings,
            status: WidgetStatus::Active,
            created_by: new.created_by,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO widgets
            (id, space_id, name, kind, design_template, settings, status,
             created_by, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&widget.id)
        .bind(&widget.space_id)
        .bind(&widget.name)
        .bind(widget.kind.as_str())
        .bind(&widget.design_template)
        .bind(settings_json(&widget.settings)?)
        .bind(widget.status.as_str())
        .bind(&widget.created_by)
        .bind(widget.metadata.to_string())
        .bind(widget.created_at.to_rfc3339())
        .bind(widget.updated_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(widget)
    }

    pub async fn find_by_id(&self, id: &str) -> ApiResult<Option<Widget>> {
        let row = sqlx::query(&select_sql("WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_widget).transpose()
    }

    pub async fn find_by_name(&self, space_id: &str, name: &str) -> ApiResult<Option<Widget>> {
        let row = sqlx::query(&select_sql("WHERE space_id = ? AND name = ?"))
            .bind(space_id)
            .bind(name)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_widget).transpose()
    }

    pub async fn list_for_space(&self, space_id: &str) -> ApiResult<Vec<Widget>> {
        let rows = sqlx::query(&select_sql("WHERE space_id = ? ORDER BY created_at DESC"))
            .bind(space_id)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(parse_widget).collect()
    }

    pub async fn update(&self, id: &str, update: WidgetUpdate) -> ApiResult<Widget> {
        let mut widget = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Widget not found".to_string()))?;

        if let Some(name) = update.name {
            widget.name = name;
        }
        if let Some(settings) = update.settings {
            // Settings can't change the widget's type after creation
            if settings.kind() != widget.kind {
                return Err(ApiError::Validation(format!(
                    "Settings do not match widget type {}",
                    widget.kind.as_str()
                )));
            }
            widget.design_template = settings.design_template().to_string();
            widget.settings = settings;
        }
        if let Some(status) = update.status {
            widget.status = status;
        }
        widget.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE widgets
            SET name = ?, design_template = ?, settings = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&widget.name)
        .bind(&widget.design_template)
        .bind(settings_json(&widget.settings)?)
        .bind(widget.status.as_str())
        .bind(widget.updated_at.to_rfc3339())
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(widget)
    }

    /// Widgets are the one entity the dashboard hard-deletes
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM widgets WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Widget not found".to_string()));
        }

        Ok(())
    }
}

fn settings_json(settings: &WidgetSettings) -> ApiResult<String> {
    serde_json::to_string(settings)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize settings: {}", e)))
}

fn select_sql(clause: &str) -> String {
    format!(
        r#"
        SELECT id, space_id, name, kind, design_template, settings, status,
               created_by, metadata, created_at, updated_at
        FROM widgets {}
        "#,
        clause
    )
}

fn parse_widget(row: sqlx::sqlite::SqliteRow) -> ApiResult<Widget> {
    let kind_str: String = row.get("kind");
    let settings_str: String = row.get("settings");
    let status: String = row.get("status");
    let metadata: String = row.get("metadata");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let kind = WidgetKind::from_str(&kind_str)?;
    let settings_value: serde_json::Value = serde_json::from_str(&settings_str)
        .map_err(|e| ApiError::Internal(format!("Invalid widget settings: {}", e)))?;
    let settings = WidgetSettings::parse(kind, settings_value)
        .map_err(|e| ApiError::Internal(format!("Stored settings failed to parse: {}", e)))?;

    Ok(Widget {
        id: row.get("id"),
        space_id: row.get("space_id"),
        name: row.get("name"),
        kind,
        design_template: row.get("design_template"),
        settings,
        status: WidgetStatus::from_str(&status)?,
        created_by: row.get("created_by"),
        metadata: serde_json::from_str(&metadata)
            .map_err(|e| ApiError::Internal(format!("Invalid metadata: {}", e)))?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

#[cfg(test)]
pub(crate) async fn create_table(db: &SqlitePool) {
    sqlx::query(
        r#"
        CREATE TABLE widgets (
            id TEXT PRIMARY KEY,
            space_id TEXT NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            design_template TEXT NOT NULL,
            settings TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_by TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
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
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_store() -> WidgetStore {
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        create_table(&db).await;
        WidgetStore::new(db)
    }

    fn wall_settings() -> WidgetSettings {
        WidgetSettings::parse(
            WidgetKind::Wall,
            json!({ "designTemplate": "grid-cards", "theme": "light" }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_round_trip() {
        let store = memory_store().await;
        let widget = store
            .create(NewWidget {
                space_id: "s1".to_string(),
                name: "Homepage wall".to_string(),
                settings: wall_settings(),
                created_by: "u1".to_string(),
                metadata: json!({}),
            })
            .await
            .unwrap();

        let stored = store.find_by_id(&widget.id).await.unwrap().unwrap();
        assert_eq!(stored.kind, WidgetKind::Wall);
        assert_eq!(stored.design_template, "grid-cards");
        assert!(stored.settings.is_public());
    }

    #[tokio::test]
    async fn test_invalid_settings_never_persist() {
        let store = memory_store().await;

        // Validation happens before the store is reached
        let parsed = WidgetSettings::parse(
            WidgetKind::Wall,
            json!({ "designTemplate": "bad-value", "theme": "light" }),
        );
        assert!(parsed.is_err());

        // Nothing with that name exists afterward
        assert!(store
            .find_by_name("s1", "Broken widget")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_cannot_switch_type() {
        let store = memory_store().await;
        let widget = store
            .create(NewWidget {
                space_id: "s1".to_string(),
                name: "Wall".to_string(),
                settings: wall_settings(),
                created_by: "u1".to_string(),
                metadata: json!({}),
            })
            .await
            .unwrap();

        let single = WidgetSettings::parse(
            WidgetKind::Single,
            json!({
                "designTemplate": "hero",
                "theme": "light",
                "selectTestimonial": "auto-latest"
            }),
        )
        .unwrap();

        let err = store
            .update(
                &widget.id,
                WidgetUpdate {
                    settings: Some(single),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_hard_delete() {
        let store = memory_store().await;
        let widget = store
            .create(NewWidget {
                space_id: "s1".to_string(),
                name: "Wall".to_string(),
                settings: wall_settings(),
                created_by: "u1".to_string(),
                metadata: json!({}),
            })
            .await
            .unwrap();

        store.delete(&widget.id).await.unwrap();
        assert!(store.find_by_id(&widget.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete(&widget.id).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }
}
