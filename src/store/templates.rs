/// Template store: reusable form configurations, read-shared when public
use crate::db::models::Template;
use crate::error::{ApiError, ApiResult};
use crate::store::parse_datetime;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub form_config: serde_json::Value,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub created_by: String,
    pub is_public: bool,
}

#[derive(Clone)]
pub struct TemplateStore {
    db: SqlitePool,
}

impl TemplateStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewTemplate) -> ApiResult<Template> {
        // A form config without a fields array renders nothing
        if !new
            .form_config
            .get("fields")
            .map_or(false, |f| f.is_array())
        {
            return Err(ApiError::Validation(
                "Form config must have a fields array".to_string(),
            ));
        }

        let template = Template {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            form_config: new.form_config,
            email_subject: new.email_subject,
            email_body: new.email_body,
            created_by: new.created_by,
            is_public: new.is_public,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO templates
            (id, name, form_config, email_subject, email_body, created_by, is_public, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(template.form_config.to_string())
        .bind(&template.email_subject)
        .bind(&template.email_body)
        .bind(&template.created_by)
        .bind(template.is_public)
        .bind(template.created_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(template)
    }

    /// Templates visible to a user: their own plus public ones
    pub async fn list_visible(&self, user_id: &str) -> ApiResult<Vec<Template>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, form_config, email_subject, email_body,
                   created_by, is_public, created_at
            FROM templates
            WHERE is_public = 1 OR created_by = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(parse_template).collect()
    }

    /// A template is accessible when the caller owns it or it is public
    pub async fn find_accessible(
        &self,
        template_id: &str,
        user_id: &str,
    ) -> ApiResult<Option<Template>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, form_config, email_subject, email_body,
                   created_by, is_public, created_at
            FROM templates
            WHERE id = ? AND (is_public = 1 OR created_by = ?)
            "#,
        )
        .bind(template_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(parse_template).transpose()
    }

    pub async fn find_by_id(&self, template_id: &str) -> ApiResult<Option<Template>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, form_config, email_subject, email_body,
                   created_by, is_public, created_at
            FROM templates
            WHERE id = ?
            "#,
        )
        .bind(template_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(parse_template).transpose()
    }

    pub async fn delete(&self, template_id: &str, user_id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ? AND created_by = ?")
            .bind(template_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Template not found".to_string()));
        }

        Ok(())
    }
}

fn parse_template(row: sqlx::sqlite::SqliteRow) -> ApiResult<Template> {
    let form_config: String = row.get("form_config");
    let created_at: String = row.get("created_at");

    Ok(Template {
        id: row.get("id"),
        name: row.get("name"),
        form_config: serde_json::from_str(&form_config)
            .map_err(|e| ApiError::Internal(format!("Invalid form config: {}", e)))?,
        email_subject: row.get("email_subject"),
        email_body: row.get("email_body"),
        created_by: row.get("created_by"),
        is_public: row.get("is_public"),
        created_at: parse_datetime(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_store() -> TemplateStore {
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE templates (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                form_config TEXT NOT NULL,
                email_subject TEXT,
                email_body TEXT,
                created_by TEXT NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        TemplateStore::new(db)
    }

    fn sample(created_by: &str, is_public: bool) -> NewTemplate {
        NewTemplate {
            name: "Default form".to_string(),
            form_config: json!({ "fields": ["authorName", "content", "rating"] }),
            email_subject: None,
            email_body: None,
            created_by: created_by.to_string(),
            is_public,
        }
    }

    #[tokio::test]
    async fn test_form_config_requires_fields_array() {
        let store = memory_store().await;
        let mut new = sample("u1", false);
        new.form_config = json!({ "title": "no fields" });

        assert!(store.create(new).await.is_err());
    }

    #[tokio::test]
    async fn test_public_templates_shared_across_owners() {
        let store = memory_store().await;
        let public = store.create(sample("u1", true)).await.unwrap();
        let private = store.create(sample("u1", false)).await.unwrap();

        assert!(store
            .find_accessible(&public.id, "u2")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_accessible(&private.id, "u2")
            .await
            .unwrap()
            .is_none());

        let visible = store.list_visible("u2").await.unwrap();
        assert_eq!(visible.len(), 1);
    }
}
