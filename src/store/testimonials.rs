/// Testimonial store: submissions, moderation inbox queries, and the
/// status transitions applied through the moderation state machine
use crate::db::models::{CollectedVia, QuestionResponse, Testimonial, TestimonialKind};
use crate::error::{ApiError, ApiResult};
use crate::moderation::{transition, ModerationAction, TestimonialStatus};
use crate::store::{parse_datetime, parse_opt_datetime};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Fields accepted when recording a testimonial
#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub space_id: Option<String>,
    pub kind: TestimonialKind,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub rating: Option<i64>,
    pub collected_via: CollectedVia,
    pub status: TestimonialStatus,
    pub created_by: Option<String>,
    pub source_link: Option<String>,
    pub question_responses: Vec<QuestionResponse>,
    pub metadata: serde_json::Value,
}

impl Default for NewTestimonial {
    fn default() -> Self {
        Self {
            space_id: None,
            kind: TestimonialKind::Text,
            author_name: None,
            author_email: None,
            content: None,
            media_url: None,
            thumbnail_url: None,
            rating: None,
            collected_via: CollectedVia::Link,
            status: TestimonialStatus::Pending,
            created_by: None,
            source_link: None,
            question_responses: Vec::new(),
            metadata: serde_json::json!({}),
        }
    }
}

/// Dashboard inbox filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InboxFilter {
    #[default]
    All,
    Video,
    Text,
    Linked,
    Archived,
    Spam,
}

impl InboxFilter {
    pub fn from_str(s: &str) -> Self {
        match s {
            "video" => InboxFilter::Video,
            "text" => InboxFilter::Text,
            "linked" => InboxFilter::Linked,
            "archived" => InboxFilter::Archived,
            "spam" => InboxFilter::Spam,
            _ => InboxFilter::All,
        }
    }

    fn clause(&self) -> &'static str {
        match self {
            InboxFilter::All => "",
            InboxFilter::Video => " AND kind = 'video'",
            InboxFilter::Text => " AND kind = 'text'",
            InboxFilter::Linked => " AND kind = 'linked'",
            InboxFilter::Archived => " AND status = 'archived'",
            InboxFilter::Spam => " AND status = 'spam'",
        }
    }
}

#[derive(Clone)]
pub struct TestimonialStore {
    db: SqlitePool,
}

impl TestimonialStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewTestimonial) -> ApiResult<Testimonial> {
        if let Some(rating) = new.rating {
            if !(1..=5).contains(&rating) {
                return Err(ApiError::Validation(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        }
        for response in &new.question_responses {
            if let Some(rating) = response.rating {
                if !(1..=5).contains(&rating) {
                    return Err(ApiError::Validation(
                        "Question rating must be between 1 and 5".to_string(),
                    ));
                }
            }
        }

        let now = Utc::now();
        let testimonial = Testimonial {
            id: Uuid::new_v4().to_string(),
            space_id: new.space_id,
            kind: new.kind,
            author_name: new.author_name,
            author_email: new.author_email,
            content: new.content,
            media_url: new.media_url,
            thumbnail_url: new.thumbnail_url,
            rating: new.rating,
            collected_via: new.collected_via,
            status: new.status,
            submitted_at: now,
            approved_at: (new.status == TestimonialStatus::Approved).then_some(now),
            created_by: new.created_by,
            source_link: new.source_link,
            question_responses: new.question_responses,
            metadata: new.metadata,
        };

        sqlx::query(
            r#"
            INSERT INTO testimonials
            (id, space_id, kind, author_name, author_email, content, media_url,
             thumbnail_url, rating, collected_via, status, submitted_at,
             approved_at, created_by, source_link, question_responses, metadata)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&testimonial.id)
        .bind(&testimonial.space_id)
        .bind(testimonial.kind.as_str())
        .bind(&testimonial.author_name)
        .bind(&testimonial.author_email)
        .bind(&testimonial.content)
        .bind(&testimonial.media_url)
        .bind(&testimonial.thumbnail_url)
        .bind(testimonial.rating)
        .bind(testimonial.collected_via.as_str())
        .bind(testimonial.status.as_str())
        .bind(testimonial.submitted_at.to_rfc3339())
        .bind(testimonial.approved_at.map(|dt| dt.to_rfc3339()))
        .bind(&testimonial.created_by)
        .bind(&testimonial.source_link)
        .bind(serde_json::to_string(&testimonial.question_responses).unwrap_or_default())
        .bind(testimonial.metadata.to_string())
        .execute(&self.db)
        .await?;

        Ok(testimonial)
    }

    pub async fn find_by_id(&self, id: &str) -> ApiResult<Option<Testimonial>> {
        let row = sqlx::query(&select_sql("WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_testimonial).transpose()
    }

    pub async fn find_for_space(
        &self,
        space_id: &str,
        id: &str,
    ) -> ApiResult<Option<Testimonial>> {
        let row = sqlx::query(&select_sql("WHERE id = ? AND space_id = ?"))
            .bind(id)
            .bind(space_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(parse_testimonial).transpose()
    }

    /// The approved set the selection engine works over
    pub async fn list_approved_for_space(&self, space_id: &str) -> ApiResult<Vec<Testimonial>> {
        let rows = sqlx::query(&select_sql(
            "WHERE space_id = ? AND status = 'approved' ORDER BY submitted_at DESC",
        ))
        .bind(space_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(parse_testimonial).collect()
    }

    pub async fn list_for_space(
        &self,
        space_id: &str,
        filter: InboxFilter,
        page: u32,
        limit: u32,
    ) -> ApiResult<Vec<Testimonial>> {
        let offset = (page.saturating_sub(1)) * limit;
        let sql = select_sql(&format!(
            "WHERE space_id = ?{} ORDER BY submitted_at DESC LIMIT ? OFFSET ?",
            filter.clause()
        ));
        let rows = sqlx::query(&sql)
            .bind(space_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(parse_testimonial).collect()
    }

    pub async fn count_for_space(&self, space_id: &str, filter: InboxFilter) -> ApiResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM testimonials WHERE space_id = ?{}",
            filter.clause()
        );
        let row = sqlx::query(&sql).bind(space_id).fetch_one(&self.db).await?;

        Ok(row.get("count"))
    }

    /// Non-deleted count of one kind, for the space credit readouts
    pub async fn count_for_space_kind(
        &self,
        space_id: &str,
        kind: TestimonialKind,
    ) -> ApiResult<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM testimonials
            WHERE space_id = ? AND kind = ? AND status != 'deleted'
            "#,
        )
        .bind(space_id)
        .bind(kind.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(row.get("count"))
    }

    pub async fn count_by_creator(&self, user_id: &str) -> ApiResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM testimonials WHERE created_by = ?")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        Ok(row.get("count"))
    }

    pub async fn count_videos_by_creator(&self, user_id: &str) -> ApiResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM testimonials WHERE created_by = ? AND kind = 'video'",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.get("count"))
    }

    /// Status-scoped listing, newest first. The public surface always asks
    /// for `approved`; admins may ask for any status.
    pub async fn list_by_status(
        &self,
        status: TestimonialStatus,
        rating: Option<i64>,
        page: u32,
        limit: u32,
    ) -> ApiResult<Vec<Testimonial>> {
        let offset = (page.saturating_sub(1)) * limit;
        let clause = if rating.is_some() {
            "WHERE status = ? AND rating = ? ORDER BY submitted_at DESC LIMIT ? OFFSET ?"
        } else {
            "WHERE status = ? ORDER BY submitted_at DESC LIMIT ? OFFSET ?"
        };
        let sql = select_sql(clause);

        let mut query = sqlx::query(&sql).bind(status.as_str());
        if let Some(rating) = rating {
            query = query.bind(rating);
        }
        let rows = query.bind(limit).bind(offset).fetch_all(&self.db).await?;

        rows.into_iter().map(parse_testimonial).collect()
    }

    pub async fn count_by_status(
        &self,
        status: TestimonialStatus,
        rating: Option<i64>,
    ) -> ApiResult<i64> {
        let clause = if rating.is_some() {
            "SELECT COUNT(*) AS count FROM testimonials WHERE status = ? AND rating = ?"
        } else {
            "SELECT COUNT(*) AS count FROM testimonials WHERE status = ?"
        };

        let mut query = sqlx::query(clause).bind(status.as_str());
        if let Some(rating) = rating {
            query = query.bind(rating);
        }
        let row = query.fetch_one(&self.db).await?;

        Ok(row.get("count"))
    }

    /// Apply one moderation action to one testimonial of a space.
    /// Illegal transitions are rejected; approval stamps `approved_at`.
    pub async fn apply_action(
        &self,
        space_id: &str,
        testimonial_id: &str,
        action: ModerationAction,
    ) -> ApiResult<Testimonial> {
        let mut testimonial = self
            .find_for_space(space_id, testimonial_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Testimonial not found".to_string()))?;

        let next = transition(testimonial.status, action).ok_or_else(|| {
            ApiError::Validation(format!(
                "Cannot {} a {} testimonial",
                action.as_str(),
                testimonial.status.as_str()
            ))
        })?;

        testimonial.status = next;
        if action == ModerationAction::Approve {
            testimonial.approved_at = Some(Utc::now());
        }

        sqlx::query("UPDATE testimonials SET status = ?, approved_at = ? WHERE id = ?")
            .bind(testimonial.status.as_str())
            .bind(testimonial.approved_at.map(|dt| dt.to_rfc3339()))
            .bind(testimonial_id)
            .execute(&self.db)
            .await?;

        Ok(testimonial)
    }

    /// Bulk moderation: the same transition applied per document, scoped to
    /// one space. Ids outside the space or in an ineligible status are
    /// silently excluded from the modified count rather than aborting the
    /// batch.
    pub async fn bulk_apply(
        &self,
        space_id: &str,
        testimonial_ids: &[String],
        action: ModerationAction,
    ) -> ApiResult<u64> {
        if testimonial_ids.is_empty() {
            return Ok(0);
        }

        let id_placeholders = vec!["?"; testimonial_ids.len()].join(", ");
        let status_placeholders = vec!["?"; action.allowed_from().len()].join(", ");

        let set_clause = if action == ModerationAction::Approve {
            "status = ?, approved_at = ?"
        } else {
            "status = ?"
        };

        let sql = format!(
            "UPDATE testimonials SET {} WHERE space_id = ? AND id IN ({}) AND status IN ({})",
            set_clause, id_placeholders, status_placeholders
        );

        let mut query = sqlx::query(&sql).bind(action.target_status().as_str());
        if action == ModerationAction::Approve {
            query = query.bind(Utc::now().to_rfc3339());
        }
        query = query.bind(space_id);
        for id in testimonial_ids {
            query = query.bind(id);
        }
        for status in action.allowed_from() {
            query = query.bind(status.as_str());
        }

        let result = query.execute(&self.db).await?;
        Ok(result.rows_affected())
    }
}

fn select_sql(clause: &str) -> String {
    format!(
        r#"
        SELECT id, space_id, kind, author_name, author_email, content, media_url,
               thumbnail_url, rating, collected_via, status, submitted_at,
               approved_at, created_by, source_link, question_responses, metadata
        FROM testimonials {}
        "#,
        clause
    )
}

fn parse_testimonial(row: sqlx::sqlite::SqliteRow) -> ApiResult<Testimonial> {
    let kind: String = row.get("kind");
    let collected_via: String = row.get("collected_via");
    let status: String = row.get("status");
    let submitted_at: String = row.get("submitted_at");
    let question_responses: String = row.get("question_responses");
    let metadata: String = row.get("metadata");

    Ok(Testimonial {
        id: row.get("id"),
        space_id: row.get("space_id"),
        kind: TestimonialKind::from_str(&kind)?,
        author_name: row.get("author_name"),
        author_email: row.get("author_email"),
        content: row.get("content"),
        media_url: row.get("media_url"),
        thumbnail_url: row.get("thumbnail_url"),
        rating: row.try_get("rating").ok(),
        collected_via: CollectedVia::from_str(&collected_via)?,
        status: TestimonialStatus::from_str(&status)?,
        submitted_at: parse_datetime(&submitted_at)?,
        approved_at: parse_opt_datetime(row.try_get("approved_at").ok()),
        created_by: row.get("created_by"),
        source_link: row.get("source_link"),
        question_responses: serde_json::from_str(&question_responses)
            .map_err(|e| ApiError::Internal(format!("Invalid question responses: {}", e)))?,
        metadata: serde_json::from_str(&metadata)
            .map_err(|e| ApiError::Internal(format!("Invalid metadata: {}", e)))?,
    })
}

#[cfg(test)]
pub(crate) async fn create_table(db: &SqlitePool) {
    sqlx::query(
        r#"
        CREATE TABLE testimonials (
            id TEXT PRIMARY KEY,
            space_id TEXT,
            kind TEXT NOT NULL,
            author_name TEXT,
            author_email TEXT,
            content TEXT,
            media_url TEXT,
            thumbnail_url TEXT,
            rating INTEGER,
            collected_via TEXT NOT NULL DEFAULT 'link',
            status TEXT NOT NULL DEFAULT 'pending',
            submitted_at TEXT NOT NULL,
            approved_at TEXT,
            created_by TEXT,
            source_link TEXT,
            question_responses TEXT NOT NULL DEFAULT '[]',
            metadata TEXT NOT NULL DEFAULT '{}'
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

    async fn memory_store() -> TestimonialStore {
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        create_table(&db).await;
        TestimonialStore::new(db)
    }

    fn pending(space_id: &str, content: &str) -> NewTestimonial {
        NewTestimonial {
            space_id: Some(space_id.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_rating() {
        let store = memory_store().await;
        let mut new = pending("s1", "Body");
        new.rating = Some(6);

        assert!(store.create(new).await.is_err());
    }

    #[tokio::test]
    async fn test_approve_stamps_timestamp() {
        let store = memory_store().await;
        let t = store.create(pending("s1", "Body")).await.unwrap();
        assert!(t.approved_at.is_none());

        let approved = store
            .apply_action("s1", &t.id, ModerationAction::Approve)
            .await
            .unwrap();
        assert_eq!(approved.status, TestimonialStatus::Approved);
        assert!(approved.approved_at.is_some());

        let stored = store.find_by_id(&t.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TestimonialStatus::Approved);
    }

    #[tokio::test]
    async fn test_illegal_transition_is_rejected() {
        let store = memory_store().await;
        let t = store.create(pending("s1", "Body")).await.unwrap();

        store
            .apply_action("s1", &t.id, ModerationAction::Archive)
            .await
            .unwrap();

        // approve requires pending
        let err = store
            .apply_action("s1", &t.id, ModerationAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // unarchive returns it to the inbox
        let unarchived = store
            .apply_action("s1", &t.id, ModerationAction::Unarchive)
            .await
            .unwrap();
        assert_eq!(unarchived.status, TestimonialStatus::Pending);
    }

    #[tokio::test]
    async fn test_action_scoped_to_space() {
        let store = memory_store().await;
        let t = store.create(pending("s1", "Body")).await.unwrap();

        let err = store
            .apply_action("other-space", &t.id, ModerationAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bulk_excludes_foreign_and_ineligible_ids() {
        let store = memory_store().await;
        let a = store.create(pending("s1", "A")).await.unwrap();
        let b = store.create(pending("s1", "B")).await.unwrap();
        let foreign = store.create(pending("s2", "C")).await.unwrap();

        // b is already approved, so a second approve doesn't count it
        store
            .apply_action("s1", &b.id, ModerationAction::Approve)
            .await
            .unwrap();

        let modified = store
            .bulk_apply(
                "s1",
                &[a.id.clone(), b.id.clone(), foreign.id.clone()],
                ModerationAction::Approve,
            )
            .await
            .unwrap();
        assert_eq!(modified, 1);

        // The foreign-space testimonial is untouched
        let untouched = store.find_by_id(&foreign.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, TestimonialStatus::Pending);
    }

    #[tokio::test]
    async fn test_bulk_delete_applies_to_all_statuses() {
        let store = memory_store().await;
        let a = store.create(pending("s1", "A")).await.unwrap();
        let b = store.create(pending("s1", "B")).await.unwrap();
        store
            .apply_action("s1", &b.id, ModerationAction::Spam)
            .await
            .unwrap();

        let modified = store
            .bulk_apply("s1", &[a.id, b.id], ModerationAction::Delete)
            .await
            .unwrap();
        assert_eq!(modified, 2);
    }

    #[tokio::test]
    async fn test_approved_listing_excludes_other_statuses() {
        let store = memory_store().await;
        let a = store.create(pending("s1", "A")).await.unwrap();
        let _b = store.create(pending("s1", "B")).await.unwrap();
        store
            .apply_action("s1", &a.id, ModerationAction::Approve)
            .await
            .unwrap();

        let approved = store.list_approved_for_space("s1").await.unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, a.id);
    }

    #[tokio::test]
    async fn test_question_responses_round_trip() {
        let store = memory_store().await;
        let mut new = pending("s1", "Body");
        new.question_responses = vec![QuestionResponse {
            question_index: 0,
            question: "How was it?".to_string(),
            answer: "Great".to_string(),
            rating: Some(5),
        }];

        let t = store.create(new).await.unwrap();
        let stored = store.find_by_id(&t.id).await.unwrap().unwrap();
        assert_eq!(stored.question_responses.len(), 1);
        assert_eq!(stored.question_responses[0].rating, Some(5));
    }
}
