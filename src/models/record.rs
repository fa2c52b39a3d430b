//! Stored record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

/// Arbitrary JSON document persisted by clients
#[derive(Debug, Clone, FromRow)]
pub struct StoredRecord {
    pub id: Uuid,
    pub document: Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
}

/// API representation: the document's own fields plus `id`
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub document: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct InsertedRecord {
    pub inserted_id: String,
}

#[derive(Debug, Deserialize, Default, Validate)]
pub struct RecordFilter {
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

impl StoredRecord {
    pub async fn create(pool: &PgPool, document: Map<String, Value>) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, StoredRecord>(
            r#"
            INSERT INTO records (id, document)
            VALUES ($1, $2)
            RETURNING id, document, created_at
            "#
        )
        .bind(Uuid::new_v4())
        .bind(Json(document))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, StoredRecord>("SELECT id, document, created_at FROM records WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, filter: &RecordFilter) -> Result<Vec<Self>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(100);
        let offset = filter.offset.unwrap_or(0);

        sqlx::query_as::<_, StoredRecord>(
            r#"
            SELECT id, document, created_at FROM records
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub fn into_response(self) -> RecordResponse {
        let mut document = self.document.0;
        // Stored fields never shadow the identifier
        document.remove("id");
        document.remove("created_at");

        RecordResponse {
            id: self.id.to_string(),
            created_at: self.created_at,
            document,
        }
    }
}

/// Parse an identifier from the path; malformed ids are a client error
pub fn parse_record_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_flattens_document() {
        let id = Uuid::new_v4();
        let document = json!({"school": "GP", "age": 17, "id": "spoofed"})
            .as_object()
            .cloned()
            .unwrap();

        let record = StoredRecord {
            id,
            document: Json(document),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(record.into_response()).unwrap();
        assert_eq!(value["id"], json!(id.to_string()));
        assert_eq!(value["school"], json!("GP"));
        assert_eq!(value["age"], json!(17));
    }

    #[test]
    fn test_parse_record_id() {
        assert!(parse_record_id("123abc").is_none());
        assert!(parse_record_id(&Uuid::new_v4().to_string()).is_some());
    }

    #[test]
    fn test_filter_bounds() {
        let ok = RecordFilter { limit: Some(50), offset: Some(0) };
        tokio_test::assert_ok!(ok.validate());

        let too_big = RecordFilter { limit: Some(10_000), offset: None };
        tokio_test::assert_err!(too_big.validate());

        let negative = RecordFilter { limit: None, offset: Some(-1) };
        tokio_test::assert_err!(negative.validate());
    }
}
