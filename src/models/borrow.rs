//! Borrow (loan) records and the borrowed-books summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::ValidationErrors;

use super::object_id::ObjectId;
use crate::validation::{Payload, Presence};

/// Borrow transaction. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Borrow {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    /// Borrowed book
    #[sqlx(rename = "book_id")]
    #[schema(value_type = String)]
    pub book: ObjectId,
    pub quantity: i32,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Borrow {
    pub fn new(request: &CreateBorrow) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::generate(),
            book: request.book.clone(),
            quantity: request.quantity,
            due_date: request.due_date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated borrow request
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBorrow {
    #[schema(value_type = String, example = "64b7f0c2a1e4d3f2b1c0a9e8")]
    pub book: ObjectId,
    #[schema(minimum = 1)]
    pub quantity: i32,
    #[schema(value_type = String, example = "2025-01-01")]
    pub due_date: DateTime<Utc>,
}

impl CreateBorrow {
    pub fn from_payload(body: &Value) -> Result<Self, ValidationErrors> {
        let mut payload = Payload::new(body)?;
        let book = payload.object_id("book", "Book", Presence::Required);
        let quantity = payload.integer(
            "quantity",
            "Quantity",
            Presence::Required,
            1,
            "Quantity must be a positive integer",
        );
        let due_date = payload.date("dueDate", "Due date", Presence::Required);

        let errors = payload.into_errors();
        match (book, quantity, due_date) {
            (Some(book), Some(quantity), Some(due_date)) if errors.is_empty() => Ok(Self {
                book,
                quantity,
                due_date,
            }),
            _ => Err(errors),
        }
    }
}

/// Title and ISBN of a borrowed book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BorrowedBook {
    pub title: String,
    pub isbn: String,
}

/// Total quantity borrowed per book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowSummary {
    pub book: BorrowedBook,
    pub total_quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde_json::json;

    #[test]
    fn test_borrow_payload() {
        let body = json!({
            "book": "64B7F0C2A1E4D3F2B1C0A9E8",
            "quantity": 2,
            "dueDate": "2025-01-01"
        });
        let request = CreateBorrow::from_payload(&body).unwrap();
        assert_eq!(request.book.as_str(), "64b7f0c2a1e4d3f2b1c0a9e8");
        assert_eq!(request.quantity, 2);
        assert_eq!(request.due_date.year(), 2025);
    }

    #[test]
    fn test_borrow_payload_reports_every_field() {
        let body = json!({ "book": "123", "quantity": 0, "dueDate": "someday" });
        let errors = CreateBorrow::from_payload(&body).unwrap_err();
        let field_errors = errors.field_errors();
        assert_eq!(field_errors["book"][0].code, "invalid_format");
        assert_eq!(
            field_errors["book"][0].message.as_deref(),
            Some("Invalid book ID format")
        );
        assert_eq!(field_errors["quantity"][0].code, "too_small");
        assert_eq!(field_errors["quantity"][0].params["min"], json!(1));
        assert_eq!(field_errors["dueDate"][0].code, "invalid_date");
    }

    #[test]
    fn test_borrow_payload_rejects_fractional_quantity() {
        let body = json!({
            "book": "64b7f0c2a1e4d3f2b1c0a9e8",
            "quantity": 1.5,
            "dueDate": "2025-01-01"
        });
        let errors = CreateBorrow::from_payload(&body).unwrap_err();
        assert_eq!(errors.field_errors()["quantity"][0].code, "not_integer");
    }

    #[test]
    fn test_summary_shape() {
        let summary = BorrowSummary {
            book: BorrowedBook {
                title: "A".to_string(),
                isbn: "123".to_string(),
            },
            total_quantity: 5,
        };
        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            json!({ "book": { "title": "A", "isbn": "123" }, "totalQuantity": 5 })
        );
    }

    #[test]
    fn test_borrow_serializes_with_document_field_names() {
        let request = CreateBorrow::from_payload(&json!({
            "book": "64b7f0c2a1e4d3f2b1c0a9e8",
            "quantity": 1,
            "dueDate": "2025-01-01"
        }))
        .unwrap();
        let value = serde_json::to_value(Borrow::new(&request)).unwrap();
        assert!(value["_id"].is_string());
        assert_eq!(value["book"], json!("64b7f0c2a1e4d3f2b1c0a9e8"));
        assert!(value["dueDate"].is_string());
        assert!(value["createdAt"].is_string());
    }
}
