use axum::extract::{Path, State};
use axum::{Form, Json};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::errors::AppError;
use crate::utils::timeout_query;
use crate::InnerState;

const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(10_000);

/// Fixed subject line on every outbound reply.
pub const REPLY_SUBJECT: &str = "Reply from End Time Ministry";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: NaiveDateTime,
}

/// Visitor-submitted payload. The email address is stored as given; no
/// format validation is applied.
#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    pub email: String,
    pub message: String,
}

#[tracing::instrument(name = "Submit contact message", skip(inner, payload), fields(name = %payload.name))]
pub async fn submit_contact(
    State(inner): State<InnerState>,
    Json(payload): Json<ContactPayload>,
) -> Result<Json<Value>, AppError> {
    let InnerState { db, .. } = inner;

    let message = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, ContactMessage>(
            r#"INSERT INTO contact_messages (name, email, message)
               VALUES ($1, $2, $3) RETURNING *"#,
        )
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.message)
        .fetch_one(&db),
    )
    .await?;

    tracing::info!("Stored contact message {} from '{}'", message.id, message.name);
    Ok(Json(json!({ "detail": "Message submitted successfully" })))
}

pub async fn contact_messages_page() -> Json<Value> {
    Json(json!({ "page": "admin/contact_messages" }))
}

#[tracing::instrument(name = "List contact messages", skip(inner))]
pub async fn all_contact_messages(
    State(inner): State<InnerState>,
) -> Result<Json<Vec<ContactMessage>>, AppError> {
    let InnerState { db, .. } = inner;

    let messages = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query_as::<_, ContactMessage>(
            r#"SELECT * FROM contact_messages ORDER BY created_at DESC"#,
        )
        .fetch_all(&db),
    )
    .await?;

    tracing::debug!("Returning {} contact messages", messages.len());
    Ok(Json(messages))
}

#[tracing::instrument(name = "Delete contact message", skip(inner), fields(message_id = %message_id))]
pub async fn delete_contact_message(
    State(inner): State<InnerState>,
    Path(message_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let InnerState { db, .. } = inner;

    let result = timeout_query(
        QUERY_TIMEOUT,
        sqlx::query(r#"DELETE FROM contact_messages WHERE id = $1"#)
            .bind(message_id)
            .execute(&db),
    )
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Message not found".to_string()));
    }

    tracing::info!("Deleted contact message {}", message_id);
    Ok(Json(json!({ "detail": "Message deleted successfully" })))
}

/// Fire-and-forget reply: the send runs detached after the response; a
/// failure is logged, never surfaced to the admin.
#[tracing::instrument(name = "Reply to contact message", skip(inner, form), fields(recipient = %form.email))]
pub async fn reply_contact_message(
    State(inner): State<InnerState>,
    Form(form): Form<ReplyForm>,
) -> Result<Json<Value>, AppError> {
    let InnerState { email_client, .. } = inner;

    tokio::spawn(async move {
        match email_client {
            Some(client) => {
                if let Err(e) = client.send_email(&form.email, REPLY_SUBJECT, &form.message).await {
                    tracing::warn!("Failed to send reply to {}: {}", form.email, e);
                }
            }
            None => {
                tracing::warn!("SMTP is not configured; dropping reply to {}", form.email);
            }
        }
    });

    Ok(Json(json!({ "detail": "Reply sent successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_payload_takes_fields_as_given() {
        // No email-format validation on submission.
        let payload: ContactPayload = serde_json::from_str(
            r#"{"name": "Jane", "email": "not an address", "message": "Hello"}"#,
        )
        .unwrap();
        assert_eq!(payload.email, "not an address");
    }

    #[test]
    fn contact_message_serializes_with_camel_case_keys() {
        let message = ContactMessage {
            id: 3,
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            message: "Hello".to_string(),
            created_at: chrono::DateTime::from_timestamp(1_700_000_000, 0)
                .unwrap()
                .naive_utc(),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["email"], "jane@example.com");
        assert!(value.get("createdAt").is_some());
    }
}
