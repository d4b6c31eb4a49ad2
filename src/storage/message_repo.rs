use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::core::error::StorageError;
use crate::core::message::{ChatMessage, Sender};

pub struct MessageRepo {
    pool: SqlitePool,
}

impl MessageRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one message stamped now. A `session_id` that does not reference
    /// an existing session is a referential-integrity error and inserts
    /// nothing.
    pub async fn save(
        &self,
        session_id: i64,
        sender: Sender,
        text: &str,
    ) -> Result<ChatMessage, StorageError> {
        let timestamp = Utc::now();
        let result = sqlx::query(
            "INSERT INTO chat_messages (session_id, sender, text, timestamp) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(sender.as_str())
        .bind(text)
        .bind(timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| classify_insert_error(e, session_id))?;

        Ok(ChatMessage {
            id: result.last_insert_rowid(),
            session_id,
            sender,
            text: text.to_string(),
            timestamp,
        })
    }

    /// All messages for a session, ascending by timestamp. Ties (same-second
    /// inserts) keep insertion order via the id.
    pub async fn list(&self, session_id: i64) -> Result<Vec<ChatMessage>, StorageError> {
        let rows: Vec<(i64, i64, String, String, String)> = sqlx::query_as(
            "SELECT id, session_id, sender, text, timestamp FROM chat_messages \
             WHERE session_id = ? ORDER BY timestamp ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_message).collect()
    }

    /// Delete a session's messages; the session row survives.
    pub async fn clear(&self, session_id: i64) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM chat_messages WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }
}

fn classify_insert_error(err: sqlx::Error, session_id: i64) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.message().contains("FOREIGN KEY constraint failed") {
            return StorageError::SessionMissing(session_id);
        }
    }
    StorageError::Database(err.to_string())
}

fn row_to_message(row: (i64, i64, String, String, String)) -> Result<ChatMessage, StorageError> {
    let sender = Sender::parse(&row.2).ok_or_else(|| StorageError::UnknownSender(row.2.clone()))?;
    Ok(ChatMessage {
        id: row.0,
        session_id: row.1,
        sender,
        text: row.3,
        timestamp: DateTime::parse_from_rfc3339(&row.4)
            .unwrap_or_default()
            .with_timezone(&Utc),
    })
}
