use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::core::error::StorageError;
use crate::core::message::ChatSession;

pub struct SessionRepo {
    pool: SqlitePool,
}

impl SessionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new session stamped now; the id comes back from the store.
    pub async fn create(&self) -> Result<ChatSession, StorageError> {
        let start_time = Utc::now();
        let result = sqlx::query("INSERT INTO chat_sessions (start_time) VALUES (?)")
            .bind(start_time.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(ChatSession {
            id: result.last_insert_rowid(),
            start_time,
        })
    }

    pub async fn get(&self, id: i64) -> Result<ChatSession, StorageError> {
        let row: (i64, String) =
            sqlx::query_as("SELECT id, start_time FROM chat_sessions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StorageError::Database(e.to_string()))?
                .ok_or(StorageError::SessionMissing(id))?;

        Ok(row_to_session(row))
    }

    /// Most recently started session, if any.
    pub async fn get_last(&self) -> Result<Option<ChatSession>, StorageError> {
        let row: Option<(i64, String)> = sqlx::query_as(
            "SELECT id, start_time FROM chat_sessions \
             ORDER BY start_time DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(row.map(row_to_session))
    }

    pub async fn list(&self) -> Result<Vec<ChatSession>, StorageError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, start_time FROM chat_sessions \
             ORDER BY start_time DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(row_to_session).collect())
    }

    /// Remove a session and everything it owns: messages first, then the
    /// session row, in one transaction.
    pub async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM chat_messages WHERE session_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Database(e.to_string()))
    }
}

fn row_to_session(row: (i64, String)) -> ChatSession {
    ChatSession {
        id: row.0,
        start_time: DateTime::parse_from_rfc3339(&row.1)
            .unwrap_or_default()
            .with_timezone(&Utc),
    }
}
