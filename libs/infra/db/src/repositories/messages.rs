// [libs/infra/db/src/repositories/messages.rs]

use crate::errors::DbError;
use crate::TursoClient;
use fleetsync_domain_models::{ShortMessage, UserMessageLink};
use libsql::params;
use tracing::instrument;

/// Repositorio de mensajes cortos (clave UID) y de sus asociaciones a
/// usuarios (clave PIN, UID).
pub struct MessageRepository {
    database_client: TursoClient,
}

impl MessageRepository {
    pub fn new(database_client: TursoClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self, message), fields(uid = %message.uid))]
    pub async fn upsert_message(
        &self,
        message: &ShortMessage,
        source_serial: &str,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT OR REPLACE INTO short_messages \
                 (uid, content, tag, duration_minutes, start_time, source_serial) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.uid.clone(),
                    message.content.clone(),
                    message.tag.clone(),
                    message.duration_minutes.clone(),
                    message.start_time.clone(),
                    source_serial
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, link), fields(pin = %link.pin, uid = %link.uid))]
    pub async fn upsert_link(
        &self,
        link: &UserMessageLink,
        source_serial: &str,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT OR REPLACE INTO user_messages (pin, uid, source_serial) \
                 VALUES (?1, ?2, ?3)",
                params![link.pin.clone(), link.uid.clone(), source_serial],
            )
            .await?;
        Ok(())
    }

    pub async fn delete_message(&self, uid: &str) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;
        let removed = transaction
            .execute("DELETE FROM short_messages WHERE uid = ?1", params![uid])
            .await?;
        transaction
            .execute("DELETE FROM user_messages WHERE uid = ?1", params![uid])
            .await?;
        transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;
        Ok(removed)
    }

    pub async fn find_message(&self, uid: &str) -> Result<Option<ShortMessage>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT uid, content, tag, duration_minutes, start_time \
                 FROM short_messages WHERE uid = ?1",
                params![uid],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(ShortMessage {
                uid: row.get(0)?,
                content: row.get(1)?,
                tag: row.get(2)?,
                duration_minutes: row.get(3)?,
                start_time: row.get(4)?,
            })),
            None => Ok(None),
        }
    }
}
