// [libs/infra/db/src/repositories/journal.rs]
/*!
 * =================================================================
 * APARATO: SYNC JOURNAL REPOSITORY
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: RASTRO APPEND-ONLY DE PROPAGACIÓN (SOLO AUDITORÍA)
 * =================================================================
 */

use crate::errors::DbError;
use crate::TursoClient;
use chrono::{DateTime, Duration, Utc};
use fleetsync_domain_models::{SyncAction, SyncJournalEntry, SyncStatus};
use libsql::params;
use tracing::{info, instrument};

pub struct SyncJournalRepository {
    database_client: TursoClient,
}

impl SyncJournalRepository {
    pub fn new(database_client: TursoClient) -> Self {
        Self { database_client }
    }

    pub async fn append(&self, entry: &SyncJournalEntry) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO sync_journal \
                 (source_serial, target_serial, record_type, record_key, action, status, \
                  detail, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULLIF(?7, ''), ?8)",
                params![
                    entry.source_serial.clone(),
                    entry.target_serial.clone(),
                    entry.record_type.clone(),
                    entry.record_key.clone(),
                    entry.action.as_str(),
                    entry.status.as_str(),
                    entry.detail.clone().unwrap_or_default(),
                    entry.created_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Entradas recientes, la más nueva primero (diagnóstico de operador).
    pub async fn recent(&self, limit: i64) -> Result<Vec<SyncJournalEntry>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT source_serial, target_serial, record_type, record_key, action, \
                        status, detail, created_at \
                 FROM sync_journal ORDER BY entry_id DESC LIMIT ?1",
                params![limit],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw_action: String = row.get(4)?;
            let raw_status: String = row.get(5)?;
            let raw_created_at: String = row.get(7)?;

            entries.push(SyncJournalEntry {
                source_serial: row.get(0)?,
                target_serial: row.get(1)?,
                record_type: row.get(2)?,
                record_key: row.get(3)?,
                action: match raw_action.as_str() {
                    "sync" => SyncAction::Sync,
                    "delete" => SyncAction::Delete,
                    other => SyncAction::Other(other.to_string()),
                },
                status: match raw_status.as_str() {
                    "queued" => SyncStatus::Queued,
                    "skipped" => SyncStatus::Skipped,
                    _ => SyncStatus::Logged,
                },
                detail: row.get::<String>(6).ok(),
                created_at: DateTime::parse_from_rfc3339(&raw_created_at)
                    .map_err(|fault| {
                        DbError::MappingError(format!("JOURNAL_TIMESTAMP_DRIFT: {}", fault))
                    })?
                    .with_timezone(&Utc),
            });
        }
        Ok(entries)
    }

    /// Poda de retención: el rastro no acumula más allá de la ventana.
    #[instrument(skip(self))]
    pub async fn prune_older_than(&self, retention_days: i64) -> Result<u64, DbError> {
        let cutoff = (Utc::now() - Duration::days(retention_days)).to_rfc3339();
        let connection = self.database_client.get_connection()?;
        let removed = connection
            .execute(
                "DELETE FROM sync_journal WHERE created_at < ?1",
                params![cutoff],
            )
            .await?;
        if removed > 0 {
            info!("💀 [JOURNAL_PRUNE]: Evicted {} audit rows.", removed);
        }
        Ok(removed)
    }
}
