// [libs/infra/db/src/repositories/commands.rs]
/*!
 * =================================================================
 * APARATO: COMMAND QUEUE REPOSITORY
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FIFO DURABLE POR TERMINAL CON MÁQUINA DE ESTADOS
 *
 * Una cola lógica por terminal sobre filas persistentes. El dequeue es
 * una única sentencia UPDATE..RETURNING sobre la fila pendiente más
 * antigua: dos polls concurrentes del mismo terminal jamás observan la
 * misma fila. La base de datos es la única fuente de verdad del estado.
 * =================================================================
 */

use crate::errors::DbError;
use crate::TursoClient;
use chrono::{DateTime, Duration, Utc};
use fleetsync_core_protocol::formatter::{normalize_command_payload, OutboundCommand};
use fleetsync_core_protocol::parser::CommandReply;
use fleetsync_domain_models::{CommandCategory, CommandRecord, CommandState};
use libsql::{params, Row};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Longitud del identificador de comando en el cable.
const COMMAND_ID_LENGTH: usize = 16;

pub struct CommandQueueRepository {
    database_client: TursoClient,
}

impl CommandQueueRepository {
    pub fn new(database_client: TursoClient) -> Self {
        Self { database_client }
    }

    const COMMAND_COLUMNS: &'static str = "identifier, device_serial, category, payload, \
         state, created_at, sent_at, completed_at, result, retry_count";

    /// Identificador de 16 caracteres hexadecimales: UUIDv4 (128 bits) en
    /// forma simple, recortado.
    fn generate_identifier() -> String {
        let mut simple_form = Uuid::new_v4().simple().to_string();
        simple_form.truncate(COMMAND_ID_LENGTH);
        simple_form
    }

    fn parse_timestamp(raw_timestamp: &str) -> Result<DateTime<Utc>, DbError> {
        DateTime::parse_from_rfc3339(raw_timestamp)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|fault| DbError::MappingError(format!("COMMAND_TIMESTAMP_DRIFT: {}", fault)))
    }

    fn map_row_to_command(data_row: &Row) -> Result<CommandRecord, DbError> {
        let raw_category: String = data_row.get(2)?;
        let raw_state: String = data_row.get(4)?;
        let created_at_raw: String = data_row.get(5)?;

        Ok(CommandRecord {
            identifier: data_row.get(0)?,
            device_serial: data_row.get(1)?,
            category: CommandCategory::parse(&raw_category).ok_or_else(|| {
                DbError::MappingError(format!("COMMAND_CATEGORY_DRIFT: {}", raw_category))
            })?,
            payload: data_row.get(3)?,
            state: CommandState::parse(&raw_state).ok_or_else(|| {
                DbError::MappingError(format!("COMMAND_STATE_DRIFT: {}", raw_state))
            })?,
            created_at: Self::parse_timestamp(&created_at_raw)?,
            sent_at: data_row
                .get::<String>(6)
                .ok()
                .map(|raw| Self::parse_timestamp(&raw))
                .transpose()?,
            completed_at: data_row
                .get::<String>(7)
                .ok()
                .map(|raw| Self::parse_timestamp(&raw))
                .transpose()?,
            result: data_row.get::<String>(8).ok(),
            retry_count: data_row.get(9)?,
        })
    }

    /// Encola un comando para un terminal. El payload atraviesa el pase de
    /// reparación de tabs antes de almacenarse; la fila nace `pending`.
    #[instrument(skip(self, outbound_command), fields(device = %device_serial))]
    pub async fn enqueue(
        &self,
        device_serial: &str,
        outbound_command: &OutboundCommand,
    ) -> Result<CommandRecord, DbError> {
        let identifier = Self::generate_identifier();
        let repaired_payload = normalize_command_payload(&outbound_command.payload);
        let created_at = Utc::now();

        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO commands \
                 (identifier, device_serial, category, payload, state, created_at, retry_count) \
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5, 0)",
                params![
                    identifier.clone(),
                    device_serial,
                    outbound_command.category.as_str(),
                    repaired_payload.clone(),
                    created_at.to_rfc3339()
                ],
            )
            .await?;

        debug!(
            "📨 [QUEUE]: Command [{}] queued for terminal [{}].",
            identifier, device_serial
        );

        Ok(CommandRecord {
            identifier,
            device_serial: device_serial.to_string(),
            category: outbound_command.category,
            payload: repaired_payload,
            state: CommandState::Pending,
            created_at,
            sent_at: None,
            completed_at: None,
            result: None,
            retry_count: 0,
        })
    }

    /// Consume la fila pendiente más antigua del terminal y la transiciona
    /// a `sent` en la misma sentencia. Vacío cuando no hay pendientes.
    #[instrument(skip(self))]
    pub async fn dequeue_next(
        &self,
        device_serial: &str,
    ) -> Result<Option<CommandRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "UPDATE commands SET state = 'sent', sent_at = ?2 \
                     WHERE device_serial = ?1 AND state = 'pending' AND rowid = ( \
                         SELECT rowid FROM commands \
                         WHERE device_serial = ?1 AND state = 'pending' \
                         ORDER BY created_at ASC, rowid ASC LIMIT 1) \
                     RETURNING {}",
                    Self::COMMAND_COLUMNS
                ),
                params![device_serial, Utc::now().to_rfc3339()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let command = Self::map_row_to_command(&row)?;
                debug!(
                    "📤 [QUEUE]: Command [{}] dispatched to terminal [{}].",
                    command.identifier, device_serial
                );
                Ok(Some(command))
            }
            None => Ok(None),
        }
    }

    /// Reconcilia una respuesta del terminal contra su fila.
    ///
    /// `Return=0` sella `sent -> completed`. Cualquier otro código es un
    /// fallo: si el contador no agotó el presupuesto y el payload es
    /// idempotente, la fila vuelve a `pending` con `sent_at` limpio; en
    /// caso contrario muere en `failed`.
    #[instrument(skip(self, reply), fields(command = %reply.command_identifier))]
    pub async fn reconcile_reply(
        &self,
        device_serial: &str,
        reply: &CommandReply,
        retry_limit: i64,
    ) -> Result<CommandState, DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        let mut rows = transaction
            .query(
                &format!(
                    "SELECT {} FROM commands WHERE identifier = ?1 AND device_serial = ?2",
                    Self::COMMAND_COLUMNS
                ),
                params![reply.command_identifier.clone(), device_serial],
            )
            .await?;
        let command = match rows.next().await? {
            Some(row) => Self::map_row_to_command(&row)?,
            None => return Err(DbError::CommandNotFound),
        };

        let final_state = if reply.is_success() {
            transaction
                .execute(
                    "UPDATE commands SET state = 'completed', completed_at = ?3, result = ?4 \
                     WHERE identifier = ?1 AND device_serial = ?2 AND state = 'sent'",
                    params![
                        reply.command_identifier.clone(),
                        device_serial,
                        Utc::now().to_rfc3339(),
                        reply.raw_line.clone()
                    ],
                )
                .await?;
            CommandState::Completed
        } else {
            let exhausted_retries = command.retry_count + 1;
            if exhausted_retries < retry_limit && command.is_idempotent_payload() {
                transaction
                    .execute(
                        "UPDATE commands SET state = 'pending', sent_at = NULL, \
                         retry_count = ?3, result = ?4 \
                         WHERE identifier = ?1 AND device_serial = ?2 AND state = 'sent'",
                        params![
                            reply.command_identifier.clone(),
                            device_serial,
                            exhausted_retries,
                            reply.raw_line.clone()
                        ],
                    )
                    .await?;
                warn!(
                    "♻️  [QUEUE]: Command [{}] returned {}; re-queued (attempt {}).",
                    reply.command_identifier, reply.return_value, exhausted_retries
                );
                CommandState::Pending
            } else {
                transaction
                    .execute(
                        "UPDATE commands SET state = 'failed', completed_at = ?3, \
                         retry_count = ?4, result = ?5 \
                         WHERE identifier = ?1 AND device_serial = ?2 AND state = 'sent'",
                        params![
                            reply.command_identifier.clone(),
                            device_serial,
                            Utc::now().to_rfc3339(),
                            exhausted_retries,
                            reply.raw_line.clone()
                        ],
                    )
                    .await?;
                warn!(
                    "🪦 [QUEUE]: Command [{}] abandoned after {} attempts (Return={}).",
                    reply.command_identifier, exhausted_retries, reply.return_value
                );
                CommandState::Failed
            }
        };

        transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;
        Ok(final_state)
    }

    /// Pendientes en cola para un terminal (diagnóstico).
    pub async fn pending_count(&self, device_serial: &str) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT COUNT(*) FROM commands \
                 WHERE device_serial = ?1 AND state = 'pending'",
                params![device_serial],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(0),
        }
    }

    /// Historial reciente de un terminal, el más nuevo primero (diagnóstico).
    pub async fn history(
        &self,
        device_serial: &str,
        limit: i64,
    ) -> Result<Vec<CommandRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM commands WHERE device_serial = ?1 \
                     ORDER BY created_at DESC, rowid DESC LIMIT ?2",
                    Self::COMMAND_COLUMNS
                ),
                params![device_serial, limit],
            )
            .await?;
        let mut command_history = Vec::new();
        while let Some(row) = rows.next().await? {
            command_history.push(Self::map_row_to_command(&row)?);
        }
        Ok(command_history)
    }

    /// Busca una fila puntual (reconciliación de diagnóstico y pruebas).
    pub async fn find(
        &self,
        device_serial: &str,
        identifier: &str,
    ) -> Result<Option<CommandRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM commands WHERE identifier = ?1 AND device_serial = ?2",
                    Self::COMMAND_COLUMNS
                ),
                params![identifier, device_serial],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_row_to_command(&row)?)),
            None => Ok(None),
        }
    }

    /// Barrido de higiene: elimina filas terminales con más antigüedad que
    /// la retención y pendientes abandonadas con el presupuesto agotado.
    #[instrument(skip(self))]
    pub async fn sweep(
        &self,
        completed_retention_hours: i64,
        stale_pending_hours: i64,
        retry_limit: i64,
    ) -> Result<(u64, u64), DbError> {
        let terminal_cutoff = (Utc::now() - Duration::hours(completed_retention_hours)).to_rfc3339();
        let pending_cutoff = (Utc::now() - Duration::hours(stale_pending_hours)).to_rfc3339();

        let connection = self.database_client.get_connection()?;
        let removed_terminal = connection
            .execute(
                "DELETE FROM commands \
                 WHERE state IN ('completed', 'failed') AND completed_at < ?1",
                params![terminal_cutoff],
            )
            .await?;
        let removed_stale = connection
            .execute(
                "DELETE FROM commands \
                 WHERE state = 'pending' AND created_at < ?1 AND retry_count >= ?2",
                params![pending_cutoff, retry_limit],
            )
            .await?;

        if removed_terminal > 0 || removed_stale > 0 {
            info!(
                "💀 [QUEUE_SWEEP]: Evicted {} terminal rows and {} abandoned pendings.",
                removed_terminal, removed_stale
            );
        }
        Ok((removed_terminal, removed_stale))
    }
}
