// [libs/infra/db/src/repositories/users.rs]
/*!
 * =================================================================
 * APARATO: USER REPOSITORY
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: UPSERT POR PIN Y BORRADO EN CASCADA TRANSACCIONAL
 * =================================================================
 */

use crate::errors::DbError;
use crate::TursoClient;
use chrono::Utc;
use fleetsync_domain_models::User;
use libsql::{params, Row};
use tracing::{info, instrument};

pub struct UserRepository {
    database_client: TursoClient,
}

impl UserRepository {
    pub fn new(database_client: TursoClient) -> Self {
        Self { database_client }
    }

    fn map_row_to_user(data_row: &Row) -> Result<User, DbError> {
        Ok(User {
            pin: data_row.get(0)?,
            name: data_row.get(1)?,
            privilege: data_row.get(2)?,
            password: data_row.get(3)?,
            card: data_row.get(4)?,
            group: data_row.get(5)?,
            time_zone: data_row.get(6)?,
            verify_mode: data_row.get(7)?,
            vice_card: data_row.get(8)?,
        })
    }

    const USER_COLUMNS: &'static str =
        "pin, name, privilege, password, card, group_id, time_zone, verify_mode, vice_card";

    /// Inserta o reemplaza por PIN, con atribución del terminal origen.
    #[instrument(skip(self, user), fields(pin = %user.pin))]
    pub async fn upsert(&self, user: &User, source_serial: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT OR REPLACE INTO users \
                 (pin, name, privilege, password, card, group_id, time_zone, verify_mode, \
                  vice_card, source_serial, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    user.pin.clone(),
                    user.name.clone(),
                    user.privilege,
                    user.password.clone(),
                    user.card.clone(),
                    user.group.clone(),
                    user.time_zone.clone(),
                    user.verify_mode,
                    user.vice_card.clone(),
                    source_serial,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn find(&self, pin: &str) -> Result<Option<User>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!("SELECT {} FROM users WHERE pin = ?1", Self::USER_COLUMNS),
                params![pin],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<User>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!("SELECT {} FROM users ORDER BY pin", Self::USER_COLUMNS),
                (),
            )
            .await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(Self::map_row_to_user(&row)?);
        }
        Ok(users)
    }

    /// Borrado en cascada por acción de operador: la fila de usuario y toda
    /// fila biométrica, de foto, de código de trabajo y de mensaje que
    /// comparta el PIN caen en una única transacción.
    #[instrument(skip(self))]
    pub async fn delete_cascade(&self, pin: &str) -> Result<bool, DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        let removed_users = transaction
            .execute("DELETE FROM users WHERE pin = ?1", params![pin])
            .await?;
        transaction
            .execute("DELETE FROM biometric_templates WHERE pin = ?1", params![pin])
            .await?;
        transaction
            .execute("DELETE FROM user_photos WHERE pin = ?1", params![pin])
            .await?;
        transaction
            .execute("DELETE FROM comparison_photos WHERE pin = ?1", params![pin])
            .await?;
        transaction
            .execute("DELETE FROM work_codes WHERE pin = ?1", params![pin])
            .await?;
        transaction
            .execute("DELETE FROM user_messages WHERE pin = ?1", params![pin])
            .await?;

        transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        info!("💀 [USERS]: Cascade removal for PIN [{}] sealed.", pin);
        Ok(removed_users > 0)
    }
}
