// [libs/infra/db/src/repositories/workcodes.rs]

use crate::errors::DbError;
use crate::TursoClient;
use fleetsync_domain_models::WorkCode;
use libsql::params;
use tracing::instrument;

/// Repositorio de códigos de trabajo, clave (PIN, código).
pub struct WorkCodeRepository {
    database_client: TursoClient,
}

impl WorkCodeRepository {
    pub fn new(database_client: TursoClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self, work_code), fields(code = %work_code.code))]
    pub async fn upsert(&self, work_code: &WorkCode, source_serial: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT OR REPLACE INTO work_codes (pin, code, name, source_serial) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    work_code.pin.clone(),
                    work_code.code.clone(),
                    work_code.name.clone(),
                    source_serial
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, pin: &str, code: &str) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        Ok(connection
            .execute(
                "DELETE FROM work_codes WHERE pin = ?1 AND code = ?2",
                params![pin, code],
            )
            .await?)
    }

    pub async fn list_all(&self) -> Result<Vec<WorkCode>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query("SELECT pin, code, name FROM work_codes ORDER BY pin, code", ())
            .await?;
        let mut work_codes = Vec::new();
        while let Some(row) = rows.next().await? {
            work_codes.push(WorkCode {
                pin: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
            });
        }
        Ok(work_codes)
    }
}
