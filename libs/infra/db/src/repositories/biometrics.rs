// [libs/infra/db/src/repositories/biometrics.rs]
/*!
 * =================================================================
 * APARATO: BIOMETRIC TEMPLATE REPOSITORY
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PLANTILLA UNIFICADA, CLAVE (PIN, TIPO, SLOT, ÍNDICE)
 *
 * El almacén solo conoce la forma unificada; las familias legadas se
 * traducen antes de llegar aquí. Insertar un duplicado sobreescribe.
 * =================================================================
 */

use crate::errors::DbError;
use crate::TursoClient;
use chrono::Utc;
use fleetsync_domain_models::{BiometricKind, BiometricTemplate};
use libsql::{params, Row};
use tracing::instrument;

pub struct BiometricRepository {
    database_client: TursoClient,
}

impl BiometricRepository {
    pub fn new(database_client: TursoClient) -> Self {
        Self { database_client }
    }

    const TEMPLATE_COLUMNS: &'static str = "pin, bio_type, slot_number, template_index, \
         valid, duress, major_version, minor_version, format_tag, template_blob";

    fn map_row_to_template(data_row: &Row) -> Result<BiometricTemplate, DbError> {
        let type_code: i64 = data_row.get(1)?;
        let kind = BiometricKind::from_code(type_code).ok_or_else(|| {
            DbError::MappingError(format!("BIO_TYPE_DRIFT: stored code {}", type_code))
        })?;
        Ok(BiometricTemplate {
            pin: data_row.get(0)?,
            kind,
            slot_number: data_row.get(2)?,
            template_index: data_row.get(3)?,
            valid: data_row.get(4)?,
            duress: data_row.get(5)?,
            major_version: data_row.get(6)?,
            minor_version: data_row.get(7)?,
            format_tag: data_row.get(8)?,
            template_blob: data_row.get(9)?,
        })
    }

    /// Inserta o reemplaza por clave compuesta.
    #[instrument(skip(self, template), fields(pin = %template.pin, kind = %template.kind))]
    pub async fn upsert(
        &self,
        template: &BiometricTemplate,
        source_serial: &str,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT OR REPLACE INTO biometric_templates \
                 (pin, bio_type, slot_number, template_index, valid, duress, major_version, \
                  minor_version, format_tag, template_blob, source_serial, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    template.pin.clone(),
                    template.kind.code() as i64,
                    template.slot_number,
                    template.template_index,
                    template.valid,
                    template.duress,
                    template.major_version.clone(),
                    template.minor_version.clone(),
                    template.format_tag.clone(),
                    template.template_blob.clone(),
                    source_serial,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Plantillas de un PIN, en orden estable de tipo/slot/índice.
    pub async fn list_for_pin(&self, pin: &str) -> Result<Vec<BiometricTemplate>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM biometric_templates WHERE pin = ?1 \
                     ORDER BY bio_type, slot_number, template_index",
                    Self::TEMPLATE_COLUMNS
                ),
                params![pin],
            )
            .await?;
        let mut templates = Vec::new();
        while let Some(row) = rows.next().await? {
            templates.push(Self::map_row_to_template(&row)?);
        }
        Ok(templates)
    }

    /// Borra plantillas de un PIN, opcionalmente acotado a una familia y a
    /// un slot. Devuelve las filas eliminadas.
    #[instrument(skip(self))]
    pub async fn delete_for_pin(
        &self,
        pin: &str,
        kind: Option<BiometricKind>,
        slot_number: Option<i64>,
    ) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        let removed = match (kind, slot_number) {
            (None, _) => {
                connection
                    .execute(
                        "DELETE FROM biometric_templates WHERE pin = ?1",
                        params![pin],
                    )
                    .await?
            }
            (Some(kind), None) => {
                connection
                    .execute(
                        "DELETE FROM biometric_templates WHERE pin = ?1 AND bio_type = ?2",
                        params![pin, kind.code() as i64],
                    )
                    .await?
            }
            (Some(kind), Some(slot_number)) => {
                connection
                    .execute(
                        "DELETE FROM biometric_templates \
                         WHERE pin = ?1 AND bio_type = ?2 AND slot_number = ?3",
                        params![pin, kind.code() as i64, slot_number],
                    )
                    .await?
            }
        };
        Ok(removed)
    }

    /// Volcado completo filtrado por terminal origen (diagnóstico).
    pub async fn list_by_source(
        &self,
        source_serial: &str,
    ) -> Result<Vec<BiometricTemplate>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM biometric_templates WHERE source_serial = ?1 \
                     ORDER BY pin, bio_type, slot_number, template_index",
                    Self::TEMPLATE_COLUMNS
                ),
                params![source_serial],
            )
            .await?;
        let mut templates = Vec::new();
        while let Some(row) = rows.next().await? {
            templates.push(Self::map_row_to_template(&row)?);
        }
        Ok(templates)
    }
}
