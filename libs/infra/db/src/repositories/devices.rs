// [libs/infra/db/src/repositories/devices.rs]
/*!
 * =================================================================
 * APARATO: DEVICE REGISTRY REPOSITORY
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ALTA IDEMPOTENTE, ÚLTIMO CONTACTO Y CONJUNTO ACTIVO
 *
 * Todo endpoint del protocolo toca este repositorio como efecto lateral:
 * el último contacto se adelanta en cada init, subida, poll y ping.
 * =================================================================
 */

use crate::errors::DbError;
use crate::TursoClient;
use chrono::{DateTime, Duration, Utc};
use fleetsync_core_protocol::parser::DeviceInfoReport;
use fleetsync_domain_models::{Device, DeviceStamps, StampFamily};
use libsql::{params, Row};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

const DEVICE_COLUMNS: &str = "serial_number, push_version, language, comm_key, \
     firmware_version, ip_address, fingerprint_algorithm, face_algorithm, options_json, \
     operlog_stamp, attlog_stamp, biodata_stamp, idcard_stamp, errorlog_stamp, \
     registered_at, last_seen";

pub struct DeviceRepository {
    database_client: TursoClient,
}

impl DeviceRepository {
    pub fn new(database_client: TursoClient) -> Self {
        Self { database_client }
    }

    fn parse_timestamp(raw_timestamp: &str) -> Result<DateTime<Utc>, DbError> {
        DateTime::parse_from_rfc3339(raw_timestamp)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|fault| {
                DbError::MappingError(format!("DEVICE_TIMESTAMP_DRIFT: {}", fault))
            })
    }

    fn map_row_to_device(data_row: &Row) -> Result<Device, DbError> {
        let options_json: String = data_row.get(8)?;
        let options: BTreeMap<String, String> = serde_json::from_str(&options_json)
            .map_err(|fault| DbError::MappingError(format!("OPTIONS_JSON_DRIFT: {}", fault)))?;

        let registered_at_raw: String = data_row.get(14)?;
        let last_seen_raw: String = data_row.get(15)?;

        Ok(Device {
            serial_number: data_row.get(0)?,
            push_version: data_row.get(1)?,
            language: data_row.get(2)?,
            comm_key: data_row.get::<String>(3).ok(),
            firmware_version: data_row.get::<String>(4).ok(),
            ip_address: data_row.get::<String>(5).ok(),
            fingerprint_algorithm: data_row.get::<String>(6).ok(),
            face_algorithm: data_row.get::<String>(7).ok(),
            options,
            stamps: DeviceStamps {
                operlog: data_row.get::<String>(9).ok(),
                attlog: data_row.get::<String>(10).ok(),
                biodata: data_row.get::<String>(11).ok(),
                idcard: data_row.get::<String>(12).ok(),
                errorlog: data_row.get::<String>(13).ok(),
            },
            registered_at: Self::parse_timestamp(&registered_at_raw)?,
            last_seen: Self::parse_timestamp(&last_seen_raw)?,
        })
    }

    /// Garantiza la existencia de la fila del terminal. Cualquier endpoint
    /// puede ser el primer contacto de un serial desconocido.
    async fn ensure_registered(&self, serial_number: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let now = Utc::now().to_rfc3339();
        connection
            .execute(
                "INSERT OR IGNORE INTO devices (serial_number, registered_at, last_seen) \
                 VALUES (?1, ?2, ?3)",
                params![serial_number, now.clone(), now],
            )
            .await?;
        Ok(())
    }

    /// Alta o actualización idempotente en el init. Fusiona las opciones de
    /// capacidad reportadas sobre las ya conocidas y adelanta el contacto.
    #[instrument(skip(self, capability_options))]
    pub async fn register_or_update(
        &self,
        serial_number: &str,
        push_version: Option<&str>,
        language: Option<&str>,
        comm_key: Option<&str>,
        capability_options: &BTreeMap<String, String>,
    ) -> Result<Device, DbError> {
        self.ensure_registered(serial_number).await?;

        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        let mut existing_rows = transaction
            .query(
                &format!("SELECT {} FROM devices WHERE serial_number = ?1", DEVICE_COLUMNS),
                params![serial_number],
            )
            .await?;
        let existing_row = existing_rows.next().await?.ok_or(DbError::DeviceNotFound)?;
        let mut device = Self::map_row_to_device(&existing_row)?;

        for (option_key, option_value) in capability_options {
            device
                .options
                .insert(option_key.clone(), option_value.clone());
        }
        if let Some(push_version) = push_version.filter(|value| !value.is_empty()) {
            device.push_version = push_version.to_string();
        }
        if let Some(language) = language.filter(|value| !value.is_empty()) {
            device.language = language.to_string();
        }
        if let Some(comm_key) = comm_key.filter(|value| !value.is_empty()) {
            device.comm_key = Some(comm_key.to_string());
        }
        device.last_seen = Utc::now();

        let options_json = serde_json::to_string(&device.options)
            .map_err(|fault| DbError::MappingError(format!("OPTIONS_JSON_DRIFT: {}", fault)))?;

        transaction
            .execute(
                "UPDATE devices SET push_version = ?2, language = ?3, \
                 comm_key = COALESCE(NULLIF(?4, ''), comm_key), \
                 options_json = ?5, last_seen = ?6 WHERE serial_number = ?1",
                params![
                    serial_number,
                    device.push_version.clone(),
                    device.language.clone(),
                    device.comm_key.clone().unwrap_or_default(),
                    options_json,
                    device.last_seen.to_rfc3339()
                ],
            )
            .await?;

        transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        info!("📟 [REGISTRY]: Terminal [{}] acquired/levelled.", serial_number);
        Ok(device)
    }

    /// Adelanta el último contacto; registra el serial si es desconocido.
    pub async fn touch_last_seen(&self, serial_number: &str) -> Result<(), DbError> {
        self.ensure_registered(serial_number).await?;
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "UPDATE devices SET last_seen = ?2 WHERE serial_number = ?1",
                params![serial_number, Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    /// Aplica el reporte `INFO=` del poll: firmware, ip y algoritmos.
    #[instrument(skip(self, info_report))]
    pub async fn apply_info_report(
        &self,
        serial_number: &str,
        info_report: &DeviceInfoReport,
    ) -> Result<(), DbError> {
        self.ensure_registered(serial_number).await?;
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "UPDATE devices SET \
                 firmware_version = COALESCE(NULLIF(?2, ''), firmware_version), \
                 ip_address = COALESCE(NULLIF(?3, ''), ip_address), \
                 fingerprint_algorithm = COALESCE(NULLIF(?4, ''), fingerprint_algorithm), \
                 face_algorithm = COALESCE(NULLIF(?5, ''), face_algorithm), \
                 last_seen = ?6 \
                 WHERE serial_number = ?1",
                params![
                    serial_number,
                    info_report.firmware_version.clone().unwrap_or_default(),
                    info_report.ip_address.clone().unwrap_or_default(),
                    info_report.fingerprint_algorithm.clone().unwrap_or_default(),
                    info_report.face_algorithm.clone().unwrap_or_default(),
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Registra el listado de opciones posteado por el terminal
    /// (`table=options`), fusionándolo sobre el mapa conocido.
    pub async fn record_options(
        &self,
        serial_number: &str,
        posted_options: &BTreeMap<String, String>,
    ) -> Result<(), DbError> {
        self.register_or_update(serial_number, None, None, None, posted_options)
            .await
            .map(|_| ())
    }

    /// Adelanta el cursor confirmado de una familia de tabla.
    pub async fn advance_stamp(
        &self,
        serial_number: &str,
        stamp_family: StampFamily,
        stamp_value: &str,
    ) -> Result<(), DbError> {
        if stamp_value.trim().is_empty() {
            return Ok(());
        }
        let stamp_column = match stamp_family {
            StampFamily::Operlog => "operlog_stamp",
            StampFamily::Attlog => "attlog_stamp",
            StampFamily::Biodata => "biodata_stamp",
            StampFamily::Idcard => "idcard_stamp",
            StampFamily::Errorlog => "errorlog_stamp",
        };
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                &format!(
                    "UPDATE devices SET {} = ?2 WHERE serial_number = ?1",
                    stamp_column
                ),
                params![serial_number, stamp_value],
            )
            .await?;
        Ok(())
    }

    pub async fn find(&self, serial_number: &str) -> Result<Option<Device>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!("SELECT {} FROM devices WHERE serial_number = ?1", DEVICE_COLUMNS),
                params![serial_number],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_row_to_device(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Device>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!("SELECT {} FROM devices ORDER BY serial_number", DEVICE_COLUMNS),
                (),
            )
            .await?;
        let mut devices = Vec::new();
        while let Some(row) = rows.next().await? {
            devices.push(Self::map_row_to_device(&row)?);
        }
        Ok(devices)
    }

    /// Instantánea atómica del conjunto activo para el fan-out: terminales
    /// con contacto dentro de la ventana, excluyendo opcionalmente al origen.
    #[instrument(skip(self))]
    pub async fn active_peers(
        &self,
        window_minutes: i64,
        exclude_serial: Option<&str>,
    ) -> Result<Vec<Device>, DbError> {
        let cutoff = (Utc::now() - Duration::minutes(window_minutes)).to_rfc3339();
        let excluded = exclude_serial.unwrap_or("");

        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {} FROM devices \
                     WHERE last_seen >= ?1 AND serial_number <> ?2 \
                     ORDER BY serial_number",
                    DEVICE_COLUMNS
                ),
                params![cutoff, excluded],
            )
            .await?;

        let mut active_devices = Vec::new();
        while let Some(row) = rows.next().await? {
            active_devices.push(Self::map_row_to_device(&row)?);
        }
        Ok(active_devices)
    }

    /// Baja dura por acción de operador: elimina el terminal y toda su cola
    /// de comandos en una sola transacción.
    #[instrument(skip(self))]
    pub async fn delete_cascade(&self, serial_number: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        transaction
            .execute(
                "DELETE FROM commands WHERE device_serial = ?1",
                params![serial_number],
            )
            .await?;
        let removed_devices = transaction
            .execute(
                "DELETE FROM devices WHERE serial_number = ?1",
                params![serial_number],
            )
            .await?;

        transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        if removed_devices == 0 {
            warn!("⚠️ [REGISTRY]: Delete requested for unknown terminal [{}].", serial_number);
            return Err(DbError::DeviceNotFound);
        }
        info!("💀 [REGISTRY]: Terminal [{}] and its queue removed.", serial_number);
        Ok(())
    }
}
