// [apps/sync-server/src/config.rs]
/*!
 * =================================================================
 * APARATO: SYNC SERVER CONFIGURATION
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L1-APP)
 * RESPONSABILIDAD: CAPTURA TIPADA DE ENTORNO CON VALORES DE DESPLIEGUE
 * =================================================================
 */

use std::env;

/// Configuración tipada del servidor, hidratada desde el entorno.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// URL del ledger (archivo local, `:memory:` o `libsql://`).
    pub database_url: String,
    /// Token de acceso para ledgers remotos.
    pub database_auth_token: Option<String>,
    /// Puerto TCP del servidor HTTP.
    pub server_port: u16,
    /// Ventana en minutos dentro de la cual un terminal cuenta como activo.
    pub active_window_minutes: i64,
    /// Presupuesto de reintentos por comando antes de abandonarlo.
    pub command_retry_limit: i64,
    /// Cadencia del barrido de higiene de la cola, en segundos.
    pub sweeper_interval_seconds: u64,
    /// Retención de filas terminales (completed/failed), en horas.
    pub command_retention_hours: i64,
    /// Antigüedad a partir de la cual una fila pendiente agotada se purga.
    pub stale_pending_hours: i64,
    /// Retención del rastro de sincronización, en días.
    pub journal_retention_days: i64,
    /// Interruptor de propagación de fotos (USERPIC/BIOPHOTO). El despliegue
    /// de producción lo mantiene apagado: la biometría basta.
    pub propagate_photos: bool,
    /// Desplazamiento horario anunciado en el bloque de opciones del init.
    pub device_timezone_offset: i64,
}

fn env_or<T: std::str::FromStr>(variable_name: &str, default_value: T) -> T {
    env::var(variable_name)
        .ok()
        .and_then(|raw_value| raw_value.trim().parse().ok())
        .unwrap_or(default_value)
}

impl SyncConfig {
    /// Hidrata la configuración desde variables de entorno; toda clave
    /// ausente cae a su valor de despliegue.
    pub fn from_environment() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "fleetsync.db".to_string()),
            database_auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
            server_port: env_or("PORT", 8080),
            active_window_minutes: env_or("ACTIVE_WINDOW_MINUTES", 10),
            command_retry_limit: env_or("COMMAND_RETRY_LIMIT", 3),
            sweeper_interval_seconds: env_or("SWEEPER_INTERVAL_SECONDS", 3600),
            command_retention_hours: env_or("COMMAND_RETENTION_HOURS", 24),
            stale_pending_hours: env_or("STALE_PENDING_HOURS", 1),
            journal_retention_days: env_or("JOURNAL_RETENTION_DAYS", 30),
            propagate_photos: env_or("PROPAGATE_PHOTOS", false),
            device_timezone_offset: env_or("DEVICE_TIMEZONE", 0),
        }
    }
}

impl Default for SyncConfig {
    /// Valores de laboratorio: ledger en memoria y cadencias de despliegue.
    fn default() -> Self {
        Self {
            database_url: ":memory:".to_string(),
            database_auth_token: None,
            server_port: 8080,
            active_window_minutes: 10,
            command_retry_limit: 3,
            sweeper_interval_seconds: 3600,
            command_retention_hours: 24,
            stale_pending_hours: 1,
            journal_retention_days: 30,
            propagate_photos: false,
            device_timezone_offset: 0,
        }
    }
}
