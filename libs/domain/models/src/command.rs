// [libs/domain/models/src/command.rs]
/*!
 * =================================================================
 * APARATO: COMMAND DOMAIN MODELS
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DEL COMANDO SALIENTE Y SU MÁQUINA DE ESTADOS
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categoría operativa del comando, registrada junto a la fila de cola.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandCategory {
    Data,
    Control,
    Clear,
    Config,
    Info,
    Enroll,
    File,
    System,
    Upgrade,
    Check,
    Log,
    Verify,
}

impl CommandCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Control => "CONTROL",
            Self::Clear => "CLEAR",
            Self::Config => "CONFIG",
            Self::Info => "INFO",
            Self::Enroll => "ENROLL",
            Self::File => "FILE",
            Self::System => "SYSTEM",
            Self::Upgrade => "UPGRADE",
            Self::Check => "CHECK",
            Self::Log => "LOG",
            Self::Verify => "VERIFY",
        }
    }

    pub fn parse(raw_category: &str) -> Option<Self> {
        match raw_category.trim().to_ascii_uppercase().as_str() {
            "DATA" => Some(Self::Data),
            "CONTROL" => Some(Self::Control),
            "CLEAR" => Some(Self::Clear),
            "CONFIG" => Some(Self::Config),
            "INFO" => Some(Self::Info),
            "ENROLL" => Some(Self::Enroll),
            "FILE" => Some(Self::File),
            "SYSTEM" => Some(Self::System),
            "UPGRADE" => Some(Self::Upgrade),
            "CHECK" => Some(Self::Check),
            "LOG" => Some(Self::Log),
            "VERIFY" => Some(Self::Verify),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommandCategory {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// Estados del ciclo de vida de un comando en la cola por terminal.
///
/// Transiciones permitidas:
/// `pending -> sent` (dequeue), `sent -> completed` (Return=0),
/// `sent -> pending` (fallo reintentable, contador < límite),
/// `sent -> failed` (fallo definitivo). `completed` y `failed` son finales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandState {
    Pending,
    Sent,
    Completed,
    Failed,
}

impl CommandState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(raw_state: &str) -> Option<Self> {
        match raw_state.trim() {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Indica si el estado es terminal (la fila ya no vuelve a despacharse).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for CommandState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// Fila canónica de la cola de comandos por terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Identificador generado de 16 caracteres hexadecimales, único por terminal.
    pub identifier: String,
    /// Número de serie del terminal propietario de la fila.
    pub device_serial: String,
    /// Categoría operativa del comando.
    pub category: CommandCategory,
    /// Bytes del dialecto de salida (sin el prefijo `C:<id>:`).
    pub payload: String,
    /// Estado actual dentro de la máquina de estados.
    pub state: CommandState,
    /// Instante de encolado.
    pub created_at: DateTime<Utc>,
    /// Instante del último despacho hacia el terminal.
    pub sent_at: Option<DateTime<Utc>>,
    /// Instante de terminación (completado o fallido).
    pub completed_at: Option<DateTime<Utc>>,
    /// Cuerpo íntegro de la última respuesta del terminal.
    pub result: Option<String>,
    /// Número de despachos fallidos acumulados.
    pub retry_count: i64,
}

impl CommandRecord {
    /// Un payload es idempotente cuando repetirlo deja al terminal en el
    /// mismo estado; cubre todo `DATA UPDATE` y `DATA DELETE`.
    pub fn is_idempotent_payload(&self) -> bool {
        self.payload.starts_with("DATA UPDATE") || self.payload.starts_with("DATA DELETE")
    }
}
