// [libs/domain/models/src/journal.rs]
/*!
 * =================================================================
 * APARATO: SYNC JOURNAL MODEL
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DEL RASTRO DE AUDITORÍA DE SINCRONIZACIÓN
 *
 * El rastro es append-only y solo alimenta auditoría; el núcleo jamás
 * lee estado desde aquí.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Acción registrada en el rastro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    /// Propagación de un registro subido hacia un par.
    Sync,
    /// Borrado propagado por un operador.
    Delete,
    /// Texto libre (p. ej. `"<DataOrigin>:<ErrMsg>"` de un ERRORLOG).
    Other(String),
}

impl SyncAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sync => "sync",
            Self::Delete => "delete",
            Self::Other(label) => label.as_str(),
        }
    }
}

/// Estado final del intento de propagación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// Comando encolado en la cola del par.
    Queued,
    /// Registro descartado antes de encolar (validación u otra causa).
    Skipped,
    /// Entrada informativa sin propagación (ERRORLOG).
    Logged,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Skipped => "skipped",
            Self::Logged => "logged",
        }
    }
}

/// Fila append-only del rastro de sincronización.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJournalEntry {
    /// Terminal origen del evento.
    pub source_serial: String,
    /// Terminal destino de la propagación; vacío para entradas informativas.
    pub target_serial: String,
    /// Tag del registro propagado (USER, BIODATA, ...).
    pub record_type: String,
    /// Clave natural del registro dentro de su tabla.
    pub record_key: String,
    /// Acción ejecutada.
    pub action: SyncAction,
    /// Resultado del intento.
    pub status: SyncStatus,
    /// Razón de descarte u otra anotación de diagnóstico.
    pub detail: Option<String>,
    /// Instante de registro.
    pub created_at: DateTime<Utc>,
}
