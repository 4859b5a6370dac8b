// [libs/domain/models/src/message.rs]

use serde::{Deserialize, Serialize};

/// Mensaje corto (tag `SMS`), clave UID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortMessage {
    /// Identificador del mensaje en la flota.
    pub uid: String,
    /// Texto del mensaje.
    pub content: String,
    /// Etiqueta de alcance reportada por el terminal (personal/público).
    pub tag: String,
    /// Minutos de permanencia en pantalla.
    pub duration_minutes: String,
    /// Instante de inicio de la exhibición.
    pub start_time: String,
}

/// Asociación usuario-mensaje (tag `USER_SMS`), clave (PIN, UID).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessageLink {
    pub pin: String,
    pub uid: String,
}
