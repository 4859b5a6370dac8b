// [libs/domain/models/src/photo.rs]

use serde::{Deserialize, Serialize};

/// Foto de usuario (tag `USERPIC`), clave PIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPhoto {
    pub pin: String,
    /// Nombre de archivo declarado por el terminal.
    pub file_name: String,
    /// Tamaño declarado del contenido decodificado, en bytes.
    pub declared_size: i64,
    /// Contenido opaco en texto imprimible (base64).
    pub content: String,
}

/// Foto comparativa multi-biométrica (tag `BIOPHOTO`), clave (PIN, tipo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonPhoto {
    pub pin: String,
    /// Código de familia biométrica al que pertenece la foto.
    pub kind_code: i64,
    pub file_name: String,
    pub declared_size: i64,
    pub content: String,
}
