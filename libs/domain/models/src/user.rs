// [libs/domain/models/src/user.rs]

use serde::{Deserialize, Serialize};

/// Usuario canónico, clave PIN (identificador en el espacio de direcciones
/// del terminal, no una contraseña). Una subida `USER` crea o sobreescribe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identificador único del usuario dentro de la flota.
    pub pin: String,
    /// Nombre mostrado en el terminal.
    pub name: String,
    /// Nivel de privilegio (0 usuario, valores mayores = operador).
    pub privilege: i64,
    /// Contraseña de teclado, puede ser vacía.
    pub password: String,
    /// Tarjeta principal.
    pub card: String,
    /// Grupo de acceso.
    pub group: String,
    /// Máscara semanal de zonas horarias, 16 caracteres hexadecimales.
    pub time_zone: String,
    /// Código de modo de verificación; -1 delega en el grupo.
    pub verify_mode: i64,
    /// Tarjeta secundaria.
    pub vice_card: String,
}

impl User {
    /// Máscara de zonas por defecto (todo en cero).
    pub const DEFAULT_TIME_ZONE: &'static str = "0000000000000000";

    /// Modo de verificación por defecto: usar el del grupo.
    pub const DEFAULT_VERIFY_MODE: i64 = -1;
}
