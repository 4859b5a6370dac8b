// [libs/domain/models/src/workcode.rs]

use serde::{Deserialize, Serialize};

/// Código de trabajo (tag `WORKCODE`), clave (PIN, código).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCode {
    pub pin: String,
    pub code: String,
    /// Nombre mostrado del código.
    pub name: String,
}
