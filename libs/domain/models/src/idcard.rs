// [libs/domain/models/src/idcard.rs]

use serde::{Deserialize, Serialize};

/// Registro de cédula de identidad (tag `IDCARD`), clave el número de
/// documento gubernamental. Transporta demografía, dos plantillas de huella
/// y un retrato; todos los campos viajan como texto opaco.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCardRecord {
    /// PIN del usuario asociado, cuando el terminal lo reporta.
    pub pin: String,
    /// Número de serie físico de la cédula.
    pub sn_number: String,
    /// Número de documento gubernamental (clave primaria).
    pub id_number: String,
    /// Identificador DN del chip.
    pub dn: String,
    pub name: String,
    pub gender: String,
    pub nation: String,
    pub birthday: String,
    /// Ventana de validez impresa en la cédula.
    pub valid_info: String,
    pub address: String,
    pub additional_info: String,
    /// Autoridad emisora.
    pub issuer: String,
    /// Retrato en texto imprimible (base64).
    pub photo: String,
    /// Primera plantilla dactilar de la cédula.
    pub fingerprint_template_1: String,
    /// Segunda plantilla dactilar de la cédula.
    pub fingerprint_template_2: String,
    pub reserve: String,
    pub notice: String,
}
