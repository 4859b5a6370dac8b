// [libs/domain/models/src/device.rs]
/*!
 * =================================================================
 * APARATO: DEVICE DOMAIN MODEL
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DEL TERMINAL REGISTRADO Y SUS CURSORES
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Familia de tabla a la que pertenece un cursor de subida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StampFamily {
    Operlog,
    Attlog,
    Biodata,
    Idcard,
    Errorlog,
}

impl StampFamily {
    /// Familia asociada al parámetro `table=` de una subida, cuando la
    /// tabla avanza un cursor.
    pub fn for_upload_table(table_name: &str) -> Option<Self> {
        match table_name {
            "OPERLOG" => Some(Self::Operlog),
            "ATTLOG" => Some(Self::Attlog),
            "BIODATA" => Some(Self::Biodata),
            "IDCARD" => Some(Self::Idcard),
            "ERRORLOG" => Some(Self::Errorlog),
            _ => None,
        }
    }
}

/// Cursores de subida (Stamps) reconocidos por familia de tabla. El servidor
/// almacena el último valor confirmado y el terminal reanuda desde ahí.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStamps {
    pub operlog: Option<String>,
    pub attlog: Option<String>,
    pub biodata: Option<String>,
    pub idcard: Option<String>,
    pub errorlog: Option<String>,
}

/// Terminal de control de acceso registrado. Se crea en el primer init y se
/// actualiza en cada init, subida, poll o ping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Número de serie, clave del registro.
    pub serial_number: String,
    /// Versión del protocolo push anunciada por el firmware.
    pub push_version: String,
    /// Etiqueta de idioma reportada en el init.
    pub language: String,
    /// Clave compartida opcional negociada con el terminal.
    pub comm_key: Option<String>,
    /// Versión de firmware (campo 1 del reporte `INFO=`).
    pub firmware_version: Option<String>,
    /// Dirección IP reportada por el terminal.
    pub ip_address: Option<String>,
    /// Versión del algoritmo de huella.
    pub fingerprint_algorithm: Option<String>,
    /// Versión del algoritmo facial.
    pub face_algorithm: Option<String>,
    /// Opciones de capacidad libres (nombre -> valor), incluidas las
    /// máscaras multi-biométricas.
    pub options: BTreeMap<String, String>,
    /// Cursores de subida confirmados por familia de tabla.
    pub stamps: DeviceStamps,
    /// Instante de alta del terminal.
    pub registered_at: DateTime<Utc>,
    /// Último contacto observado en cualquier endpoint.
    pub last_seen: DateTime<Utc>,
}

impl Device {
    /// Máscara de soporte multi-biométrico del terminal, con el valor de
    /// despliegue por defecto cuando el firmware aún no la anunció.
    pub fn multi_bio_data_mask(&self) -> String {
        self.options
            .get("MultiBioDataSupport")
            .cloned()
            .unwrap_or_else(|| Self::DEFAULT_MULTI_BIO_MASK.to_string())
    }

    /// Máscara de soporte de fotos comparativas multi-biométricas.
    pub fn multi_bio_photo_mask(&self) -> String {
        self.options
            .get("MultiBioPhotoSupport")
            .cloned()
            .unwrap_or_else(|| Self::DEFAULT_MULTI_BIO_MASK.to_string())
    }

    /// Un terminal está activo cuando su último contacto cae dentro de la
    /// ventana configurada.
    pub fn is_active(&self, window_minutes: i64, now: DateTime<Utc>) -> bool {
        now - self.last_seen <= chrono::Duration::minutes(window_minutes)
    }

    /// Máscara por defecto: posiciones 1 (huella), 2 (rostro), 7 (vena),
    /// 8 (palma) y 9 (rostro visible) habilitadas.
    pub const DEFAULT_MULTI_BIO_MASK: &'static str = "0:1:1:0:0:0:0:1:1:1";
}
