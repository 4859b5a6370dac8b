// [libs/domain/models/src/biometric.rs]
/*!
 * =================================================================
 * APARATO: BIOMETRIC DOMAIN MODELS
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: ENUMERACIÓN AUTORITATIVA DE TIPOS Y PLANTILLA UNIFICADA
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Enumeración autoritativa de familias biométricas. El código numérico
/// viaja en el campo `Type` del dialecto BIODATA y es idéntico en la
/// base de datos y en el cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiometricKind {
    /// Huella dactilar (código 1).
    Fingerprint,
    /// Rostro (código 2).
    Face,
    /// Huella de voz (código 3).
    Voiceprint,
    /// Iris (código 4).
    Iris,
    /// Retina (código 5).
    Retina,
    /// Huella palmar (código 6).
    Palmprint,
    /// Vena del dedo (código 7).
    FingerVein,
    /// Palma (código 8).
    Palm,
    /// Rostro de luz visible (código 9).
    VisibleLightFace,
}

impl BiometricKind {
    /// Código numérico del protocolo para esta familia.
    pub fn code(self) -> u8 {
        match self {
            Self::Fingerprint => 1,
            Self::Face => 2,
            Self::Voiceprint => 3,
            Self::Iris => 4,
            Self::Retina => 5,
            Self::Palmprint => 6,
            Self::FingerVein => 7,
            Self::Palm => 8,
            Self::VisibleLightFace => 9,
        }
    }

    /// Resuelve la familia desde el código del protocolo.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Fingerprint),
            2 => Some(Self::Face),
            3 => Some(Self::Voiceprint),
            4 => Some(Self::Iris),
            5 => Some(Self::Retina),
            6 => Some(Self::Palmprint),
            7 => Some(Self::FingerVein),
            8 => Some(Self::Palm),
            9 => Some(Self::VisibleLightFace),
            _ => None,
        }
    }

    /// Resuelve la familia desde el valor textual del campo `Type`.
    pub fn from_wire_field(raw_type_field: &str) -> Option<Self> {
        raw_type_field.trim().parse::<i64>().ok().and_then(Self::from_code)
    }
}

impl std::fmt::Display for BiometricKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Fingerprint => "fingerprint",
            Self::Face => "face",
            Self::Voiceprint => "voiceprint",
            Self::Iris => "iris",
            Self::Retina => "retina",
            Self::Palmprint => "palmprint",
            Self::FingerVein => "finger-vein",
            Self::Palm => "palm",
            Self::VisibleLightFace => "visible-light-face",
        };
        write!(formatter, "{}", label)
    }
}

/// Plantilla biométrica canónica. Toda familia entrante (FP, FACE, FVEIN o
/// BIODATA nativo) se normaliza a esta forma única; la clave primaria es
/// (pin, kind, slot_number, template_index).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricTemplate {
    /// Identificador del usuario en el espacio de direcciones del terminal.
    pub pin: String,
    /// Familia biométrica de la plantilla.
    pub kind: BiometricKind,
    /// Posición física (dedo 0..9, rostro 0, resto según protocolo).
    pub slot_number: i64,
    /// Discriminador de plantillas múltiples dentro de un mismo slot.
    pub template_index: i64,
    /// Bandera de validez reportada por el firmware.
    pub valid: i64,
    /// Bandera de coacción (duress).
    pub duress: i64,
    /// Versión mayor del algoritmo, transportada textual sin coerción.
    pub major_version: String,
    /// Versión menor del algoritmo, transportada textual sin coerción.
    pub minor_version: String,
    /// Etiqueta de formato. Algunos sitios emiten `0`, otros `ZK`;
    /// se preserva byte a byte.
    pub format_tag: String,
    /// Vector de características opaco en texto imprimible (base64).
    pub template_blob: String,
}

impl BiometricTemplate {
    /// Clave de registro para el rastro de sincronización.
    pub fn record_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.pin,
            self.kind.code(),
            self.slot_number,
            self.template_index
        )
    }
}
