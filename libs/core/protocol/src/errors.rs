// [libs/core/protocol/src/errors.rs]
/*!
 * =================================================================
 * APARATO: WIRE ERROR CATALOG
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE CABLE Y VALIDACIÓN
 * =================================================================
 */

use thiserror::Error;

/// Fallos al interpretar material que llega del terminal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// El tag inicial del registro no pertenece al protocolo.
    #[error("[L1_WIRE_FAULT]: UNKNOWN_RECORD_TAG -> {0}")]
    UnknownTag(String),

    /// El registro trae el tag correcto pero el cuerpo no es interpretable.
    #[error("[L1_WIRE_FAULT]: MALFORMED_RECORD [{tag}] -> {reason}")]
    MalformedRecord { tag: &'static str, reason: String },

    /// Falta un campo obligatorio para la clave primaria del registro.
    #[error("[L1_WIRE_FAULT]: MISSING_FIELD [{tag}] -> {field}")]
    MissingField { tag: &'static str, field: &'static str },

    /// La respuesta de comando no trae identificador.
    #[error("[L1_WIRE_FAULT]: REPLY_WITHOUT_COMMAND_ID")]
    ReplyWithoutId,
}

/// Fallos de la validación de payloads previa al encolado (la llamada
/// registra el descarte en el rastro de sincronización).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("[L1_VALIDATION_FAULT]: EMPTY_PIN")]
    EmptyPin,

    #[error("[L1_VALIDATION_FAULT]: UNKNOWN_BIOMETRIC_TYPE -> {0}")]
    UnknownBiometricType(i64),

    #[error("[L1_VALIDATION_FAULT]: EMPTY_TEMPLATE")]
    EmptyTemplate,

    /// El blob no respeta la clase imprimible base64.
    #[error("[L1_VALIDATION_FAULT]: TEMPLATE_NOT_PRINTABLE_BASE64")]
    MalformedTemplate,

    #[error("[L1_VALIDATION_FAULT]: SLOT_OUT_OF_RANGE [{kind}] -> {slot}")]
    SlotOutOfRange { kind: &'static str, slot: i64 },

    #[error("[L1_VALIDATION_FAULT]: NEGATIVE_TEMPLATE_INDEX -> {0}")]
    NegativeIndex(i64),
}
