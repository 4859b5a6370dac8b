// [libs/core/protocol/src/records.rs]
/*!
 * =================================================================
 * APARATO: TYPED UPLOAD RECORDS
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: VARIANTES TIPADAS POR TAG Y TRADUCCIÓN A ENTIDADES
 *
 * Los registros llegan del firmware como mapas de texto; se parsean una
 * sola vez en la frontera del códec y de ahí en adelante circulan como
 * variantes tipadas. Las familias legadas (FP, FACE, FVEIN) saben
 * traducirse a la plantilla biométrica unificada.
 * =================================================================
 */

use crate::errors::WireError;
use fleetsync_domain_models::{
    BiometricKind, BiometricTemplate, ComparisonPhoto, IdCardRecord, ShortMessage, User,
    UserMessageLink, UserPhoto, WorkCode,
};

/// Registro `USER`. Claves en mayúscula (`PIN`, `Name`, `Pri`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub pin: String,
    pub name: String,
    pub privilege: String,
    pub password: String,
    pub card: String,
    pub group: String,
    pub time_zone: String,
    pub verify_mode: String,
    pub vice_card: String,
}

impl UserRecord {
    /// Traduce al usuario canónico aplicando los valores por defecto del
    /// dominio sobre campos en blanco.
    pub fn to_user(&self) -> User {
        User {
            pin: self.pin.clone(),
            name: self.name.clone(),
            privilege: self.privilege.trim().parse().unwrap_or(0),
            password: self.password.clone(),
            card: self.card.clone(),
            group: self.group.clone(),
            time_zone: if self.time_zone.trim().is_empty() {
                User::DEFAULT_TIME_ZONE.to_string()
            } else {
                self.time_zone.clone()
            },
            verify_mode: self
                .verify_mode
                .trim()
                .parse()
                .unwrap_or(User::DEFAULT_VERIFY_MODE),
            vice_card: self.vice_card.clone(),
        }
    }
}

/// Registro legado `FP` (claves `PIN`, `FID`, `Size`, `Valid`, `TMP`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintRecord {
    pub pin: String,
    pub finger_id: String,
    pub size: String,
    pub valid: String,
    pub template: String,
}

/// Registro legado `FACE` (claves `PIN`, `FID`, `SIZE`, `VALID`, `TMP`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceRecord {
    pub pin: String,
    pub face_id: String,
    pub size: String,
    pub valid: String,
    pub template: String,
}

/// Registro legado `FVEIN` (claves `Pin`, `FID`, `Index`, `Size`, `Valid`, `Tmp`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerVeinRecord {
    pub pin: String,
    pub finger_id: String,
    pub index: String,
    pub size: String,
    pub valid: String,
    pub template: String,
}

/// Registro unificado `BIODATA` con los diez campos canónicos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiodataRecord {
    pub pin: String,
    pub number: String,
    pub index: String,
    pub valid: String,
    pub duress: String,
    pub bio_type: String,
    pub major_version: String,
    pub minor_version: String,
    pub format: String,
    pub template: String,
}

/// Registro `USERPIC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPhotoRecord {
    pub pin: String,
    pub file_name: String,
    pub size: String,
    pub content: String,
}

/// Registro `BIOPHOTO`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioPhotoRecord {
    pub pin: String,
    pub bio_type: String,
    pub file_name: String,
    pub size: String,
    pub content: String,
}

/// Registro `WORKCODE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkCodeRecord {
    pub pin: String,
    pub code: String,
    pub name: String,
}

/// Registro `SMS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsRecord {
    pub uid: String,
    pub message: String,
    pub tag: String,
    pub duration_minutes: String,
    pub start_time: String,
}

/// Registro `USER_SMS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSmsRecord {
    pub pin: String,
    pub uid: String,
}

/// Registro `ERRORLOG`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogRecord {
    pub error_code: String,
    pub error_message: String,
    pub data_origin: String,
    pub command_id: String,
    pub additional: String,
}

/// Registro subido, una variante por tag del protocolo.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadRecord {
    User(UserRecord),
    Fingerprint(FingerprintRecord),
    Face(FaceRecord),
    FingerVein(FingerVeinRecord),
    Biometric(BiodataRecord),
    UserPhoto(UserPhotoRecord),
    ComparisonPhoto(BioPhotoRecord),
    WorkCode(WorkCodeRecord),
    ShortMessage(SmsRecord),
    UserMessage(UserSmsRecord),
    IdCard(IdCardRecord),
    ErrorLog(ErrorLogRecord),
}

impl UploadRecord {
    /// Tag de cable del registro.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::User(_) => "USER",
            Self::Fingerprint(_) => "FP",
            Self::Face(_) => "FACE",
            Self::FingerVein(_) => "FVEIN",
            Self::Biometric(_) => "BIODATA",
            Self::UserPhoto(_) => "USERPIC",
            Self::ComparisonPhoto(_) => "BIOPHOTO",
            Self::WorkCode(_) => "WORKCODE",
            Self::ShortMessage(_) => "SMS",
            Self::UserMessage(_) => "USER_SMS",
            Self::IdCard(_) => "IDCARD",
            Self::ErrorLog(_) => "ERRORLOG",
        }
    }

    /// Conjunto sincronizable: registros que disparan el fan-out hacia los
    /// pares. Las fotos y los ERRORLOG se persisten pero no se propagan por
    /// esta vía.
    pub fn is_syncable(&self) -> bool {
        matches!(
            self,
            Self::User(_)
                | Self::Fingerprint(_)
                | Self::Face(_)
                | Self::FingerVein(_)
                | Self::Biometric(_)
                | Self::WorkCode(_)
                | Self::ShortMessage(_)
                | Self::UserMessage(_)
                | Self::IdCard(_)
        )
    }

    /// Clave natural del registro dentro de su tabla, para el rastro.
    pub fn record_key(&self) -> String {
        match self {
            Self::User(record) => record.pin.clone(),
            Self::Fingerprint(record) => format!("{}:{}", record.pin, record.finger_id),
            Self::Face(record) => format!("{}:{}", record.pin, record.face_id),
            Self::FingerVein(record) => {
                format!("{}:{}:{}", record.pin, record.finger_id, record.index)
            }
            Self::Biometric(record) => format!(
                "{}:{}:{}:{}",
                record.pin, record.bio_type, record.number, record.index
            ),
            Self::UserPhoto(record) => record.pin.clone(),
            Self::ComparisonPhoto(record) => format!("{}:{}", record.pin, record.bio_type),
            Self::WorkCode(record) => format!("{}:{}", record.pin, record.code),
            Self::ShortMessage(record) => record.uid.clone(),
            Self::UserMessage(record) => format!("{}:{}", record.pin, record.uid),
            Self::IdCard(record) => record.id_number.clone(),
            Self::ErrorLog(record) => record.data_origin.clone(),
        }
    }
}

fn parse_integer_field(
    tag: &'static str,
    field_name: &'static str,
    raw_value: &str,
    default_when_blank: i64,
) -> Result<i64, WireError> {
    let trimmed = raw_value.trim();
    if trimmed.is_empty() {
        return Ok(default_when_blank);
    }
    trimmed.parse().map_err(|_| WireError::MalformedRecord {
        tag,
        reason: format!("{}={} is not an integer", field_name, raw_value),
    })
}

fn default_if_blank(raw_value: &str, default_value: &str) -> String {
    if raw_value.trim().is_empty() {
        default_value.to_string()
    } else {
        raw_value.to_string()
    }
}

/// Etiqueta de formato asumida para las familias legadas que no la declaran.
const LEGACY_FORMAT_TAG: &str = "ZK";

impl FingerprintRecord {
    /// FP -> BIODATA tipo 1: `FID` pasa a ser el slot (`No`), índice 0.
    pub fn to_template(&self) -> Result<BiometricTemplate, WireError> {
        Ok(BiometricTemplate {
            pin: self.pin.clone(),
            kind: BiometricKind::Fingerprint,
            slot_number: parse_integer_field("FP", "FID", &self.finger_id, 0)?,
            template_index: 0,
            valid: parse_integer_field("FP", "Valid", &self.valid, 1)?,
            duress: 0,
            major_version: "0".to_string(),
            minor_version: "0".to_string(),
            format_tag: LEGACY_FORMAT_TAG.to_string(),
            template_blob: self.template.clone(),
        })
    }
}

impl FaceRecord {
    /// FACE -> BIODATA tipo 2. El protocolo exige slot 0 para rostro; la
    /// validación previa al encolado lo verifica.
    pub fn to_template(&self) -> Result<BiometricTemplate, WireError> {
        Ok(BiometricTemplate {
            pin: self.pin.clone(),
            kind: BiometricKind::Face,
            slot_number: parse_integer_field("FACE", "FID", &self.face_id, 0)?,
            template_index: 0,
            valid: parse_integer_field("FACE", "VALID", &self.valid, 1)?,
            duress: 0,
            major_version: "0".to_string(),
            minor_version: "0".to_string(),
            format_tag: LEGACY_FORMAT_TAG.to_string(),
            template_blob: self.template.clone(),
        })
    }
}

impl FingerVeinRecord {
    /// FVEIN -> BIODATA tipo 7, preservando el índice reportado.
    pub fn to_template(&self) -> Result<BiometricTemplate, WireError> {
        Ok(BiometricTemplate {
            pin: self.pin.clone(),
            kind: BiometricKind::FingerVein,
            slot_number: parse_integer_field("FVEIN", "FID", &self.finger_id, 0)?,
            template_index: parse_integer_field("FVEIN", "Index", &self.index, 0)?,
            valid: parse_integer_field("FVEIN", "Valid", &self.valid, 1)?,
            duress: 0,
            major_version: "0".to_string(),
            minor_version: "0".to_string(),
            format_tag: LEGACY_FORMAT_TAG.to_string(),
            template_blob: self.template.clone(),
        })
    }
}

impl BiodataRecord {
    /// BIODATA nativo -> plantilla canónica. El campo `Type` debe caer en
    /// la enumeración autoritativa; `Format` se preserva sin coerción.
    pub fn to_template(&self) -> Result<BiometricTemplate, WireError> {
        let type_code = parse_integer_field("BIODATA", "Type", &self.bio_type, -1)?;
        let kind = BiometricKind::from_code(type_code).ok_or(WireError::MalformedRecord {
            tag: "BIODATA",
            reason: format!("Type={} outside the biometric enumeration", self.bio_type),
        })?;

        Ok(BiometricTemplate {
            pin: self.pin.clone(),
            kind,
            slot_number: parse_integer_field("BIODATA", "No", &self.number, 0)?,
            template_index: parse_integer_field("BIODATA", "Index", &self.index, 0)?,
            valid: parse_integer_field("BIODATA", "Valid", &self.valid, 1)?,
            duress: parse_integer_field("BIODATA", "Duress", &self.duress, 0)?,
            major_version: default_if_blank(&self.major_version, "0"),
            minor_version: default_if_blank(&self.minor_version, "0"),
            format_tag: self.format.clone(),
            template_blob: self.template.clone(),
        })
    }
}

impl UserPhotoRecord {
    pub fn to_photo(&self) -> Result<UserPhoto, WireError> {
        Ok(UserPhoto {
            pin: self.pin.clone(),
            file_name: self.file_name.clone(),
            declared_size: parse_integer_field("USERPIC", "Size", &self.size, 0)?,
            content: self.content.clone(),
        })
    }
}

impl BioPhotoRecord {
    pub fn to_photo(&self) -> Result<ComparisonPhoto, WireError> {
        Ok(ComparisonPhoto {
            pin: self.pin.clone(),
            kind_code: parse_integer_field("BIOPHOTO", "Type", &self.bio_type, 9)?,
            file_name: self.file_name.clone(),
            declared_size: parse_integer_field("BIOPHOTO", "Size", &self.size, 0)?,
            content: self.content.clone(),
        })
    }
}

impl WorkCodeRecord {
    pub fn to_work_code(&self) -> WorkCode {
        WorkCode {
            pin: self.pin.clone(),
            code: self.code.clone(),
            name: self.name.clone(),
        }
    }
}

impl SmsRecord {
    pub fn to_message(&self) -> ShortMessage {
        ShortMessage {
            uid: self.uid.clone(),
            content: self.message.clone(),
            tag: self.tag.clone(),
            duration_minutes: self.duration_minutes.clone(),
            start_time: self.start_time.clone(),
        }
    }
}

impl UserSmsRecord {
    pub fn to_link(&self) -> UserMessageLink {
        UserMessageLink {
            pin: self.pin.clone(),
            uid: self.uid.clone(),
        }
    }
}
