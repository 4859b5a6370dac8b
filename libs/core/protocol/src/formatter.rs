// [libs/core/protocol/src/formatter.rs]
/*!
 * =================================================================
 * APARATO: OUTBOUND COMMAND FORMATTER
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: PAYLOADS DEL DIALECTO DE SALIDA Y REPARACIÓN DE TABS
 *
 * Toda familia biométrica sale por el cable como BIODATA unificado; esa
 * invariante es la que mantiene consistente una flota con firmwares
 * mezclados. La validación previa al encolado vive aquí: un payload que
 * no valida se rechaza y la llamada registra el descarte.
 * =================================================================
 */

use crate::errors::ValidationError;
use crate::parser::BIODATA_FIELD_ORDER;
use fleetsync_domain_models::{
    BiometricKind, BiometricTemplate, CommandCategory, ComparisonPhoto, IdCardRecord,
    ShortMessage, User, UserMessageLink, UserPhoto, WorkCode,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Object-kinds cuyo parámetro exige tab-separación estricta en el cable.
const REQUIRES_TABS: [&str; 11] = [
    "USERINFO", "BIODATA", "FVEIN", "USERPIC", "BIOPHOTO", "WORKCODE", "SMS", "USER_SMS",
    "IDCARD", "FINGERTMP", "FACE",
];

/// Verbos de datos cuyo primer token posterior es el object-kind.
const DATA_VERB_PREFIXES: [&str; 3] = ["DATA UPDATE ", "DATA DELETE ", "DATA QUERY "];

static COLLAPSED_SEPARATOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([A-Za-z_]+=)").expect("static separator pattern"));

static TEMPLATE_BLOB_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").expect("static template pattern"));

static BIODATA_NAMED_FIELD: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    BIODATA_FIELD_ORDER
        .iter()
        .map(|field_name| {
            let pattern = format!(r"(?:^|\s){}=([^\s\t]+)", field_name);
            (*field_name, Regex::new(&pattern).expect("static biodata field pattern"))
        })
        .collect()
});

static BIODATA_TMP_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)Tmp=(.*)$").expect("static tmp pattern"));

/// Reescribe toda corrida de espacios/tabs que precede a un `clave=` como
/// un único tabulador. Es el pase genérico para object-kinds tab-estrictos
/// cuyos separadores colapsaron en tránsito.
pub fn repair_tab_separation(parameter_string: &str) -> String {
    COLLAPSED_SEPARATOR_PATTERN
        .replace_all(parameter_string, "\t$1")
        .into_owned()
}

/// Re-emisión canónica de parámetros BIODATA: extracción nominal en el
/// orden `Pin, No, Index, Valid, Duress, Type, MajorVer, MinorVer, Format,
/// Tmp` y re-unión con exactamente un tab entre campos presentes (9 tabs
/// cuando están los diez).
fn canonical_biodata_parameters(parameter_string: &str) -> Option<String> {
    let mut canonical_fields: Vec<String> = Vec::with_capacity(10);

    for (field_name, pattern) in BIODATA_NAMED_FIELD.iter() {
        if let Some(captures) = pattern.captures(parameter_string) {
            canonical_fields.push(format!("{}={}", field_name, &captures[1]));
        }
    }
    if let Some(captures) = BIODATA_TMP_FIELD.captures(parameter_string) {
        canonical_fields.push(format!("Tmp={}", &captures[1]));
    }

    if canonical_fields.len() < 2 {
        return None;
    }
    Some(canonical_fields.join("\t"))
}

/// Pase de reparación previo a la emisión/encolado de un comando. Para
/// `DATA UPDATE BIODATA` aplica la re-emisión canónica; para el resto de
/// object-kinds tab-estrictos, el pase genérico de tabs; cualquier otro
/// payload se devuelve intacto.
pub fn normalize_command_payload(command_payload: &str) -> String {
    for verb_prefix in DATA_VERB_PREFIXES {
        let Some(after_verb) = command_payload.strip_prefix(verb_prefix) else {
            continue;
        };
        let (object_kind, parameter_string) = match after_verb.split_once(' ') {
            Some((object_kind, rest)) => (object_kind, rest),
            None => (after_verb, ""),
        };
        if parameter_string.is_empty() || !REQUIRES_TABS.contains(&object_kind) {
            return command_payload.to_string();
        }

        let repaired_parameters = if object_kind == "BIODATA" && verb_prefix == "DATA UPDATE " {
            canonical_biodata_parameters(parameter_string)
                .unwrap_or_else(|| repair_tab_separation(parameter_string))
        } else {
            repair_tab_separation(parameter_string)
        };

        if repaired_parameters != parameter_string {
            debug!(
                "[FORMATTER]: Collapsed separators repaired for {} payload.",
                object_kind
            );
        }
        return format!("{}{} {}", verb_prefix, object_kind, repaired_parameters);
    }
    command_payload.to_string()
}

/// Validación de una plantilla canónica previa al encolado.
///
/// Reglas: PIN no vacío; blob no vacío y dentro de la clase imprimible
/// base64; índice no negativo; slot 0..9 para huella y exactamente 0 para
/// rostro.
pub fn validate_biometric(template: &BiometricTemplate) -> Result<(), ValidationError> {
    if template.pin.trim().is_empty() {
        return Err(ValidationError::EmptyPin);
    }
    if template.template_blob.is_empty() {
        return Err(ValidationError::EmptyTemplate);
    }
    if !TEMPLATE_BLOB_PATTERN.is_match(&template.template_blob) {
        return Err(ValidationError::MalformedTemplate);
    }
    if template.template_index < 0 {
        return Err(ValidationError::NegativeIndex(template.template_index));
    }
    match template.kind {
        BiometricKind::Fingerprint if !(0..=9).contains(&template.slot_number) => {
            Err(ValidationError::SlotOutOfRange {
                kind: "fingerprint",
                slot: template.slot_number,
            })
        }
        BiometricKind::Face if template.slot_number != 0 => Err(ValidationError::SlotOutOfRange {
            kind: "face",
            slot: template.slot_number,
        }),
        _ if template.slot_number < 0 => Err(ValidationError::SlotOutOfRange {
            kind: "biometric",
            slot: template.slot_number,
        }),
        _ => Ok(()),
    }
}

/// Comando de alto nivel listo para encolar: categoría + payload en el
/// dialecto exacto del cable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCommand {
    pub category: CommandCategory,
    pub payload: String,
}

/// Tipos de purga remota soportados por el verbo `CLEAR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearKind {
    Data,
    Log,
    Photo,
}

impl ClearKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Log => "LOG",
            Self::Photo => "PHOTO",
        }
    }
}

/// Constructor de payloads del dialecto de salida. Sin estado; cada método
/// produce los bytes exactos que espera el firmware.
pub struct CommandFormatter;

impl CommandFormatter {
    /// `DATA UPDATE USERINFO ...` con el conjunto completo de campos.
    pub fn user_update(user: &User) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!(
                "DATA UPDATE USERINFO PIN={}\tName={}\tPri={}\tPasswd={}\tCard={}\tGrp={}\tTZ={}\tVerify={}\tViceCard={}",
                user.pin,
                user.name,
                user.privilege,
                user.password,
                user.card,
                user.group,
                user.time_zone,
                user.verify_mode,
                user.vice_card
            ),
        }
    }

    /// `DATA DELETE USERINFO PIN=<pin>`; el firmware cascadea sus plantillas.
    pub fn user_delete(pin: &str) -> Result<OutboundCommand, ValidationError> {
        if pin.trim().is_empty() {
            return Err(ValidationError::EmptyPin);
        }
        Ok(OutboundCommand {
            category: CommandCategory::Data,
            payload: format!("DATA DELETE USERINFO PIN={}", pin),
        })
    }

    /// Alta/actualización biométrica unificada: siempre `DATA UPDATE
    /// BIODATA` con el orden canónico de diez campos (9 tabs).
    pub fn biometric_update(
        template: &BiometricTemplate,
    ) -> Result<OutboundCommand, ValidationError> {
        validate_biometric(template)?;
        Ok(OutboundCommand {
            category: CommandCategory::Data,
            payload: format!(
                "DATA UPDATE BIODATA Pin={}\tNo={}\tIndex={}\tValid={}\tDuress={}\tType={}\tMajorVer={}\tMinorVer={}\tFormat={}\tTmp={}",
                template.pin,
                template.slot_number,
                template.template_index,
                template.valid,
                template.duress,
                template.kind.code(),
                template.major_version,
                template.minor_version,
                template.format_tag,
                template.template_blob
            ),
        })
    }

    /// `DATA DELETE BIODATA Pin=<pin>[\tType=<t>[\tNo=<n>]]`.
    pub fn biometric_delete(
        pin: &str,
        kind: Option<BiometricKind>,
        slot_number: Option<i64>,
    ) -> Result<OutboundCommand, ValidationError> {
        if pin.trim().is_empty() {
            return Err(ValidationError::EmptyPin);
        }
        let mut payload = format!("DATA DELETE BIODATA Pin={}", pin);
        if let Some(kind) = kind {
            payload.push_str(&format!("\tType={}", kind.code()));
            if let Some(slot_number) = slot_number {
                payload.push_str(&format!("\tNo={}", slot_number));
            }
        }
        Ok(OutboundCommand {
            category: CommandCategory::Data,
            payload,
        })
    }

    /// `DATA QUERY BIODATA Type=<t>[\tPIN=<p>[\tNo=<n>]]`. La clave del PIN
    /// va en mayúsculas en esta consulta; así lo espera el firmware objetivo.
    pub fn biometric_query(
        kind: BiometricKind,
        pin: Option<&str>,
        slot_number: Option<i64>,
    ) -> OutboundCommand {
        let mut payload = format!("DATA QUERY BIODATA Type={}", kind.code());
        if let Some(pin) = pin.filter(|pin| !pin.trim().is_empty()) {
            payload.push_str(&format!("\tPIN={}", pin));
            if let Some(slot_number) = slot_number {
                payload.push_str(&format!("\tNo={}", slot_number));
            }
        }
        OutboundCommand {
            category: CommandCategory::Data,
            payload,
        }
    }

    pub fn work_code_update(work_code: &WorkCode) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!(
                "DATA UPDATE WORKCODE PIN={}\tCODE={}\tNAME={}",
                work_code.pin, work_code.code, work_code.name
            ),
        }
    }

    pub fn work_code_delete(pin: &str, code: &str) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!("DATA DELETE WORKCODE PIN={}\tCODE={}", pin, code),
        }
    }

    pub fn message_update(message: &ShortMessage) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!(
                "DATA UPDATE SMS MSG={}\tTAG={}\tUID={}\tMIN={}\tStartTime={}",
                message.content, message.tag, message.uid, message.duration_minutes,
                message.start_time
            ),
        }
    }

    pub fn message_delete(uid: &str) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!("DATA DELETE SMS UID={}", uid),
        }
    }

    pub fn user_message_update(link: &UserMessageLink) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!("DATA UPDATE USER_SMS PIN={}\tUID={}", link.pin, link.uid),
        }
    }

    pub fn id_card_update(card: &IdCardRecord) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!(
                "DATA UPDATE IDCARD PIN={}\tSNNum={}\tIDNum={}\tDN={}\tName={}\tGender={}\tNation={}\tBirthday={}\tValidInfo={}\tAddress={}\tAdditionalInfo={}\tIssuer={}\tPhoto={}\tFPTemplate1={}\tFPTemplate2={}\tReserve={}\tNotice={}",
                card.pin,
                card.sn_number,
                card.id_number,
                card.dn,
                card.name,
                card.gender,
                card.nation,
                card.birthday,
                card.valid_info,
                card.address,
                card.additional_info,
                card.issuer,
                card.photo,
                card.fingerprint_template_1,
                card.fingerprint_template_2,
                card.reserve,
                card.notice
            ),
        }
    }

    /// Foto de usuario. El despacho está detrás del interruptor de
    /// propagación de fotos; el payload existe siempre.
    pub fn user_photo_update(photo: &UserPhoto) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!(
                "DATA UPDATE USERPIC PIN={}\tFileName={}\tSize={}\tContent={}",
                photo.pin, photo.file_name, photo.declared_size, photo.content
            ),
        }
    }

    pub fn user_photo_delete(pin: &str) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!("DATA DELETE USERPIC PIN={}", pin),
        }
    }

    pub fn comparison_photo_update(photo: &ComparisonPhoto) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Data,
            payload: format!(
                "DATA UPDATE BIOPHOTO PIN={}\tType={}\tFileName={}\tSize={}\tContent={}",
                photo.pin, photo.kind_code, photo.file_name, photo.declared_size, photo.content
            ),
        }
    }

    pub fn set_option(option_key: &str, option_value: &str) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Config,
            payload: format!("SET OPTION {}={}", option_key, option_value),
        }
    }

    pub fn reload_options() -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Config,
            payload: "RELOAD OPTIONS".to_string(),
        }
    }

    pub fn reboot() -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Control,
            payload: "REBOOT".to_string(),
        }
    }

    pub fn clear(kind: ClearKind) -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Clear,
            payload: format!("CLEAR {}", kind.as_str()),
        }
    }

    pub fn unlock() -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Control,
            payload: "AC_UNLOCK".to_string(),
        }
    }

    pub fn unalarm() -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Control,
            payload: "AC_UNALARM".to_string(),
        }
    }

    pub fn info_query() -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Info,
            payload: "INFO".to_string(),
        }
    }

    pub fn check() -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Check,
            payload: "CHECK".to_string(),
        }
    }

    pub fn log_query() -> OutboundCommand {
        OutboundCommand {
            category: CommandCategory::Log,
            payload: "LOG".to_string(),
        }
    }

    /// Enrolamiento remoto multi-biométrico.
    pub fn enroll_biometric(
        pin: &str,
        kind: BiometricKind,
        retry_budget: u8,
    ) -> Result<OutboundCommand, ValidationError> {
        if pin.trim().is_empty() {
            return Err(ValidationError::EmptyPin);
        }
        Ok(OutboundCommand {
            category: CommandCategory::Enroll,
            payload: format!(
                "ENROLL_BIO TYPE={}\tPIN={}\tRETRY={}\tOVERWRITE=1",
                kind.code(),
                pin,
                retry_budget
            ),
        })
    }

    /// Payload arbitrario del operador: se clasifica y se pasa por el pase
    /// de reparación de tabs antes de almacenarse.
    pub fn raw(category: CommandCategory, payload: &str) -> OutboundCommand {
        OutboundCommand {
            category,
            payload: normalize_command_payload(payload),
        }
    }
}
