// [libs/core/protocol/src/parser.rs]
/*!
 * =================================================================
 * APARATO: UPLOAD DIALECT PARSER
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: PARSEO DE REGISTROS SUBIDOS, RESPUESTAS Y REPORTES
 *
 * Forma tab-separada para todos los tags; BIODATA admite además la forma
 * separada por espacios porque ciertos firmwares pierden los tabuladores
 * en tránsito. El framing acepta LF y CRLF; las líneas vacías se ignoran.
 * =================================================================
 */

use crate::errors::WireError;
use crate::records::{
    BioPhotoRecord, BiodataRecord, ErrorLogRecord, FaceRecord, FingerVeinRecord,
    FingerprintRecord, SmsRecord, UploadRecord, UserPhotoRecord, UserRecord, UserSmsRecord,
    WorkCodeRecord,
};
use fleetsync_domain_models::IdCardRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Orden canónico de extracción nominal para BIODATA (sin `Tmp`, que se
/// captura aparte con regla voraz hasta fin de línea).
pub(crate) const BIODATA_FIELD_ORDER: [&str; 9] = [
    "Pin", "No", "Index", "Valid", "Duress", "Type", "MajorVer", "MinorVer", "Format",
];

static BIODATA_FIELD_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    BIODATA_FIELD_ORDER
        .iter()
        .map(|field_name| {
            let pattern = format!(r"(?:^|\s){}=([^\s\t]+)", field_name);
            (*field_name, Regex::new(&pattern).expect("static biodata field pattern"))
        })
        .collect()
});

static BIODATA_TMP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)Tmp=(.*)$").expect("static biodata tmp pattern"));

/// Divide una cadena de parámetros tab-separada en un mapa clave -> valor.
/// Los campos sin `=` se descartan; valores ausentes quedan como cadena vacía.
fn split_tab_fields(parameter_string: &str) -> BTreeMap<String, String> {
    let mut field_map = BTreeMap::new();
    for raw_field in parameter_string.split('\t') {
        if let Some((key, value)) = raw_field.split_once('=') {
            field_map.insert(key.to_string(), value.to_string());
        }
    }
    field_map
}

/// Extracción nominal por expresión regular para la forma BIODATA separada
/// por espacios (mezcla de espacios simples, múltiples y tabuladores).
fn extract_biodata_named_fields(parameter_string: &str) -> BTreeMap<String, String> {
    let mut field_map = BTreeMap::new();
    for (field_name, pattern) in BIODATA_FIELD_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(parameter_string) {
            field_map.insert(field_name.to_string(), captures[1].to_string());
        }
    }
    field_map
}

fn field(field_map: &BTreeMap<String, String>, key: &str) -> String {
    field_map.get(key).cloned().unwrap_or_default()
}

fn require_field(
    field_map: &BTreeMap<String, String>,
    tag: &'static str,
    key: &'static str,
) -> Result<String, WireError> {
    let value = field(field_map, key);
    if value.trim().is_empty() {
        return Err(WireError::MissingField { tag, field: key });
    }
    Ok(value)
}

/// Parsea el cuerpo BIODATA: intento tab-separado primero y, si recupera
/// menos de 3 claves, extracción nominal por espacios. `Tmp` se captura
/// siempre con regla voraz hasta el final de la línea.
fn parse_biodata_parameters(parameter_string: &str) -> BTreeMap<String, String> {
    let mut field_map = split_tab_fields(parameter_string);
    if field_map.len() < 3 {
        field_map = extract_biodata_named_fields(parameter_string);
    }
    if let Some(captures) = BIODATA_TMP_PATTERN.captures(parameter_string) {
        field_map.insert("Tmp".to_string(), captures[1].to_string());
    }
    field_map
}

/// Parsea una línea de registro subido (`<TAG> <parámetros>`).
pub fn parse_record(record_line: &str) -> Result<UploadRecord, WireError> {
    let trimmed_line = record_line.trim_end_matches(['\r', '\n']);
    let (tag, parameter_string) = match trimmed_line.split_once(' ') {
        Some((tag, rest)) => (tag, rest),
        None => (trimmed_line, ""),
    };

    match tag {
        "USER" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::User(UserRecord {
                pin: require_field(&fields, "USER", "PIN")?,
                name: field(&fields, "Name"),
                privilege: field(&fields, "Pri"),
                password: field(&fields, "Passwd"),
                card: field(&fields, "Card"),
                group: field(&fields, "Grp"),
                time_zone: field(&fields, "TZ"),
                verify_mode: field(&fields, "Verify"),
                vice_card: field(&fields, "ViceCard"),
            }))
        }
        "FP" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::Fingerprint(FingerprintRecord {
                pin: require_field(&fields, "FP", "PIN")?,
                finger_id: field(&fields, "FID"),
                size: field(&fields, "Size"),
                valid: field(&fields, "Valid"),
                template: field(&fields, "TMP"),
            }))
        }
        "FACE" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::Face(FaceRecord {
                pin: require_field(&fields, "FACE", "PIN")?,
                face_id: field(&fields, "FID"),
                size: field(&fields, "SIZE"),
                valid: field(&fields, "VALID"),
                template: field(&fields, "TMP"),
            }))
        }
        "FVEIN" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::FingerVein(FingerVeinRecord {
                pin: require_field(&fields, "FVEIN", "Pin")?,
                finger_id: field(&fields, "FID"),
                index: field(&fields, "Index"),
                size: field(&fields, "Size"),
                valid: field(&fields, "Valid"),
                template: field(&fields, "Tmp"),
            }))
        }
        "BIODATA" => {
            let fields = parse_biodata_parameters(parameter_string);
            Ok(UploadRecord::Biometric(BiodataRecord {
                pin: require_field(&fields, "BIODATA", "Pin")?,
                number: field(&fields, "No"),
                index: field(&fields, "Index"),
                valid: field(&fields, "Valid"),
                duress: field(&fields, "Duress"),
                bio_type: field(&fields, "Type"),
                major_version: field(&fields, "MajorVer"),
                minor_version: field(&fields, "MinorVer"),
                format: field(&fields, "Format"),
                template: field(&fields, "Tmp"),
            }))
        }
        "USERPIC" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::UserPhoto(UserPhotoRecord {
                pin: require_field(&fields, "USERPIC", "PIN")?,
                file_name: field(&fields, "FileName"),
                size: field(&fields, "Size"),
                content: field(&fields, "Content"),
            }))
        }
        "BIOPHOTO" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::ComparisonPhoto(BioPhotoRecord {
                pin: require_field(&fields, "BIOPHOTO", "PIN")?,
                bio_type: field(&fields, "Type"),
                file_name: field(&fields, "FileName"),
                size: field(&fields, "Size"),
                content: field(&fields, "Content"),
            }))
        }
        "WORKCODE" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::WorkCode(WorkCodeRecord {
                pin: field(&fields, "PIN"),
                code: require_field(&fields, "WORKCODE", "CODE")?,
                name: field(&fields, "NAME"),
            }))
        }
        "SMS" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::ShortMessage(SmsRecord {
                uid: require_field(&fields, "SMS", "UID")?,
                message: field(&fields, "MSG"),
                tag: field(&fields, "TAG"),
                duration_minutes: field(&fields, "MIN"),
                start_time: field(&fields, "StartTime"),
            }))
        }
        "USER_SMS" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::UserMessage(UserSmsRecord {
                pin: require_field(&fields, "USER_SMS", "PIN")?,
                uid: require_field(&fields, "USER_SMS", "UID")?,
            }))
        }
        "IDCARD" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::IdCard(IdCardRecord {
                pin: field(&fields, "PIN"),
                sn_number: field(&fields, "SNNum"),
                id_number: require_field(&fields, "IDCARD", "IDNum")?,
                dn: field(&fields, "DN"),
                name: field(&fields, "Name"),
                gender: field(&fields, "Gender"),
                nation: field(&fields, "Nation"),
                birthday: field(&fields, "Birthday"),
                valid_info: field(&fields, "ValidInfo"),
                address: field(&fields, "Address"),
                additional_info: field(&fields, "AdditionalInfo"),
                issuer: field(&fields, "Issuer"),
                photo: field(&fields, "Photo"),
                fingerprint_template_1: field(&fields, "FPTemplate1"),
                fingerprint_template_2: field(&fields, "FPTemplate2"),
                reserve: field(&fields, "Reserve"),
                notice: field(&fields, "Notice"),
            }))
        }
        "ERRORLOG" => {
            let fields = split_tab_fields(parameter_string);
            Ok(UploadRecord::ErrorLog(ErrorLogRecord {
                error_code: field(&fields, "ErrCode"),
                error_message: field(&fields, "ErrMsg"),
                data_origin: field(&fields, "DataOrigin"),
                command_id: field(&fields, "CmdId"),
                additional: field(&fields, "Additional"),
            }))
        }
        unknown_tag => Err(WireError::UnknownTag(unknown_tag.to_string())),
    }
}

/// Parsea un cuerpo de subida multi-registro. Devuelve un resultado por
/// línea no vacía; la llamada decide cómo contabilizar los fallos.
pub fn parse_upload_body(upload_body: &str) -> Vec<Result<UploadRecord, WireError>> {
    upload_body
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(parse_record)
        .collect()
}

/// Respuesta de comando reportada por el terminal en `devicecmd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    /// Identificador del comando al que responde (`ID=`).
    pub command_identifier: String,
    /// Código de retorno crudo (`Return=`); `"0"` es éxito.
    pub return_value: String,
    /// Tag de verbo reportado (`CMD=`).
    pub verb_tag: String,
    /// Línea íntegra tal como llegó, preservada como resultado.
    pub raw_line: String,
}

impl CommandReply {
    pub fn is_success(&self) -> bool {
        self.return_value == "0"
    }

    /// Código numérico del retorno, cuando el terminal envía un entero.
    pub fn return_code_numeric(&self) -> Option<i64> {
        self.return_value.trim().parse().ok()
    }
}

fn parse_reply_line(reply_line: &str) -> Result<CommandReply, WireError> {
    let mut command_identifier = String::new();
    let mut return_value = String::new();
    let mut verb_tag = String::new();

    for raw_pair in reply_line.split('&') {
        if let Some((key, value)) = raw_pair.split_once('=') {
            match key.trim() {
                "ID" => command_identifier = value.trim().to_string(),
                "Return" => return_value = value.trim().to_string(),
                "CMD" => verb_tag = value.trim().to_string(),
                _ => {}
            }
        }
    }

    if command_identifier.is_empty() {
        return Err(WireError::ReplyWithoutId);
    }

    Ok(CommandReply {
        command_identifier,
        return_value,
        verb_tag,
        raw_line: reply_line.to_string(),
    })
}

/// Parsea un cuerpo de respuestas (una o más líneas `ID=..&Return=..&CMD=..`).
pub fn parse_reply_body(reply_body: &str) -> Vec<Result<CommandReply, WireError>> {
    reply_body
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(parse_reply_line)
        .collect()
}

/// Reporte `INFO=` entregado en el poll: CSV posicional con los campos
/// firmware, usuarios, huellas, marcaciones, ip, algoritmo de huella,
/// algoritmo facial y rostros; los campos finales pueden faltar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfoReport {
    pub firmware_version: Option<String>,
    pub user_count: Option<String>,
    pub fingerprint_count: Option<String>,
    pub attendance_count: Option<String>,
    pub ip_address: Option<String>,
    pub fingerprint_algorithm: Option<String>,
    pub face_algorithm: Option<String>,
    pub face_count: Option<String>,
}

pub fn parse_device_info_report(info_csv: &str) -> DeviceInfoReport {
    let mut positional_fields = info_csv.split(',').map(|field| {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    });

    DeviceInfoReport {
        firmware_version: positional_fields.next().flatten(),
        user_count: positional_fields.next().flatten(),
        fingerprint_count: positional_fields.next().flatten(),
        attendance_count: positional_fields.next().flatten(),
        ip_address: positional_fields.next().flatten(),
        fingerprint_algorithm: positional_fields.next().flatten(),
        face_algorithm: positional_fields.next().flatten(),
        face_count: positional_fields.next().flatten(),
    }
}

/// Parsea una lista de opciones `clave=valor` separada por comas o saltos
/// de línea (forma del init `options=` y del POST `table=options`).
pub fn parse_options_list(raw_options: &str) -> BTreeMap<String, String> {
    let mut options_map = BTreeMap::new();
    for raw_pair in raw_options.split([',', '\n', '\r']) {
        if let Some((key, value)) = raw_pair.split_once('=') {
            let trimmed_key = key.trim();
            if !trimmed_key.is_empty() {
                options_map.insert(trimmed_key.to_string(), value.trim().to_string());
            }
        }
    }
    options_map
}
