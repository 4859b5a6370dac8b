// [libs/core/protocol/src/emit.rs]
/*!
 * =================================================================
 * APARATO: COMMAND DIALECT EMITTER
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: EMISIÓN BIT-PERFECTA DE LÍNEAS DE COMANDO Y OPCIONES
 * =================================================================
 */

use crate::PUSH_PROTOCOL_VERSION;
use fleetsync_domain_models::{BiometricTemplate, Device, User};

/// Bandera de transmisión anunciada al terminal en el init.
pub const TRANS_FLAG: &str =
    "TransData EnrollUser ChgUser EnrollFP ChgFP FACE UserPic BioPhoto WORKCODE FVEIN";

/// Capacidades push anunciadas al terminal en el init.
pub const PUSH_OPTIONS: &str =
    "FingerFunOn,FaceFunOn,MultiBioDataSupport,MultiBioPhotoSupport,BioPhotoFun,BioDataFun,VisilightFun";

/// Línea de comando en el cuerpo de respuesta del poll:
/// `C:<cmdid>:<payload>` donde el payload ya viene en dialecto de salida.
pub fn render_command_line(command_identifier: &str, payload: &str) -> String {
    format!("C:{}:{}", command_identifier, payload)
}

fn stamp_or_none(stamp_value: &Option<String>) -> &str {
    stamp_value
        .as_deref()
        .filter(|value| !value.is_empty())
        .unwrap_or("None")
}

/// Bloque de opciones del init: 22 líneas `CLAVE=VALOR` terminadas en LF,
/// encabezadas por `GET OPTION FROM: <serial>`. Los cursores confirmados se
/// emiten por familia; `None` cuando el servidor aún no confirmó ninguno.
pub fn render_init_options_block(device: &Device, timezone_offset: i64) -> String {
    let mut options_block = String::with_capacity(640);

    options_block.push_str(&format!("GET OPTION FROM: {}\n", device.serial_number));
    options_block.push_str("ATTLOGStamp=None\n");
    options_block.push_str(&format!(
        "OPERLOGStamp={}\n",
        stamp_or_none(&device.stamps.operlog)
    ));
    options_block.push_str("ATTPHOTOStamp=None\n");
    options_block.push_str(&format!(
        "BIODATAStamp={}\n",
        stamp_or_none(&device.stamps.biodata)
    ));
    options_block.push_str(&format!(
        "IDCARDStamp={}\n",
        stamp_or_none(&device.stamps.idcard)
    ));
    options_block.push_str(&format!(
        "ERRORLOGStamp={}\n",
        stamp_or_none(&device.stamps.errorlog)
    ));
    options_block.push_str("ErrorDelay=30\n");
    options_block.push_str("Delay=10\n");
    options_block.push_str("TransTimes=00:00;12:00\n");
    options_block.push_str("TransInterval=1\n");
    options_block.push_str(&format!("TransFlag={}\n", TRANS_FLAG));
    options_block.push_str(&format!("TimeZone={}\n", timezone_offset));
    options_block.push_str("Realtime=1\n");
    options_block.push_str("Encrypt=None\n");
    options_block.push_str(&format!("ServerVer={}\n", PUSH_PROTOCOL_VERSION));
    options_block.push_str(&format!("PushProtVer={}\n", PUSH_PROTOCOL_VERSION));
    options_block.push_str("PushOptionsFlag=1\n");
    options_block.push_str(&format!("PushOptions={}\n", PUSH_OPTIONS));
    options_block.push_str(&format!(
        "MultiBioDataSupport={}\n",
        device.multi_bio_data_mask()
    ));
    options_block.push_str(&format!(
        "MultiBioPhotoSupport={}\n",
        device.multi_bio_photo_mask()
    ));
    options_block.push_str("ATTPHOTOBase64=1\n");

    options_block
}

/// Re-emite un usuario en el dialecto de subida (consulta `RemoteAtt`).
pub fn render_user_upload_line(user: &User) -> String {
    format!(
        "USER PIN={}\tName={}\tPri={}\tPasswd={}\tCard={}\tGrp={}\tTZ={}\tVerify={}\tViceCard={}",
        user.pin,
        user.name,
        user.privilege,
        user.password,
        user.card,
        user.group,
        user.time_zone,
        user.verify_mode,
        user.vice_card
    )
}

/// Re-emite una plantilla canónica en el dialecto de subida BIODATA
/// (forma tab-separada, orden canónico de diez campos).
pub fn render_biodata_upload_line(template: &BiometricTemplate) -> String {
    format!(
        "BIODATA Pin={}\tNo={}\tIndex={}\tValid={}\tDuress={}\tType={}\tMajorVer={}\tMinorVer={}\tFormat={}\tTmp={}",
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
    )
}
