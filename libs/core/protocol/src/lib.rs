// [libs/core/protocol/src/lib.rs]
/*!
 * =================================================================
 * APARATO: FLEETSYNC WIRE CODEC
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: GRAMÁTICA DEL PROTOCOLO PUSH, SIN I/O
 *
 * El protocolo tiene dos formas de registro en subida (tab-separada y
 * separada por espacios para BIODATA) y un único dialecto estricto
 * tab-separado en bajada. Este estrato parsea la primera, emite el
 * segundo y repara tabuladores colapsados entre medio.
 * =================================================================
 */

pub mod emit;
pub mod errors;
pub mod formatter;
pub mod parser;
pub mod records;

pub use emit::{render_biodata_upload_line, render_command_line, render_init_options_block, render_user_upload_line};
pub use errors::{ValidationError, WireError};
pub use formatter::{normalize_command_payload, repair_tab_separation, validate_biometric, CommandFormatter, OutboundCommand};
pub use parser::{parse_device_info_report, parse_options_list, parse_reply_body, parse_upload_body, CommandReply, DeviceInfoReport};
pub use records::UploadRecord;

/// Versión del protocolo push que este servidor habla y anuncia en el
/// bloque de opciones del init (`ServerVer` / `PushProtVer`).
pub const PUSH_PROTOCOL_VERSION: &str = "2.4.1";

/// Nombre de producto anunciado en la cabecera `Server`.
pub const PRODUCT_NAME: &str = "FleetSync";

/// Descripción corta de un código de retorno de terminal, solo para el
/// rastro de diagnóstico.
pub fn describe_return_code(return_code: i64) -> &'static str {
    match return_code {
        0 => "success",
        -1 => "parameter incorrect",
        -2 => "photo size mismatch",
        -3 => "read/write error",
        -9 => "template size mismatch",
        -10 => "pin not present",
        -11 => "template format illegal",
        -12 => "template illegal",
        -1001 => "capacity limit",
        -1002 => "not supported",
        -1003 => "command timeout",
        -1004 => "data configuration error",
        -1005 => "device busy",
        -1006 => "data length error",
        -1007 => "memory error",
        -1008 => "upstream failure",
        _ => "unknown return code",
    }
}
