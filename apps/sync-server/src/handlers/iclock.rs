// [apps/sync-server/src/handlers/iclock.rs]
/*!
 * =================================================================
 * APARATO: PUSH PROTOCOL HANDLER
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: LOS CINCO RECURSOS HTTP DEL PROTOCOLO DE TERMINAL
 *
 * init (GET cdata), subida (POST cdata), poll (getrequest), respuesta
 * (devicecmd) y latido (ping). Todo endpoint adelanta el último
 * contacto del terminal como efecto lateral; ningún fallo interno se
 * filtra con texto de excepción hacia el firmware.
 * =================================================================
 */

use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fleetsync_core_protocol::{
    describe_return_code,
    emit::{render_biodata_upload_line, render_command_line, render_init_options_block,
           render_user_upload_line},
    parser::{parse_device_info_report, parse_options_list, parse_reply_body},
};
use fleetsync_domain_models::StampFamily;
use std::collections::{BTreeMap, HashMap};
use tracing::{error, info, instrument, warn};

/// Tablas de subida que el ingestor procesa registro a registro.
const INGESTED_TABLES: [&str; 4] = ["OPERLOG", "BIODATA", "IDCARD", "ERRORLOG"];

fn missing_serial() -> Response {
    (StatusCode::BAD_REQUEST, "SN parameter required").into_response()
}

fn internal_fault(fault: impl std::fmt::Display) -> Response {
    // El texto interno queda en el log estructurado, nunca en el cable.
    error!("💥 [ICLOCK]: Store interaction failed: {}", fault);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

pub struct PushProtocolHandler;

impl PushProtocolHandler {
    /// Endpoint: GET /iclock/cdata — intercambio de init.
    ///
    /// Caso especial `table=RemoteAtt`: re-emite usuario y biometría de un
    /// PIN en el dialecto de subida, u `OK` si no existe. En el resto,
    /// registra/actualiza el terminal y responde el bloque de opciones.
    #[instrument(skip(application_state, query_params))]
    pub async fn handle_init(
        State(application_state): State<AppState>,
        Query(query_params): Query<HashMap<String, String>>,
    ) -> Response {
        let Some(serial_number) = query_params.get("SN").filter(|sn| !sn.trim().is_empty())
        else {
            return missing_serial();
        };

        if query_params.get("table").map(String::as_str) == Some("RemoteAtt") {
            return Self::handle_remote_query(&application_state, serial_number, &query_params)
                .await;
        }

        let push_version = query_params.get("pushver").map(String::as_str);
        let language = query_params.get("language").map(String::as_str);
        let comm_key = query_params
            .get("COMMKey")
            .or_else(|| query_params.get("pushcommkey"))
            .map(String::as_str);

        // `options=all` pide el bloque completo; algunos firmwares mandan
        // en su lugar la lista de capacidades `clave=valor,...`.
        let capability_options: BTreeMap<String, String> = query_params
            .get("options")
            .map(|raw_options| parse_options_list(raw_options))
            .unwrap_or_default();

        let device = match application_state
            .device_registry
            .register_or_update(
                serial_number,
                push_version,
                language,
                comm_key,
                &capability_options,
            )
            .await
        {
            Ok(device) => device,
            Err(fault) => return internal_fault(fault),
        };

        info!("🤝 [ICLOCK]: Init exchange completed for [{}].", serial_number);
        render_init_options_block(&device, application_state.config.device_timezone_offset)
            .into_response()
    }

    /// Consulta remota de un PIN (`table=RemoteAtt`).
    async fn handle_remote_query(
        application_state: &AppState,
        serial_number: &str,
        query_params: &HashMap<String, String>,
    ) -> Response {
        if let Err(fault) = application_state
            .device_registry
            .touch_last_seen(serial_number)
            .await
        {
            return internal_fault(fault);
        }

        let Some(pin) = query_params.get("PIN").filter(|pin| !pin.trim().is_empty()) else {
            return "OK".into_response();
        };

        let user = match application_state.user_repository.find(pin).await {
            Ok(Some(user)) => user,
            Ok(None) => return "OK".into_response(),
            Err(fault) => return internal_fault(fault),
        };
        let templates = match application_state.biometric_repository.list_for_pin(pin).await {
            Ok(templates) => templates,
            Err(fault) => return internal_fault(fault),
        };

        let mut upload_dialect_lines = vec![render_user_upload_line(&user)];
        upload_dialect_lines.extend(templates.iter().map(render_biodata_upload_line));
        upload_dialect_lines.join("\n").into_response()
    }

    /// Endpoint: POST /iclock/cdata — subida de datos.
    ///
    /// `OK: <n>` con el conteo de aceptados; `OK` plano para el sabor
    /// `PostVerifyData`; 400 ante serial ausente o tabla desconocida.
    #[instrument(skip(application_state, query_params, upload_body))]
    pub async fn handle_upload(
        State(application_state): State<AppState>,
        Query(query_params): Query<HashMap<String, String>>,
        upload_body: String,
    ) -> Response {
        let Some(serial_number) = query_params.get("SN").filter(|sn| !sn.trim().is_empty())
        else {
            return missing_serial();
        };

        if let Err(fault) = application_state
            .device_registry
            .touch_last_seen(serial_number)
            .await
        {
            return internal_fault(fault);
        }

        // Sabor PostVerifyData: material de verificación, acuse plano.
        if query_params.get("type").map(String::as_str) == Some("PostVerifyData") {
            info!("🧾 [ICLOCK]: PostVerifyData flavour acknowledged for [{}].", serial_number);
            return "OK".into_response();
        }

        let Some(table_name) = query_params.get("table").filter(|t| !t.trim().is_empty())
        else {
            return (StatusCode::BAD_REQUEST, "table parameter required").into_response();
        };

        // El cursor confirmado avanza por familia de tabla.
        if let (Some(stamp_family), Some(stamp_value)) = (
            StampFamily::for_upload_table(table_name),
            query_params.get("Stamp"),
        ) {
            if let Err(fault) = application_state
                .device_registry
                .advance_stamp(serial_number, stamp_family, stamp_value)
                .await
            {
                return internal_fault(fault);
            }
        }

        match table_name.as_str() {
            table if INGESTED_TABLES.contains(&table) => {
                match application_state
                    .ingest_pipeline
                    .process_upload(serial_number, &upload_body)
                    .await
                {
                    // Línea ininterpretable: 400 tras la ingesta parcial;
                    // el terminal re-sube el lote desde su cursor.
                    Ok(outcome) if outcome.malformed > 0 => {
                        (StatusCode::BAD_REQUEST, "malformed record").into_response()
                    }
                    Ok(outcome) => format!("OK: {}", outcome.accepted).into_response(),
                    Err(fault) => internal_fault(fault),
                }
            }
            // Las marcaciones no se procesan; se acusan para que el
            // terminal avance su cursor.
            "ATTLOG" => {
                let discarded_lines = upload_body
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .count();
                info!(
                    "🕳️ [ICLOCK]: {} attendance rows acknowledged and discarded for [{}].",
                    discarded_lines, serial_number
                );
                format!("OK: {}", discarded_lines).into_response()
            }
            "options" => {
                let posted_options = parse_options_list(&upload_body);
                match application_state
                    .device_registry
                    .record_options(serial_number, &posted_options)
                    .await
                {
                    Ok(()) => "OK".into_response(),
                    Err(fault) => internal_fault(fault),
                }
            }
            unknown_table => (
                StatusCode::BAD_REQUEST,
                format!("unknown table: {}", unknown_table),
            )
                .into_response(),
        }
    }

    /// Endpoint: GET /iclock/getrequest — poll de comandos.
    ///
    /// A lo sumo un comando por poll; `OK` plano con la cola vacía.
    #[instrument(skip(application_state, query_params))]
    pub async fn handle_poll(
        State(application_state): State<AppState>,
        Query(query_params): Query<HashMap<String, String>>,
    ) -> Response {
        let Some(serial_number) = query_params.get("SN").filter(|sn| !sn.trim().is_empty())
        else {
            return missing_serial();
        };

        let registry_result = match query_params.get("INFO") {
            Some(info_csv) => {
                let info_report = parse_device_info_report(info_csv);
                application_state
                    .device_registry
                    .apply_info_report(serial_number, &info_report)
                    .await
            }
            None => {
                application_state
                    .device_registry
                    .touch_last_seen(serial_number)
                    .await
            }
        };
        if let Err(fault) = registry_result {
            return internal_fault(fault);
        }

        match application_state.command_queue.dequeue_next(serial_number).await {
            Ok(Some(command)) => {
                render_command_line(&command.identifier, &command.payload).into_response()
            }
            Ok(None) => "OK".into_response(),
            Err(fault) => internal_fault(fault),
        }
    }

    /// Endpoint: POST /iclock/devicecmd — respuestas de comandos.
    ///
    /// Una o más líneas `ID=..&Return=..&CMD=..`; un retorno distinto de
    /// cero es una transición de fila, no un error de petición: la
    /// respuesta HTTP es `OK` siempre.
    #[instrument(skip(application_state, query_params, reply_body))]
    pub async fn handle_device_reply(
        State(application_state): State<AppState>,
        Query(query_params): Query<HashMap<String, String>>,
        reply_body: String,
    ) -> Response {
        let Some(serial_number) = query_params.get("SN").filter(|sn| !sn.trim().is_empty())
        else {
            return missing_serial();
        };

        if let Err(fault) = application_state
            .device_registry
            .touch_last_seen(serial_number)
            .await
        {
            return internal_fault(fault);
        }

        for reply_result in parse_reply_body(&reply_body) {
            match reply_result {
                Ok(reply) => {
                    if !reply.is_success() {
                        let meaning = reply
                            .return_code_numeric()
                            .map(describe_return_code)
                            .unwrap_or("unparsable return code");
                        warn!(
                            "📡 [ICLOCK]: Terminal [{}] reported Return={} ({}) for [{}].",
                            serial_number, reply.return_value, meaning, reply.command_identifier
                        );
                    }
                    match application_state
                        .command_queue
                        .reconcile_reply(
                            serial_number,
                            &reply,
                            application_state.config.command_retry_limit,
                        )
                        .await
                    {
                        Ok(_) => {}
                        Err(fleetsync_infra_db::DbError::CommandNotFound) => {
                            warn!(
                                "📡 [ICLOCK]: Reply for unknown command [{}] from [{}].",
                                reply.command_identifier, serial_number
                            );
                        }
                        Err(fault) => return internal_fault(fault),
                    }
                }
                Err(wire_fault) => {
                    warn!("📡 [ICLOCK]: Unparsable reply line from [{}]: {}", serial_number, wire_fault);
                }
            }
        }

        "OK".into_response()
    }

    /// Endpoint: GET /iclock/ping — latido.
    #[instrument(skip(application_state, query_params))]
    pub async fn handle_ping(
        State(application_state): State<AppState>,
        Query(query_params): Query<HashMap<String, String>>,
    ) -> Response {
        let Some(serial_number) = query_params.get("SN").filter(|sn| !sn.trim().is_empty())
        else {
            return missing_serial();
        };
        match application_state
            .device_registry
            .touch_last_seen(serial_number)
            .await
        {
            Ok(()) => "OK".into_response(),
            Err(fault) => internal_fault(fault),
        }
    }
}
