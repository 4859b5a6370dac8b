// [apps/sync-server/src/handlers/admin.rs]
/*!
 * =================================================================
 * APARATO: FLEET ADMINISTRATION HANDLER
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: SUPERFICIE DE GESTIÓN PARA OPERADORES (JSON)
 *
 * Altas/bajas de usuarios con fan-out a toda la flota activa, encolado
 * de comandos crudos (con pase de reparación), opciones remotas y
 * diagnóstico de colas y rastro.
 * =================================================================
 */

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use fleetsync_core_protocol::formatter::CommandFormatter;
use fleetsync_domain_models::{BiometricKind, CommandCategory, SyncAction, User};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

fn internal_fault(fault: impl std::fmt::Display) -> Response {
    error!("💥 [ADMIN]: Store interaction failed: {}", fault);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
        .into_response()
}

/// Resumen de terminal para el listado de flota.
#[derive(Serialize)]
pub struct DeviceSummary {
    pub serial_number: String,
    pub push_version: String,
    pub firmware_version: Option<String>,
    pub ip_address: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub active: bool,
}

/// Resumen de fila de cola para diagnóstico.
#[derive(Serialize)]
pub struct CommandSummary {
    pub identifier: String,
    pub category: String,
    pub state: String,
    pub payload: String,
    pub retry_count: i64,
    pub created_at: DateTime<Utc>,
    pub result: Option<String>,
}

/// Alta/actualización de usuario desde la interfaz de gestión.
#[derive(Deserialize)]
pub struct UserUpsertPayload {
    pub pin: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub privilege: i64,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub card: String,
    #[serde(default)]
    pub group: String,
    #[serde(default = "UserUpsertPayload::default_time_zone")]
    pub time_zone: String,
    #[serde(default = "UserUpsertPayload::default_verify_mode")]
    pub verify_mode: i64,
    #[serde(default)]
    pub vice_card: String,
}

impl UserUpsertPayload {
    fn default_time_zone() -> String {
        User::DEFAULT_TIME_ZONE.to_string()
    }

    fn default_verify_mode() -> i64 {
        User::DEFAULT_VERIFY_MODE
    }

    fn into_user(self) -> User {
        User {
            pin: self.pin,
            name: self.name,
            privilege: self.privilege,
            password: self.password,
            card: self.card,
            group: self.group,
            time_zone: self.time_zone,
            verify_mode: self.verify_mode,
            vice_card: self.vice_card,
        }
    }
}

/// Comando crudo del operador hacia un terminal puntual.
#[derive(Deserialize)]
pub struct RawCommandPayload {
    pub category: String,
    pub payload: String,
}

/// Opción remota a fijar en un terminal.
#[derive(Deserialize)]
pub struct OptionPayload {
    pub key: String,
    pub value: String,
}

pub struct FleetAdministrationHandler;

impl FleetAdministrationHandler {
    /// Endpoint: GET /api/v1/admin/devices
    #[instrument(skip(application_state))]
    pub async fn list_devices(State(application_state): State<AppState>) -> Response {
        let devices = match application_state.device_registry.list_all().await {
            Ok(devices) => devices,
            Err(fault) => return internal_fault(fault),
        };
        let now = Utc::now();
        let window_minutes = application_state.config.active_window_minutes;

        let fleet_summary: Vec<DeviceSummary> = devices
            .into_iter()
            .map(|device| DeviceSummary {
                active: device.is_active(window_minutes, now),
                serial_number: device.serial_number,
                push_version: device.push_version,
                firmware_version: device.firmware_version,
                ip_address: device.ip_address,
                last_seen: device.last_seen,
            })
            .collect();

        Json(fleet_summary).into_response()
    }

    /// Endpoint: DELETE /api/v1/admin/devices/:serial — baja dura con
    /// cascada sobre la cola del terminal.
    #[instrument(skip(application_state))]
    pub async fn delete_device(
        State(application_state): State<AppState>,
        Path(serial_number): Path<String>,
    ) -> Response {
        match application_state
            .device_registry
            .delete_cascade(&serial_number)
            .await
        {
            Ok(()) => StatusCode::NO_CONTENT.into_response(),
            Err(fleetsync_infra_db::DbError::DeviceNotFound) => {
                StatusCode::NOT_FOUND.into_response()
            }
            Err(fault) => internal_fault(fault),
        }
    }

    /// Endpoint: GET /api/v1/admin/devices/:serial/queue — pendientes e
    /// historial reciente.
    #[instrument(skip(application_state, query_params))]
    pub async fn queue_diagnostics(
        State(application_state): State<AppState>,
        Path(serial_number): Path<String>,
        Query(query_params): Query<HashMap<String, String>>,
    ) -> Response {
        let history_limit = query_params
            .get("limit")
            .and_then(|raw_limit| raw_limit.parse::<i64>().ok())
            .unwrap_or(50);

        let pending = match application_state
            .command_queue
            .pending_count(&serial_number)
            .await
        {
            Ok(count) => count,
            Err(fault) => return internal_fault(fault),
        };
        let history = match application_state
            .command_queue
            .history(&serial_number, history_limit)
            .await
        {
            Ok(rows) => rows,
            Err(fault) => return internal_fault(fault),
        };

        let history_summary: Vec<CommandSummary> = history
            .into_iter()
            .map(|command| CommandSummary {
                identifier: command.identifier,
                category: command.category.as_str().to_string(),
                state: command.state.as_str().to_string(),
                payload: command.payload,
                retry_count: command.retry_count,
                created_at: command.created_at,
                result: command.result,
            })
            .collect();

        Json(json!({ "pending": pending, "history": history_summary })).into_response()
    }

    /// Endpoint: POST /api/v1/admin/devices/:serial/commands — encolado de
    /// un payload crudo. El pase de reparación de tabs corre antes de que
    /// la fila se almacene.
    #[instrument(skip(application_state, raw_command))]
    pub async fn enqueue_raw_command(
        State(application_state): State<AppState>,
        Path(serial_number): Path<String>,
        Json(raw_command): Json<RawCommandPayload>,
    ) -> Response {
        let Some(category) = CommandCategory::parse(&raw_command.category) else {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("unknown category: {}", raw_command.category) })),
            )
                .into_response();
        };
        if raw_command.payload.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "empty payload" })),
            )
                .into_response();
        }

        let outbound_command = CommandFormatter::raw(category, &raw_command.payload);
        match application_state
            .command_queue
            .enqueue(&serial_number, &outbound_command)
            .await
        {
            Ok(command) => {
                info!(
                    "🛰️ [ADMIN]: Raw {} command [{}] queued for [{}].",
                    category, command.identifier, serial_number
                );
                (
                    StatusCode::CREATED,
                    Json(json!({ "identifier": command.identifier })),
                )
                    .into_response()
            }
            Err(fault) => internal_fault(fault),
        }
    }

    /// Endpoint: POST /api/v1/admin/devices/:serial/options — fija una
    /// opción remota y ordena recargar opciones.
    #[instrument(skip(application_state, option_payload))]
    pub async fn push_option(
        State(application_state): State<AppState>,
        Path(serial_number): Path<String>,
        Json(option_payload): Json<OptionPayload>,
    ) -> Response {
        let set_option = CommandFormatter::set_option(&option_payload.key, &option_payload.value);
        let reload = CommandFormatter::reload_options();

        for outbound_command in [&set_option, &reload] {
            if let Err(fault) = application_state
                .command_queue
                .enqueue(&serial_number, outbound_command)
                .await
            {
                return internal_fault(fault);
            }
        }
        Json(json!({ "queued": 2 })).into_response()
    }

    /// Endpoint: POST /api/v1/admin/users — alta/actualización y fan-out
    /// hacia todos los terminales activos.
    #[instrument(skip(application_state, user_payload))]
    pub async fn upsert_user(
        State(application_state): State<AppState>,
        Json(user_payload): Json<UserUpsertPayload>,
    ) -> Response {
        if user_payload.pin.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "pin must not be empty" })),
            )
                .into_response();
        }
        let user = user_payload.into_user();

        if let Err(fault) = application_state.user_repository.upsert(&user, "").await {
            return internal_fault(fault);
        }

        let outbound_command = CommandFormatter::user_update(&user);
        let outcome = application_state
            .synchronizer
            .propagate_operator_command("USER", &user.pin, SyncAction::Sync, &outbound_command)
            .await;

        info!(
            "👤 [ADMIN]: User [{}] upserted; {} queued / {} skipped.",
            user.pin, outcome.queued, outcome.skipped
        );
        Json(json!({ "queued": outcome.queued, "skipped": outcome.skipped })).into_response()
    }

    /// Endpoint: DELETE /api/v1/admin/users/:pin — cascada local en una
    /// transacción y `DATA DELETE USERINFO` hacia la flota activa.
    #[instrument(skip(application_state))]
    pub async fn delete_user(
        State(application_state): State<AppState>,
        Path(pin): Path<String>,
    ) -> Response {
        let existed = match application_state.user_repository.delete_cascade(&pin).await {
            Ok(existed) => existed,
            Err(fault) => return internal_fault(fault),
        };
        if !existed {
            return StatusCode::NOT_FOUND.into_response();
        }

        let outbound_command = match CommandFormatter::user_delete(&pin) {
            Ok(command) => command,
            Err(validation_fault) => {
                warn!("⚠️ [ADMIN]: Delete fan-out refused: {}", validation_fault);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": validation_fault.to_string() })),
                )
                    .into_response();
            }
        };
        let outcome = application_state
            .synchronizer
            .propagate_operator_command("USER", &pin, SyncAction::Delete, &outbound_command)
            .await;

        Json(json!({ "queued": outcome.queued, "skipped": outcome.skipped })).into_response()
    }

    /// Endpoint: DELETE /api/v1/admin/users/:pin/biometrics[?type=&no=] —
    /// borra plantillas locales y propaga `DATA DELETE BIODATA`.
    #[instrument(skip(application_state, query_params))]
    pub async fn delete_user_biometrics(
        State(application_state): State<AppState>,
        Path(pin): Path<String>,
        Query(query_params): Query<HashMap<String, String>>,
    ) -> Response {
        let kind = match query_params.get("type") {
            None => None,
            Some(raw_type) => match raw_type
                .parse::<i64>()
                .ok()
                .and_then(BiometricKind::from_code)
            {
                Some(kind) => Some(kind),
                None => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": format!("unknown biometric type: {}", raw_type) })),
                    )
                        .into_response();
                }
            },
        };
        let slot_number = query_params
            .get("no")
            .and_then(|raw_slot| raw_slot.parse::<i64>().ok());

        let removed = match application_state
            .biometric_repository
            .delete_for_pin(&pin, kind, slot_number)
            .await
        {
            Ok(removed) => removed,
            Err(fault) => return internal_fault(fault),
        };

        let outbound_command = match CommandFormatter::biometric_delete(&pin, kind, slot_number) {
            Ok(command) => command,
            Err(validation_fault) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": validation_fault.to_string() })),
                )
                    .into_response();
            }
        };
        let outcome = application_state
            .synchronizer
            .propagate_operator_command("BIODATA", &pin, SyncAction::Delete, &outbound_command)
            .await;

        Json(json!({
            "removed": removed,
            "queued": outcome.queued,
            "skipped": outcome.skipped
        }))
        .into_response()
    }

    /// Endpoint: GET /api/v1/admin/journal — rastro reciente de auditoría.
    #[instrument(skip(application_state, query_params))]
    pub async fn recent_journal(
        State(application_state): State<AppState>,
        Query(query_params): Query<HashMap<String, String>>,
    ) -> Response {
        let limit = query_params
            .get("limit")
            .and_then(|raw_limit| raw_limit.parse::<i64>().ok())
            .unwrap_or(100);
        match application_state.sync_journal.recent(limit).await {
            Ok(entries) => Json(entries).into_response(),
            Err(fault) => internal_fault(fault),
        }
    }
}
