// [apps/sync-server/src/routes.rs]
/*!
 * =================================================================
 * APARATO: ROUTING MATRIX
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: TOPOLOGÍA HTTP DEL PROTOCOLO Y DE LA GESTIÓN
 * =================================================================
 */

use crate::handlers::{admin::FleetAdministrationHandler, iclock::PushProtocolHandler};
use crate::middleware::protocol_headers;
use crate::state::AppState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(application_state: AppState) -> Router {
    // CORS solo para la superficie de gestión; los terminales no lo usan.
    let management_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // ESTRATO DE PROTOCOLO: los cinco recursos que habla el firmware.
    let push_protocol = Router::new()
        .route(
            "/cdata",
            get(PushProtocolHandler::handle_init).post(PushProtocolHandler::handle_upload),
        )
        .route("/getrequest", get(PushProtocolHandler::handle_poll))
        .route("/devicecmd", post(PushProtocolHandler::handle_device_reply))
        .route("/ping", get(PushProtocolHandler::handle_ping))
        .layer(middleware::from_fn(protocol_headers));

    // ESTRATO DE GESTIÓN: operaciones de flota para el operador.
    let fleet_administration = Router::new()
        .route("/devices", get(FleetAdministrationHandler::list_devices))
        .route(
            "/devices/:serial",
            delete(FleetAdministrationHandler::delete_device),
        )
        .route(
            "/devices/:serial/queue",
            get(FleetAdministrationHandler::queue_diagnostics),
        )
        .route(
            "/devices/:serial/commands",
            post(FleetAdministrationHandler::enqueue_raw_command),
        )
        .route(
            "/devices/:serial/options",
            post(FleetAdministrationHandler::push_option),
        )
        .route("/users", post(FleetAdministrationHandler::upsert_user))
        .route(
            "/users/:pin",
            delete(FleetAdministrationHandler::delete_user),
        )
        .route(
            "/users/:pin/biometrics",
            delete(FleetAdministrationHandler::delete_user_biometrics),
        )
        .route("/journal", get(FleetAdministrationHandler::recent_journal))
        .layer(management_cors);

    Router::new()
        .route("/health", get(|| async { "STATUS_OK" }))
        .nest("/iclock", push_protocol)
        .nest("/api/v1/admin", fleet_administration)
        .layer(TraceLayer::new_for_http())
        .with_state(application_state)
}
