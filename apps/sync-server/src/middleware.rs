// [apps/sync-server/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: PROTOCOL RESPONSE HEADERS
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: CABECERAS EXACTAS DEL PROTOCOLO PUSH
 *
 * El firmware es estricto con las cabeceras: cada respuesta de /iclock
 * lleva Date RFC1123 GMT, Content-Type text/plain, anti-caché y la
 * firma de producto del servidor.
 * =================================================================
 */

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use fleetsync_core_protocol::{PRODUCT_NAME, PUSH_PROTOCOL_VERSION};

/// Fecha actual en forma RFC1123 GMT (`Tue, 01 Aug 2026 10:00:00 GMT`).
fn rfc1123_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub async fn protocol_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let response_headers = response.headers_mut();

    if let Ok(date_value) = HeaderValue::from_str(&rfc1123_now()) {
        response_headers.insert(header::DATE, date_value);
    }
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response_headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Ok(server_value) =
        HeaderValue::from_str(&format!("{}/{}", PRODUCT_NAME, PUSH_PROTOCOL_VERSION))
    {
        response_headers.insert(header::SERVER, server_value);
    }

    response
}
