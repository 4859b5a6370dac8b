/**
 * =================================================================
 * APARATO: REPLY RECONCILIATION MIRROR TEST
 * CLASIFICACIÓN: EVIDENCIA DE PROTOCOLO
 * OBJETIVO: Certificar el ciclo poll -> respuesta sobre los endpoints
 *           reales: sellado en completed y reintentos hasta failed.
 * =================================================================
 */

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::Router;
use fleetsync_domain_models::CommandState;
use fleetsync_infra_db::TursoClient;
use fleetsync_server::prelude::*;
use tower::ServiceExt;

async fn router_over_memory_ledger() -> (Router, AppState) {
    let client = TursoClient::connect(":memory:", None)
        .await
        .expect("memory ignition");
    let state = AppState::new(client, SyncConfig::default());
    (create_router(state.clone()), state)
}

async fn get_text(router: &Router, uri: &str) -> String {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8")
}

async fn post_text(router: &Router, uri: &str, body: &str) -> String {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "text/plain")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8")
}

/// Prepara dos terminales activos y una subida de A01, y devuelve el
/// identificador del comando que A02 recibe en su primer poll.
async fn seed_and_poll(router: &Router) -> String {
    for serial in ["A01", "A02"] {
        get_text(
            router,
            &format!("/iclock/cdata?SN={}&options=all&pushver=2.4.1", serial),
        )
        .await;
    }
    post_text(
        router,
        "/iclock/cdata?SN=A01&table=OPERLOG",
        "USER PIN=1001\tName=Alice\tPri=0\tGrp=1",
    )
    .await;

    let poll_body = get_text(router, "/iclock/getrequest?SN=A02").await;
    assert!(poll_body.starts_with("C:"), "poll must deliver a command line");

    // C:<id>:<payload>
    let command_identifier = poll_body
        .split(':')
        .nth(1)
        .expect("identifier segment")
        .to_string();
    assert_eq!(command_identifier.len(), 16);
    command_identifier
}

#[tokio::test]
async fn certify_successful_reply_seals_the_command() {
    let (router, state) = router_over_memory_ledger().await;
    let command_identifier = seed_and_poll(&router).await;

    // La fila quedó sent tras el poll.
    let sent_row = state
        .command_queue
        .find("A02", &command_identifier)
        .await
        .expect("find")
        .expect("row");
    assert_eq!(sent_row.state, CommandState::Sent);

    let acknowledgement = post_text(
        &router,
        "/iclock/devicecmd?SN=A02",
        &format!("ID={}&Return=0&CMD=DATA", command_identifier),
    )
    .await;
    assert_eq!(acknowledgement, "OK");

    let completed_row = state
        .command_queue
        .find("A02", &command_identifier)
        .await
        .expect("find")
        .expect("row");
    assert_eq!(completed_row.state, CommandState::Completed);
    assert!(completed_row.completed_at.is_some());
    println!("✅ REPLY: Completion sealing certified.");
}

#[tokio::test]
async fn certify_retryable_failure_requeues_and_redelivers() {
    let (router, state) = router_over_memory_ledger().await;
    let command_identifier = seed_and_poll(&router).await;

    let acknowledgement = post_text(
        &router,
        "/iclock/devicecmd?SN=A02",
        &format!("ID={}&Return=-1003&CMD=DATA", command_identifier),
    )
    .await;
    assert_eq!(acknowledgement, "OK", "a failed return is not a request error");

    let requeued_row = state
        .command_queue
        .find("A02", &command_identifier)
        .await
        .expect("find")
        .expect("row");
    assert_eq!(requeued_row.state, CommandState::Pending);
    assert_eq!(requeued_row.retry_count, 1);

    // El siguiente poll re-entrega el mismo comando.
    let redelivered = get_text(&router, "/iclock/getrequest?SN=A02").await;
    assert!(redelivered.starts_with(&format!("C:{}:", command_identifier)));
    println!("✅ REPLY: Retryable requeue certified.");
}

#[tokio::test]
async fn certify_third_failure_abandons_the_command() {
    let (router, state) = router_over_memory_ledger().await;
    let command_identifier = seed_and_poll(&router).await;

    // Fallo 1 (ya despachado en seed_and_poll) y dos ciclos más.
    for _ in 0..2 {
        post_text(
            &router,
            "/iclock/devicecmd?SN=A02",
            &format!("ID={}&Return=-1003&CMD=DATA", command_identifier),
        )
        .await;
        let redelivered = get_text(&router, "/iclock/getrequest?SN=A02").await;
        assert!(redelivered.starts_with("C:"));
    }
    post_text(
        &router,
        "/iclock/devicecmd?SN=A02",
        &format!("ID={}&Return=-1003&CMD=DATA", command_identifier),
    )
    .await;

    let dead_row = state
        .command_queue
        .find("A02", &command_identifier)
        .await
        .expect("find")
        .expect("row");
    assert_eq!(dead_row.state, CommandState::Failed);
    assert_eq!(dead_row.retry_count, 3);

    // No hay re-entrega: la cola quedó vacía.
    assert_eq!(get_text(&router, "/iclock/getrequest?SN=A02").await, "OK");
    println!("✅ REPLY: Retry exhaustion certified.");
}

#[tokio::test]
async fn certify_unknown_and_malformed_replies_are_tolerated() {
    let (router, _state) = router_over_memory_ledger().await;
    get_text(&router, "/iclock/cdata?SN=A02&options=all").await;

    let acknowledgement = post_text(
        &router,
        "/iclock/devicecmd?SN=A02",
        "ID=ffffffffffffffff&Return=0&CMD=DATA\nnot-a-reply-line\n",
    )
    .await;
    assert_eq!(acknowledgement, "OK", "reply endpoint never escalates per-line faults");
    println!("✅ REPLY: Fault tolerance certified.");
}

#[tokio::test]
async fn certify_multi_line_reply_reconciles_each_row() {
    let (router, state) = router_over_memory_ledger().await;
    for serial in ["A01", "A02"] {
        get_text(
            &router,
            &format!("/iclock/cdata?SN={}&options=all", serial),
        )
        .await;
    }
    // Dos registros en una subida: dos comandos en la cola de A02.
    post_text(
        &router,
        "/iclock/cdata?SN=A01&table=OPERLOG",
        "USER PIN=1\tName=A\nUSER PIN=2\tName=B",
    )
    .await;

    let first_id = get_text(&router, "/iclock/getrequest?SN=A02")
        .await
        .split(':')
        .nth(1)
        .expect("id")
        .to_string();
    let second_id = get_text(&router, "/iclock/getrequest?SN=A02")
        .await
        .split(':')
        .nth(1)
        .expect("id")
        .to_string();

    let acknowledgement = post_text(
        &router,
        "/iclock/devicecmd?SN=A02",
        &format!(
            "ID={}&Return=0&CMD=DATA\r\nID={}&Return=0&CMD=DATA\r\n",
            first_id, second_id
        ),
    )
    .await;
    assert_eq!(acknowledgement, "OK");

    for identifier in [&first_id, &second_id] {
        let row = state
            .command_queue
            .find("A02", identifier)
            .await
            .expect("find")
            .expect("row");
        assert_eq!(row.state, CommandState::Completed);
    }
    println!("✅ REPLY: Multi-line reconciliation certified.");
}
