/**
 * =================================================================
 * APARATO: ADMIN SURFACE MIRROR TEST
 * CLASIFICACIÓN: EVIDENCIA DE GESTIÓN
 * OBJETIVO: Certificar la superficie de operador: alta/baja de
 *           usuarios con fan-out, comandos crudos reparados y
 *           diagnóstico de colas.
 * =================================================================
 */

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use fleetsync_domain_models::{
    BiometricKind, BiometricTemplate, CommandState, UserPhoto,
};
use fleetsync_infra_db::TursoClient;
use fleetsync_server::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn router_over_memory_ledger() -> (Router, AppState) {
    let client = TursoClient::connect(":memory:", None)
        .await
        .expect("memory ignition");
    let state = AppState::new(client, SyncConfig::default());
    (create_router(state.clone()), state)
}

async fn register_fleet(state: &AppState, serials: &[&str]) {
    for serial in serials {
        state
            .device_registry
            .touch_last_seen(serial)
            .await
            .expect("register terminal");
    }
}

async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match payload {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let parsed = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, parsed)
}

#[tokio::test]
async fn certify_operator_user_push_reaches_the_fleet() {
    let (router, state) = router_over_memory_ledger().await;
    register_fleet(&state, &["A01", "A02"]).await;

    let (status, response) = send_json(
        &router,
        "POST",
        "/api/v1/admin/users",
        Some(json!({ "pin": "1001", "name": "Alice", "group": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["queued"], 2, "one command per active terminal");

    let stored = state
        .user_repository
        .find("1001")
        .await
        .expect("find")
        .expect("stored");
    assert_eq!(stored.name, "Alice");
    assert_eq!(stored.verify_mode, -1, "defaults applied");

    for serial in ["A01", "A02"] {
        let command = state
            .command_queue
            .dequeue_next(serial)
            .await
            .expect("dequeue")
            .expect("command queued");
        assert!(command.payload.starts_with("DATA UPDATE USERINFO PIN=1001"));
    }
    println!("✅ ADMIN: Fleet-wide user push certified.");
}

#[tokio::test]
async fn certify_user_delete_cascades_and_propagates() {
    let (router, state) = router_over_memory_ledger().await;
    register_fleet(&state, &["A01", "A02"]).await;

    // Siembra local: usuario, plantilla y foto compartiendo el PIN.
    let (status, _) = send_json(
        &router,
        "POST",
        "/api/v1/admin/users",
        Some(json!({ "pin": "1001", "name": "Alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    state
        .biometric_repository
        .upsert(
            &BiometricTemplate {
                pin: "1001".to_string(),
                kind: BiometricKind::Fingerprint,
                slot_number: 0,
                template_index: 0,
                valid: 1,
                duress: 0,
                major_version: "0".to_string(),
                minor_version: "0".to_string(),
                format_tag: "ZK".to_string(),
                template_blob: "QUJDRA==".to_string(),
            },
            "A01",
        )
        .await
        .expect("seed template");
    state
        .photo_repository
        .upsert_user_photo(
            &UserPhoto {
                pin: "1001".to_string(),
                file_name: "1001.jpg".to_string(),
                declared_size: 4,
                content: "QUJDRA==".to_string(),
            },
            "A01",
        )
        .await
        .expect("seed photo");

    // Vaciar las colas del push inicial para aislar el borrado.
    while state
        .command_queue
        .dequeue_next("A01")
        .await
        .expect("drain")
        .is_some()
    {}
    while state
        .command_queue
        .dequeue_next("A02")
        .await
        .expect("drain")
        .is_some()
    {}

    let (status, response) =
        send_json(&router, "DELETE", "/api/v1/admin/users/1001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["queued"], 2);

    // Cascada local en una transacción.
    assert!(state.user_repository.find("1001").await.expect("find").is_none());
    assert!(state
        .biometric_repository
        .list_for_pin("1001")
        .await
        .expect("list")
        .is_empty());
    assert!(state
        .photo_repository
        .find_user_photo("1001")
        .await
        .expect("find")
        .is_none());

    // Cada terminal activo recibe el DATA DELETE USERINFO.
    for serial in ["A01", "A02"] {
        let command = state
            .command_queue
            .dequeue_next(serial)
            .await
            .expect("dequeue")
            .expect("delete queued");
        assert_eq!(command.payload, "DATA DELETE USERINFO PIN=1001");
    }

    // Borrar un PIN inexistente: 404.
    let (status, _) = send_json(&router, "DELETE", "/api/v1/admin/users/1001", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    println!("✅ ADMIN: Delete cascade + propagation certified.");
}

#[tokio::test]
async fn certify_biometric_delete_filters_and_propagates() {
    let (router, state) = router_over_memory_ledger().await;
    register_fleet(&state, &["A02"]).await;

    for slot_number in [0, 1] {
        state
            .biometric_repository
            .upsert(
                &BiometricTemplate {
                    pin: "7".to_string(),
                    kind: BiometricKind::Fingerprint,
                    slot_number,
                    template_index: 0,
                    valid: 1,
                    duress: 0,
                    major_version: "0".to_string(),
                    minor_version: "0".to_string(),
                    format_tag: "ZK".to_string(),
                    template_blob: "QUJDRA==".to_string(),
                },
                "A01",
            )
            .await
            .expect("seed template");
    }

    let (status, response) = send_json(
        &router,
        "DELETE",
        "/api/v1/admin/users/7/biometrics?type=1&no=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["removed"], 1);

    assert_eq!(
        state.biometric_repository.list_for_pin("7").await.expect("list").len(),
        1,
        "only the filtered slot fell"
    );

    let command = state
        .command_queue
        .dequeue_next("A02")
        .await
        .expect("dequeue")
        .expect("delete queued");
    assert_eq!(command.payload, "DATA DELETE BIODATA Pin=7\tType=1\tNo=1");

    // Tipo fuera de la enumeración: 400.
    let (status, _) = send_json(
        &router,
        "DELETE",
        "/api/v1/admin/users/7/biometrics?type=55",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    println!("✅ ADMIN: Biometric delete certified.");
}

#[tokio::test]
async fn certify_raw_command_is_repaired_before_storage() {
    let (router, state) = router_over_memory_ledger().await;
    register_fleet(&state, &["A02"]).await;

    let (status, response) = send_json(
        &router,
        "POST",
        "/api/v1/admin/devices/A02/commands",
        Some(json!({
            "category": "DATA",
            "payload": "DATA UPDATE BIODATA Pin=1001 No=3 Index=0 Valid=1 Duress=0 Type=1 MajorVer=0 MinorVer=0 Format=ZK Tmp=AAAA"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let identifier = response["identifier"].as_str().expect("identifier").to_string();

    let stored = state
        .command_queue
        .find("A02", &identifier)
        .await
        .expect("find")
        .expect("row");
    assert_eq!(
        stored.payload,
        "DATA UPDATE BIODATA Pin=1001\tNo=3\tIndex=0\tValid=1\tDuress=0\tType=1\tMajorVer=0\tMinorVer=0\tFormat=ZK\tTmp=AAAA",
        "collapsed separators repaired before the row is stored"
    );
    assert_eq!(stored.state, CommandState::Pending);

    // Categoría desconocida: 400.
    let (status, _) = send_json(
        &router,
        "POST",
        "/api/v1/admin/devices/A02/commands",
        Some(json!({ "category": "BOGUS", "payload": "REBOOT" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    println!("✅ ADMIN: Raw command repair certified.");
}

#[tokio::test]
async fn certify_queue_diagnostics_and_device_listing() {
    let (router, state) = router_over_memory_ledger().await;
    register_fleet(&state, &["A01", "A02"]).await;

    send_json(
        &router,
        "POST",
        "/api/v1/admin/devices/A02/commands",
        Some(json!({ "category": "CONTROL", "payload": "REBOOT" })),
    )
    .await;

    let (status, diagnostics) =
        send_json(&router, "GET", "/api/v1/admin/devices/A02/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(diagnostics["pending"], 1);
    assert_eq!(diagnostics["history"][0]["payload"], "REBOOT");
    assert_eq!(diagnostics["history"][0]["state"], "pending");

    let (status, fleet) = send_json(&router, "GET", "/api/v1/admin/devices", None).await;
    assert_eq!(status, StatusCode::OK);
    let fleet_list = fleet.as_array().expect("device array");
    assert_eq!(fleet_list.len(), 2);
    assert!(fleet_list.iter().all(|device| device["active"] == true));
    println!("✅ ADMIN: Diagnostics and listing certified.");
}

#[tokio::test]
async fn certify_option_push_queues_set_and_reload() {
    let (router, state) = router_over_memory_ledger().await;
    register_fleet(&state, &["A02"]).await;

    let (status, response) = send_json(
        &router,
        "POST",
        "/api/v1/admin/devices/A02/options",
        Some(json!({ "key": "Delay", "value": "10" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["queued"], 2);

    let set_option = state
        .command_queue
        .dequeue_next("A02")
        .await
        .expect("dequeue")
        .expect("first command");
    assert_eq!(set_option.payload, "SET OPTION Delay=10");

    let reload = state
        .command_queue
        .dequeue_next("A02")
        .await
        .expect("dequeue")
        .expect("second command");
    assert_eq!(reload.payload, "RELOAD OPTIONS");
    println!("✅ ADMIN: Option push ordering certified.");
}

#[tokio::test]
async fn certify_device_removal_from_the_fleet() {
    let (router, state) = router_over_memory_ledger().await;
    register_fleet(&state, &["A01", "A02"]).await;

    let (status, _) = send_json(&router, "DELETE", "/api/v1/admin/devices/A02", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fleet) = send_json(&router, "GET", "/api/v1/admin/devices", None).await;
    assert_eq!(fleet.as_array().expect("device array").len(), 1);

    let (status, _) = send_json(&router, "DELETE", "/api/v1/admin/devices/A02", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    println!("✅ ADMIN: Device removal certified.");
}

#[tokio::test]
async fn certify_journal_endpoint_exposes_audit_trail() {
    let (router, state) = router_over_memory_ledger().await;
    register_fleet(&state, &["A01", "A02"]).await;

    send_json(
        &router,
        "POST",
        "/api/v1/admin/users",
        Some(json!({ "pin": "1001", "name": "Alice" })),
    )
    .await;

    let (status, journal) = send_json(&router, "GET", "/api/v1/admin/journal?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = journal.as_array().expect("journal array");
    assert_eq!(entries.len(), 2, "one audit row per targeted terminal");
    assert!(entries
        .iter()
        .all(|entry| entry["record_type"] == "USER" && entry["record_key"] == "1001"));
    println!("✅ ADMIN: Journal exposure certified.");
}
