/**
 * =================================================================
 * APARATO: COMMAND QUEUE MIRROR TEST
 * CLASIFICACIÓN: EVIDENCIA DE MÁQUINA DE ESTADOS
 * OBJETIVO: Certificar pending -> sent -> completed|failed, el orden
 *           FIFO por terminal, la política de reintentos y el barrido.
 * =================================================================
 */

use fleetsync_core_protocol::formatter::{CommandFormatter, OutboundCommand};
use fleetsync_core_protocol::parser::parse_reply_body;
use fleetsync_domain_models::{CommandCategory, CommandState};
use fleetsync_infra_db::repositories::CommandQueueRepository;
use fleetsync_infra_db::TursoClient;

const RETRY_LIMIT: i64 = 3;

async fn queue_over_memory_ledger() -> CommandQueueRepository {
    let client = TursoClient::connect(":memory:", None)
        .await
        .expect("memory ignition");
    CommandQueueRepository::new(client)
}

fn reply_line(identifier: &str, return_code: &str) -> fleetsync_core_protocol::parser::CommandReply {
    parse_reply_body(&format!("ID={}&Return={}&CMD=DATA", identifier, return_code))
        .remove(0)
        .expect("reply parses")
}

fn data_command(payload: &str) -> OutboundCommand {
    OutboundCommand {
        category: CommandCategory::Data,
        payload: payload.to_string(),
    }
}

#[tokio::test]
async fn certify_enqueue_generates_wire_identifiers() {
    let queue = queue_over_memory_ledger().await;

    let command = queue
        .enqueue("A01", &data_command("DATA UPDATE USERINFO PIN=1\tName=A"))
        .await
        .expect("enqueue");

    assert_eq!(command.identifier.len(), 16);
    assert!(command.identifier.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(command.state, CommandState::Pending);
    assert_eq!(queue.pending_count("A01").await.expect("count"), 1);
    println!("✅ QUEUE: Identifier generation certified.");
}

#[tokio::test]
async fn certify_dequeue_consumes_in_enqueue_order() {
    let queue = queue_over_memory_ledger().await;

    for ordinal in 0..3 {
        queue
            .enqueue(
                "A01",
                &data_command(&format!("DATA UPDATE USERINFO PIN={}\tName=U{}", ordinal, ordinal)),
            )
            .await
            .expect("enqueue");
    }
    // La cola de otro terminal no interfiere.
    queue
        .enqueue("B07", &data_command("DATA UPDATE USERINFO PIN=9\tName=Z"))
        .await
        .expect("enqueue peer");

    for ordinal in 0..3 {
        let command = queue
            .dequeue_next("A01")
            .await
            .expect("dequeue")
            .expect("row available");
        assert!(command.payload.contains(&format!("PIN={}", ordinal)));
        assert_eq!(command.state, CommandState::Sent);
        assert!(command.sent_at.is_some());
    }
    assert!(queue.dequeue_next("A01").await.expect("dequeue").is_none());
    assert_eq!(queue.pending_count("B07").await.expect("count"), 1);
    println!("✅ QUEUE: FIFO consumption certified.");
}

#[tokio::test]
async fn certify_success_reply_completes_the_row() {
    let queue = queue_over_memory_ledger().await;

    let queued = queue
        .enqueue("A02", &data_command("DATA UPDATE BIODATA Pin=1\tNo=0\tIndex=0\tValid=1\tDuress=0\tType=1\tMajorVer=0\tMinorVer=0\tFormat=ZK\tTmp=AAAA"))
        .await
        .expect("enqueue");
    queue.dequeue_next("A02").await.expect("dequeue").expect("row");

    let final_state = queue
        .reconcile_reply("A02", &reply_line(&queued.identifier, "0"), RETRY_LIMIT)
        .await
        .expect("reconcile");
    assert_eq!(final_state, CommandState::Completed);

    let row = queue
        .find("A02", &queued.identifier)
        .await
        .expect("find")
        .expect("row exists");
    assert_eq!(row.state, CommandState::Completed);
    assert!(row.completed_at.is_some());
    assert!(row.result.as_deref().unwrap_or_default().contains("Return=0"));
    println!("✅ QUEUE: Success reconciliation certified.");
}

#[tokio::test]
async fn certify_retry_policy_until_exhaustion() {
    let queue = queue_over_memory_ledger().await;

    let queued = queue
        .enqueue("A02", &data_command("DATA UPDATE USERINFO PIN=1\tName=A"))
        .await
        .expect("enqueue");

    // Dos fallos reintentables: la fila vuelve a pending con el contador.
    for expected_retry in 1..=2 {
        queue.dequeue_next("A02").await.expect("dequeue").expect("row");
        let state = queue
            .reconcile_reply("A02", &reply_line(&queued.identifier, "-1003"), RETRY_LIMIT)
            .await
            .expect("reconcile");
        assert_eq!(state, CommandState::Pending);

        let row = queue
            .find("A02", &queued.identifier)
            .await
            .expect("find")
            .expect("row exists");
        assert_eq!(row.retry_count, expected_retry);
        assert!(row.sent_at.is_none(), "sent_at cleared on requeue");
    }

    // Tercer fallo: presupuesto agotado, la fila muere en failed.
    queue.dequeue_next("A02").await.expect("dequeue").expect("row");
    let state = queue
        .reconcile_reply("A02", &reply_line(&queued.identifier, "-1003"), RETRY_LIMIT)
        .await
        .expect("reconcile");
    assert_eq!(state, CommandState::Failed);

    let row = queue
        .find("A02", &queued.identifier)
        .await
        .expect("find")
        .expect("row exists");
    assert_eq!(row.retry_count, 3);
    assert!(queue.dequeue_next("A02").await.expect("dequeue").is_none());
    println!("✅ QUEUE: Retry policy certified.");
}

#[tokio::test]
async fn certify_non_idempotent_payload_fails_immediately() {
    let queue = queue_over_memory_ledger().await;

    let queued = queue
        .enqueue(
            "A02",
            &OutboundCommand {
                category: CommandCategory::Control,
                payload: "REBOOT".to_string(),
            },
        )
        .await
        .expect("enqueue");
    queue.dequeue_next("A02").await.expect("dequeue").expect("row");

    let state = queue
        .reconcile_reply("A02", &reply_line(&queued.identifier, "-1005"), RETRY_LIMIT)
        .await
        .expect("reconcile");
    assert_eq!(state, CommandState::Failed, "REBOOT is not idempotent: no requeue");
    println!("✅ QUEUE: Non-idempotent fast-fail certified.");
}

#[tokio::test]
async fn certify_unknown_reply_is_reported() {
    let queue = queue_over_memory_ledger().await;
    let reconcile_result = queue
        .reconcile_reply("A02", &reply_line("deadbeefdeadbeef", "0"), RETRY_LIMIT)
        .await;
    assert!(matches!(
        reconcile_result,
        Err(fleetsync_infra_db::DbError::CommandNotFound)
    ));
    println!("✅ QUEUE: Unknown reply detection certified.");
}

#[tokio::test]
async fn certify_repair_pass_runs_before_storage() {
    let queue = queue_over_memory_ledger().await;

    // Un operador encola BIODATA con espacios colapsados: la fila debe
    // almacenarse ya reparada en forma canónica.
    let collapsed = CommandFormatter::raw(
        CommandCategory::Data,
        "DATA UPDATE BIODATA Pin=1001 No=3 Index=0 Valid=1 Duress=0 Type=1 MajorVer=0 MinorVer=0 Format=ZK Tmp=AAAA",
    );
    let queued = queue.enqueue("A02", &collapsed).await.expect("enqueue");

    let stored = queue
        .find("A02", &queued.identifier)
        .await
        .expect("find")
        .expect("row exists");
    assert_eq!(
        stored.payload,
        "DATA UPDATE BIODATA Pin=1001\tNo=3\tIndex=0\tValid=1\tDuress=0\tType=1\tMajorVer=0\tMinorVer=0\tFormat=ZK\tTmp=AAAA"
    );
    assert_eq!(stored.payload.matches('\t').count(), 9);
    println!("✅ QUEUE: Pre-storage repair certified.");
}

#[tokio::test]
async fn certify_sweep_retention_policy() {
    let queue = queue_over_memory_ledger().await;

    // Fila completada: cae con retención cero.
    let completed = queue
        .enqueue("A03", &data_command("DATA UPDATE USERINFO PIN=1\tName=A"))
        .await
        .expect("enqueue");
    queue.dequeue_next("A03").await.expect("dequeue").expect("row");
    queue
        .reconcile_reply("A03", &reply_line(&completed.identifier, "0"), RETRY_LIMIT)
        .await
        .expect("reconcile");

    // Fila pendiente fresca: sobrevive siempre al barrido.
    let fresh = queue
        .enqueue("A03", &data_command("DATA UPDATE USERINFO PIN=2\tName=B"))
        .await
        .expect("enqueue");

    let (removed_terminal, removed_stale) =
        queue.sweep(0, 0, RETRY_LIMIT).await.expect("sweep");
    assert_eq!(removed_terminal, 1);
    assert_eq!(removed_stale, 0, "fresh pendings have retry_count below the limit");

    assert!(queue
        .find("A03", &completed.identifier)
        .await
        .expect("find")
        .is_none());
    assert!(queue
        .find("A03", &fresh.identifier)
        .await
        .expect("find")
        .is_some());
    println!("✅ QUEUE: Sweep retention certified.");
}
