// [apps/sync-server/src/services/sweeper.rs]
/*!
 * =================================================================
 * APARATO: QUEUE SWEEPER SERVICE
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: HIGIENE PERIÓDICA DE COLA Y RASTRO
 *
 * Independiente de toda petición: purga filas terminales fuera de
 * retención, pendientes abandonadas con presupuesto agotado y entradas
 * viejas del rastro de auditoría.
 * =================================================================
 */

use crate::state::AppState;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

/// Inicia el daemon de higiene en el runtime de Tokio.
pub async fn spawn_queue_sweeper(application_state: AppState) {
    let sweep_cadence = Duration::from_secs(application_state.config.sweeper_interval_seconds);
    let mut maintenance_ticker = interval(sweep_cadence);

    tokio::spawn(async move {
        info!("💀 [SWEEPER_ACTIVE]: Queue hygiene daemon initiated.");

        loop {
            maintenance_ticker.tick().await;

            // 1. HIGIENE DE COLA (retención de terminales y abandonadas)
            if let Err(sweep_fault) = application_state
                .command_queue
                .sweep(
                    application_state.config.command_retention_hours,
                    application_state.config.stale_pending_hours,
                    application_state.config.command_retry_limit,
                )
                .await
            {
                error!("💀 [SWEEPER]: Queue sweep failed: {}", sweep_fault);
            }

            // 2. PODA DEL RASTRO DE AUDITORÍA
            if let Err(prune_fault) = application_state
                .sync_journal
                .prune_older_than(application_state.config.journal_retention_days)
                .await
            {
                error!("💀 [SWEEPER]: Journal prune failed: {}", prune_fault);
            }
        }
    });
}
