// [apps/sync-server/src/main.rs]
/*!
 * =================================================================
 * APARATO: SYNC SERVER ENTRY POINT
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L1-APP)
 * RESPONSABILIDAD: CARGA DE ENTORNO, OBSERVABILIDAD E IGNICIÓN
 * =================================================================
 */

use dotenvy::dotenv;
use fleetsync_server::prelude::*;
use fleetsync_shared_watchtower::init_tracing;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO
    dotenv().ok();

    // 2. OBSERVABILIDAD
    init_tracing("fleetsync_server");

    // 3. RUNTIME
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        info!("🛰️  [FLEETSYNC]: Global ignition sequence starting...");

        // 4. CONFIGURACIÓN TIPADA
        let config = SyncConfig::from_environment();
        let listening_port = config.server_port;

        // 5. KERNEL (ledger + estado + daemons + HTTP)
        let kernel = match SyncServerKernel::ignite(config).await {
            Ok(kernel) => kernel,
            Err(ignition_fault) => {
                error!("❌ [IGNITION_FAILED]: {}", ignition_fault);
                std::process::exit(1);
            }
        };

        info!("🚀 [FLEETSYNC_ONLINE]: System operational on port {}.", listening_port);
        kernel.launch_operations().await;

        Ok(())
    })
}
