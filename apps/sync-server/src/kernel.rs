// [apps/sync-server/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: SYNC SERVER KERNEL
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN
 *
 * El cliente del ledger se conecta (con bootstrap de esquema incluido)
 * antes de levantar daemons y el transporte HTTP.
 * =================================================================
 */

use crate::config::SyncConfig;
use crate::routes::create_router;
use crate::services::spawn_queue_sweeper;
use crate::state::AppState;
use fleetsync_infra_db::{DbError, TursoClient};
use std::net::SocketAddr;
use tracing::{error, info, instrument};

pub struct SyncServerKernel {
    pub server_network_port: u16,
    pub application_state: AppState,
}

impl SyncServerKernel {
    /// Conecta el ledger y compone el estado de aplicación.
    #[instrument(skip(config))]
    pub async fn ignite(config: SyncConfig) -> Result<Self, DbError> {
        let database_client = TursoClient::connect(
            &config.database_url,
            config.database_auth_token.clone(),
        )
        .await?;

        Ok(Self {
            server_network_port: config.server_port,
            application_state: AppState::new(database_client, config),
        })
    }

    /// Lanza los daemons de mantenimiento y el servidor HTTP principal.
    pub async fn launch_operations(self) {
        spawn_queue_sweeper(self.application_state.clone()).await;

        let router = create_router(self.application_state);
        let bind_address = SocketAddr::from(([0, 0, 0, 0], self.server_network_port));

        info!("🚀 [KERNEL_ONLINE]: FleetSync listening at {}", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("CRITICAL_FAULT: Failed to bind network port.");

        if let Err(server_error) = axum::serve(tcp_listener, router).await {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_error);
            std::process::exit(1);
        }
    }
}
