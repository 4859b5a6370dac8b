// [apps/sync-server/src/state.rs]
/*!
 * =================================================================
 * APARATO: APPLICATION STATE HUB
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: COMPOSICIÓN ÚNICA DE REPOSITORIOS Y SINCRONIZADOR
 *
 * El sincronizador de fan-out y la cola de comandos se construyen UNA
 * vez aquí y se inyectan donde se consumen; ningún componente los
 * instancia de forma perezosa por llamada.
 * =================================================================
 */

use crate::config::SyncConfig;
use crate::sync::fanout::FanOutSynchronizer;
use crate::sync::ingest::IngestPipeline;
use fleetsync_infra_db::repositories::{
    BiometricRepository, CommandQueueRepository, DeviceRepository, IdCardRepository,
    MessageRepository, PhotoRepository, SyncJournalRepository, UserRepository,
    WorkCodeRepository,
};
use fleetsync_infra_db::TursoClient;
use std::sync::Arc;
use tracing::debug;

/// Contenedor de estado compartido (thread-safe) del servidor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SyncConfig>,
    pub database_client: TursoClient,
    pub device_registry: Arc<DeviceRepository>,
    pub user_repository: Arc<UserRepository>,
    pub biometric_repository: Arc<BiometricRepository>,
    pub photo_repository: Arc<PhotoRepository>,
    pub work_code_repository: Arc<WorkCodeRepository>,
    pub message_repository: Arc<MessageRepository>,
    pub id_card_repository: Arc<IdCardRepository>,
    pub command_queue: Arc<CommandQueueRepository>,
    pub sync_journal: Arc<SyncJournalRepository>,
    pub synchronizer: Arc<FanOutSynchronizer>,
    pub ingest_pipeline: Arc<IngestPipeline>,
}

impl AppState {
    pub fn new(database_client: TursoClient, config: SyncConfig) -> Self {
        debug!("🧬 [APP_STATE]: Executing composition sequence...");

        let config = Arc::new(config);

        let device_registry = Arc::new(DeviceRepository::new(database_client.clone()));
        let user_repository = Arc::new(UserRepository::new(database_client.clone()));
        let biometric_repository = Arc::new(BiometricRepository::new(database_client.clone()));
        let photo_repository = Arc::new(PhotoRepository::new(database_client.clone()));
        let work_code_repository = Arc::new(WorkCodeRepository::new(database_client.clone()));
        let message_repository = Arc::new(MessageRepository::new(database_client.clone()));
        let id_card_repository = Arc::new(IdCardRepository::new(database_client.clone()));
        let command_queue = Arc::new(CommandQueueRepository::new(database_client.clone()));
        let sync_journal = Arc::new(SyncJournalRepository::new(database_client.clone()));

        let synchronizer = Arc::new(FanOutSynchronizer::new(
            device_registry.clone(),
            command_queue.clone(),
            sync_journal.clone(),
            config.clone(),
        ));

        let ingest_pipeline = Arc::new(IngestPipeline::new(
            user_repository.clone(),
            biometric_repository.clone(),
            photo_repository.clone(),
            work_code_repository.clone(),
            message_repository.clone(),
            id_card_repository.clone(),
            sync_journal.clone(),
            synchronizer.clone(),
            config.clone(),
        ));

        Self {
            config,
            database_client,
            device_registry,
            user_repository,
            biometric_repository,
            photo_repository,
            work_code_repository,
            message_repository,
            id_card_repository,
            command_queue,
            sync_journal,
            synchronizer,
            ingest_pipeline,
        }
    }
}
