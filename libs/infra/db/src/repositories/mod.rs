// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY REGISTRY
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: AUTORIDAD ÚNICA POR ENTIDAD CANÓNICA
 * =================================================================
 */

pub mod biometrics;
pub mod commands;
pub mod devices;
pub mod idcards;
pub mod journal;
pub mod messages;
pub mod photos;
pub mod users;
pub mod workcodes;

pub use biometrics::BiometricRepository;
pub use commands::CommandQueueRepository;
pub use devices::DeviceRepository;
pub use idcards::IdCardRepository;
pub use journal::SyncJournalRepository;
pub use messages::MessageRepository;
pub use photos::PhotoRepository;
pub use users::UserRepository;
pub use workcodes::WorkCodeRepository;
