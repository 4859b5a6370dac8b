// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: FLEETSYNC DOMAIN MODELS
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS CANÓNICOS DEL ECOSISTEMA DE SINCRONIZACIÓN
 *
 * Define las entidades que el resto de los estratos comparten: el
 * terminal registrado, el usuario, la plantilla biométrica unificada,
 * el comando saliente y el rastro de sincronización. Ningún módulo de
 * este estrato realiza I/O.
 * =================================================================
 */

pub mod biometric;
pub mod command;
pub mod device;
pub mod idcard;
pub mod journal;
pub mod message;
pub mod photo;
pub mod user;
pub mod workcode;

pub use biometric::{BiometricKind, BiometricTemplate};
pub use command::{CommandCategory, CommandRecord, CommandState};
pub use device::{Device, DeviceStamps, StampFamily};
pub use idcard::IdCardRecord;
pub use journal::{SyncAction, SyncJournalEntry, SyncStatus};
pub use message::{ShortMessage, UserMessageLink};
pub use photo::{ComparisonPhoto, UserPhoto};
pub use user::User;
pub use workcode::WorkCode;
