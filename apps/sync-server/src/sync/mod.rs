// [apps/sync-server/src/sync/mod.rs]
/*!
 * =================================================================
 * APARATO: SYNCHRONIZATION ENGINE
 * CLASIFICACIÓN: APPLICATION CORE (ESTRATO L1-APP)
 * RESPONSABILIDAD: INGESTA TIPADA Y FAN-OUT HACIA LA FLOTA
 * =================================================================
 */

pub mod fanout;
pub mod ingest;
