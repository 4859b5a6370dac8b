// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: FLEETSYNC PERSISTENCE ADAPTER
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ACCESO TIPADO AL LEDGER libSQL
 *
 * La base de datos es la única fuente de verdad del estado de la cola y
 * del inventario canónico; ningún caché en proceso es autoritativo.
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::TursoClient;
pub use errors::DbError;
