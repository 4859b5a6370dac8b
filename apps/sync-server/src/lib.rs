// [apps/sync-server/src/lib.rs]
/*!
 * =================================================================
 * APARATO: FLEETSYNC SERVER LIBRARY
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L1-APP)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE LOS MÓDULOS DEL SERVIDOR
 * =================================================================
 */

pub mod config;
pub mod handlers;
pub mod kernel;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod sync;

pub mod prelude {
    pub use crate::config::SyncConfig;
    pub use crate::kernel::SyncServerKernel;
    pub use crate::routes::create_router;
    pub use crate::state::AppState;
}
