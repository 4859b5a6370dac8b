// [apps/sync-server/src/services/mod.rs]

pub mod sweeper;

pub use sweeper::spawn_queue_sweeper;
