pub mod batch;
pub mod sync;

pub use batch::run_batch;
pub use sync::{SyncOptions, SyncOrchestrator, SyncReport};
