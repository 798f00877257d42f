pub mod auto_sync;
pub mod connections;
pub mod parsing;
pub mod reconcile;
pub mod sync;
pub mod trigger;
