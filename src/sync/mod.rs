//! Remote synchronization

mod poller;

pub use poller::{SyncEvent, SyncPoller};
