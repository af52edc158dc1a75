// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Atomic, divergence-aware persistence and crash-recovery checkpoints
//! for documents (spec §4.3, §4.7).

mod atomic;
mod checkpoint;
mod sidecar;
mod snapshot;

pub use atomic::{atomic_write, detect_divergence, AtomicWriteOptions, Divergence};
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use sidecar::write_revision_sidecar;
pub use snapshot::DiskSnapshot;
