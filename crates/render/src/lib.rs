#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Debounced, supersede-based render queue with an incremental/full change
//! tracker and fallback preview synthesis (spec §4.5).

mod adapter;
mod change_tracker;
mod fallback;
mod queue;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use adapter::{Preview, PreviewMetadata, RenderAdapter, RenderAdapterRegistry, RenderOpts};
pub use change_tracker::{decide, ChangeDecision, ChangeTrackerThresholds};
pub use fallback::synthesize_fallback;
pub use queue::{RenderNotify, RenderQueue, RenderQueueConfig, RenderQueueCounters};
