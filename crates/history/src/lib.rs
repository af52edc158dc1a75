#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Bounded undo/redo history over document snapshots (spec §4.4).

mod history;

pub use history::{History, HistoryState};
