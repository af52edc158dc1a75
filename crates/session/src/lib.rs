#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The per-document session state machine (spec §4.6): binds the document
//! model, history, persistence, render adapters, and signal bus under a
//! single sequential command surface.

pub mod command;
pub mod outcome;
pub mod safety;
mod session;

pub use command::{
    LoadParams, MergeHook, OnConflict, RecoverParams, RenderParams, SaveParams, UpdateBodyParams,
    UpdateFrontmatterParams,
};
pub use outcome::{
    HistoryStateOutcome, LoadOutcome, RecoverOutcome, RecoveryAvailableSummary, RenderOutcome,
    SaveOutcome, UndoRedoOutcome, UpdateOutcome,
};
pub use safety::{Finding, SafetyPolicy, SafetyRule, Severity};
pub use session::{AsyncRenderHandle, Session, SessionConfig, SessionLock};
