//! The session state machine (spec §4.6): combines the document model,
//! persistence, history, render adapters, checkpoints, and the signal bus
//! under a single sequential command surface.

use crate::command::{
    LoadParams, OnConflict, RecoverParams, RenderParams, SaveParams, UpdateBodyParams,
    UpdateFrontmatterParams,
};
use crate::outcome::{
    HistoryStateOutcome, LoadOutcome, RecoverOutcome, RecoveryAvailableSummary, RenderOutcome,
    SaveOutcome, UndoRedoOutcome, UpdateOutcome,
};
use crate::safety;
use jido_core::{
    ActionMetadata, ActionResult, Clock, CorrelationId, Document, Idempotency, JidoError,
    ParseOptions, SerializeOptions, Status,
};
use jido_history::History;
use jido_render::{
    decide, ChangeTrackerThresholds, Preview, PreviewMetadata, RenderAdapterRegistry, RenderOpts,
};
use jido_signals::{BroadcastOpts, SignalBus, SignalType};
use jido_storage::{
    atomic_write, detect_divergence, write_revision_sidecar, AtomicWriteOptions, Checkpoint,
    CheckpointStore, Divergence, DiskSnapshot,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::trace;

/// Session-local exclusive locks (spec §4.6). Distinct from the
/// registry-owned cross-session optimistic lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionLock {
    Save,
    Render,
}

/// The inputs a registry-owned [`jido_render::RenderQueue`] needs to run a
/// render job for this session, plus the revision it was computed against
/// so a late result can be recognized as stale.
#[derive(Debug, Clone)]
pub struct AsyncRenderHandle {
    pub revision: u64,
    pub markdown: String,
    pub render_opts: RenderOpts,
}

/// Tunables for a [`Session`], mirroring the `session`/`persistence`/
/// `parser`/`renderer` configuration groups in spec §6.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub workspace_root: PathBuf,
    pub parse_opts: ParseOptions,
    pub serialize_opts: SerializeOptions,
    pub history_limit: usize,
    pub checkpoint_on_edit: bool,
    pub max_payload_bytes: usize,
    pub change_tracker: ChangeTrackerThresholds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            parse_opts: ParseOptions::default(),
            serialize_opts: SerializeOptions::default(),
            history_limit: 100,
            checkpoint_on_edit: true,
            max_payload_bytes: 16384,
            change_tracker: ChangeTrackerThresholds::default(),
        }
    }
}

/// The stateful orchestrator for one open document (spec §4.6). Owns its
/// `Document`, `History`, `pending_checkpoint`, `preview`, and
/// `last_good_preview` exclusively; holds only a shared handle to the
/// signal bus, which it does not own.
pub struct Session<C: Clock> {
    session_id: jido_core::SessionId,
    config: SessionConfig,
    document: Option<Document>,
    disk_snapshot: Option<DiskSnapshot>,
    preview: Option<Preview>,
    last_good_preview: Option<String>,
    last_rendered_body: Option<String>,
    render_fallback_active: bool,
    history: History,
    pending_checkpoint: Option<Checkpoint>,
    locks: HashSet<SessionLock>,
    checkpoint_store: CheckpointStore,
    adapter_registry: RenderAdapterRegistry,
    signal_bus: Arc<SignalBus<C>>,
    clock: C,
}

impl<C: Clock> Session<C> {
    /// Construct a session and run startup reconciliation: if a checkpoint
    /// exists for `session_id`, it is loaded as `pending_checkpoint` and a
    /// `recovery_available` signal is emitted, but never auto-applied.
    pub fn new(
        session_id: jido_core::SessionId,
        config: SessionConfig,
        checkpoint_store: CheckpointStore,
        adapter_registry: RenderAdapterRegistry,
        signal_bus: Arc<SignalBus<C>>,
        clock: C,
    ) -> Result<Self, JidoError> {
        let pending_checkpoint = checkpoint_store.load(&session_id)?;
        let history = History::new(config.history_limit);

        let mut session = Self {
            session_id,
            config,
            document: None,
            disk_snapshot: None,
            preview: None,
            last_good_preview: None,
            last_rendered_body: None,
            render_fallback_active: false,
            history,
            pending_checkpoint: None,
            locks: HashSet::new(),
            checkpoint_store,
            adapter_registry,
            signal_bus,
            clock,
        };

        if let Some(checkpoint) = pending_checkpoint {
            let summary = RecoveryAvailableSummary {
                session_id: session.session_id.as_str().to_string(),
                captured_at_ms: checkpoint.captured_at_ms,
                path: checkpoint.document.path.clone(),
            };
            session.pending_checkpoint = Some(checkpoint);
            session.emit(
                SignalType::Updated,
                json!({ "action": "recovery_available", "payload": summary }),
                None,
            );
        }

        Ok(session)
    }

    pub fn session_id(&self) -> &jido_core::SessionId {
        &self.session_id
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn history_state(&self) -> HistoryStateOutcome {
        self.history.state().into()
    }

    pub fn is_locked(&self, lock: SessionLock) -> bool {
        self.locks.contains(&lock)
    }

    /// Acquire a session-local lock; used by an external async wrapper
    /// (the registry's render scheduler) that spans suspension points this
    /// synchronous session cannot represent on its own. Returns whether it
    /// was newly acquired.
    pub fn acquire_lock(&mut self, lock: SessionLock) -> bool {
        self.locks.insert(lock)
    }

    pub fn release_lock(&mut self, lock: SessionLock) {
        self.locks.remove(&lock);
    }

    fn emit(&self, type_: SignalType, data: Value, correlation_id: Option<CorrelationId>) {
        let opts = BroadcastOpts {
            max_payload_bytes: self.config.max_payload_bytes,
            correlation_id,
        };
        if let Err(e) = self.signal_bus.broadcast(type_, &self.session_id, data, opts) {
            trace!(session_id = %self.session_id, error = %e, "session: signal broadcast rejected");
        }
    }

    fn metadata(&self, action: &str, idempotency: Idempotency, start: std::time::Instant) -> ActionMetadata {
        let duration_us = self.clock.now().saturating_duration_since(start).as_micros() as u64;
        ActionMetadata::new(action, idempotency, duration_us)
    }

    fn ok<T: serde::Serialize>(
        &self,
        value: T,
        action: &str,
        idempotency: Idempotency,
        start: std::time::Instant,
        correlation_id: Option<CorrelationId>,
    ) -> ActionResult<Value> {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        let mut metadata = self.metadata(action, idempotency, start);
        if let Some(id) = correlation_id {
            metadata = metadata.with_correlation_id(id.as_str().to_string());
        }
        ActionResult {
            status: Status::Ok,
            value: Some(value),
            error: None,
            metadata,
        }
    }

    fn err(
        &self,
        error: JidoError,
        action: &str,
        idempotency: Idempotency,
        start: std::time::Instant,
        correlation_id: Option<CorrelationId>,
    ) -> ActionResult<Value> {
        self.emit(
            SignalType::Failed,
            json!({ "action": action, "error": error }),
            correlation_id.clone(),
        );
        let mut metadata = self.metadata(action, idempotency, start);
        if let Some(id) = correlation_id {
            metadata = metadata.with_correlation_id(id.as_str().to_string());
        }
        ActionResult {
            status: Status::Error,
            value: None,
            error: Some(error),
            metadata,
        }
    }

    /// `load {path}` (spec §4.6 row `load`).
    pub fn load(&mut self, params: LoadParams, correlation_id: Option<CorrelationId>) -> ActionResult<Value> {
        let start = self.clock.now();
        let action = "load";

        let resolved = match jido_core::resolve_path(&params.path, &self.config.workspace_root) {
            Ok(p) => p,
            Err(e) => return self.err(e, action, Idempotency::Idempotent, start, correlation_id),
        };

        let (document, snapshot) = match fs::read_to_string(&resolved) {
            Ok(raw) => {
                let parsed = match Document::parse(&raw, self.config.parse_opts) {
                    Ok(mut d) => {
                        d.path = Some(resolved.clone());
                        d
                    }
                    Err(e) => return self.err(e, action, Idempotency::Idempotent, start, correlation_id),
                };
                let snapshot = match DiskSnapshot::capture(&resolved) {
                    Ok(s) => Some(s),
                    Err(e) => return self.err(e, action, Idempotency::Idempotent, start, correlation_id),
                };
                (parsed, snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (Document::blank(Some(resolved.clone()), None), None)
            }
            Err(e) => {
                return self.err(
                    JidoError::filesystem(format!("read failed: {e}")),
                    action,
                    Idempotency::Idempotent,
                    start,
                    correlation_id,
                )
            }
        };

        let revision = document.revision;
        self.document = Some(document);
        self.disk_snapshot = snapshot;
        self.history.clear();
        self.preview = None;
        self.last_good_preview = None;
        self.last_rendered_body = None;
        self.render_fallback_active = false;

        self.emit(
            SignalType::Loaded,
            json!({ "path": resolved }),
            correlation_id.clone(),
        );
        self.ok(
            LoadOutcome {
                revision,
                path: Some(resolved),
            },
            action,
            Idempotency::Idempotent,
            start,
            correlation_id,
        )
    }

    /// `save {..}` (spec §4.6 row `save`).
    pub fn save(&mut self, mut params: SaveParams, correlation_id: Option<CorrelationId>) -> ActionResult<Value> {
        let start = self.clock.now();
        let action = "save";
        let idempotency = Idempotency::ConditionallyIdempotent;

        if self.is_locked(SessionLock::Save) || self.is_locked(SessionLock::Render) {
            return self.err(JidoError::busy("save refused: lock held"), action, idempotency, start, correlation_id);
        }
        let Some(document) = self.document.clone() else {
            return self.err(JidoError::invalid_params("no document loaded"), action, idempotency, start, correlation_id);
        };
        let Some(path) = params.path.clone().or_else(|| document.path.clone()) else {
            return self.err(JidoError::invalid_params("save requires a path"), action, idempotency, start, correlation_id);
        };

        self.acquire_lock(SessionLock::Save);
        let result = self.save_locked(&document, &path, &mut params, correlation_id.clone());
        self.release_lock(SessionLock::Save);

        match result {
            Ok(outcome) => {
                self.emit(SignalType::Saved, json!({ "path": path }), correlation_id.clone());
                self.ok(outcome, action, idempotency, start, correlation_id)
            }
            Err(e) => self.err(e, action, idempotency, start, correlation_id),
        }
    }

    fn save_locked(
        &mut self,
        document: &Document,
        path: &PathBuf,
        params: &mut SaveParams,
        _correlation_id: Option<CorrelationId>,
    ) -> Result<SaveOutcome, JidoError> {
        if let Some(policy) = &params.safety {
            let findings = safety::scan(policy, &document.body);
            if policy.blocks(&findings) {
                return Err(JidoError::validation_failed("save blocked by safety policy")
                    .with_details(json!({ "findings": findings })));
            }
        }

        let baseline = params.baseline.as_ref().or(self.disk_snapshot.as_ref());
        let mut body = document.clone();
        match detect_divergence(path, baseline)? {
            Divergence::Ok => {}
            Divergence::Conflict {
                baseline_hash,
                current_hash,
            } => match params.on_conflict {
                OnConflict::Overwrite => {}
                OnConflict::MergeHook => {
                    let Some(hook) = params.merge_hook.take() else {
                        return Err(JidoError::conflict("save diverged, no merge_hook supplied")
                            .with_details(json!({ "baseline_hash": baseline_hash, "current_hash": current_hash }))
                            .with_remediation(&["reload", "overwrite", "merge_hook"]));
                    };
                    let current_text = fs::read_to_string(path)
                        .map_err(|e| JidoError::filesystem(format!("read failed: {e}")))?;
                    match hook(&current_text, &body.body) {
                        Some(merged) => body.update_body(merged)?,
                        None => {
                            return Err(JidoError::conflict("merge_hook declined")
                                .with_details(json!({ "baseline_hash": baseline_hash, "current_hash": current_hash }))
                                .with_remediation(&["reload", "overwrite", "merge_hook"]))
                        }
                    }
                }
                OnConflict::Reject => {
                    return Err(JidoError::conflict("save target diverged from baseline")
                        .with_details(json!({ "baseline_hash": baseline_hash, "current_hash": current_hash }))
                        .with_remediation(&["reload", "overwrite", "merge_hook"]));
                }
            },
        }

        let bytes = body.serialize(self.config.serialize_opts)?;
        let write_opts = AtomicWriteOptions {
            preserve_metadata: params.preserve_metadata,
        };
        let snapshot = atomic_write(path, bytes.as_bytes(), &write_opts)?;

        if let Some(metadata) = params.revision_metadata.take() {
            if let Err(e) = write_revision_sidecar(path, metadata) {
                trace!(session_id = %self.session_id, error = %e, "session: revision sidecar write failed");
            }
        }

        let mut saved_document = body;
        saved_document.mark_clean();
        saved_document.path = Some(path.clone());
        let revision = saved_document.revision;
        self.document = Some(saved_document);
        self.disk_snapshot = Some(snapshot.clone());

        if let Err(e) = self.checkpoint_store.discard(&self.session_id) {
            trace!(session_id = %self.session_id, error = %e, "session: checkpoint discard failed");
        }
        self.pending_checkpoint = None;

        Ok(SaveOutcome {
            revision,
            path: path.clone(),
            disk_snapshot: snapshot,
        })
    }

    /// `update_frontmatter {changes, mode}` (spec §4.6 row `update_frontmatter`).
    pub fn update_frontmatter(
        &mut self,
        params: UpdateFrontmatterParams,
        correlation_id: Option<CorrelationId>,
    ) -> ActionResult<Value> {
        self.apply_update("update_frontmatter", params.optimistic, correlation_id, |doc| {
            doc.update_frontmatter(params.changes.clone(), params.mode)
        })
    }

    /// `update_body {body | patch}` (spec §4.6 row `update_body`).
    pub fn update_body(&mut self, params: UpdateBodyParams, correlation_id: Option<CorrelationId>) -> ActionResult<Value> {
        let UpdateBodyParams { patch, optimistic } = params;
        self.apply_update("update_body", optimistic, correlation_id, move |doc| {
            doc.apply_body_patch(patch)
        })
    }

    fn apply_update(
        &mut self,
        action: &str,
        optimistic: bool,
        correlation_id: Option<CorrelationId>,
        mutate: impl FnOnce(&mut Document) -> Result<(), JidoError>,
    ) -> ActionResult<Value> {
        let start = self.clock.now();
        let idempotency = Idempotency::ConditionallyIdempotent;

        if self.is_locked(SessionLock::Save) {
            return self.err(JidoError::busy(format!("{action} refused: save lock held")), action, idempotency, start, correlation_id);
        }
        let Some(previous) = self.document.clone() else {
            return self.err(JidoError::invalid_params("no document loaded"), action, idempotency, start, correlation_id);
        };
        let mut document = previous.clone();

        let before_revision = document.revision;
        let result = mutate(&mut document);
        match result {
            Ok(()) => {
                let changed = document.revision != before_revision;
                if changed {
                    self.history.record(previous, action, "session");
                }
                let revision = document.revision;
                let dirty = document.dirty;
                self.document = Some(document);
                self.emit(
                    SignalType::Updated,
                    json!({ "action": action, "revision": revision, "changed": changed }),
                    correlation_id.clone(),
                );
                self.ok(
                    UpdateOutcome {
                        revision,
                        dirty,
                        changed,
                    },
                    action,
                    idempotency,
                    start,
                    correlation_id,
                )
            }
            Err(e) => {
                if optimistic {
                    trace!(session_id = %self.session_id, %action, "session: optimistic rollback");
                }
                self.err(e, action, idempotency, start, correlation_id)
            }
        }
    }

    /// `render {..}` (spec §4.6 row `render`). Always runs the adapter
    /// inline and always returns `ok`: a renderer error or missing adapter
    /// is absorbed into a fallback preview (spec §7).
    pub fn render(&mut self, params: RenderParams, correlation_id: Option<CorrelationId>) -> ActionResult<Value> {
        let start = self.clock.now();
        let action = "render";
        let idempotency = Idempotency::Idempotent;

        let handle = match self.begin_render(params) {
            Ok(h) => h,
            Err(e) => return self.err(e, action, idempotency, start, correlation_id),
        };

        let preview = resolve_and_render(
            &self.adapter_registry,
            &handle.markdown,
            &handle.render_opts,
            self.config.change_tracker,
        );
        self.release_lock(SessionLock::Render);

        self.finish_render(preview, &handle.markdown, action, idempotency, start, correlation_id)
    }

    /// Pre-flight for both the synchronous [`Session::render`] path and the
    /// registry-driven async path: lock/document/safety checks, filling in
    /// `previous_body`/`last_good_preview` defaults, and acquiring the
    /// render lock. The caller is responsible for releasing the lock
    /// (directly for the sync path, via [`Session::complete_async_render`]
    /// for the async one).
    pub fn begin_render(&mut self, mut params: RenderParams) -> Result<AsyncRenderHandle, JidoError> {
        if self.is_locked(SessionLock::Render) {
            return Err(JidoError::busy("render refused: render lock held"));
        }
        let Some(document) = self.document.clone() else {
            return Err(JidoError::invalid_params("no document loaded"));
        };

        if let Some(policy) = &params.safety {
            let findings = safety::scan(policy, &document.body);
            if policy.blocks(&findings) {
                return Err(JidoError::validation_failed("render blocked by safety policy")
                    .with_details(json!({ "findings": findings })));
            }
        }

        if params.render_opts.previous_body.is_none() {
            params.render_opts.previous_body = self.last_rendered_body.clone();
        }
        if params.render_opts.last_good_preview.is_none() {
            params.render_opts.last_good_preview = self.last_good_preview.clone();
        }

        self.acquire_lock(SessionLock::Render);
        Ok(AsyncRenderHandle {
            revision: document.revision,
            markdown: document.body,
            render_opts: params.render_opts,
        })
    }

    /// Apply a render result obtained off-session (the registry's shared
    /// [`jido_render::RenderQueue`]). Returns `None` if `expected_revision`
    /// no longer matches the loaded document: a newer edit arrived while
    /// the job was in flight and the result is discarded as stale (spec
    /// §5 "Ordering guarantees" only promises last-writer-wins across
    /// *enqueued* jobs, not in-flight ones).
    pub fn complete_async_render(
        &mut self,
        expected_revision: u64,
        outcome: Result<Preview, JidoError>,
        correlation_id: Option<CorrelationId>,
    ) -> Option<ActionResult<Value>> {
        let start = self.clock.now();
        let idempotency = Idempotency::Idempotent;
        self.release_lock(SessionLock::Render);

        let Some(body) = self
            .document
            .as_ref()
            .filter(|d| d.revision == expected_revision)
            .map(|d| d.body.clone())
        else {
            trace!(session_id = %self.session_id, expected_revision, "session: dropping stale async render result");
            return None;
        };

        Some(match outcome {
            Ok(preview) => self.finish_render(preview, &body, "render", idempotency, start, correlation_id),
            Err(e) => self.err(e, "render", idempotency, start, correlation_id),
        })
    }

    fn finish_render(
        &mut self,
        preview: Preview,
        rendered_body: &str,
        action: &str,
        idempotency: Idempotency,
        start: std::time::Instant,
        correlation_id: Option<CorrelationId>,
    ) -> ActionResult<Value> {
        let was_fallback = self.render_fallback_active;
        if preview.metadata.fallback {
            self.render_fallback_active = true;
            self.emit(
                SignalType::Failed,
                json!({ "action": action, "error": { "code": "render_failed", "message": "renderer unavailable, served fallback" } }),
                correlation_id.clone(),
            );
            self.emit(
                SignalType::Rendered,
                json!({ "action": action, "fallback": true }),
                correlation_id.clone(),
            );
        } else {
            self.last_good_preview = Some(preview.html.clone());
            self.last_rendered_body = Some(rendered_body.to_string());
            if was_fallback {
                self.render_fallback_active = false;
                self.emit(
                    SignalType::Updated,
                    json!({ "action": "render_recovered" }),
                    correlation_id.clone(),
                );
            }
            self.emit(
                SignalType::Rendered,
                json!({ "action": action, "fallback": false }),
                correlation_id.clone(),
            );
        }

        self.preview = Some(preview.clone());
        self.ok(RenderOutcome::from(preview), action, idempotency, start, correlation_id)
    }

    /// `undo` (spec §4.6 row `undo`).
    pub fn undo(&mut self, correlation_id: Option<CorrelationId>) -> ActionResult<Value> {
        self.shift_history("undo", correlation_id, |history, current| history.undo(current))
    }

    /// `redo` (spec §4.6 row `redo`).
    pub fn redo(&mut self, correlation_id: Option<CorrelationId>) -> ActionResult<Value> {
        self.shift_history("redo", correlation_id, |history, current| history.redo(current))
    }

    fn shift_history(
        &mut self,
        action: &str,
        correlation_id: Option<CorrelationId>,
        step: impl FnOnce(&mut History, Document) -> Result<Document, JidoError>,
    ) -> ActionResult<Value> {
        let start = self.clock.now();
        let idempotency = Idempotency::ConditionallyIdempotent;

        if self.is_locked(SessionLock::Save) {
            return self.err(JidoError::busy(format!("{action} refused: save lock held")), action, idempotency, start, correlation_id);
        }
        let Some(current) = self.document.clone() else {
            return self.err(JidoError::invalid_params("no document loaded"), action, idempotency, start, correlation_id);
        };

        match step(&mut self.history, current) {
            Ok(restored) => {
                let revision = restored.revision;
                self.document = Some(restored);
                self.emit(SignalType::Updated, json!({ "action": action, "revision": revision }), correlation_id.clone());
                let history_state: HistoryStateOutcome = self.history.state().into();
                self.emit(
                    SignalType::Updated,
                    json!({ "action": "history_state", "payload": history_state }),
                    correlation_id.clone(),
                );
                self.ok(
                    UndoRedoOutcome {
                        revision,
                        history: self.history.state().into(),
                    },
                    action,
                    idempotency,
                    start,
                    correlation_id,
                )
            }
            Err(e) => self.err(e, action, idempotency, start, correlation_id),
        }
    }

    /// `recover(force?)` (spec §4.7).
    pub fn recover(&mut self, params: RecoverParams, correlation_id: Option<CorrelationId>) -> ActionResult<Value> {
        let start = self.clock.now();
        let action = "recover";
        let idempotency = Idempotency::NonIdempotent;

        let Some(checkpoint) = self.pending_checkpoint.clone() else {
            return self.err(JidoError::not_found("no pending checkpoint"), action, idempotency, start, correlation_id);
        };

        if !params.force {
            if let (Some(path), Some(snapshot)) = (&checkpoint.document.path, &checkpoint.disk_snapshot) {
                match detect_divergence(path, Some(snapshot)) {
                    Ok(Divergence::Ok) => {}
                    Ok(Divergence::Conflict { baseline_hash, current_hash }) => {
                        return self.err(
                            JidoError::conflict("checkpoint diverged from disk")
                                .with_details(json!({ "baseline_hash": baseline_hash, "current_hash": current_hash }))
                                .with_remediation(&["force_recover", "discard", "reload"]),
                            action,
                            idempotency,
                            start,
                            correlation_id,
                        );
                    }
                    Err(e) => return self.err(e, action, idempotency, start, correlation_id),
                }
            }
        }

        if let Err(e) = self.checkpoint_store.discard(&self.session_id) {
            trace!(session_id = %self.session_id, error = %e, "session: checkpoint discard on recover failed");
        }

        if let Some(previous) = self.document.take() {
            self.history.clear();
            self.history.record(previous, "load", "recover");
        } else {
            self.history.clear();
        }

        let revision = checkpoint.document.revision;
        let path = checkpoint.document.path.clone();
        self.document = Some(checkpoint.document);
        self.disk_snapshot = checkpoint.disk_snapshot;
        self.preview = None;
        self.last_good_preview = None;
        self.last_rendered_body = None;
        self.render_fallback_active = false;
        self.pending_checkpoint = None;

        self.emit(SignalType::Updated, json!({ "action": "recovered" }), correlation_id.clone());
        self.ok(RecoverOutcome { revision, path }, action, idempotency, start, correlation_id)
    }

    /// `discard_recovery` — drop the pending checkpoint without applying it.
    pub fn discard_recovery(&mut self, correlation_id: Option<CorrelationId>) -> ActionResult<Value> {
        let start = self.clock.now();
        let action = "discard_recovery";
        let idempotency = Idempotency::Idempotent;

        if self.pending_checkpoint.is_none() {
            return self.err(JidoError::not_found("no pending checkpoint"), action, idempotency, start, correlation_id);
        }
        if let Err(e) = self.checkpoint_store.discard(&self.session_id) {
            return self.err(e, action, idempotency, start, correlation_id);
        }
        self.pending_checkpoint = None;
        self.emit(SignalType::Updated, json!({ "action": "recovery_discarded" }), correlation_id.clone());
        self.ok(Value::Null, action, idempotency, start, correlation_id)
    }

    /// Write a checkpoint if the document is dirty and `checkpoint_on_edit`
    /// is enabled. Write failures never fail the triggering command; they
    /// emit a diagnostic `failed` signal (spec §4.7).
    pub fn maybe_checkpoint(&mut self) {
        if !self.config.checkpoint_on_edit {
            return;
        }
        let Some(document) = &self.document else { return };
        if !document.dirty {
            return;
        }
        let checkpoint = Checkpoint::new(self.session_id.clone(), document.clone(), self.disk_snapshot.clone());
        if let Err(e) = self.checkpoint_store.write(&checkpoint) {
            self.emit(
                SignalType::Failed,
                json!({ "action": "checkpoint_write", "error": e }),
                None,
            );
        } else {
            self.pending_checkpoint = Some(checkpoint);
        }
    }

    /// Flush a best-effort `session_closed` signal. Does not cancel any
    /// in-flight command (there cannot be one under `&mut self`).
    pub fn close(&mut self) {
        let history_size = self.history.state().undo_depth + self.history.state().redo_depth;
        let revision = self.document.as_ref().map(|d| d.revision).unwrap_or(0);
        self.emit(
            SignalType::SessionClosed,
            json!({ "history_size": history_size, "revision": revision }),
            None,
        );
    }

    pub fn subscribe(&self) -> (jido_signals::SubscriberId, tokio::sync::mpsc::UnboundedReceiver<jido_signals::Signal>) {
        self.signal_bus.subscribe(&self.session_id)
    }

    pub fn unsubscribe(&self, id: jido_signals::SubscriberId) {
        self.signal_bus.unsubscribe(&self.session_id, id);
    }
}

/// Mirrors [`jido_render::RenderQueue`]'s inline render-then-fallback path
/// (spec §4.5), without the debounce/supersede scheduling that belongs to
/// the shared async queue. Never returns an error: adapter failure and a
/// missing adapter both degrade to a fallback preview.
fn resolve_and_render(
    registry: &RenderAdapterRegistry,
    markdown: &str,
    opts: &RenderOpts,
    thresholds: ChangeTrackerThresholds,
) -> Preview {
    let Some(adapter) = registry.resolve(opts.adapter.as_deref()) else {
        return jido_render::synthesize_fallback(opts.last_good_preview.as_deref(), markdown);
    };

    match adapter.render(markdown) {
        Ok(html) => {
            let (decision, changed_lines, total_lines) =
                decide(opts.previous_body.as_deref(), markdown, thresholds);
            Preview {
                html,
                metadata: PreviewMetadata {
                    adapter: adapter.name().to_string(),
                    fallback: false,
                    decision,
                    changed_lines,
                    total_lines,
                },
            }
        }
        Err(_) => jido_render::synthesize_fallback(opts.last_good_preview.as_deref(), markdown),
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
