//! The cross-session registry (spec §4.8): deterministic session lookup,
//! optimistic lock arbitration, idle reclamation, and the single shared
//! render queue every session's asynchronous render delegates to.
//!
//! All mutation is serialized through the registry's own mutexes (spec
//! §5 "shared-resource policy") — `Session` itself has no internal
//! synchronization and is only ever touched while a registry lock is held.

use crate::lock::{LockGrant, LockState};
use jido_core::{ActionResult, Clock, CorrelationId, JidoError, LockToken, SessionId, Status};
use jido_render::{Preview, RenderAdapterRegistry, RenderNotify, RenderQueue, RenderQueueConfig};
use jido_session::{
    LoadParams, RecoverParams, RenderParams, SaveParams, Session, SessionConfig, SessionLock,
    UpdateBodyParams, UpdateFrontmatterParams,
};
use jido_signals::{BroadcastOpts, SignalBus, SignalType};
use jido_storage::CheckpointStore;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;
use uuid::Uuid;

/// Caller-supplied hints for `ensure_session`/`ensure_session_by_path`.
/// Currently empty; kept as a struct so the signature can grow (spec
/// §4.8 leaves the option open) without breaking callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsureSessionOpts {}

#[derive(Debug, Clone)]
pub struct SessionRegistryConfig {
    /// Template applied to every session the registry opens.
    pub session: SessionConfig,
    pub render_queue: RenderQueueConfig,
    /// How long a session may go untouched before idle reclamation closes it.
    pub idle_timeout: Duration,
    /// How often the idle-reclamation sweep runs.
    pub idle_sweep_interval: Duration,
    /// How often the shared render queue is polled for due jobs.
    pub render_poll_interval: Duration,
}

impl Default for SessionRegistryConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            render_queue: RenderQueueConfig::default(),
            idle_timeout: Duration::from_secs(30 * 60),
            idle_sweep_interval: Duration::from_secs(60),
            render_poll_interval: Duration::from_millis(50),
        }
    }
}

struct SessionEntry<C: Clock> {
    session: Session<C>,
    lock: LockState,
    last_seen_ms: u64,
}

/// Joins the two background tasks a live registry drives. Dropping this
/// aborts both; hold onto it for the registry's lifetime.
pub struct BackgroundHandles {
    idle_reclaim: tokio::task::JoinHandle<()>,
    render_poll: tokio::task::JoinHandle<()>,
}

impl Drop for BackgroundHandles {
    fn drop(&mut self) {
        self.idle_reclaim.abort();
        self.render_poll.abort();
    }
}

pub struct SessionRegistry<C: Clock> {
    sessions: Mutex<HashMap<SessionId, SessionEntry<C>>>,
    paths: Mutex<HashMap<PathBuf, SessionId>>,
    pending_render_correlation: Mutex<HashMap<SessionId, Option<CorrelationId>>>,
    checkpoint_store: CheckpointStore,
    adapter_registry: RenderAdapterRegistry,
    signal_bus: Arc<SignalBus<C>>,
    render_queue: Mutex<RenderQueue<C>>,
    telemetry: Arc<dyn jido_core::TelemetrySink>,
    config: SessionRegistryConfig,
    clock: C,
}

impl<C: Clock + 'static> SessionRegistry<C> {
    pub fn new(
        checkpoint_dir: impl Into<PathBuf>,
        adapter_registry: RenderAdapterRegistry,
        telemetry: Arc<dyn jido_core::TelemetrySink>,
        clock: C,
        config: SessionRegistryConfig,
    ) -> Arc<Self> {
        let signal_bus = Arc::new(SignalBus::new(clock.clone()));
        let render_queue = RenderQueue::new(adapter_registry.clone(), clock.clone(), config.render_queue);
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            paths: Mutex::new(HashMap::new()),
            pending_render_correlation: Mutex::new(HashMap::new()),
            checkpoint_store: CheckpointStore::new(checkpoint_dir),
            adapter_registry,
            signal_bus,
            render_queue: Mutex::new(render_queue),
            telemetry,
            config,
            clock,
        })
    }

    /// Spawn the idle-reclamation sweep and the render-queue poll loop.
    /// The returned handle aborts both tasks on drop.
    pub fn spawn_background_tasks(self: &Arc<Self>) -> BackgroundHandles {
        BackgroundHandles {
            idle_reclaim: Arc::clone(self).spawn_idle_reclaim(),
            render_poll: Arc::clone(self).spawn_render_poll(),
        }
    }

    fn spawn_idle_reclaim(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = self.config.idle_sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.reclaim_idle_sessions();
            }
        })
    }

    fn spawn_render_poll(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = self.config.render_poll_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.poll_render_queue_once();
            }
        })
    }

    /// Drive one pass of the shared render queue synchronously, delivering
    /// any due job through [`RenderNotify`]. [`Self::spawn_background_tasks`]
    /// does this on a timer; exposed directly for callers that want to pump
    /// it themselves.
    pub fn poll_render_queue_once(&self) {
        self.render_queue.lock().poll(self);
    }

    /// `ensure_session(id, opts)` (spec §4.8).
    pub fn ensure_session(&self, session_id: SessionId, opts: EnsureSessionOpts) -> Result<(), JidoError> {
        let _ = opts;
        self.ensure_internal(session_id, None)
    }

    /// `ensure_session_by_path(path, opts)` (spec §4.8): resolves `path`
    /// against the registry's workspace root, derives its deterministic
    /// session id, and ensures a session for it.
    pub fn ensure_session_by_path(&self, path: &Path, opts: EnsureSessionOpts) -> Result<SessionId, JidoError> {
        let _ = opts;
        let resolved = jido_core::resolve_path(path, &self.config.session.workspace_root)?;
        let session_id = SessionId::for_path(&resolved);
        self.ensure_internal(session_id.clone(), Some(resolved))?;
        Ok(session_id)
    }

    fn ensure_internal(&self, session_id: SessionId, path_hint: Option<PathBuf>) -> Result<(), JidoError> {
        let now = self.clock.epoch_ms();
        {
            let mut sessions = self.sessions.lock();
            if let Some(entry) = sessions.get_mut(&session_id) {
                entry.last_seen_ms = now;
                return Ok(());
            }
            let session = Session::new(
                session_id.clone(),
                self.config.session.clone(),
                self.checkpoint_store.clone(),
                self.adapter_registry.clone(),
                Arc::clone(&self.signal_bus),
                self.clock.clone(),
            )?;
            sessions.insert(
                session_id.clone(),
                SessionEntry {
                    session,
                    lock: LockState::default(),
                    last_seen_ms: now,
                },
            );
        }
        if let Some(path) = path_hint {
            self.paths.lock().insert(path, session_id);
        }
        Ok(())
    }

    pub fn session_id_for_path(&self, path: &Path) -> Option<SessionId> {
        self.paths.lock().get(path).cloned()
    }

    fn dispatch(
        &self,
        session_id: &SessionId,
        f: impl FnOnce(&mut Session<C>) -> ActionResult<Value>,
    ) -> Result<ActionResult<Value>, JidoError> {
        let result = {
            let mut sessions = self.sessions.lock();
            let entry = sessions
                .get_mut(session_id)
                .ok_or_else(|| JidoError::not_found("unknown session"))?;
            entry.last_seen_ms = self.clock.epoch_ms();
            let result = f(&mut entry.session);
            entry.session.maybe_checkpoint();
            result
        };
        self.record_telemetry(session_id, &result);
        Ok(result)
    }

    fn record_telemetry(&self, session_id: &SessionId, result: &ActionResult<Value>) {
        let status = match result.status {
            Status::Ok => "ok",
            Status::Error => "error",
        };
        self.telemetry.record(jido_core::ActionTelemetry {
            event: result.metadata.action.clone(),
            duration_us: result.metadata.duration_us,
            status: status.to_string(),
            session_id: session_id.as_str().to_string(),
            correlation_id: result.metadata.correlation_id.clone(),
        });
    }

    pub fn load(
        &self,
        session_id: &SessionId,
        params: LoadParams,
        correlation_id: Option<CorrelationId>,
    ) -> Result<ActionResult<Value>, JidoError> {
        self.dispatch(session_id, |s| s.load(params, correlation_id))
    }

    pub fn save(
        &self,
        session_id: &SessionId,
        params: SaveParams,
        correlation_id: Option<CorrelationId>,
    ) -> Result<ActionResult<Value>, JidoError> {
        self.dispatch(session_id, |s| s.save(params, correlation_id))
    }

    pub fn update_frontmatter(
        &self,
        session_id: &SessionId,
        params: UpdateFrontmatterParams,
        correlation_id: Option<CorrelationId>,
    ) -> Result<ActionResult<Value>, JidoError> {
        self.dispatch(session_id, |s| s.update_frontmatter(params, correlation_id))
    }

    pub fn update_body(
        &self,
        session_id: &SessionId,
        params: UpdateBodyParams,
        correlation_id: Option<CorrelationId>,
    ) -> Result<ActionResult<Value>, JidoError> {
        self.dispatch(session_id, |s| s.update_body(params, correlation_id))
    }

    pub fn undo(&self, session_id: &SessionId, correlation_id: Option<CorrelationId>) -> Result<ActionResult<Value>, JidoError> {
        self.dispatch(session_id, |s| s.undo(correlation_id))
    }

    pub fn redo(&self, session_id: &SessionId, correlation_id: Option<CorrelationId>) -> Result<ActionResult<Value>, JidoError> {
        self.dispatch(session_id, |s| s.redo(correlation_id))
    }

    /// Synchronous render, bypassing the shared queue's debounce. Useful
    /// for callers that need a preview immediately (spec §4.5's inline
    /// path); most callers should prefer [`Self::async_render`].
    pub fn render(
        &self,
        session_id: &SessionId,
        params: RenderParams,
        correlation_id: Option<CorrelationId>,
    ) -> Result<ActionResult<Value>, JidoError> {
        self.dispatch(session_id, |s| s.render(params, correlation_id))
    }

    pub fn recover(
        &self,
        session_id: &SessionId,
        params: RecoverParams,
        correlation_id: Option<CorrelationId>,
    ) -> Result<ActionResult<Value>, JidoError> {
        self.dispatch(session_id, |s| s.recover(params, correlation_id))
    }

    pub fn discard_recovery(
        &self,
        session_id: &SessionId,
        correlation_id: Option<CorrelationId>,
    ) -> Result<ActionResult<Value>, JidoError> {
        self.dispatch(session_id, |s| s.discard_recovery(correlation_id))
    }

    /// Schedule a debounced render on the shared queue (spec §4.5, §5).
    /// Returns once the job is enqueued; the result is delivered later,
    /// asynchronously, through [`Session::complete_async_render`] driven
    /// by the registry's render-poll task and observable on the signal
    /// bus. Supersedes any job already pending for this session.
    pub fn async_render(
        &self,
        session_id: &SessionId,
        params: RenderParams,
        correlation_id: Option<CorrelationId>,
    ) -> Result<(), JidoError> {
        let handle = {
            let mut sessions = self.sessions.lock();
            let entry = sessions
                .get_mut(session_id)
                .ok_or_else(|| JidoError::not_found("unknown session"))?;
            entry.last_seen_ms = self.clock.epoch_ms();
            entry.session.begin_render(params)?
        };

        let enqueued = self.render_queue.lock().enqueue(
            session_id.clone(),
            handle.revision,
            handle.markdown,
            handle.render_opts,
        );

        if let Err(e) = enqueued {
            let mut sessions = self.sessions.lock();
            if let Some(entry) = sessions.get_mut(session_id) {
                entry.session.release_lock(SessionLock::Render);
            }
            return Err(e);
        }

        self.pending_render_correlation
            .lock()
            .insert(session_id.clone(), correlation_id);
        Ok(())
    }

    /// `acquire_lock(id, owner, {expected_token?, rotate_token?})` (spec
    /// §4.8). Emits the `updated{action: lock_state}` signal before
    /// returning, per spec §5's ordering guarantee.
    pub fn acquire_lock(
        &self,
        session_id: &SessionId,
        owner: &str,
        expected_token: Option<&LockToken>,
        rotate_token: bool,
        correlation_id: Option<CorrelationId>,
    ) -> Result<LockGrant, JidoError> {
        let unique = Uuid::new_v4().to_string();
        let grant = {
            let mut sessions = self.sessions.lock();
            let entry = sessions
                .get_mut(session_id)
                .ok_or_else(|| JidoError::not_found("unknown session"))?;
            let grant = entry
                .lock
                .acquire(owner, expected_token, rotate_token, || {
                    LockToken::derive(session_id, owner, &unique)
                })?;
            entry.last_seen_ms = self.clock.epoch_ms();
            grant
        };
        self.emit_lock_signal(
            session_id,
            json!({
                "action": "granted",
                "owner": grant.owner,
                "lock_revision": grant.lock_revision,
                "previous_owner": grant.previous_owner,
            }),
            correlation_id,
        );
        Ok(grant)
    }

    /// `validate_lock(id, token)` (spec §4.8).
    pub fn validate_lock(&self, session_id: &SessionId, token: &LockToken) -> Result<(), JidoError> {
        let sessions = self.sessions.lock();
        let entry = sessions
            .get(session_id)
            .ok_or_else(|| JidoError::not_found("unknown session"))?;
        entry.lock.validate(token)
    }

    /// `release_lock(id, token)` (spec §4.8).
    pub fn release_lock(
        &self,
        session_id: &SessionId,
        token: &LockToken,
        correlation_id: Option<CorrelationId>,
    ) -> Result<(), JidoError> {
        let lock_revision = {
            let mut sessions = self.sessions.lock();
            let entry = sessions
                .get_mut(session_id)
                .ok_or_else(|| JidoError::not_found("unknown session"))?;
            entry.lock.release(token)?;
            entry.lock.lock_revision()
        };
        self.emit_lock_signal(
            session_id,
            json!({ "action": "released", "owner": Value::Null, "lock_revision": lock_revision }),
            correlation_id,
        );
        Ok(())
    }

    /// `force_takeover(id, new_owner, reason?)` (spec §4.8).
    pub fn force_takeover(
        &self,
        session_id: &SessionId,
        new_owner: &str,
        reason: Option<&str>,
        correlation_id: Option<CorrelationId>,
    ) -> Result<LockGrant, JidoError> {
        let unique = Uuid::new_v4().to_string();
        let grant = {
            let mut sessions = self.sessions.lock();
            let entry = sessions
                .get_mut(session_id)
                .ok_or_else(|| JidoError::not_found("unknown session"))?;
            let grant = entry
                .lock
                .force_takeover(new_owner, || LockToken::derive(session_id, new_owner, &unique));
            entry.last_seen_ms = self.clock.epoch_ms();
            grant
        };
        self.emit_lock_signal(
            session_id,
            json!({
                "action": "takeover",
                "owner": grant.owner,
                "lock_revision": grant.lock_revision,
                "previous_owner": grant.previous_owner,
                "reason": reason,
            }),
            correlation_id,
        );
        Ok(grant)
    }

    fn emit_lock_signal(&self, session_id: &SessionId, payload: Value, correlation_id: Option<CorrelationId>) {
        let opts = BroadcastOpts {
            max_payload_bytes: self.config.session.max_payload_bytes,
            correlation_id,
        };
        if let Err(e) = self
            .signal_bus
            .broadcast(SignalType::Updated, session_id, json!({ "action": "lock_state", "payload": payload }), opts)
        {
            trace!(session_id = %session_id, error = %e, "registry: lock-state signal broadcast rejected");
        }
    }

    pub fn subscribe(
        &self,
        session_id: &SessionId,
    ) -> Result<(jido_signals::SubscriberId, tokio::sync::mpsc::UnboundedReceiver<jido_signals::Signal>), JidoError> {
        let sessions = self.sessions.lock();
        let entry = sessions
            .get(session_id)
            .ok_or_else(|| JidoError::not_found("unknown session"))?;
        Ok(entry.session.subscribe())
    }

    pub fn unsubscribe(&self, session_id: &SessionId, id: jido_signals::SubscriberId) {
        if let Some(entry) = self.sessions.lock().get(session_id) {
            entry.session.unsubscribe(id);
        }
    }

    fn reclaim_idle_sessions(&self) {
        let now = self.clock.epoch_ms();
        let timeout_ms = self.config.idle_timeout.as_millis() as u64;
        let idle: Vec<SessionId> = {
            let sessions = self.sessions.lock();
            sessions
                .iter()
                .filter(|(_, entry)| now.saturating_sub(entry.last_seen_ms) >= timeout_ms)
                .map(|(id, _)| id.clone())
                .collect()
        };
        for session_id in idle {
            trace!(session_id = %session_id, "registry: reclaiming idle session");
            self.terminate_session(&session_id);
        }
    }

    /// Remove and close a session. Any pending checkpoint is left on disk
    /// for later recovery (spec §5): this never calls the checkpoint
    /// store's `discard`.
    fn terminate_session(&self, session_id: &SessionId) {
        let removed = self.sessions.lock().remove(session_id);
        let Some(mut entry) = removed else { return };
        entry.session.close();
        self.render_queue.lock().cancel(session_id);
        self.pending_render_correlation.lock().remove(session_id);
        self.paths.lock().retain(|_, v| v.as_str() != session_id.as_str());
    }
}

impl<C: Clock> RenderNotify for SessionRegistry<C> {
    fn notify(&self, session_id: &SessionId, revision: u64, outcome: Result<Preview, JidoError>) {
        let correlation_id = self.pending_render_correlation.lock().remove(session_id).flatten();
        let result = {
            let mut sessions = self.sessions.lock();
            let Some(entry) = sessions.get_mut(session_id) else {
                return;
            };
            entry.session.complete_async_render(revision, outcome, correlation_id)
        };
        if let Some(result) = result {
            self.record_telemetry(session_id, &result);
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
