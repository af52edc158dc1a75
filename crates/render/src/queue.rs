//! Debounced, single-latest-per-session render scheduler (spec §4.5).

use crate::adapter::{Preview, PreviewMetadata, RenderAdapterRegistry, RenderOpts};
use crate::change_tracker::{self, ChangeDecision, ChangeTrackerThresholds};
use crate::fallback::synthesize_fallback;
use jido_core::{Clock, JidoError, SessionId};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
pub struct RenderQueueConfig {
    pub debounce: Duration,
    pub max_queue_size: usize,
    pub thresholds: ChangeTrackerThresholds,
}

impl Default for RenderQueueConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(120),
            max_queue_size: 64,
            thresholds: ChangeTrackerThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderQueueCounters {
    pub queue_enqueued: u64,
    pub queue_canceled: u64,
    pub queue_dropped: u64,
    pub queue_completed: u64,
    pub incremental_selected: u64,
    pub full_selected: u64,
}

pub(crate) struct RenderJob {
    pub expected_revision: u64,
    pub markdown: String,
    pub opts: RenderOpts,
    pub fires_at: Instant,
}

/// Delivers a render outcome to whatever owns the session.
pub trait RenderNotify: Send + Sync {
    fn notify(&self, session_id: &SessionId, revision: u64, outcome: Result<Preview, JidoError>);
}

/// Single-process scheduler: `session_id -> pending_job`, bounded by
/// `max_queue_size`, debounced with supersede-on-enqueue semantics.
pub struct RenderQueue<C: Clock> {
    jobs: HashMap<SessionId, RenderJob>,
    config: RenderQueueConfig,
    registry: RenderAdapterRegistry,
    clock: C,
    counters: RenderQueueCounters,
}

impl<C: Clock> RenderQueue<C> {
    pub fn new(registry: RenderAdapterRegistry, clock: C, config: RenderQueueConfig) -> Self {
        Self {
            jobs: HashMap::new(),
            config,
            registry,
            clock,
            counters: RenderQueueCounters::default(),
        }
    }

    pub fn counters(&self) -> &RenderQueueCounters {
        &self.counters
    }

    /// Enqueue a render for `session_id`. Supersedes any pending job for
    /// the same session; fails `Busy{queue_full}` when the queue is at
    /// capacity and this session has no existing pending job.
    pub fn enqueue(
        &mut self,
        session_id: SessionId,
        revision: u64,
        markdown: String,
        opts: RenderOpts,
    ) -> Result<(), JidoError> {
        let fires_at = self.clock.now() + self.config.debounce;

        if self.jobs.contains_key(&session_id) {
            trace!(session_id = %session_id, revision, "render queue: supersede");
            self.counters.queue_canceled += 1;
        } else if self.jobs.len() >= self.config.max_queue_size {
            self.counters.queue_dropped += 1;
            return Err(JidoError::busy("render queue full").with_details(serde_json::json!({
                "reason": "queue_full",
            })));
        }

        self.counters.queue_enqueued += 1;
        self.jobs.insert(
            session_id,
            RenderJob {
                expected_revision: revision,
                markdown,
                opts,
                fires_at,
            },
        );
        Ok(())
    }

    /// Cancel the pending job for `session_id`, if any superseded by a
    /// later-revision enqueue that arrived before this one fired.
    pub fn cancel(&mut self, session_id: &SessionId) {
        if self.jobs.remove(session_id).is_some() {
            self.counters.queue_canceled += 1;
        }
    }

    /// Run all jobs whose debounce has elapsed, delivering results through
    /// `notify`.
    pub fn poll(&mut self, notify: &dyn RenderNotify) {
        let now = self.clock.now();
        let due: Vec<SessionId> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.fires_at <= now)
            .map(|(id, _)| id.clone())
            .collect();

        for session_id in due {
            let Some(job) = self.jobs.remove(&session_id) else {
                continue;
            };
            let outcome = self.render_job(&job);
            self.counters.queue_completed += 1;
            match &outcome {
                Ok(preview) if preview.metadata.decision == ChangeDecision::Incremental => {
                    self.counters.incremental_selected += 1;
                }
                Ok(_) => self.counters.full_selected += 1,
                Err(_) => {}
            }
            notify.notify(&session_id, job.expected_revision, outcome);
        }
    }

    fn render_job(&self, job: &RenderJob) -> Result<Preview, JidoError> {
        let Some(adapter) = self.registry.resolve(job.opts.adapter.as_deref()) else {
            return Ok(synthesize_fallback(
                job.opts.last_good_preview.as_deref(),
                &job.markdown,
            ));
        };

        match adapter.render(&job.markdown) {
            Ok(html) => {
                let (decision, changed_lines, total_lines) = change_tracker::decide(
                    job.opts.previous_body.as_deref(),
                    &job.markdown,
                    self.config.thresholds,
                );
                Ok(Preview {
                    html,
                    metadata: PreviewMetadata {
                        adapter: adapter.name().to_string(),
                        fallback: false,
                        decision,
                        changed_lines,
                        total_lines,
                    },
                })
            }
            Err(_) => Ok(synthesize_fallback(
                job.opts.last_good_preview.as_deref(),
                &job.markdown,
            )),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.jobs.len()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
