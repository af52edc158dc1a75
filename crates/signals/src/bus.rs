use crate::payload::normalize_payload;
use crate::signal::{Signal, SignalType};
use jido_core::{Clock, CorrelationId, JidoError, SessionId};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

pub type SubscriberId = u64;

#[derive(Debug, Clone, Copy)]
pub struct BroadcastOpts {
    pub max_payload_bytes: usize,
    pub correlation_id: Option<CorrelationId>,
}

impl Default for BroadcastOpts {
    fn default() -> Self {
        Self {
            max_payload_bytes: 16384,
            correlation_id: None,
        }
    }
}

struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<Signal>,
}

/// Per-session fan-out of [`Signal`]s, best-effort and non-blocking.
pub struct SignalBus<C: Clock> {
    subscribers: Mutex<HashMap<SessionId, Vec<Subscriber>>>,
    next_id: AtomicU64,
    clock: C,
}

impl<C: Clock> SignalBus<C> {
    pub fn new(clock: C) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            clock,
        }
    }

    pub fn subscribe(&self, session_id: &SessionId) -> (SubscriberId, UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers
            .lock()
            .entry(session_id.clone())
            .or_default()
            .push(Subscriber { id, sender: tx });
        (id, rx)
    }

    pub fn unsubscribe(&self, session_id: &SessionId, subscriber_id: SubscriberId) {
        let mut subscribers = self.subscribers.lock();
        if let Some(list) = subscribers.get_mut(session_id) {
            list.retain(|s| s.id != subscriber_id);
            if list.is_empty() {
                subscribers.remove(session_id);
            }
        }
    }

    /// Validate, normalize, and deliver a signal to every subscriber of
    /// `session_id`. Dead subscribers (closed receiver) are pruned and a
    /// `subscriber_cleaned` signal is emitted to the survivors.
    pub fn broadcast(
        &self,
        type_: SignalType,
        session_id: &SessionId,
        data: Value,
        opts: BroadcastOpts,
    ) -> Result<(), JidoError> {
        if session_id.as_str().is_empty() {
            return Err(JidoError::validation_failed("session_id must not be empty"));
        }
        if !data.is_object() {
            return Err(JidoError::validation_failed("signal data must be a map"));
        }

        let normalized = normalize_payload(&data, opts.max_payload_bytes);
        let mut metadata = serde_json::json!({});
        if normalized.truncated {
            metadata = serde_json::json!({
                "truncated": true,
                "dropped_keys": normalized.dropped_keys,
            });
        }

        let signal = Signal::new(
            type_,
            session_id.clone(),
            normalized.data,
            self.clock.epoch_ms(),
            opts.correlation_id,
            metadata,
        );

        self.deliver(session_id, signal, opts);
        Ok(())
    }

    fn deliver(&self, session_id: &SessionId, signal: Signal, opts: BroadcastOpts) {
        let mut dead = Vec::new();
        {
            let subscribers = self.subscribers.lock();
            if let Some(list) = subscribers.get(session_id) {
                for subscriber in list {
                    if subscriber.sender.send(signal.clone()).is_err() {
                        dead.push(subscriber.id);
                    }
                }
            }
        }

        if dead.is_empty() {
            return;
        }

        {
            let mut subscribers = self.subscribers.lock();
            if let Some(list) = subscribers.get_mut(session_id) {
                list.retain(|s| !dead.contains(&s.id));
            }
        }
        trace!(session_id = %session_id, dead = dead.len(), "signal bus: pruned dead subscribers");

        let cleanup = Signal::new(
            SignalType::SubscriberCleaned,
            session_id.clone(),
            serde_json::json!({ "removed": dead.len() }),
            self.clock.epoch_ms(),
            opts.correlation_id,
            Value::Null,
        );
        let subscribers = self.subscribers.lock();
        if let Some(list) = subscribers.get(session_id) {
            for subscriber in list {
                let _ = subscriber.sender.send(cleanup.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
