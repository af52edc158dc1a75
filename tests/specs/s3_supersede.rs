//! S3 — render queue supersede/capacity (spec §8).

use jido_core::{ErrorCode, FakeClock, JidoError, SessionId};
use jido_render::test_support::echo_registry;
use jido_render::{Preview, RenderNotify, RenderOpts, RenderQueue, RenderQueueConfig};
use parking_lot::Mutex;
use std::time::Duration;

struct Collector {
    delivered: Mutex<Vec<(SessionId, u64)>>,
}

impl RenderNotify for Collector {
    fn notify(&self, session_id: &SessionId, revision: u64, _outcome: Result<Preview, JidoError>) {
        self.delivered.lock().push((session_id.clone(), revision));
    }
}

#[test]
fn queue_supersedes_per_session_and_drops_past_capacity() {
    let clock = FakeClock::new();
    let config = RenderQueueConfig {
        debounce: Duration::from_millis(20),
        max_queue_size: 2,
        ..RenderQueueConfig::default()
    };
    let mut queue = RenderQueue::new(echo_registry(), clock.clone(), config);

    let a = SessionId::new("session-a");
    let b = SessionId::new("session-b");
    let c = SessionId::new("session-c");

    queue
        .enqueue(a.clone(), 1, "rev1".into(), RenderOpts::default())
        .expect("a rev1 enqueues");
    queue
        .enqueue(a.clone(), 2, "rev2".into(), RenderOpts::default())
        .expect("a rev2 supersedes");
    queue
        .enqueue(b.clone(), 1, "b-rev1".into(), RenderOpts::default())
        .expect("b rev1 enqueues");
    let err = queue
        .enqueue(c.clone(), 1, "c-rev1".into(), RenderOpts::default())
        .expect_err("queue is full");
    assert_eq!(err.code, ErrorCode::Busy);

    clock.advance(Duration::from_millis(25));
    let collector = Collector { delivered: Mutex::new(Vec::new()) };
    queue.poll(&collector);

    let delivered = collector.delivered.into_inner();
    assert_eq!(delivered.len(), 2);
    assert!(delivered.contains(&(a, 2)));
    assert!(delivered.contains(&(b, 1)));

    assert!(queue.counters().queue_enqueued >= 3);
    assert!(queue.counters().queue_dropped >= 1);
}
