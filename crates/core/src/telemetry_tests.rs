use super::*;

struct Recorder(parking_lot::Mutex<Vec<ActionTelemetry>>);

impl TelemetrySink for Recorder {
    fn record(&self, event: ActionTelemetry) {
        self.0.lock().push(event);
    }
}

#[test]
fn sink_receives_recorded_events() {
    let sink = Recorder(parking_lot::Mutex::new(Vec::new()));
    sink.record(ActionTelemetry {
        event: "save".to_string(),
        duration_us: 42,
        status: "ok".to_string(),
        session_id: "file-abc".to_string(),
        correlation_id: None,
    });
    assert_eq!(sink.0.lock().len(), 1);
    assert_eq!(sink.0.lock()[0].event, "save");
}

#[test]
fn noop_sink_does_not_panic() {
    NoopTelemetrySink.record(ActionTelemetry {
        event: "load".to_string(),
        duration_us: 1,
        status: "ok".to_string(),
        session_id: "file-abc".to_string(),
        correlation_id: Some("corr-1".to_string()),
    });
}
