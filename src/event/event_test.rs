use std::sync::Mutex as SyncMutex;

use super::*;

/// RecordingEventSink keeps every emitted event for later inspection.
#[derive(Debug, Default)]
pub(crate) struct RecordingEventSink {
    events: SyncMutex<Vec<MediaEvent>>,
}

impl RecordingEventSink {
    pub(crate) fn events(&self) -> Vec<MediaEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&MediaEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: MediaEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[test]
fn test_media_event_level() {
    let tests = vec![
        (
            MediaEvent::PacketDropped {
                ssrc: 1,
                stream: StreamKind::Rtp,
            },
            log::Level::Trace,
        ),
        (
            MediaEvent::ReadLoopEnded {
                ssrc: 1,
                stream: StreamKind::Rtcp,
                reason: "closed".to_owned(),
            },
            log::Level::Debug,
        ),
        (
            MediaEvent::WriteFailed {
                ssrc: 1,
                reason: "closed".to_owned(),
            },
            log::Level::Warn,
        ),
        (
            MediaEvent::CodecMatchFailed {
                codec: "VP8".to_owned(),
                reason: "bad".to_owned(),
            },
            log::Level::Warn,
        ),
    ];

    for (event, expected) in tests {
        assert_eq!(event.level(), expected, "{event}");
    }
}

#[test]
fn test_media_event_string() {
    let event = MediaEvent::UnmarshalFailed {
        ssrc: 5000,
        stream: StreamKind::Rtcp,
        reason: "short".to_owned(),
    };
    assert_eq!(
        event.to_string(),
        "failed to unmarshal rtcp packet for ssrc 5000: short"
    );

    let event = MediaEvent::PacketDropped {
        ssrc: 42,
        stream: StreamKind::Rtp,
    };
    assert_eq!(event.to_string(), "rtp queue full for ssrc 42, packet dropped");
}

#[test]
fn test_recording_event_sink() {
    let sink = RecordingEventSink::default();
    sink.emit(MediaEvent::PacketDropped {
        ssrc: 1,
        stream: StreamKind::Rtp,
    });
    sink.emit(MediaEvent::WriteFailed {
        ssrc: 1,
        reason: "x".to_owned(),
    });

    assert_eq!(sink.events().len(), 2);
    assert_eq!(
        sink.count(|e| matches!(e, MediaEvent::PacketDropped { .. })),
        1
    );

    let _ = env_logger::builder().is_test(true).try_init();
    LogEventSink.emit(MediaEvent::PacketDropped {
        ssrc: 1,
        stream: StreamKind::Rtp,
    });
}
