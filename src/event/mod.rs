#[cfg(test)]
pub(crate) mod event_test;

use std::fmt;
use std::sync::Arc;

use crate::rtp_transceiver::{PayloadType, SSRC};

/// StreamKind names which of the two packet flows of one logical stream an
/// event refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamKind {
    Rtp,
    Rtcp,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StreamKind::Rtp => write!(f, "rtp"),
            StreamKind::Rtcp => write!(f, "rtcp"),
        }
    }
}

/// MediaEvent is a structured diagnostic emitted by the engines and the codec
/// registry. Recoverable per-packet failures surface here instead of as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// An inbound unit could not be deserialized and was skipped.
    UnmarshalFailed {
        ssrc: SSRC,
        stream: StreamKind,
        reason: String,
    },
    /// An output queue was full and the newest unit was dropped.
    PacketDropped { ssrc: SSRC, stream: StreamKind },
    /// A read loop observed a transport failure and terminated.
    ReadLoopEnded {
        ssrc: SSRC,
        stream: StreamKind,
        reason: String,
    },
    /// A single outbound packet could not be written.
    WriteFailed { ssrc: SSRC, reason: String },
    /// A media sample could not be packetized.
    PacketizeFailed { ssrc: SSRC, reason: String },
    /// Format parameters of a candidate codec could not be compared.
    CodecMatchFailed { codec: String, reason: String },
    /// A receiver resolved its codec and published a track.
    TrackPublished {
        ssrc: SSRC,
        payload_type: PayloadType,
        mime_type: String,
    },
}

impl MediaEvent {
    /// level is the log level the event is reported at by [`LogEventSink`].
    pub fn level(&self) -> log::Level {
        match self {
            MediaEvent::PacketDropped { .. } => log::Level::Trace,
            MediaEvent::ReadLoopEnded { .. } | MediaEvent::TrackPublished { .. } => {
                log::Level::Debug
            }
            MediaEvent::UnmarshalFailed { .. }
            | MediaEvent::WriteFailed { .. }
            | MediaEvent::PacketizeFailed { .. }
            | MediaEvent::CodecMatchFailed { .. } => log::Level::Warn,
        }
    }
}

impl fmt::Display for MediaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaEvent::UnmarshalFailed {
                ssrc,
                stream,
                reason,
            } => write!(f, "failed to unmarshal {stream} packet for ssrc {ssrc}: {reason}"),
            MediaEvent::PacketDropped { ssrc, stream } => {
                write!(f, "{stream} queue full for ssrc {ssrc}, packet dropped")
            }
            MediaEvent::ReadLoopEnded {
                ssrc,
                stream,
                reason,
            } => write!(f, "{stream} read loop for ssrc {ssrc} exited: {reason}"),
            MediaEvent::WriteFailed { ssrc, reason } => {
                write!(f, "failed to write rtp packet for ssrc {ssrc}: {reason}")
            }
            MediaEvent::PacketizeFailed { ssrc, reason } => {
                write!(f, "failed to packetize sample for ssrc {ssrc}: {reason}")
            }
            MediaEvent::CodecMatchFailed { codec, reason } => {
                write!(f, "failed to compare fmtp of codec {codec}: {reason}")
            }
            MediaEvent::TrackPublished {
                ssrc,
                payload_type,
                mime_type,
            } => write!(
                f,
                "track published for ssrc {ssrc} with payload type {payload_type} ({mime_type})"
            ),
        }
    }
}

/// EventSink receives the diagnostics of the components it is injected into.
pub trait EventSink: fmt::Debug + Send + Sync {
    fn emit(&self, event: MediaEvent);
}

/// LogEventSink forwards every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: MediaEvent) {
        log::log!(event.level(), "{event}");
    }
}

/// default_event_sink returns the sink used when none is configured.
pub fn default_event_sink() -> Arc<dyn EventSink> {
    Arc::new(LogEventSink)
}
