
use std::sync::Arc;

use media::Sample;
use tokio::sync::{mpsc, Mutex};
use util::sync::Mutex as SyncMutex;

use crate::error::{Error, Result};
use crate::rtp_transceiver::rtp_codec::{RTCRtpCodec, RTPCodecType};
use crate::rtp_transceiver::{PayloadType, SSRC};
use crate::track::RtcpPackets;

/// TrackLocalMode selects what the application writes into a local track.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackLocalMode {
    /// Packets already framed by the application, sent as they are.
    Rtp,
    /// Timestamped media samples, packetized by the sender.
    Sample,
}

/// TrackLocalInput is the consuming end of a local track, taken once by the
/// sender that transmits it.
pub(crate) enum TrackLocalInput {
    Rtp(mpsc::Receiver<rtp::packet::Packet>),
    Sample(mpsc::Receiver<Sample>),
}

enum TrackLocalWriter {
    Rtp(mpsc::Sender<rtp::packet::Packet>),
    Sample(mpsc::Sender<Sample>),
}

/// TrackLocal is an outbound source of media. The application writes packets
/// or samples into it and reads the RTCP feedback the remote side sends back.
pub struct TrackLocal {
    id: String,
    stream_id: String,
    codec: Arc<RTCRtpCodec>,
    ssrc: SSRC,
    mode: TrackLocalMode,

    writer: SyncMutex<Option<TrackLocalWriter>>,
    input: SyncMutex<Option<TrackLocalInput>>,

    rtcp_tx: SyncMutex<Option<mpsc::Sender<RtcpPackets>>>,
    rtcp_rx: Mutex<mpsc::Receiver<RtcpPackets>>,
}

impl std::fmt::Debug for TrackLocal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackLocal")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("codec", &self.codec)
            .field("ssrc", &self.ssrc)
            .field("mode", &self.mode)
            .finish()
    }
}

impl TrackLocal {
    /// new_rtp creates a track fed with complete RTP packets.
    pub fn new_rtp(
        codec: Arc<RTCRtpCodec>,
        ssrc: SSRC,
        id: String,
        stream_id: String,
        queue_size: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        Self::new(
            codec,
            ssrc,
            id,
            stream_id,
            TrackLocalMode::Rtp,
            TrackLocalWriter::Rtp(tx),
            TrackLocalInput::Rtp(rx),
            queue_size,
        )
    }

    /// new_sample creates a track fed with media samples.
    pub fn new_sample(
        codec: Arc<RTCRtpCodec>,
        ssrc: SSRC,
        id: String,
        stream_id: String,
        queue_size: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        Self::new(
            codec,
            ssrc,
            id,
            stream_id,
            TrackLocalMode::Sample,
            TrackLocalWriter::Sample(tx),
            TrackLocalInput::Sample(rx),
            queue_size,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn new(
        codec: Arc<RTCRtpCodec>,
        ssrc: SSRC,
        id: String,
        stream_id: String,
        mode: TrackLocalMode,
        writer: TrackLocalWriter,
        input: TrackLocalInput,
        queue_size: usize,
    ) -> Self {
        let (rtcp_tx, rtcp_rx) = mpsc::channel(queue_size.max(1));
        TrackLocal {
            id,
            stream_id,
            codec,
            ssrc,
            mode,
            writer: SyncMutex::new(Some(writer)),
            input: SyncMutex::new(Some(input)),
            rtcp_tx: SyncMutex::new(Some(rtcp_tx)),
            rtcp_rx: Mutex::new(rtcp_rx),
        }
    }

    /// id is the unique identifier for this Track. This should be unique for the
    /// stream, but doesn't have to globally unique. A common example would be 'audio' or 'video'
    /// and StreamID would be 'desktop' or 'webcam'
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// stream_id is the group this track belongs too. This must be unique
    pub fn stream_id(&self) -> &str {
        self.stream_id.as_str()
    }

    pub fn kind(&self) -> RTPCodecType {
        self.codec.kind
    }

    pub fn codec(&self) -> Arc<RTCRtpCodec> {
        Arc::clone(&self.codec)
    }

    pub fn payload_type(&self) -> PayloadType {
        self.codec.payload_type
    }

    pub fn ssrc(&self) -> SSRC {
        self.ssrc
    }

    pub fn mode(&self) -> TrackLocalMode {
        self.mode
    }

    /// write_rtp queues a packet for the sender. It waits while the queue is
    /// full and fails with ErrClosedPipe once the sender has stopped.
    pub async fn write_rtp(&self, pkt: rtp::packet::Packet) -> Result<()> {
        let tx = match &*self.writer.lock() {
            Some(TrackLocalWriter::Rtp(tx)) => tx.clone(),
            Some(TrackLocalWriter::Sample(_)) => return Err(Error::ErrTrackModeMismatch),
            None => return Err(Error::ErrClosedPipe),
        };
        tx.send(pkt).await.map_err(|_| Error::ErrClosedPipe)
    }

    /// write_sample queues a sample for packetization by the sender.
    pub async fn write_sample(&self, sample: Sample) -> Result<()> {
        let tx = match &*self.writer.lock() {
            Some(TrackLocalWriter::Sample(tx)) => tx.clone(),
            Some(TrackLocalWriter::Rtp(_)) => return Err(Error::ErrTrackModeMismatch),
            None => return Err(Error::ErrClosedPipe),
        };
        tx.send(sample).await.map_err(|_| Error::ErrClosedPipe)
    }

    /// read_rtcp waits for the next RTCP compound packet relayed by the
    /// sender. It returns None once the sender has stopped.
    pub async fn read_rtcp(&self) -> Option<RtcpPackets> {
        let mut rtcp_rx = self.rtcp_rx.lock().await;
        rtcp_rx.recv().await
    }

    pub(crate) fn take_input(&self) -> Option<TrackLocalInput> {
        self.input.lock().take()
    }

    pub(crate) fn has_input(&self) -> bool {
        self.input.lock().is_some()
    }

    /// close_input drops the writing end so the sender's loop drains the
    /// queue and exits.
    pub(crate) fn close_input(&self) {
        self.writer.lock().take();
    }

    pub(crate) fn take_rtcp_sender(&self) -> Option<mpsc::Sender<RtcpPackets>> {
        self.rtcp_tx.lock().take()
    }
}
