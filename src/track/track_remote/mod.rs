use std::sync::atomic::Ordering;
use std::sync::Arc;

use portable_atomic::AtomicUsize;
use tokio::sync::{mpsc, Mutex};

use crate::rtp_transceiver::rtp_codec::{RTCRtpCodec, RTPCodecType};
use crate::rtp_transceiver::{PayloadType, SSRC};
use crate::track::RtcpPackets;

lazy_static! {
    static ref TRACK_REMOTE_UNIQUE_ID: AtomicUsize = AtomicUsize::new(0);
}

/// TrackRemote represents a single inbound source of media. It is published
/// by a receiver once the codec of the stream is known and never changes
/// codec or ssrc afterwards.
pub struct TrackRemote {
    tid: usize,
    payload_type: PayloadType,
    kind: RTPCodecType,
    ssrc: SSRC,
    codec: Arc<RTCRtpCodec>,

    rtp_rx: Mutex<mpsc::Receiver<rtp::packet::Packet>>,
    rtcp_rx: Mutex<mpsc::Receiver<RtcpPackets>>,
}

impl std::fmt::Debug for TrackRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackRemote")
            .field("tid", &self.tid)
            .field("payload_type", &self.payload_type)
            .field("kind", &self.kind)
            .field("ssrc", &self.ssrc)
            .field("codec", &self.codec)
            .finish()
    }
}

impl TrackRemote {
    pub(crate) fn new(
        payload_type: PayloadType,
        ssrc: SSRC,
        codec: Arc<RTCRtpCodec>,
        rtp_rx: mpsc::Receiver<rtp::packet::Packet>,
        rtcp_rx: mpsc::Receiver<RtcpPackets>,
    ) -> Self {
        TrackRemote {
            tid: TRACK_REMOTE_UNIQUE_ID.fetch_add(1, Ordering::SeqCst),
            payload_type,
            kind: codec.kind,
            ssrc,
            codec,
            rtp_rx: Mutex::new(rtp_rx),
            rtcp_rx: Mutex::new(rtcp_rx),
        }
    }

    pub fn tid(&self) -> usize {
        self.tid
    }

    /// payload_type gets the PayloadType of the track
    pub fn payload_type(&self) -> PayloadType {
        self.payload_type
    }

    /// kind gets the Kind of the track
    pub fn kind(&self) -> RTPCodecType {
        self.kind
    }

    /// ssrc gets the SSRC of the track
    pub fn ssrc(&self) -> SSRC {
        self.ssrc
    }

    /// codec gets the Codec of the track
    pub fn codec(&self) -> Arc<RTCRtpCodec> {
        Arc::clone(&self.codec)
    }

    /// read_rtp waits for the next RTP packet. It returns None once the
    /// receiver has stopped and every queued packet has been read.
    pub async fn read_rtp(&self) -> Option<rtp::packet::Packet> {
        let mut rtp_rx = self.rtp_rx.lock().await;
        rtp_rx.recv().await
    }

    /// read_rtcp waits for the next RTCP compound packet of this source.
    pub async fn read_rtcp(&self) -> Option<RtcpPackets> {
        let mut rtcp_rx = self.rtcp_rx.lock().await;
        rtcp_rx.recv().await
    }

    /// try_read_rtp returns a queued RTP packet without waiting.
    pub fn try_read_rtp(&self) -> Option<rtp::packet::Packet> {
        let mut rtp_rx = self.rtp_rx.try_lock().ok()?;
        rtp_rx.try_recv().ok()
    }
}
