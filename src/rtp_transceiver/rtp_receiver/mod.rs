
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex};
use util::Unmarshal;
use waitgroup::{WaitGroup, Worker};

use crate::api::media_engine::MediaEngine;
use crate::api::setting_engine::QueueSizes;
use crate::error::{flatten_errs, Error, Result};
use crate::event::{EventSink, MediaEvent, StreamKind};
use crate::rtp_transceiver::rtp_codec::RTPCodecType;
use crate::rtp_transceiver::{PayloadType, RTCRtpReceiveParameters, SSRC};
use crate::srtp_transport::{ReadStream, SecureTransport};
use crate::track::track_remote::TrackRemote;
use crate::track::RtcpPackets;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// receive has not been called yet.
    Idle,
    /// The read loops are running.
    Receiving,
    /// stop has been called.
    Stopped,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Idle => write!(f, "Idle"),
            State::Receiving => write!(f, "Receiving"),
            State::Stopped => write!(f, "Stopped"),
        }
    }
}

struct RTPReceiverInternal {
    state: State,
    rtp_read_stream: Option<Arc<dyn ReadStream>>,
    rtcp_read_stream: Option<Arc<dyn ReadStream>>,
    wg: Option<WaitGroup>,
    track: Option<Arc<TrackRemote>>,
}

/// RTPReceiver allows an application to inspect the receipt of a TrackRemote
pub struct RTCRtpReceiver {
    kind: RTPCodecType,
    receive_mtu: usize,
    queue_sizes: QueueSizes,
    transport: Arc<dyn SecureTransport>,
    media_engine: Arc<MediaEngine>,
    event_sink: Arc<dyn EventSink>,

    internal: Mutex<RTPReceiverInternal>,
}

impl fmt::Debug for RTCRtpReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTCRtpReceiver")
            .field("kind", &self.kind)
            .field("receive_mtu", &self.receive_mtu)
            .field("queue_sizes", &self.queue_sizes)
            .finish()
    }
}

impl RTCRtpReceiver {
    pub fn new(
        receive_mtu: usize,
        queue_sizes: QueueSizes,
        kind: RTPCodecType,
        transport: Arc<dyn SecureTransport>,
        media_engine: Arc<MediaEngine>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        RTCRtpReceiver {
            kind,
            receive_mtu,
            queue_sizes,
            transport,
            media_engine,
            event_sink,
            internal: Mutex::new(RTPReceiverInternal {
                state: State::Idle,
                rtp_read_stream: None,
                rtcp_read_stream: None,
                wg: None,
                track: None,
            }),
        }
    }

    pub fn kind(&self) -> RTPCodecType {
        self.kind
    }

    pub async fn state(&self) -> State {
        self.internal.lock().await.state
    }

    /// track returns the TrackRemote published by receive
    pub async fn track(&self) -> Option<Arc<TrackRemote>> {
        self.internal.lock().await.track.clone()
    }

    /// receive opens the streams of the first decoding target, starts the
    /// read loops and waits for the first packet. The track is published
    /// once the payload type of that packet resolves to a registered codec.
    /// When resolution fails the streams stay open until stop.
    pub async fn receive(&self, parameters: &RTCRtpReceiveParameters) -> Result<Arc<TrackRemote>> {
        let (ssrc, rtp_rx, rtcp_rx, first_rx) = {
            let mut internal = self.internal.lock().await;
            match internal.state {
                State::Idle => {}
                State::Receiving => return Err(Error::ErrRTPReceiverReceiveAlreadyCalled),
                State::Stopped => return Err(Error::ErrRTPReceiverAlreadyClosed),
            }

            let ssrc = parameters
                .encodings
                .first()
                .map(|encoding| encoding.ssrc)
                .ok_or(Error::ErrRTPReceiverNoEncodings)?;

            let rtp_read_stream = self.transport.open_rtp_read_stream(ssrc).await?;
            let rtcp_read_stream = match self.transport.open_rtcp_read_stream(ssrc).await {
                Ok(stream) => stream,
                Err(err) => {
                    let _ = rtp_read_stream.close().await;
                    return Err(err);
                }
            };

            let (rtp_tx, rtp_rx) = mpsc::channel(self.queue_sizes.rtp);
            let (rtcp_tx, rtcp_rx) = mpsc::channel(self.queue_sizes.rtcp);
            let (first_tx, first_rx) = oneshot::channel();

            let wg = WaitGroup::new();
            tokio::spawn(read_rtp_loop(
                Arc::clone(&rtp_read_stream),
                ssrc,
                self.receive_mtu,
                first_tx,
                rtp_tx,
                Arc::clone(&self.event_sink),
                wg.worker(),
            ));
            tokio::spawn(read_rtcp_loop(
                Arc::clone(&rtcp_read_stream),
                ssrc,
                self.receive_mtu,
                rtcp_tx,
                Arc::clone(&self.event_sink),
                wg.worker(),
            ));

            internal.state = State::Receiving;
            internal.rtp_read_stream = Some(rtp_read_stream);
            internal.rtcp_read_stream = Some(rtcp_read_stream);
            internal.wg = Some(wg);

            (ssrc, rtp_rx, rtcp_rx, first_rx)
        };

        let payload_type = first_rx
            .await
            .map_err(|_| Error::ErrRTPReceiverClosedBeforeFirstPacket)?;

        let codec_parameters = parameters
            .rtp_parameters
            .get_codec_parameters(payload_type)?;
        let codec = self.media_engine.get_codec_sdp(codec_parameters)?;

        let track = Arc::new(TrackRemote::new(
            payload_type,
            ssrc,
            codec,
            rtp_rx,
            rtcp_rx,
        ));
        self.event_sink.emit(MediaEvent::TrackPublished {
            ssrc,
            payload_type,
            mime_type: track.codec().mime_type().to_owned(),
        });

        let mut internal = self.internal.lock().await;
        internal.track = Some(Arc::clone(&track));

        Ok(track)
    }

    /// Stop irreversibly stops the RTPReceiver. It closes both read streams
    /// and returns once both read loops have exited.
    pub async fn stop(&self) -> Result<()> {
        let (streams, wg) = {
            let mut internal = self.internal.lock().await;
            if internal.state == State::Stopped {
                return Err(Error::ErrRTPReceiverAlreadyClosed);
            }
            internal.state = State::Stopped;

            (
                [
                    internal.rtp_read_stream.take(),
                    internal.rtcp_read_stream.take(),
                ],
                internal.wg.take(),
            )
        };

        let mut errs = vec![];
        for stream in streams.into_iter().flatten() {
            if let Err(err) = stream.close().await {
                errs.push(err);
            }
        }

        if let Some(wg) = wg {
            wg.wait().await;
        }

        flatten_errs(errs)
    }
}

/// read_rtp_loop moves packets from the rtp stream into the track queue.
/// The first packet only hands its payload type to the waiting receive and
/// is not queued.
async fn read_rtp_loop(
    stream: Arc<dyn ReadStream>,
    ssrc: SSRC,
    receive_mtu: usize,
    first_tx: oneshot::Sender<PayloadType>,
    rtp_tx: mpsc::Sender<rtp::packet::Packet>,
    event_sink: Arc<dyn EventSink>,
    _worker: Worker,
) {
    let mut first_tx = Some(first_tx);
    let mut b = vec![0u8; receive_mtu];
    loop {
        let n = match stream.read(&mut b).await {
            Ok(n) => n,
            Err(err) => {
                event_sink.emit(MediaEvent::ReadLoopEnded {
                    ssrc,
                    stream: StreamKind::Rtp,
                    reason: err.to_string(),
                });
                break;
            }
        };

        let pkt = match rtp::packet::Packet::unmarshal(&mut &b[..n]) {
            Ok(pkt) => pkt,
            Err(err) => {
                event_sink.emit(MediaEvent::UnmarshalFailed {
                    ssrc,
                    stream: StreamKind::Rtp,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        if let Some(first_tx) = first_tx.take() {
            let _ = first_tx.send(pkt.header.payload_type);
            continue;
        }

        if let Err(TrySendError::Full(_)) = rtp_tx.try_send(pkt) {
            event_sink.emit(MediaEvent::PacketDropped {
                ssrc,
                stream: StreamKind::Rtp,
            });
        }
    }
}

/// read_rtcp_loop moves compound packets from the rtcp stream into the
/// track queue.
async fn read_rtcp_loop(
    stream: Arc<dyn ReadStream>,
    ssrc: SSRC,
    receive_mtu: usize,
    rtcp_tx: mpsc::Sender<RtcpPackets>,
    event_sink: Arc<dyn EventSink>,
    _worker: Worker,
) {
    let mut b = vec![0u8; receive_mtu];
    loop {
        let n = match stream.read(&mut b).await {
            Ok(n) => n,
            Err(err) => {
                event_sink.emit(MediaEvent::ReadLoopEnded {
                    ssrc,
                    stream: StreamKind::Rtcp,
                    reason: err.to_string(),
                });
                break;
            }
        };

        let mut buf = &b[..n];
        let pkts = match rtcp::packet::unmarshal(&mut buf) {
            Ok(pkts) => pkts,
            Err(err) => {
                event_sink.emit(MediaEvent::UnmarshalFailed {
                    ssrc,
                    stream: StreamKind::Rtcp,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        if let Err(TrySendError::Full(_)) = rtcp_tx.try_send(pkts) {
            event_sink.emit(MediaEvent::PacketDropped {
                ssrc,
                stream: StreamKind::Rtcp,
            });
        }
    }
}
