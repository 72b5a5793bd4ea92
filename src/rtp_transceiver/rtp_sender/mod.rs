
use std::fmt;
use std::sync::Arc;

use media::Sample;
use rtp::packetizer::Packetizer;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use waitgroup::{WaitGroup, Worker};

use crate::error::{flatten_errs, Error, Result};
use crate::event::{EventSink, MediaEvent, StreamKind};
use crate::rtp_transceiver::{PayloadType, RTCRtpSendParameters, SSRC};
use crate::srtp_transport::{ReadStream, SecureTransport, WriteStream};
use crate::track::track_local::{TrackLocal, TrackLocalInput, TrackLocalMode};
use crate::track::RtcpPackets;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// send has not been called yet.
    Idle,
    /// The outbound and rtcp loops are running.
    Sending,
    /// stop has been called.
    Stopped,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Idle => write!(f, "Idle"),
            State::Sending => write!(f, "Sending"),
            State::Stopped => write!(f, "Stopped"),
        }
    }
}

struct RTPSenderInternal {
    state: State,
    rtcp_read_stream: Option<Arc<dyn ReadStream>>,
    wg: Option<WaitGroup>,
}

/// RTPSender allows an application to control how a given Track is encoded and transmitted to a remote peer
pub struct RTCRtpSender {
    rtp_outbound_mtu: usize,
    receive_mtu: usize,
    transport: Arc<dyn SecureTransport>,
    event_sink: Arc<dyn EventSink>,

    track: Mutex<Option<Arc<TrackLocal>>>,
    internal: Mutex<RTPSenderInternal>,
}

impl fmt::Debug for RTCRtpSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTCRtpSender")
            .field("rtp_outbound_mtu", &self.rtp_outbound_mtu)
            .field("receive_mtu", &self.receive_mtu)
            .finish()
    }
}

impl RTCRtpSender {
    pub fn new(
        receive_mtu: usize,
        rtp_outbound_mtu: usize,
        transport: Arc<dyn SecureTransport>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        RTCRtpSender {
            rtp_outbound_mtu,
            receive_mtu,
            transport,
            event_sink,
            track: Mutex::new(None),
            internal: Mutex::new(RTPSenderInternal {
                state: State::Idle,
                rtcp_read_stream: None,
                wg: None,
            }),
        }
    }

    pub async fn state(&self) -> State {
        self.internal.lock().await.state
    }

    /// track returns the RTCRtpTransceiver track, or None
    pub async fn track(&self) -> Option<Arc<TrackLocal>> {
        self.track.lock().await.clone()
    }

    /// set_track replaces the track the sender transmits. The track can
    /// only change before send is called.
    pub async fn set_track(&self, track: Option<Arc<TrackLocal>>) -> Result<()> {
        let internal = self.internal.lock().await;
        match internal.state {
            State::Idle => {}
            State::Sending => return Err(Error::ErrRTPSenderSendAlreadyCalled),
            State::Stopped => return Err(Error::ErrRTPSenderAlreadyStopped),
        }

        let mut t = self.track.lock().await;
        *t = track;

        Ok(())
    }

    /// send starts moving the track's input to the transport and relaying
    /// RTCP for its ssrc back to the track. A nonzero ssrc or payload type
    /// in the first encoding overrides the track's for packetized samples.
    pub async fn send(&self, parameters: &RTCRtpSendParameters) -> Result<()> {
        let mut internal = self.internal.lock().await;
        match internal.state {
            State::Idle => {}
            State::Sending => return Err(Error::ErrRTPSenderSendAlreadyCalled),
            State::Stopped => return Err(Error::ErrRTPSenderAlreadyStopped),
        }

        let track = self.track().await.ok_or(Error::ErrRTPSenderTrackNil)?;
        if !track.has_input() {
            return Err(Error::ErrRTPSenderTrackConsumed);
        }

        let encoding = parameters.encodings.first();
        let ssrc = match encoding.map(|e| e.ssrc) {
            Some(ssrc) if ssrc != 0 => ssrc,
            _ => track.ssrc(),
        };
        let payload_type = match encoding.map(|e| e.payload_type) {
            Some(payload_type) if payload_type != 0 => payload_type,
            _ => track.payload_type(),
        };

        let packetizer = match track.mode() {
            TrackLocalMode::Rtp => None,
            TrackLocalMode::Sample => Some(self.new_packetizer(&track, ssrc, payload_type)?),
        };

        let write_stream = self.transport.open_write_stream().await?;
        let rtcp_read_stream = self.transport.open_rtcp_read_stream(ssrc).await?;

        let input = match track.take_input() {
            Some(input) => input,
            None => {
                let _ = rtcp_read_stream.close().await;
                return Err(Error::ErrRTPSenderTrackConsumed);
            }
        };

        let wg = WaitGroup::new();
        match (input, packetizer) {
            (TrackLocalInput::Sample(samples), Some(packetizer)) => {
                tokio::spawn(write_sample_loop(
                    samples,
                    packetizer,
                    track.codec().clock_rate(),
                    write_stream,
                    ssrc,
                    Arc::clone(&self.event_sink),
                    wg.worker(),
                ));
            }
            (TrackLocalInput::Rtp(packets), _) => {
                tokio::spawn(write_rtp_loop(
                    packets,
                    write_stream,
                    ssrc,
                    Arc::clone(&self.event_sink),
                    wg.worker(),
                ));
            }
            (TrackLocalInput::Sample(_), None) => {
                let _ = rtcp_read_stream.close().await;
                return Err(Error::ErrNoPayloaderForCodec);
            }
        }

        tokio::spawn(read_rtcp_loop(
            Arc::clone(&rtcp_read_stream),
            ssrc,
            self.receive_mtu,
            track.take_rtcp_sender(),
            Arc::clone(&self.event_sink),
            wg.worker(),
        ));

        internal.state = State::Sending;
        internal.rtcp_read_stream = Some(rtcp_read_stream);
        internal.wg = Some(wg);

        Ok(())
    }

    fn new_packetizer(
        &self,
        track: &TrackLocal,
        ssrc: SSRC,
        payload_type: PayloadType,
    ) -> Result<Box<dyn Packetizer + Send + Sync>> {
        let codec = track.codec();
        let payloader = codec.payloader()?;
        let sequencer: Box<dyn rtp::sequence::Sequencer + Send + Sync> =
            Box::new(rtp::sequence::new_random_sequencer());

        Ok(Box::new(rtp::packetizer::new_packetizer(
            self.rtp_outbound_mtu,
            payload_type,
            ssrc,
            payloader,
            sequencer,
            codec.clock_rate(),
        )))
    }

    /// stop irreversibly stops the RTPSender. The track input is closed, so
    /// the outbound loop drains what was queued and exits. Returns once both
    /// loops have exited.
    pub async fn stop(&self) -> Result<()> {
        let (rtcp_read_stream, wg) = {
            let mut internal = self.internal.lock().await;
            if internal.state == State::Stopped {
                return Err(Error::ErrRTPSenderAlreadyStopped);
            }
            internal.state = State::Stopped;
            (internal.rtcp_read_stream.take(), internal.wg.take())
        };

        if let Some(track) = self.track().await {
            track.close_input();
        }

        let mut errs = vec![];
        if let Some(rtcp_read_stream) = rtcp_read_stream {
            if let Err(err) = rtcp_read_stream.close().await {
                errs.push(err);
            }
        }

        if let Some(wg) = wg {
            wg.wait().await;
        }

        flatten_errs(errs)
    }
}

async fn write_rtp_loop(
    mut packets: mpsc::Receiver<rtp::packet::Packet>,
    write_stream: Arc<dyn WriteStream>,
    ssrc: SSRC,
    event_sink: Arc<dyn EventSink>,
    _worker: Worker,
) {
    while let Some(pkt) = packets.recv().await {
        if let Err(err) = write_stream.write_rtp(&pkt.header, &pkt.payload).await {
            event_sink.emit(MediaEvent::WriteFailed {
                ssrc,
                reason: err.to_string(),
            });
        }
    }
}

async fn write_sample_loop(
    mut samples: mpsc::Receiver<Sample>,
    mut packetizer: Box<dyn Packetizer + Send + Sync>,
    clock_rate: u32,
    write_stream: Arc<dyn WriteStream>,
    ssrc: SSRC,
    event_sink: Arc<dyn EventSink>,
    _worker: Worker,
) {
    while let Some(sample) = samples.recv().await {
        let sample_count = (sample.duration.as_secs_f64() * clock_rate as f64) as u32;
        // rtp timestamps wrap
        if sample.prev_dropped_packets > 0 {
            packetizer.skip_samples(sample_count.wrapping_mul(sample.prev_dropped_packets as u32));
        }

        let pkts = match packetizer.packetize(&sample.data, sample_count) {
            Ok(pkts) => pkts,
            Err(err) => {
                event_sink.emit(MediaEvent::PacketizeFailed {
                    ssrc,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        for pkt in pkts {
            if let Err(err) = write_stream.write_rtp(&pkt.header, &pkt.payload).await {
                event_sink.emit(MediaEvent::WriteFailed {
                    ssrc,
                    reason: err.to_string(),
                });
            }
        }
    }
}

/// read_rtcp_loop relays RTCP addressed to the sent ssrc to the track.
async fn read_rtcp_loop(
    stream: Arc<dyn ReadStream>,
    ssrc: SSRC,
    receive_mtu: usize,
    rtcp_tx: Option<mpsc::Sender<RtcpPackets>>,
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

        if let Some(rtcp_tx) = &rtcp_tx {
            if let Err(TrySendError::Full(_)) = rtcp_tx.try_send(pkts) {
                event_sink.emit(MediaEvent::PacketDropped {
                    ssrc,
                    stream: StreamKind::Rtcp,
                });
            }
        }
    }
}
