
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use portable_atomic::AtomicU8;
use sdp::description::media::MediaDescription;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::rtp_transceiver::rtp_codec::*;
use crate::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use crate::rtp_transceiver::rtp_sender::RTCRtpSender;
use crate::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use crate::sdp_attributes::{parse_decoding_parameters, parse_rtp_parameters};
use crate::track::track_local::TrackLocal;
use crate::track::track_remote::TrackRemote;

pub mod rtp_codec;
pub mod rtp_receiver;
pub mod rtp_sender;
pub mod rtp_transceiver_direction;

/// SSRC represents a synchronization source
/// A synchronization source is a randomly chosen
/// value meant to be globally unique within a particular
/// RTP session. Used to identify a single stream of media.
/// <https://tools.ietf.org/html/rfc3550#section-3>
#[allow(clippy::upper_case_acronyms)]
pub type SSRC = u32;

/// PayloadType identifies the format of the RTP payload and determines
/// its interpretation by the application. Each codec in a RTP Session
/// will have a different PayloadType
/// <https://tools.ietf.org/html/rfc3550#section-3>
pub type PayloadType = u8;

/// TYPE_RTCP_FB_TRANSPORT_CC ..
pub const TYPE_RTCP_FB_TRANSPORT_CC: &str = "transport-cc";

/// TYPE_RTCP_FB_GOOG_REMB ..
pub const TYPE_RTCP_FB_GOOG_REMB: &str = "goog-remb";

/// TYPE_RTCP_FB_ACK ..
pub const TYPE_RTCP_FB_ACK: &str = "ack";

/// TYPE_RTCP_FB_CCM ..
pub const TYPE_RTCP_FB_CCM: &str = "ccm";

/// TYPE_RTCP_FB_NACK ..
pub const TYPE_RTCP_FB_NACK: &str = "nack";

/// rtcpfeedback signals the connection to use additional RTCP packet types.
/// <https://draft.ortc.org/#dom-rtcrtcpfeedback>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCPFeedback {
    /// Type is the type of feedback.
    /// see: <https://draft.ortc.org/#dom-rtcrtcpfeedback>
    /// valid: ack, ccm, nack, goog-remb, transport-cc
    pub typ: String,

    /// The parameter value depends on the type.
    /// For example, type="nack" parameter="pli" will send Picture Loss Indicator packets.
    pub parameter: String,
}

/// RTPCapabilities represents the capabilities of a transceiver
/// <https://w3c.github.io/webrtc-pc/#rtcrtpcapabilities>
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RTCRtpCapabilities {
    pub codecs: Vec<RTCRtpCodecCapability>,
    pub header_extensions: Vec<RTCRtpHeaderExtensionCapability>,
}

/// RTPRtxParameters dictionary contains information relating to retransmission (RTX) settings.
/// Reserved: repair streams are not received or sent yet.
/// <https://draft.ortc.org/#dom-rtcrtprtxparameters>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpRtxParameters {
    pub ssrc: SSRC,
}

/// RTPCodingParameters provides information relating to both encoding and decoding.
/// <http://draft.ortc.org/#dom-rtcrtpcodingparameters>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpCodingParameters {
    pub ssrc: SSRC,
    pub payload_type: PayloadType,
    pub rtx: RTCRtpRtxParameters,
}

/// RTPDecodingParameters provides information relating to both encoding and decoding.
/// <http://draft.ortc.org/#dom-rtcrtpdecodingparameters>
pub type RTCRtpDecodingParameters = RTCRtpCodingParameters;

/// RTPEncodingParameters provides information relating to both encoding and decoding.
/// <http://draft.ortc.org/#dom-rtcrtpencodingparameters>
pub type RTCRtpEncodingParameters = RTCRtpCodingParameters;

/// RTPReceiveParameters contains the RTP stack settings used by receivers
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpReceiveParameters {
    pub rtp_parameters: RTCRtpParameters,
    pub encodings: Vec<RTCRtpDecodingParameters>,
}

/// RTPSendParameters contains the RTP stack settings used by senders
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpSendParameters {
    pub rtp_parameters: RTCRtpParameters,
    pub encodings: Vec<RTCRtpEncodingParameters>,
}

pub type OnTrackHdlrFn = Box<
    dyn (FnMut(Arc<TrackRemote>) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>)
        + Send
        + Sync,
>;

/// RTCRtpTransceiverState is the lifecycle of a transceiver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCRtpTransceiverState {
    Created,
    Started,
    Stopped,
}

/// RTPTransceiver represents a combination of an RTPSender and an RTPReceiver that share a common mid.
pub struct RTCRtpTransceiver {
    mid: SmolStr,
    kind: RTPCodecType,

    sender: Option<Arc<RTCRtpSender>>,
    receiver: Option<Arc<RTCRtpReceiver>>,

    direction: AtomicU8, //RTCRtpTransceiverDirection
    state: Mutex<RTCRtpTransceiverState>,

    remote_parameters: Mutex<Option<RTCRtpReceiveParameters>>,

    on_track_handler: Arc<ArcSwapOption<Mutex<OnTrackHdlrFn>>>,
}

impl std::fmt::Debug for RTCRtpTransceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RTCRtpTransceiver")
            .field("mid", &self.mid)
            .field("kind", &self.kind)
            .field("direction", &self.direction())
            .finish()
    }
}

impl RTCRtpTransceiver {
    pub fn new(
        mid: SmolStr,
        kind: RTPCodecType,
        direction: RTCRtpTransceiverDirection,
        sender: Option<Arc<RTCRtpSender>>,
        receiver: Option<Arc<RTCRtpReceiver>>,
    ) -> Self {
        RTCRtpTransceiver {
            mid,
            kind,
            sender,
            receiver,
            direction: AtomicU8::new(direction as u8),
            state: Mutex::new(RTCRtpTransceiverState::Created),
            remote_parameters: Mutex::new(None),
            on_track_handler: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// mid gets the Transceiver's mid value.
    pub fn mid(&self) -> &SmolStr {
        &self.mid
    }

    pub fn kind(&self) -> RTPCodecType {
        self.kind
    }

    /// sender returns the RTPTransceiver's RTPSender if it has one
    pub fn sender(&self) -> Option<Arc<RTCRtpSender>> {
        self.sender.clone()
    }

    /// receiver returns the RTPTransceiver's RTPReceiver if it has one
    pub fn receiver(&self) -> Option<Arc<RTCRtpReceiver>> {
        self.receiver.clone()
    }

    /// direction returns the RTPTransceiver's current direction
    pub fn direction(&self) -> RTCRtpTransceiverDirection {
        self.direction.load(Ordering::SeqCst).into()
    }

    pub async fn state(&self) -> RTCRtpTransceiverState {
        *self.state.lock().await
    }

    /// on_track sets the handler invoked with the inbound track once the
    /// receiver has resolved its codec.
    pub fn on_track(&self, f: OnTrackHdlrFn) {
        self.on_track_handler.store(Some(Arc::new(Mutex::new(f))));
    }

    /// set_remote_parameters records what the remote description negotiated
    /// for this transceiver's receiver.
    pub async fn set_remote_parameters(
        &self,
        rtp_parameters: RTCRtpParameters,
        encodings: Vec<RTCRtpDecodingParameters>,
    ) {
        let mut remote_parameters = self.remote_parameters.lock().await;
        *remote_parameters = Some(RTCRtpReceiveParameters {
            rtp_parameters,
            encodings,
        });
    }

    /// set_remote_description parses the media section describing this
    /// transceiver and records the result as its remote parameters.
    pub async fn set_remote_description(&self, media: &MediaDescription) -> Result<()> {
        let rtp_parameters = parse_rtp_parameters(media)?;
        let encodings = parse_decoding_parameters(media)?;
        self.set_remote_parameters(rtp_parameters, encodings).await;
        Ok(())
    }

    pub async fn remote_parameters(&self) -> Option<RTCRtpReceiveParameters> {
        self.remote_parameters.lock().await.clone()
    }

    /// attach_sending_track hands `track` to the sender and widens the
    /// direction to include sending. Only a recvonly or inactive transceiver
    /// accepts a sending track.
    pub async fn attach_sending_track(&self, track: Arc<TrackLocal>) -> Result<()> {
        let state = self.state.lock().await;
        match *state {
            RTCRtpTransceiverState::Created => {}
            RTCRtpTransceiverState::Started => return Err(Error::ErrRTPTransceiverAlreadyStarted),
            RTCRtpTransceiverState::Stopped => return Err(Error::ErrRTPTransceiverStopped),
        }

        let sender = self
            .sender
            .as_ref()
            .ok_or(Error::ErrRTPTransceiverNoSender)?;
        let direction = self.direction().with_sending_track()?;

        sender.set_track(Some(track)).await?;
        self.direction.store(direction as u8, Ordering::SeqCst);

        Ok(())
    }

    /// start launches the sender, if it has a track, and the receiver. The
    /// on_track handler is invoked once the receiver publishes its track.
    /// The transceiver counts as started even when an engine fails, so that
    /// stop releases whatever was opened.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        match *state {
            RTCRtpTransceiverState::Created => {}
            RTCRtpTransceiverState::Started => return Err(Error::ErrRTPTransceiverAlreadyStarted),
            RTCRtpTransceiverState::Stopped => return Err(Error::ErrRTPTransceiverStopped),
        }

        let remote_parameters = self.remote_parameters.lock().await.clone();
        if self.receiver.is_some() && remote_parameters.is_none() {
            return Err(Error::ErrRTPTransceiverNoRemoteParameters);
        }
        *state = RTCRtpTransceiverState::Started;
        drop(state);

        if let Some(sender) = &self.sender {
            if let Some(track) = sender.track().await {
                let rtp_parameters = remote_parameters
                    .as_ref()
                    .map(|p| p.rtp_parameters.clone())
                    .unwrap_or_default();
                sender
                    .send(&RTCRtpSendParameters {
                        rtp_parameters,
                        encodings: vec![RTCRtpEncodingParameters {
                            ssrc: track.ssrc(),
                            payload_type: track.payload_type(),
                            ..Default::default()
                        }],
                    })
                    .await?;
            }
        }

        if let (Some(receiver), Some(params)) = (&self.receiver, &remote_parameters) {
            let track = receiver.receive(params).await?;

            let on_track_handler = Arc::clone(&self.on_track_handler);
            if let Some(handler) = &*on_track_handler.load() {
                let mut f = handler.lock().await;
                f(track).await;
            }
        }

        Ok(())
    }

    /// stop irreversibly stops the RTPTransceiver. Both engines are stopped
    /// and the first failure is returned.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if *state == RTCRtpTransceiverState::Stopped {
                return Err(Error::ErrRTPTransceiverStopped);
            }
            *state = RTCRtpTransceiverState::Stopped;
        }

        let mut first_err = None;
        if let Some(sender) = &self.sender {
            if let Err(err) = sender.stop().await {
                first_err.get_or_insert(err);
            }
        }
        if let Some(receiver) = &self.receiver {
            if let Err(err) = receiver.stop().await {
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
