
pub mod media_engine;
pub mod setting_engine;

use std::sync::Arc;

use media_engine::*;
use setting_engine::*;
use smol_str::SmolStr;

use crate::error::Result;
use crate::event::{default_event_sink, EventSink};
use crate::rtp_transceiver::rtp_codec::RTPCodecType;
use crate::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use crate::rtp_transceiver::rtp_sender::RTCRtpSender;
use crate::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use crate::rtp_transceiver::{PayloadType, RTCRtpTransceiver};
use crate::srtp_transport::SecureTransport;
use crate::track::track_local::TrackLocal;

/// API bundles the codec registry, the settings and the event sink shared
/// by every receiver, sender and transceiver it constructs.
pub struct API {
    pub(crate) setting_engine: Arc<SettingEngine>,
    pub(crate) media_engine: Arc<MediaEngine>,
    pub(crate) event_sink: Arc<dyn EventSink>,
}

impl API {
    /// new_rtp_receiver constructs a new RTPReceiver
    pub fn new_rtp_receiver(
        &self,
        kind: RTPCodecType,
        transport: Arc<dyn SecureTransport>,
    ) -> RTCRtpReceiver {
        RTCRtpReceiver::new(
            self.setting_engine.get_receive_mtu(),
            self.setting_engine.get_queue_sizes(),
            kind,
            transport,
            Arc::clone(&self.media_engine),
            Arc::clone(&self.event_sink),
        )
    }

    /// new_rtp_sender constructs a new RTPSender
    pub fn new_rtp_sender(&self, transport: Arc<dyn SecureTransport>) -> RTCRtpSender {
        RTCRtpSender::new(
            self.setting_engine.get_receive_mtu(),
            self.setting_engine.get_rtp_outbound_mtu(),
            transport,
            Arc::clone(&self.event_sink),
        )
    }

    /// new_rtp_transceiver couples an optional sender and receiver under one mid.
    pub fn new_rtp_transceiver(
        &self,
        mid: &str,
        kind: RTPCodecType,
        direction: RTCRtpTransceiverDirection,
        sender: Option<Arc<RTCRtpSender>>,
        receiver: Option<Arc<RTCRtpReceiver>>,
    ) -> RTCRtpTransceiver {
        RTCRtpTransceiver::new(SmolStr::from(mid), kind, direction, sender, receiver)
    }

    /// new_rtp_track creates a local track fed with complete RTP packets,
    /// using the codec registered under payload_type and a random ssrc.
    pub fn new_rtp_track(
        &self,
        payload_type: PayloadType,
        id: String,
        stream_id: String,
    ) -> Result<TrackLocal> {
        let codec = self.media_engine.get_codec(payload_type)?;
        Ok(TrackLocal::new_rtp(
            codec,
            rand::random::<u32>(),
            id,
            stream_id,
            self.setting_engine.get_queue_sizes().rtp,
        ))
    }

    /// new_sample_track creates a local track fed with media samples that
    /// the sender packetizes.
    pub fn new_sample_track(
        &self,
        payload_type: PayloadType,
        id: String,
        stream_id: String,
    ) -> Result<TrackLocal> {
        let codec = self.media_engine.get_codec(payload_type)?;
        Ok(TrackLocal::new_sample(
            codec,
            rand::random::<u32>(),
            id,
            stream_id,
            self.setting_engine.get_queue_sizes().rtp,
        ))
    }

    /// Returns the internal [`SettingEngine`].
    pub fn setting_engine(&self) -> Arc<SettingEngine> {
        Arc::clone(&self.setting_engine)
    }

    /// Returns the internal [`MediaEngine`].
    pub fn media_engine(&self) -> Arc<MediaEngine> {
        Arc::clone(&self.media_engine)
    }
}

#[derive(Default)]
pub struct APIBuilder {
    setting_engine: Option<SettingEngine>,
    media_engine: Option<MediaEngine>,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl APIBuilder {
    pub fn new() -> Self {
        APIBuilder::default()
    }

    pub fn build(mut self) -> API {
        let event_sink = self.event_sink.take();
        let mut media_engine = self.media_engine.take().unwrap_or_default();
        if let Some(event_sink) = &event_sink {
            media_engine.event_sink = Arc::clone(event_sink);
        }

        API {
            setting_engine: Arc::new(self.setting_engine.take().unwrap_or_default()),
            media_engine: Arc::new(media_engine),
            event_sink: event_sink.unwrap_or_else(default_event_sink),
        }
    }

    /// WithSettingEngine allows providing a SettingEngine to the API.
    /// Settings should not be changed after passing the engine to an API.
    pub fn with_setting_engine(mut self, setting_engine: SettingEngine) -> Self {
        self.setting_engine = Some(setting_engine);
        self
    }

    /// WithMediaEngine allows providing a MediaEngine to the API.
    /// The MediaEngine is frozen once the API is built.
    pub fn with_media_engine(mut self, media_engine: MediaEngine) -> Self {
        self.media_engine = Some(media_engine);
        self
    }

    /// with_event_sink routes the diagnostics of the MediaEngine and every
    /// engine the API constructs to `event_sink`.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(event_sink);
        self
    }
}
