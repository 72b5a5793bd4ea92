
use std::fmt;
use std::sync::Arc;

use unicase::UniCase;

use crate::error::{Error, Result};
use crate::event::{default_event_sink, EventSink, MediaEvent};
use crate::rtp_transceiver::rtp_codec::*;
use crate::rtp_transceiver::{PayloadType, RTCRtpCapabilities};

/// MIME_TYPE_H264 H264 MIME type.
/// Note: Matching should be case insensitive.
pub const MIME_TYPE_H264: &str = "video/H264";
/// MIME_TYPE_OPUS Opus MIME type
/// Note: Matching should be case insensitive.
pub const MIME_TYPE_OPUS: &str = "audio/opus";
/// MIME_TYPE_VP8 VP8 MIME type
/// Note: Matching should be case insensitive.
pub const MIME_TYPE_VP8: &str = "video/VP8";
/// MIME_TYPE_VP9 VP9 MIME type
/// Note: Matching should be case insensitive.
pub const MIME_TYPE_VP9: &str = "video/VP9";
/// MIME_TYPE_G722 G722 MIME type
/// Note: Matching should be case insensitive.
pub const MIME_TYPE_G722: &str = "audio/G722";
/// MIME_TYPE_PCMU PCMU MIME type
/// Note: Matching should be case insensitive.
pub const MIME_TYPE_PCMU: &str = "audio/PCMU";
/// MIME_TYPE_PCMA PCMA MIME type
/// Note: Matching should be case insensitive.
pub const MIME_TYPE_PCMA: &str = "audio/PCMA";

/// Encoding names of the default codecs.
pub const G722: &str = "G722";
pub const PCMU: &str = "PCMU";
pub const PCMA: &str = "PCMA";
pub const OPUS: &str = "opus";
pub const VP8: &str = "VP8";
pub const VP9: &str = "VP9";
pub const H264: &str = "H264";

/// Payload types of the default codecs.
pub const DEFAULT_PAYLOAD_TYPE_PCMU: PayloadType = 0;
pub const DEFAULT_PAYLOAD_TYPE_PCMA: PayloadType = 8;
pub const DEFAULT_PAYLOAD_TYPE_G722: PayloadType = 9;
pub const DEFAULT_PAYLOAD_TYPE_OPUS: PayloadType = 111;
pub const DEFAULT_PAYLOAD_TYPE_VP8: PayloadType = 96;
pub const DEFAULT_PAYLOAD_TYPE_VP9: PayloadType = 98;
pub const DEFAULT_PAYLOAD_TYPE_H264: PayloadType = 100;

#[derive(Default, Debug, Clone)]
struct MediaEngineHeaderExtension {
    uri: String,
    is_audio: bool,
    is_video: bool,
}

/// A MediaEngine defines the codecs supported by the local endpoint.
/// It is populated before use and read concurrently afterwards.
pub struct MediaEngine {
    codecs: Vec<Arc<RTCRtpCodec>>,
    header_extensions: Vec<MediaEngineHeaderExtension>,
    pub(crate) event_sink: Arc<dyn EventSink>,
}

impl Default for MediaEngine {
    fn default() -> Self {
        MediaEngine {
            codecs: vec![],
            header_extensions: vec![],
            event_sink: default_event_sink(),
        }
    }
}

impl fmt::Debug for MediaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaEngine")
            .field("codecs", &self.codecs)
            .field("header_extensions", &self.header_extensions)
            .finish()
    }
}

impl MediaEngine {
    /// register_default_codecs registers the default codecs supported by webrtc-rs.
    pub fn register_default_codecs(&mut self) {
        self.register_codec(new_rtp_opus_codec(DEFAULT_PAYLOAD_TYPE_OPUS, 48000, 2));
        self.register_codec(new_rtp_g722_codec(DEFAULT_PAYLOAD_TYPE_G722, 8000));
        self.register_codec(new_rtp_pcmu_codec(DEFAULT_PAYLOAD_TYPE_PCMU, 8000));
        self.register_codec(new_rtp_pcma_codec(DEFAULT_PAYLOAD_TYPE_PCMA, 8000));
        self.register_codec(new_rtp_vp8_codec(DEFAULT_PAYLOAD_TYPE_VP8, 90000));
        self.register_codec(new_rtp_h264_codec(DEFAULT_PAYLOAD_TYPE_H264, 90000));
        self.register_codec(new_rtp_vp9_codec(DEFAULT_PAYLOAD_TYPE_VP9, 90000));
    }

    /// register_codec adds codec to the MediaEngine and returns the payload
    /// type it was registered under. Conflicting payload types are not
    /// detected; the earliest registration wins lookups.
    pub fn register_codec(&mut self, codec: RTCRtpCodec) -> PayloadType {
        let payload_type = codec.payload_type;
        self.codecs.push(Arc::new(codec));
        payload_type
    }

    /// register_header_extension advertises a RFC5285 header extension for
    /// one media kind.
    pub fn register_header_extension(
        &mut self,
        extension: RTCRtpHeaderExtensionCapability,
        typ: RTPCodecType,
    ) {
        let ext = match self
            .header_extensions
            .iter()
            .position(|ext| ext.uri == extension.uri)
        {
            Some(i) => &mut self.header_extensions[i],
            None => {
                self.header_extensions.push(MediaEngineHeaderExtension {
                    uri: extension.uri,
                    ..Default::default()
                });
                let last = self.header_extensions.len() - 1;
                &mut self.header_extensions[last]
            }
        };

        match typ {
            RTPCodecType::Audio => ext.is_audio = true,
            RTPCodecType::Video => ext.is_video = true,
            RTPCodecType::Unspecified => {}
        }
    }

    /// get_codec returns the codec registered under payload_type.
    pub fn get_codec(&self, payload_type: PayloadType) -> Result<Arc<RTCRtpCodec>> {
        self.codecs
            .iter()
            .find(|codec| codec.payload_type == payload_type)
            .cloned()
            .ok_or(Error::ErrCodecNotFound)
    }

    /// get_codec_sdp returns the first registered codec matching the remote
    /// codec parameters on name, clock rate, channels and format parameters.
    /// The remote payload type is not considered.
    pub fn get_codec_sdp(&self, params: &RTCRtpCodecParameters) -> Result<Arc<RTCRtpCodec>> {
        for codec in &self.codecs {
            if UniCase::new(codec.name.as_str()) != UniCase::new(params.name.as_str())
                || codec.clock_rate() != params.clock_rate
                || codec.channels() != params.channels
            {
                continue;
            }

            match params.equal_fmtp(codec.sdp_fmtp_line()) {
                Ok(true) => return Ok(Arc::clone(codec)),
                Ok(false) => {}
                Err(err) => self.event_sink.emit(MediaEvent::CodecMatchFailed {
                    codec: params.to_string(),
                    reason: err.to_string(),
                }),
            }
        }

        Err(Error::ErrCodecNotFound)
    }

    /// get_codecs_by_kind returns the codecs of one kind in registration order.
    pub fn get_codecs_by_kind(&self, typ: RTPCodecType) -> Vec<Arc<RTCRtpCodec>> {
        self.codecs
            .iter()
            .filter(|codec| codec.kind == typ)
            .cloned()
            .collect()
    }

    /// get_capabilities returns what the MediaEngine can negotiate for one kind.
    pub fn get_capabilities(&self, typ: RTPCodecType) -> RTCRtpCapabilities {
        let codecs = self
            .get_codecs_by_kind(typ)
            .iter()
            .map(|codec| codec.capability.clone())
            .collect();

        let header_extensions = self
            .header_extensions
            .iter()
            .filter(|ext| match typ {
                RTPCodecType::Audio => ext.is_audio,
                RTPCodecType::Video => ext.is_video,
                RTPCodecType::Unspecified => false,
            })
            .map(|ext| RTCRtpHeaderExtensionCapability {
                uri: ext.uri.clone(),
            })
            .collect();

        RTCRtpCapabilities {
            codecs,
            header_extensions,
        }
    }
}
