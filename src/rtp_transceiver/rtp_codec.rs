use std::collections::HashMap;
use std::fmt;

use rtp::packetizer::Payloader;
use serde::{Deserialize, Serialize};

use super::*;
use crate::api::media_engine::*;
use crate::error::{Error, Result};
use crate::sdp_attributes::parse_fmtp_string;

/// RTPCodecType determines the type of a codec
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RTPCodecType {
    #[default]
    Unspecified = 0,

    /// RTPCodecTypeAudio indicates this is an audio codec
    Audio = 1,

    /// RTPCodecTypeVideo indicates this is a video codec
    Video = 2,
}

impl From<&str> for RTPCodecType {
    fn from(raw: &str) -> Self {
        match raw {
            "audio" => RTPCodecType::Audio,
            "video" => RTPCodecType::Video,
            _ => RTPCodecType::Unspecified,
        }
    }
}

impl fmt::Display for RTPCodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTPCodecType::Audio => "audio",
            RTPCodecType::Video => "video",
            RTPCodecType::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// PayloaderFn builds a fresh payloader for one outbound stream.
pub type PayloaderFn = fn() -> Box<dyn Payloader + Send + Sync>;

/// RTCRtpCodecCapability is the negotiable part of a codec, independent of
/// the local payload type numbering.
/// <https://w3c.github.io/webrtc-pc/#dictionary-rtcrtpcodeccapability-members>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpCodecCapability {
    pub mime_type: String,
    pub clock_rate: u32,
    pub channels: u16,
    pub sdp_fmtp_line: String,
}

/// RTCRtpCodec is a codec supported by the local endpoint.
#[derive(Debug, Clone)]
pub struct RTCRtpCodec {
    pub capability: RTCRtpCodecCapability,
    pub kind: RTPCodecType,
    pub name: String,
    pub payload_type: PayloadType,
    payloader: Option<PayloaderFn>,
}

impl RTCRtpCodec {
    pub fn new(
        kind: RTPCodecType,
        name: &str,
        clock_rate: u32,
        channels: u16,
        sdp_fmtp_line: &str,
        payload_type: PayloadType,
        payloader: Option<PayloaderFn>,
    ) -> Self {
        RTCRtpCodec {
            capability: RTCRtpCodecCapability {
                mime_type: format!("{kind}/{name}"),
                clock_rate,
                channels,
                sdp_fmtp_line: sdp_fmtp_line.to_owned(),
            },
            kind,
            name: name.to_owned(),
            payload_type,
            payloader,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.capability.mime_type
    }

    pub fn clock_rate(&self) -> u32 {
        self.capability.clock_rate
    }

    pub fn channels(&self) -> u16 {
        self.capability.channels
    }

    pub fn sdp_fmtp_line(&self) -> &str {
        &self.capability.sdp_fmtp_line
    }

    /// payloader builds the codec's payloader, or fails for codecs registered
    /// without packetization support.
    pub fn payloader(&self) -> Result<Box<dyn Payloader + Send + Sync>> {
        match self.payloader {
            Some(f) => Ok(f()),
            None => Err(Error::ErrNoPayloaderForCodec),
        }
    }

    pub fn has_payloader(&self) -> bool {
        self.payloader.is_some()
    }
}

fn opus_payloader() -> Box<dyn Payloader + Send + Sync> {
    Box::<rtp::codecs::opus::OpusPayloader>::default()
}

fn g7xx_payloader() -> Box<dyn Payloader + Send + Sync> {
    Box::<rtp::codecs::g7xx::G7xxPayloader>::default()
}

fn vp8_payloader() -> Box<dyn Payloader + Send + Sync> {
    let mut vp8_payloader = rtp::codecs::vp8::Vp8Payloader::default();
    vp8_payloader.enable_picture_id = true;
    Box::new(vp8_payloader)
}

fn vp9_payloader() -> Box<dyn Payloader + Send + Sync> {
    Box::<rtp::codecs::vp9::Vp9Payloader>::default()
}

fn h264_payloader() -> Box<dyn Payloader + Send + Sync> {
    Box::<rtp::codecs::h264::H264Payloader>::default()
}

/// new_rtp_opus_codec is a helper to create an Opus codec
pub fn new_rtp_opus_codec(payload_type: PayloadType, clock_rate: u32, channels: u16) -> RTCRtpCodec {
    RTCRtpCodec::new(
        RTPCodecType::Audio,
        OPUS,
        clock_rate,
        channels,
        "minptime=10;useinbandfec=1",
        payload_type,
        Some(opus_payloader),
    )
}

/// new_rtp_g722_codec is a helper to create a G722 codec
pub fn new_rtp_g722_codec(payload_type: PayloadType, clock_rate: u32) -> RTCRtpCodec {
    RTCRtpCodec::new(
        RTPCodecType::Audio,
        G722,
        clock_rate,
        0,
        "",
        payload_type,
        Some(g7xx_payloader),
    )
}

/// new_rtp_pcmu_codec is a helper to create a G711 mu-law codec
pub fn new_rtp_pcmu_codec(payload_type: PayloadType, clock_rate: u32) -> RTCRtpCodec {
    RTCRtpCodec::new(
        RTPCodecType::Audio,
        PCMU,
        clock_rate,
        0,
        "",
        payload_type,
        Some(g7xx_payloader),
    )
}

/// new_rtp_pcma_codec is a helper to create a G711 a-law codec
pub fn new_rtp_pcma_codec(payload_type: PayloadType, clock_rate: u32) -> RTCRtpCodec {
    RTCRtpCodec::new(
        RTPCodecType::Audio,
        PCMA,
        clock_rate,
        0,
        "",
        payload_type,
        Some(g7xx_payloader),
    )
}

/// new_rtp_vp8_codec is a helper to create a VP8 codec
pub fn new_rtp_vp8_codec(payload_type: PayloadType, clock_rate: u32) -> RTCRtpCodec {
    RTCRtpCodec::new(
        RTPCodecType::Video,
        VP8,
        clock_rate,
        0,
        "",
        payload_type,
        Some(vp8_payloader),
    )
}

/// new_rtp_vp9_codec is a helper to create a VP9 codec
pub fn new_rtp_vp9_codec(payload_type: PayloadType, clock_rate: u32) -> RTCRtpCodec {
    RTCRtpCodec::new(
        RTPCodecType::Video,
        VP9,
        clock_rate,
        0,
        "",
        payload_type,
        Some(vp9_payloader),
    )
}

/// new_rtp_h264_codec is a helper to create a H264 codec
pub fn new_rtp_h264_codec(payload_type: PayloadType, clock_rate: u32) -> RTCRtpCodec {
    RTCRtpCodec::new(
        RTPCodecType::Video,
        H264,
        clock_rate,
        0,
        "level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42001f",
        payload_type,
        Some(h264_payloader),
    )
}

/// RTCRtpHeaderExtensionCapability is used to define a RFC5285 RTP header extension supported by the codec.
/// <https://w3c.github.io/webrtc-pc/#dom-rtcrtpcapabilities-headerextensions>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpHeaderExtensionCapability {
    pub uri: String,
}

/// RTCRtpHeaderExtensionParameters represents a negotiated RFC5285 RTP header extension.
/// <https://w3c.github.io/webrtc-pc/#dictionary-rtcrtpheaderextensionparameters-members>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpHeaderExtensionParameters {
    pub id: u16,
    pub direction: RTCRtpTransceiverDirection,
    pub uri: String,
}

/// RTCRtpCodecParameters is a codec as it appears in a remote description,
/// with the payload type the peer signaled for it.
/// <https://w3c.github.io/webrtc-pc/#rtcrtpcodecparameters>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpCodecParameters {
    pub name: String,
    pub mime_type: String,
    pub payload_type: PayloadType,
    pub clock_rate: u32,
    pub maxptime: u32,
    pub ptime: u32,
    pub channels: u16,
    pub rtcp_feedback: Vec<RTCPFeedback>,
    pub parameters: HashMap<String, String>,
}

impl fmt::Display for RTCRtpCodecParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}/{}",
            self.payload_type, self.name, self.clock_rate, self.channels
        )
    }
}

impl RTCRtpCodecParameters {
    /// equal_fmtp reports whether the format parameter line `other` decodes
    /// to exactly the parameters of this codec. Key order is irrelevant.
    pub fn equal_fmtp(&self, other: &str) -> Result<bool> {
        let b = parse_fmtp_string(other)?;
        Ok(self.parameters == b)
    }
}

/// RTCRtcpParameters carries the RTCP settings of one media section.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtcpParameters {
    pub cname: String,
    pub reduced_size: bool,
}

/// RTCRtpParameters is a list of negotiated codecs and header extensions
/// <https://w3c.github.io/webrtc-pc/#dictionary-rtcrtpparameters-members>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpParameters {
    pub header_extensions: Vec<RTCRtpHeaderExtensionParameters>,
    pub codecs: Vec<RTCRtpCodecParameters>,
    pub rtcp: RTCRtcpParameters,
}

impl RTCRtpParameters {
    pub fn get_codec_parameters(&self, payload_type: PayloadType) -> Result<&RTCRtpCodecParameters> {
        self.codecs
            .iter()
            .find(|c| c.payload_type == payload_type)
            .ok_or(Error::ErrPayloadTypeNotFound(payload_type))
    }
}
