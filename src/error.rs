use std::num::ParseIntError;

use thiserror::Error;

use crate::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use crate::rtp_transceiver::PayloadType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// ErrCodecNotFound is returned when a codec search to the Media Engine fails
    #[error("codec not found")]
    ErrCodecNotFound,

    /// ErrPayloadTypeNotFound is returned when a payload type is absent from
    /// the negotiated RTP parameters.
    #[error("payload type {0} not found in negotiated parameters")]
    ErrPayloadTypeNotFound(PayloadType),

    /// ErrNoPayloaderForCodec indicates that the requested codec does not have a payloader
    #[error("the requested codec does not have a payloader")]
    ErrNoPayloaderForCodec,

    /// ErrInvalidFmtpParameter indicates a format parameter segment without `=`.
    #[error("invalid fmtp parameter: {0}")]
    ErrInvalidFmtpParameter(String),

    #[error("{attribute} attribute to short: {value}")]
    ErrAttributeTooShort { attribute: String, value: String },
    #[error("invalid payload type: {0}")]
    ErrInvalidPayloadType(String),
    #[error("invalid codec: {0}")]
    ErrInvalidCodec(String),
    #[error("invalid clockrate: {0}")]
    ErrInvalidClockRate(String),
    #[error("invalid channels: {0}")]
    ErrInvalidChannels(String),
    #[error("invalid id: {0}")]
    ErrInvalidExtmapId(String),
    #[error("invalid ssrc: {0}")]
    ErrInvalidSsrc(String),

    /// ErrParseAttribute wraps a failure while correlating one attribute kind
    /// of a media section.
    #[error("failed to parse {attribute}: {source}")]
    ErrParseAttribute {
        attribute: String,
        source: Box<Error>,
    },

    /// ErrNoSsrcInMediaDescription indicates a media section without any
    /// cname tagged ssrc attribute.
    #[error("no ssrc with cname in media description")]
    ErrNoSsrcInMediaDescription,

    #[error("Receive has already been called")]
    ErrRTPReceiverReceiveAlreadyCalled,
    #[error("RTPReceiver has already been closed")]
    ErrRTPReceiverAlreadyClosed,
    #[error("RTPReceiver requires at least one decoding parameter")]
    ErrRTPReceiverNoEncodings,
    #[error("RTPReceiver stream closed before the first packet")]
    ErrRTPReceiverClosedBeforeFirstPacket,

    #[error("Track must not be nil")]
    ErrRTPSenderTrackNil,
    #[error("Send has already been called")]
    ErrRTPSenderSendAlreadyCalled,
    #[error("Sender has already been stopped")]
    ErrRTPSenderAlreadyStopped,
    #[error("Sender track input has already been consumed")]
    ErrRTPSenderTrackConsumed,

    /// ErrTrackModeMismatch is returned when samples are written to a track
    /// that carries packets, or the other way round.
    #[error("track does not accept this kind of input")]
    ErrTrackModeMismatch,

    #[error("invalid direction change in RTPTransceiver from {from}")]
    ErrRTPTransceiverInvalidDirectionChange { from: RTCRtpTransceiverDirection },
    #[error("RTPTransceiver has no sender")]
    ErrRTPTransceiverNoSender,
    #[error("RTPTransceiver has already been started")]
    ErrRTPTransceiverAlreadyStarted,
    #[error("RTPTransceiver has already been stopped")]
    ErrRTPTransceiverStopped,
    #[error("RTPTransceiver has no remote parameters")]
    ErrRTPTransceiverNoRemoteParameters,

    /// ErrClosedPipe indicates a read or write on a closed stream.
    #[error("stream is closed")]
    ErrClosedPipe,

    #[error("{0}")]
    Util(#[from] util::Error),
    #[error("{0}")]
    Srtp(#[from] srtp::Error),
    #[error("{0}")]
    Sdp(#[from] sdp::Error),
    #[error("{0}")]
    Rtcp(#[from] rtcp::Error),
    #[error("{0}")]
    Rtp(#[from] rtp::Error),

    #[error("parse int: {0}")]
    ParseInt(#[from] ParseIntError),

    #[allow(non_camel_case_types)]
    #[error("{0}")]
    new(String),
}

impl Error {
    /// wraps self as the cause of a failure to parse the named attribute
    pub(crate) fn in_attribute(self, attribute: &str) -> Self {
        Error::ErrParseAttribute {
            attribute: attribute.to_owned(),
            source: Box::new(self),
        }
    }
}

/// flatten_errs flattens multiple errors into one
pub fn flatten_errs(errs: Vec<impl Into<Error>>) -> Result<()> {
    if errs.is_empty() {
        Ok(())
    } else {
        let errs_strs: Vec<String> = errs.into_iter().map(|e| e.into().to_string()).collect();
        Err(Error::new(errs_strs.join("\n")))
    }
}
