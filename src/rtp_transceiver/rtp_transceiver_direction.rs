use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// RTCRtpTransceiverDirection indicates which halves of a transceiver carry media.
/// It is also the direction attribute of a negotiated header extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RTCRtpTransceiverDirection {
    #[default]
    Unspecified = 0,

    /// Sendrecv indicates media flows both ways.
    Sendrecv = 1,

    /// Sendonly indicates only the sender carries media.
    Sendonly = 2,

    /// Recvonly indicates only the receiver carries media.
    Recvonly = 3,

    /// Inactive indicates no media flows.
    Inactive = 4,
}

const DIRECTION_SENDRECV_STR: &str = "sendrecv";
const DIRECTION_SENDONLY_STR: &str = "sendonly";
const DIRECTION_RECVONLY_STR: &str = "recvonly";
const DIRECTION_INACTIVE_STR: &str = "inactive";

impl From<&str> for RTCRtpTransceiverDirection {
    fn from(raw: &str) -> Self {
        match raw {
            DIRECTION_SENDRECV_STR => RTCRtpTransceiverDirection::Sendrecv,
            DIRECTION_SENDONLY_STR => RTCRtpTransceiverDirection::Sendonly,
            DIRECTION_RECVONLY_STR => RTCRtpTransceiverDirection::Recvonly,
            DIRECTION_INACTIVE_STR => RTCRtpTransceiverDirection::Inactive,
            _ => RTCRtpTransceiverDirection::Unspecified,
        }
    }
}

impl From<u8> for RTCRtpTransceiverDirection {
    fn from(v: u8) -> Self {
        match v {
            1 => RTCRtpTransceiverDirection::Sendrecv,
            2 => RTCRtpTransceiverDirection::Sendonly,
            3 => RTCRtpTransceiverDirection::Recvonly,
            4 => RTCRtpTransceiverDirection::Inactive,
            _ => RTCRtpTransceiverDirection::Unspecified,
        }
    }
}

impl fmt::Display for RTCRtpTransceiverDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCRtpTransceiverDirection::Sendrecv => DIRECTION_SENDRECV_STR,
            RTCRtpTransceiverDirection::Sendonly => DIRECTION_SENDONLY_STR,
            RTCRtpTransceiverDirection::Recvonly => DIRECTION_RECVONLY_STR,
            RTCRtpTransceiverDirection::Inactive => DIRECTION_INACTIVE_STR,
            RTCRtpTransceiverDirection::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

impl RTCRtpTransceiverDirection {
    pub fn from_send_recv(send: bool, recv: bool) -> RTCRtpTransceiverDirection {
        match (send, recv) {
            (true, true) => Self::Sendrecv,
            (true, false) => Self::Sendonly,
            (false, true) => Self::Recvonly,
            (false, false) => Self::Inactive,
        }
    }

    pub fn has_send(&self) -> bool {
        matches!(self, Self::Sendrecv | Self::Sendonly)
    }

    pub fn has_recv(&self) -> bool {
        matches!(self, Self::Sendrecv | Self::Recvonly)
    }

    /// with_sending_track returns the direction after a sending track is
    /// attached. Only recvonly and inactive can gain a sender.
    pub fn with_sending_track(&self) -> Result<RTCRtpTransceiverDirection> {
        match *self {
            Self::Recvonly => Ok(Self::Sendrecv),
            Self::Inactive => Ok(Self::Sendonly),
            from => Err(Error::ErrRTPTransceiverInvalidDirectionChange { from }),
        }
    }
}
