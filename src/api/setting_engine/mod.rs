
use crate::{DEFAULT_QUEUE_SIZE, RECEIVE_MTU, RTP_OUTBOUND_MTU};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSizes {
    pub rtp: usize,
    pub rtcp: usize,
}

/// SettingEngine allows influencing behavior of the engines in ways that are
/// not covered by the negotiated parameters. Zero values select the defaults.
#[derive(Default, Debug, Clone)]
pub struct SettingEngine {
    pub(crate) receive_mtu: usize,
    pub(crate) rtp_outbound_mtu: usize,
    pub(crate) queue_sizes: QueueSizes,
}

impl SettingEngine {
    /// get_receive_mtu returns the configured MTU. If SettingEngine's MTU is configured to 0 it returns the default
    pub(crate) fn get_receive_mtu(&self) -> usize {
        if self.receive_mtu != 0 {
            self.receive_mtu
        } else {
            RECEIVE_MTU
        }
    }

    pub(crate) fn get_rtp_outbound_mtu(&self) -> usize {
        if self.rtp_outbound_mtu != 0 {
            self.rtp_outbound_mtu
        } else {
            RTP_OUTBOUND_MTU
        }
    }

    /// get_queue_sizes returns the capacity of the rtp and rtcp output queues.
    pub(crate) fn get_queue_sizes(&self) -> QueueSizes {
        let or_default = |n: usize| if n != 0 { n } else { DEFAULT_QUEUE_SIZE };
        QueueSizes {
            rtp: or_default(self.queue_sizes.rtp),
            rtcp: or_default(self.queue_sizes.rtcp),
        }
    }

    /// set_receive_mtu sets the size of the buffer used to read one packet
    /// from the secure transport.
    pub fn set_receive_mtu(&mut self, receive_mtu: usize) {
        self.receive_mtu = receive_mtu;
    }

    /// set_rtp_outbound_mtu sets the largest RTP packet the sample
    /// packetizer emits.
    pub fn set_rtp_outbound_mtu(&mut self, mtu: usize) {
        self.rtp_outbound_mtu = mtu;
    }

    /// set_queue_sizes sets how many packets a track buffers before the
    /// newest arrivals are dropped.
    pub fn set_queue_sizes(&mut self, rtp: usize, rtcp: usize) {
        self.queue_sizes = QueueSizes { rtp, rtcp };
    }
}
