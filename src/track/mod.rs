pub mod track_local;
pub mod track_remote;

/// RtcpPackets is one unmarshalled RTCP compound packet.
pub type RtcpPackets = Vec<Box<dyn rtcp::packet::Packet + Send + Sync>>;
