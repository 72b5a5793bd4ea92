#![warn(rust_2018_idioms)]
#![allow(dead_code)]

// re-export sub-crates
pub use media;
pub use rtcp;
pub use rtp;
pub use sdp;
pub use srtp;
pub use util;

pub mod api;
pub mod error;
pub mod event;
pub mod rtp_transceiver;
pub mod sdp_attributes;
pub mod srtp_transport;
pub mod track;

pub use error::Error;

#[macro_use]
extern crate lazy_static;

pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";

/// Equal to UDP MTU
pub(crate) const RECEIVE_MTU: usize = 1460;

/// Largest RTP packet produced when packetizing samples.
pub(crate) const RTP_OUTBOUND_MTU: usize = 1400;

/// Capacity of every track queue unless configured otherwise.
pub(crate) const DEFAULT_QUEUE_SIZE: usize = 15;
