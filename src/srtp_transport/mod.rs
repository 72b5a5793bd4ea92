
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use srtp::session::Session;
use srtp::stream::Stream;

use crate::error::Result;
use crate::rtp_transceiver::SSRC;

/// ReadStream yields one decrypted packet per read.
#[async_trait]
pub trait ReadStream: Send + Sync {
    async fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// close unblocks a pending read, which then fails.
    async fn close(&self) -> Result<()>;
}

/// WriteStream encrypts and sends RTP packets.
#[async_trait]
pub trait WriteStream: Send + Sync {
    async fn write_rtp(&self, header: &rtp::header::Header, payload: &Bytes) -> Result<usize>;
}

/// SecureTransport is an established secure media session. Key exchange and
/// session setup happen before it is handed to the engines.
#[async_trait]
pub trait SecureTransport: Send + Sync {
    async fn open_rtp_read_stream(&self, ssrc: SSRC) -> Result<Arc<dyn ReadStream>>;
    async fn open_rtcp_read_stream(&self, ssrc: SSRC) -> Result<Arc<dyn ReadStream>>;
    async fn open_write_stream(&self) -> Result<Arc<dyn WriteStream>>;
}

#[async_trait]
impl ReadStream for Stream {
    async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        Ok(Stream::read(self, buf).await?)
    }

    async fn close(&self) -> Result<()> {
        Ok(Stream::close(self).await?)
    }
}

struct SrtpWriteStream {
    session: Arc<Session>,
}

#[async_trait]
impl WriteStream for SrtpWriteStream {
    async fn write_rtp(&self, header: &rtp::header::Header, payload: &Bytes) -> Result<usize> {
        let pkt = rtp::packet::Packet {
            header: header.clone(),
            payload: payload.clone(),
        };
        Ok(self.session.write_rtp(&pkt).await?)
    }
}

/// SrtpTransport serves streams from an SRTP session and its SRTCP companion.
pub struct SrtpTransport {
    srtp_session: Arc<Session>,
    srtcp_session: Arc<Session>,
}

impl SrtpTransport {
    pub fn new(srtp_session: Arc<Session>, srtcp_session: Arc<Session>) -> Self {
        SrtpTransport {
            srtp_session,
            srtcp_session,
        }
    }
}

#[async_trait]
impl SecureTransport for SrtpTransport {
    async fn open_rtp_read_stream(&self, ssrc: SSRC) -> Result<Arc<dyn ReadStream>> {
        let stream: Arc<dyn ReadStream> = self.srtp_session.open(ssrc).await;
        Ok(stream)
    }

    async fn open_rtcp_read_stream(&self, ssrc: SSRC) -> Result<Arc<dyn ReadStream>> {
        let stream: Arc<dyn ReadStream> = self.srtcp_session.open(ssrc).await;
        Ok(stream)
    }

    async fn open_write_stream(&self) -> Result<Arc<dyn WriteStream>> {
        Ok(Arc::new(SrtpWriteStream {
            session: Arc::clone(&self.srtp_session),
        }))
    }
}
