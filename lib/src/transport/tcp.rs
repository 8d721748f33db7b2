//! TCP transport for the speculos device simulator
//!
//! Speculos exposes an APDU socket with 4-byte big-endian length framing:
//! the request length covers the serialized APDU, the response length
//! covers the payload only, with the 2-byte status word appended after it.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use log::trace;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use ledger_mvx_apdu::{ApduError, ApduReq};

use super::{serialize_req, Exchange};

/// Default speculos APDU port
pub const DEFAULT_APDU_PORT: u16 = 9999;

/// TCP transport error
#[derive(Debug, thiserror::Error)]
pub enum TcpError {
    /// Socket error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Response shorter than its own length prefix promised
    #[error("truncated response")]
    InvalidLength,

    /// Request APDU could not be serialized
    #[error("APDU encoding error: {0}")]
    Apdu(ApduError),
}

impl From<ApduError> for TcpError {
    fn from(e: ApduError) -> Self {
        TcpError::Apdu(e)
    }
}

/// Simulator endpoint options
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TcpOptions {
    pub addr: IpAddr,
    pub port: u16,
}

impl Default for TcpOptions {
    fn default() -> Self {
        Self {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_APDU_PORT,
        }
    }
}

impl TcpOptions {
    /// Socket address for these options
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

/// APDU transport over a speculos TCP socket
pub struct TransportTcp {
    stream: TcpStream,
}

impl TransportTcp {
    /// Connect to a speculos APDU socket
    pub async fn new(opts: TcpOptions) -> Result<Self, TcpError> {
        let stream = TcpStream::connect(opts.socket_addr()).await?;
        Ok(Self { stream })
    }
}

#[async_trait::async_trait]
impl Exchange for TransportTcp {
    type Error = TcpError;

    async fn exchange(&mut self, req: &(dyn ApduReq + Sync)) -> Result<Vec<u8>, Self::Error> {
        let data = serialize_req(req)?;

        trace!("TCP <= {}", hex::encode(&data));

        self.stream
            .write_all(&(data.len() as u32).to_be_bytes())
            .await?;
        self.stream.write_all(&data).await?;

        let mut len_prefix = [0u8; 4];
        self.stream.read_exact(&mut len_prefix).await?;
        let n = u32::from_be_bytes(len_prefix) as usize;

        // Payload plus the trailing status word
        let mut resp = vec![0u8; n + 2];
        self.stream
            .read_exact(&mut resp)
            .await
            .map_err(|_| TcpError::InvalidLength)?;

        trace!("TCP => {}", hex::encode(&resp));

        Ok(resp)
    }
}
