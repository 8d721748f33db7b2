//! Transport abstraction for APDU exchange with a device
//!

use core::fmt::Debug;

use async_trait::async_trait;

use ledger_mvx_apdu::{ApduError, ApduReq, MAX_APDU_DATA_LEN};

use crate::Error;

#[cfg(feature = "transport_hid")]
pub mod hid;
#[cfg(feature = "transport_hid")]
pub use hid::{HidError, HidFramer, HidTransport, ReportIo, TransportNativeHid};

#[cfg(feature = "transport_tcp")]
pub mod tcp;
#[cfg(feature = "transport_tcp")]
pub use tcp::{TcpError, TcpOptions, TransportTcp};

/// Exchange trait for transports able to run one APDU request / response
/// round-trip.
///
/// The protocol is strictly synchronous: one exchange must complete before
/// the next begins, and chunked operations must not interleave exchanges
/// from two logical calls. [crate::DeviceHandle] enforces this by holding
/// its transport behind a mutex for the full duration of each operation.
#[async_trait]
pub trait Exchange {
    type Error: Debug + Send;

    /// Execute an exchange, returning the raw response with the trailing
    /// status word still attached
    async fn exchange(&mut self, req: &(dyn ApduReq + Sync)) -> Result<Vec<u8>, Self::Error>;
}

/// Serialize a request APDU as `CLA ‖ INS ‖ P1 ‖ P2 ‖ LEN ‖ DATA`.
///
/// A data field over 255 bytes cannot be represented in the one-byte
/// length; callers chunk above this layer, so oversize here is a
/// programming error.
pub(crate) fn serialize_req(req: &(dyn ApduReq + Sync)) -> Result<Vec<u8>, ApduError> {
    let n = req.encode_len()?;
    assert!(n <= MAX_APDU_DATA_LEN, "APDU data cannot exceed 255 bytes");

    let h = req.header();

    let mut buff = vec![0u8; 5 + n];
    buff[0] = h.cla;
    buff[1] = h.ins;
    buff[2] = h.p1;
    buff[3] = h.p2;
    buff[4] = n as u8;

    req.encode(&mut buff[5..])?;

    Ok(buff)
}

/// Generic device transport (abstract over transport types)
#[derive(strum::Display)]
#[non_exhaustive]
pub enum GenericTransport {
    #[cfg(feature = "transport_hid")]
    Hid(TransportNativeHid),
    #[cfg(feature = "transport_tcp")]
    Tcp(TransportTcp),
}

/// Convert a HID transport into a generic transport
#[cfg(feature = "transport_hid")]
impl From<TransportNativeHid> for GenericTransport {
    fn from(t: TransportNativeHid) -> Self {
        Self::Hid(t)
    }
}

/// Convert a TCP transport into a generic transport
#[cfg(feature = "transport_tcp")]
impl From<TransportTcp> for GenericTransport {
    fn from(t: TransportTcp) -> Self {
        Self::Tcp(t)
    }
}

/// Implementation of [Exchange] for [GenericTransport], hiding transport
/// error types
#[async_trait]
impl Exchange for GenericTransport {
    type Error = Error;

    async fn exchange(&mut self, req: &(dyn ApduReq + Sync)) -> Result<Vec<u8>, Self::Error> {
        let r = match self {
            #[cfg(feature = "transport_hid")]
            Self::Hid(t) => t.exchange(req).await?,
            #[cfg(feature = "transport_tcp")]
            Self::Tcp(t) => t.exchange(req).await?,
            #[cfg(not(any(feature = "transport_hid", feature = "transport_tcp")))]
            _ => unreachable!(),
        };

        Ok(r)
    }
}
