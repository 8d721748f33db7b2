//! Library error taxonomy
//!
//! Two layers, matching the protocol: transport / framing faults
//! ([Error::Hid], [Error::Tcp], [Error::MissingStatusWord] and the malformed
//! response kinds) are fatal to the connection and never retried here;
//! [Error::Device] wraps a status word the firmware reported, and retry
//! policy for those (eg. re-prompting after a rejection) belongs to the
//! caller.

use ledger_mvx_apdu::{status::DeviceError, ApduError};

/// MultiversX Ledger API error type
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// HID subsystem could not be initialised
    #[error("could not create HidApi instance")]
    HidInit,

    /// No matching device attached
    #[error("Nano S not detected")]
    NoDevice,

    /// HID transport error
    #[cfg(feature = "transport_hid")]
    #[error("transport error: {0}")]
    Hid(#[from] crate::transport::HidError),

    /// TCP transport error
    #[cfg(feature = "transport_tcp")]
    #[error("transport error: {0}")]
    Tcp(#[from] crate::transport::TcpError),

    /// Error status reported by the device firmware
    #[error("device error: {0}")]
    Device(DeviceError),

    /// Response shorter than the two-byte status word
    #[error("APDU response missing status code")]
    MissingStatusWord,

    /// APDU encode / decode fault
    #[error("APDU encoding error: {0}")]
    Apdu(ApduError),

    /// GetConfiguration response was not exactly six bytes
    #[error("GetConfiguration erroneous response")]
    InvalidConfigResponse,

    /// GetAddress response length byte did not match the payload
    #[error("invalid get address response")]
    InvalidAddressResponse,

    /// Final signing response was not a well-formed 64-byte signature
    #[error("invalid signature received from Ledger")]
    InvalidSignature,

    /// Auth token response did not carry address plus signature
    #[error("invalid auth token response")]
    InvalidAuthTokenResponse,

    /// Timeout waiting for user interaction; the connection must be
    /// reopened, mid-exchange abandonment cannot be signalled to the
    /// firmware
    #[error("timeout waiting for user interaction")]
    UserTimeout,

    /// Timeout waiting for a device response; the connection must be
    /// reopened
    #[error("timeout waiting for device response")]
    RequestTimeout,
}

impl Error {
    /// Whether this error is the user declining on the device, a normal
    /// cancellation rather than a fault
    pub fn is_user_denied(&self) -> bool {
        matches!(self, Error::Device(e) if e.is_user_denied())
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Error::Device(e)
    }
}
