//! Protocol / APDU definitions for MultiversX app communication
//!
//! This crate provides the protocol specification and typed encodings for
//! talking to the MultiversX nano app: instruction codes, status words, and
//! one request/response object per command.
//!
//! Requests are encoded as `CLA ‖ INS ‖ P1 ‖ P2 ‖ LEN ‖ DATA` with `DATA`
//! limited to 255 bytes (single-byte length field), responses as
//! `DATA ‖ STATUS` with a trailing big-endian status word. Multi-byte
//! integer fields are big-endian on the wire.

#![no_std]

#[cfg(test)]
extern crate std;

pub use encdec::{Decode, DecodeOwned, Encode};

pub mod address;
pub mod auth_token;
pub mod config;
pub mod esdt;
pub mod prelude;
pub mod sign;
pub mod status;
pub mod version;

/// MultiversX APDU class
pub const MVX_APDU_CLA: u8 = 0xed;

/// Maximum data length for a single APDU (one-byte length field)
pub const MAX_APDU_DATA_LEN: usize = 255;

/// Ed25519 signature length returned by signing commands
pub const SIGNATURE_LEN: usize = 64;

/// MultiversX APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, strum::Display)]
#[derive(num_enum::IntoPrimitive, num_enum::TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch application version string
    GetAppVersion = 0x01,

    /// Fetch application configuration
    GetAppConfiguration = 0x02,

    /// Derive an address for an account / address index pair
    GetAddr = 0x03,

    /// Sign a serialized transaction (chunked)
    SignTx = 0x04,

    /// Pin the active account / address index on the device
    SetAddr = 0x05,

    /// Sign a free-form message (chunked)
    SignMsg = 0x06,

    /// Sign a transaction in hash mode (chunked)
    SignTxHash = 0x07,

    /// Register an ESDT token descriptor for display
    ProvideEsdtInfo = 0x08,

    /// Sign a native auth token (chunked)
    SignMsgAuthToken = 0x09,
}

/// APDU encode / decode error
#[derive(Copy, Clone, Debug, PartialEq, strum::Display)]
pub enum ApduError {
    /// Buffer too small for the encoded object
    InvalidLength,
    /// Malformed field encoding
    InvalidEncoding,
    /// Invalid UTF-8 in a string field
    Utf8,
}

impl From<encdec::Error> for ApduError {
    fn from(e: encdec::Error) -> Self {
        match e {
            encdec::Error::Length => ApduError::InvalidLength,
            _ => ApduError::InvalidEncoding,
        }
    }
}

/// APDU request header
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ApduHeader {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
}

/// Request APDU trait, providing the header under which a request object
/// is sent
pub trait ApduReq: Encode<Error = ApduError> {
    /// Fetch the APDU header for this request
    fn header(&self) -> ApduHeader;
}

/// Helper trait for request APDUs with a static instruction code.
///
/// `p1` / `p2` default to zero and may be overridden per-object where the
/// command carries parameters (see [address::GetAddressReq]).
pub trait ApduStatic {
    /// Application class, `0xED` for all MultiversX commands
    const CLA: u8 = MVX_APDU_CLA;

    /// Command instruction code
    const INS: u8;

    /// First parameter byte
    fn p1(&self) -> u8 {
        0
    }

    /// Second parameter byte
    fn p2(&self) -> u8 {
        0
    }
}

impl<T: ApduStatic + Encode<Error = ApduError>> ApduReq for T {
    fn header(&self) -> ApduHeader {
        ApduHeader {
            cla: T::CLA,
            ins: T::INS,
            p1: self.p1(),
            p2: self.p2(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Helper for request APDU encode tests
    pub fn encode_apdu<'a, A: Encode<Error = ApduError>>(
        buff: &'a mut [u8],
        apdu: &A,
    ) -> &'a [u8] {
        let n = apdu.encode(buff).expect("encode failed");

        // Encoded data must fit a single APDU data field
        assert!(
            n <= MAX_APDU_DATA_LEN,
            "encoded length {} exceeds maximum APDU data length",
            n
        );

        // Check encoded length matches expected length
        let expected_n = apdu.encode_len().expect("get length failed");
        assert_eq!(n, expected_n, "encode length mismatch");

        &buff[..n]
    }

    #[test]
    fn instruction_codes() {
        assert_eq!(Instruction::GetAppVersion as u8, 0x01);
        assert_eq!(Instruction::SignMsgAuthToken as u8, 0x09);
        assert_eq!(Instruction::try_from(0x04u8).unwrap(), Instruction::SignTx);
        assert!(Instruction::try_from(0x0au8).is_err());
    }
}
