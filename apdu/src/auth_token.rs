//! Native auth token signing payload and response
//!
//! The payload is sent through the shared chunking flow (see [crate::sign])
//! under [crate::Instruction::SignMsgAuthToken]; the approved response
//! carries the signing address alongside the signature so callers can bind
//! the token to an identity without a separate address read.

use byteorder::{BigEndian, ByteOrder};
use encdec::{Decode, Encode};

use crate::{ApduError, SIGNATURE_LEN};

/// Auth token signing payload.
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         ACCOUNT_INDEX                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         ADDRESS_INDEX                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           TOKEN_LEN                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                            TOKEN...                           /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AuthTokenPayload<'a> {
    /// BIP32 account index
    pub account: u32,
    /// BIP32 address index
    pub index: u32,
    /// Token bytes as presented by the authenticating service
    pub token: &'a [u8],
}

impl<'a> AuthTokenPayload<'a> {
    /// Create a new auth token payload
    pub fn new(account: u32, index: u32, token: &'a [u8]) -> Self {
        Self {
            account,
            index,
            token,
        }
    }
}

impl<'a> Encode for AuthTokenPayload<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(12 + self.token.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        BigEndian::write_u32(&mut buff[..4], self.account);
        BigEndian::write_u32(&mut buff[4..8], self.index);
        BigEndian::write_u32(&mut buff[8..12], self.token.len() as u32);
        buff[12..][..self.token.len()].copy_from_slice(self.token);

        Ok(n)
    }
}

/// Auth token response, `[len][bech32 address][64-byte signature]` where
/// `len` covers address and signature together
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AuthTokenResp<'a> {
    /// Bech32 signing address
    pub address: &'a str,
    /// Detached ed25519 signature over the token
    pub signature: [u8; SIGNATURE_LEN],
}

impl<'a> Decode<'a> for AuthTokenResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < 1 + SIGNATURE_LEN + 1 {
            return Err(ApduError::InvalidLength);
        }
        if buff[0] as usize != buff.len() - 1 {
            return Err(ApduError::InvalidEncoding);
        }

        let addr_len = buff.len() - 1 - SIGNATURE_LEN;
        let address =
            core::str::from_utf8(&buff[1..1 + addr_len]).map_err(|_| ApduError::Utf8)?;

        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&buff[1 + addr_len..]);

        Ok((Self { address, signature }, buff.len()))
    }
}
