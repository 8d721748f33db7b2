//! Address derivation and selection APDUs

use byteorder::{BigEndian, ByteOrder};
use encdec::{Decode, Encode};

use crate::{ApduError, ApduStatic, Instruction};

/// P1 requesting on-device confirmation of the derived address
pub const P1_CONFIRM: u8 = 0x01;
/// P1 for a silent read, no user interaction
pub const P1_NON_CONFIRM: u8 = 0x00;
/// P2 selecting bech32 display encoding on the device
pub const P2_DISPLAY_BECH32: u8 = 0x00;
/// P2 selecting hex display encoding on the device
pub const P2_DISPLAY_HEX: u8 = 0x01;

/// On-device display encoding for a derived address
#[derive(Copy, Clone, Debug, Default, PartialEq, strum::Display)]
pub enum DisplayFormat {
    /// Render as bech32 (`erd1...`)
    #[default]
    Bech32,
    /// Render as raw hex
    Hex,
}

/// Derive address request.
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
/// ```
///
/// Confirmation and display encoding travel in P1 / P2.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct GetAddressReq {
    /// BIP32 account index
    pub account: u32,
    /// BIP32 address index
    pub index: u32,
    /// Require on-device user confirmation before returning
    pub confirm: bool,
    /// Display encoding used on the device screen
    pub format: DisplayFormat,
}

impl GetAddressReq {
    /// Create a new address derivation request
    pub fn new(account: u32, index: u32, confirm: bool) -> Self {
        Self {
            account,
            index,
            confirm,
            format: DisplayFormat::default(),
        }
    }
}

impl ApduStatic for GetAddressReq {
    const INS: u8 = Instruction::GetAddr as u8;

    fn p1(&self) -> u8 {
        match self.confirm {
            true => P1_CONFIRM,
            false => P1_NON_CONFIRM,
        }
    }

    fn p2(&self) -> u8 {
        match self.format {
            DisplayFormat::Bech32 => P2_DISPLAY_BECH32,
            DisplayFormat::Hex => P2_DISPLAY_HEX,
        }
    }
}

impl Encode for GetAddressReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(8)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < 8 {
            return Err(ApduError::InvalidLength);
        }

        BigEndian::write_u32(&mut buff[..4], self.account);
        BigEndian::write_u32(&mut buff[4..8], self.index);

        Ok(8)
    }
}

/// Derived address response, `[len][address bytes]` where `len` must cover
/// the remainder of the data field exactly
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AddressResp<'a> {
    /// Derived address, encoded per the requested [DisplayFormat]
    pub address: &'a [u8],
}

impl<'a> Decode<'a> for AddressResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }
        if buff[0] as usize != buff.len() - 1 {
            return Err(ApduError::InvalidEncoding);
        }

        Ok((
            Self {
                address: &buff[1..],
            },
            buff.len(),
        ))
    }
}

/// Pin the active account / address index on the device, used by
/// subsequent signing commands that rely on on-device state.
///
/// Same 8-byte payload as [GetAddressReq], no meaningful response data.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SetAddressReq {
    /// BIP32 account index
    pub account: u32,
    /// BIP32 address index
    pub index: u32,
}

impl SetAddressReq {
    /// Create a new address selection request
    pub fn new(account: u32, index: u32) -> Self {
        Self { account, index }
    }
}

impl ApduStatic for SetAddressReq {
    const INS: u8 = Instruction::SetAddr as u8;
}

impl Encode for SetAddressReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(8)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < 8 {
            return Err(ApduError::InvalidLength);
        }

        BigEndian::write_u32(&mut buff[..4], self.account);
        BigEndian::write_u32(&mut buff[4..8], self.index);

        Ok(8)
    }
}
