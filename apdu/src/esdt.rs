//! ESDT token descriptor APDU
//!
//! Registers a token descriptor the device displays during a following
//! hash-mode transaction signature for transfers of that token. Must be
//! provided in the same session, before the corresponding sign command.

use encdec::Encode;

use crate::{ApduError, ApduStatic, Instruction, MAX_APDU_DATA_LEN};

/// Maximum ticker length accepted by the firmware
pub const MAX_TICKER_LEN: usize = 10;
/// Maximum chain id length accepted by the firmware
pub const MAX_CHAIN_ID_LEN: usize = 4;

/// ESDT token descriptor.
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  TICKER_LEN   |                   TICKER...                   /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   IDENT_LEN   |                 IDENTIFIER...                 /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   DECIMALS    | CHAIN_ID_LEN  |           CHAIN_ID...         /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /              ISSUER SIGNATURE (secp256k1 DER)...              /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The signature covers every preceding byte and is verified on-device
/// against the issuer public key baked into the firmware; it runs to the
/// end of the data field (no length prefix). Must fit a single APDU.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct EsdtInfo<'a> {
    /// Token ticker as displayed (eg. `USDC`)
    pub ticker: &'a str,
    /// Full token identifier (eg. `USDC-c76f1f`)
    pub identifier: &'a str,
    /// Number of decimals for amount display
    pub decimals: u8,
    /// Chain id the descriptor applies to (`1` for mainnet)
    pub chain_id: &'a str,
    /// Issuer signature over the preceding fields
    pub signature: &'a [u8],
}

impl<'a> ApduStatic for EsdtInfo<'a> {
    const INS: u8 = Instruction::ProvideEsdtInfo as u8;
}

impl<'a> Encode for EsdtInfo<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(1 + self.ticker.len()
            + 1
            + self.identifier.len()
            + 1
            + 1
            + self.chain_id.len()
            + self.signature.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.encode_len()?;

        if self.ticker.len() > MAX_TICKER_LEN
            || self.chain_id.len() > MAX_CHAIN_ID_LEN
            || self.identifier.len() > u8::MAX as usize
            || n > MAX_APDU_DATA_LEN
        {
            return Err(ApduError::InvalidLength);
        }
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        buff[index] = self.ticker.len() as u8;
        index += 1;
        buff[index..][..self.ticker.len()].copy_from_slice(self.ticker.as_bytes());
        index += self.ticker.len();

        buff[index] = self.identifier.len() as u8;
        index += 1;
        buff[index..][..self.identifier.len()].copy_from_slice(self.identifier.as_bytes());
        index += self.identifier.len();

        buff[index] = self.decimals;
        index += 1;

        buff[index] = self.chain_id.len() as u8;
        index += 1;
        buff[index..][..self.chain_id.len()].copy_from_slice(self.chain_id.as_bytes());
        index += self.chain_id.len();

        buff[index..][..self.signature.len()].copy_from_slice(self.signature);
        index += self.signature.len();

        Ok(index)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::encode_apdu;

    #[test]
    fn esdt_info_encode() {
        let info = EsdtInfo {
            ticker: "USDC",
            identifier: "USDC-c76f1f",
            decimals: 6,
            chain_id: "1",
            signature: &[0xaa, 0xbb],
        };

        let mut buff = [0u8; 64];
        let encoded = encode_apdu(&mut buff, &info);

        assert_eq!(encoded[0], 4);
        assert_eq!(&encoded[1..5], b"USDC");
        assert_eq!(encoded[5], 11);
        assert_eq!(&encoded[6..17], b"USDC-c76f1f");
        assert_eq!(encoded[17], 6);
        assert_eq!(encoded[18], 1);
        assert_eq!(&encoded[19..20], b"1");
        assert_eq!(&encoded[20..], &[0xaa, 0xbb]);
    }

    #[test]
    fn esdt_info_rejects_long_ticker() {
        let info = EsdtInfo {
            ticker: "WAYTOOLONGTICKER",
            identifier: "X-000000",
            decimals: 0,
            chain_id: "1",
            signature: &[],
        };

        let mut buff = [0u8; 64];
        assert_eq!(info.encode(&mut buff), Err(ApduError::InvalidLength));
    }
}
