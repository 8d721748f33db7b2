//! Application version APDU

use encdec::{Decode, DecodeOwned, Encode};

use crate::{ApduError, ApduStatic, Instruction};

/// Fetch application version request (empty data field)
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct AppVersionReq;

impl ApduStatic for AppVersionReq {
    const INS: u8 = Instruction::GetAppVersion as u8;
}

impl Encode for AppVersionReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(0)
    }

    fn encode(&self, _buff: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}

impl DecodeOwned for AppVersionReq {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(_buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        Ok((Self, 0))
    }
}

/// Application version response, the whole data field is an ASCII
/// version string (no length prefix)
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AppVersionResp<'a> {
    /// Application version, eg. `1.0.22`
    pub version: &'a str,
}

impl<'a> Decode<'a> for AppVersionResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        let version = core::str::from_utf8(buff).map_err(|_| ApduError::Utf8)?;

        Ok((Self { version }, buff.len()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::encode_apdu;

    #[test]
    fn version_req_is_empty() {
        let mut buff = [0u8; 16];
        assert_eq!(encode_apdu(&mut buff, &AppVersionReq), &[]);
    }

    #[test]
    fn version_resp_decode() {
        let (v, n) = AppVersionResp::decode(b"1.0.22").unwrap();
        assert_eq!(v.version, "1.0.22");
        assert_eq!(n, 6);
    }

    #[test]
    fn version_resp_rejects_invalid_utf8() {
        assert_eq!(AppVersionResp::decode(&[0xff, 0xfe]), Err(ApduError::Utf8));
    }
}
