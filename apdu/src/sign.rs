//! Chunked signing APDUs, shared by transaction, message, hash-mode and
//! auth-token signing
//!
//! Payloads larger than one APDU data field are split into consecutive
//! slices of at most [crate::MAX_APDU_DATA_LEN] bytes and sent one exchange
//! per slice under the same instruction. P1 marks the first slice vs. a
//! continuation; only the exchange carrying the final slice returns a
//! non-empty data field, the signature.

use encdec::{DecodeOwned, Encode};

use crate::{ApduError, ApduHeader, ApduReq, Instruction, MVX_APDU_CLA, SIGNATURE_LEN};

/// P1 marking the first chunk of a signing payload
pub const P1_FIRST_CHUNK: u8 = 0x00;
/// P1 marking every subsequent chunk
pub const P1_MORE_CHUNK: u8 = 0x80;

/// One chunk of a signing payload.
///
/// The instruction is carried per-object so the same chunking flow serves
/// [Instruction::SignTx], [Instruction::SignMsg], [Instruction::SignTxHash]
/// and [Instruction::SignMsgAuthToken].
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SignChunkReq<'a> {
    /// Signing instruction this chunk belongs to
    pub ins: Instruction,
    /// Whether this is the opening chunk of the payload
    pub first: bool,
    /// Chunk bytes, at most [crate::MAX_APDU_DATA_LEN]
    pub chunk: &'a [u8],
}

impl<'a> SignChunkReq<'a> {
    /// Create a new signing chunk
    pub fn new(ins: Instruction, first: bool, chunk: &'a [u8]) -> Self {
        Self { ins, first, chunk }
    }
}

impl<'a> ApduReq for SignChunkReq<'a> {
    fn header(&self) -> ApduHeader {
        ApduHeader {
            cla: MVX_APDU_CLA,
            ins: self.ins as u8,
            p1: match self.first {
                true => P1_FIRST_CHUNK,
                false => P1_MORE_CHUNK,
            },
            p2: 0,
        }
    }
}

impl<'a> Encode for SignChunkReq<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.chunk.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < self.chunk.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..self.chunk.len()].copy_from_slice(self.chunk);

        Ok(self.chunk.len())
    }
}

/// Final signing response, `[64][64-byte ed25519 signature]`.
///
/// Any other shape (wrong total length or wrong leading length byte) is
/// rejected, regardless of the status word that accompanied it.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SignatureResp {
    /// Detached ed25519 signature over the signing payload
    pub signature: [u8; SIGNATURE_LEN],
}

impl DecodeOwned for SignatureResp {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() != SIGNATURE_LEN + 1 || buff[0] as usize != SIGNATURE_LEN {
            return Err(ApduError::InvalidEncoding);
        }

        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&buff[1..]);

        Ok((Self { signature }, buff.len()))
    }
}
