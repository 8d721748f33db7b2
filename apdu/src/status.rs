//! Status words trailing every response APDU

use core::fmt;

/// Command completed successfully
pub const SW_OK: u16 = 0x9000;

/// Device-reported error status, decoded from a non-success status word.
///
/// Codes outside the known set are preserved verbatim in [DeviceError::Unknown]
/// so callers can log firmware revisions this table does not cover yet.
#[derive(Copy, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum DeviceError {
    /// `0x6985` request denied on the device
    UserDenied,
    /// `0x6D00` instruction byte not recognized by the app
    UnknownInstruction,
    /// `0x6E00` class byte does not match the app
    WrongCla,
    /// `0x6E01` malformed command arguments
    InvalidArguments,
    /// `0x6E02` malformed message payload
    InvalidMessage,
    /// `0x6E03` unexpected P1 parameter
    InvalidP1,
    /// `0x6E04` message exceeds the app's buffer
    MessageTooLong,
    /// `0x6E05` receiver address field too long
    ReceiverTooLong,
    /// `0x6E06` amount string too long
    AmountTooLong,
    /// `0x6E07` transaction carries data but contract data is disabled
    ContractDataDisabled,
    /// `0x6E08` chunked message ended prematurely
    MessageIncomplete,
    /// `0x6E09` unsupported transaction version
    WrongTxVersion,
    /// `0x6E0A` nonce field too long
    NonceTooLong,
    /// `0x6E0B` unparseable amount field
    InvalidAmount,
    /// `0x6E0C` unparseable fee field
    InvalidFee,
    /// `0x6E0D` amount could not be formatted for display
    PrettyFailed,
    /// `0x6E0E` data field too long
    DataTooLong,
    /// `0x6E0F` unsupported transaction options
    WrongTxOptions,
    /// `0x6E10` signature generation failed on the device
    SignatureFailed,
    /// `0x6E11` plain transaction signing retired by this firmware
    SignTxDeprecated,
    /// `0x6E12` token descriptor signature did not verify
    InvalidTokenSignature,
    /// `0x6E13` account or address index out of bounds
    IndexOutOfBounds,
    /// `0x6E14` token descriptor missing or not matching the transfer
    InvalidToken,
    /// Any status word outside the known set
    Unknown(u16),
}

impl DeviceError {
    /// Decode a status word, `None` for [SW_OK]
    pub fn from_status(sw: u16) -> Option<Self> {
        let e = match sw {
            SW_OK => return None,
            0x6985 => DeviceError::UserDenied,
            0x6d00 => DeviceError::UnknownInstruction,
            0x6e00 => DeviceError::WrongCla,
            0x6e01 => DeviceError::InvalidArguments,
            0x6e02 => DeviceError::InvalidMessage,
            0x6e03 => DeviceError::InvalidP1,
            0x6e04 => DeviceError::MessageTooLong,
            0x6e05 => DeviceError::ReceiverTooLong,
            0x6e06 => DeviceError::AmountTooLong,
            0x6e07 => DeviceError::ContractDataDisabled,
            0x6e08 => DeviceError::MessageIncomplete,
            0x6e09 => DeviceError::WrongTxVersion,
            0x6e0a => DeviceError::NonceTooLong,
            0x6e0b => DeviceError::InvalidAmount,
            0x6e0c => DeviceError::InvalidFee,
            0x6e0d => DeviceError::PrettyFailed,
            0x6e0e => DeviceError::DataTooLong,
            0x6e0f => DeviceError::WrongTxOptions,
            0x6e10 => DeviceError::SignatureFailed,
            0x6e11 => DeviceError::SignTxDeprecated,
            0x6e12 => DeviceError::InvalidTokenSignature,
            0x6e13 => DeviceError::IndexOutOfBounds,
            0x6e14 => DeviceError::InvalidToken,
            _ => DeviceError::Unknown(sw),
        };
        Some(e)
    }

    /// Raw status word for this error
    pub fn status(&self) -> u16 {
        match self {
            DeviceError::UserDenied => 0x6985,
            DeviceError::UnknownInstruction => 0x6d00,
            DeviceError::WrongCla => 0x6e00,
            DeviceError::InvalidArguments => 0x6e01,
            DeviceError::InvalidMessage => 0x6e02,
            DeviceError::InvalidP1 => 0x6e03,
            DeviceError::MessageTooLong => 0x6e04,
            DeviceError::ReceiverTooLong => 0x6e05,
            DeviceError::AmountTooLong => 0x6e06,
            DeviceError::ContractDataDisabled => 0x6e07,
            DeviceError::MessageIncomplete => 0x6e08,
            DeviceError::WrongTxVersion => 0x6e09,
            DeviceError::NonceTooLong => 0x6e0a,
            DeviceError::InvalidAmount => 0x6e0b,
            DeviceError::InvalidFee => 0x6e0c,
            DeviceError::PrettyFailed => 0x6e0d,
            DeviceError::DataTooLong => 0x6e0e,
            DeviceError::WrongTxOptions => 0x6e0f,
            DeviceError::SignatureFailed => 0x6e10,
            DeviceError::SignTxDeprecated => 0x6e11,
            DeviceError::InvalidTokenSignature => 0x6e12,
            DeviceError::IndexOutOfBounds => 0x6e13,
            DeviceError::InvalidToken => 0x6e14,
            DeviceError::Unknown(sw) => *sw,
        }
    }

    /// Whether this error is a user cancellation rather than a fault
    pub fn is_user_denied(&self) -> bool {
        matches!(self, DeviceError::UserDenied)
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::UserDenied => write!(f, "user denied request"),
            DeviceError::UnknownInstruction => write!(f, "unknown instruction (INS)"),
            DeviceError::WrongCla => write!(f, "wrong CLA"),
            DeviceError::InvalidArguments => write!(f, "invalid arguments"),
            DeviceError::InvalidMessage => write!(f, "invalid message"),
            DeviceError::InvalidP1 => write!(f, "invalid P1"),
            DeviceError::MessageTooLong => write!(f, "message too long"),
            DeviceError::ReceiverTooLong => write!(f, "receiver address too long"),
            DeviceError::AmountTooLong => write!(f, "amount string too long"),
            DeviceError::ContractDataDisabled => write!(f, "contract data is disabled"),
            DeviceError::MessageIncomplete => write!(f, "message incomplete"),
            DeviceError::WrongTxVersion => write!(f, "wrong tx version"),
            DeviceError::NonceTooLong => write!(f, "nonce too long"),
            DeviceError::InvalidAmount => write!(f, "invalid amount"),
            DeviceError::InvalidFee => write!(f, "invalid fee"),
            DeviceError::PrettyFailed => {
                write!(f, "failed to make the amount look pretty")
            }
            DeviceError::DataTooLong => write!(f, "data too long"),
            DeviceError::WrongTxOptions => write!(f, "wrong tx options"),
            DeviceError::SignatureFailed => write!(f, "signature generation failed"),
            DeviceError::SignTxDeprecated => {
                write!(f, "plain transaction signing deprecated by firmware")
            }
            DeviceError::InvalidTokenSignature => {
                write!(f, "invalid token descriptor signature")
            }
            DeviceError::IndexOutOfBounds => write!(f, "index out of bounds"),
            DeviceError::InvalidToken => write!(f, "invalid token descriptor"),
            DeviceError::Unknown(sw) => write!(f, "error code 0x{:04x}", sw),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn success_is_not_an_error() {
        assert_eq!(DeviceError::from_status(SW_OK), None);
    }

    #[test]
    fn known_codes_round_trip() {
        for sw in [0x6985, 0x6d00].into_iter().chain(0x6e00..=0x6e14) {
            let e = DeviceError::from_status(sw).unwrap();
            assert_eq!(e.status(), sw);
            assert!(!matches!(e, DeviceError::Unknown(_)));
        }
    }

    #[test]
    fn unknown_codes_pass_through() {
        let e = DeviceError::from_status(0x6f42).unwrap();
        assert_eq!(e, DeviceError::Unknown(0x6f42));
        assert_eq!(e.status(), 0x6f42);
    }

    #[test]
    fn mapping_is_stable() {
        // Same status word must always yield the same error kind
        for _ in 0..3 {
            assert_eq!(
                DeviceError::from_status(0x6985),
                Some(DeviceError::UserDenied)
            );
        }
    }
}
