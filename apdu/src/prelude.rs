//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    address::{AddressResp, DisplayFormat, GetAddressReq, SetAddressReq},
    auth_token::{AuthTokenPayload, AuthTokenResp},
    config::{AppConfigReq, AppConfigResp},
    esdt::EsdtInfo,
    sign::{SignChunkReq, SignatureResp},
    status::{DeviceError, SW_OK},
    version::{AppVersionReq, AppVersionResp},
    ApduError, ApduHeader, ApduReq, ApduStatic, Instruction, MAX_APDU_DATA_LEN, MVX_APDU_CLA,
    SIGNATURE_LEN,
};
