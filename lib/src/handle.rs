//! Handle for connected MultiversX Ledger devices
//!
//! This provides one method per device command and is generic over the
//! underlying [Exchange] transport.

use std::{sync::Arc, time::Duration};

use log::debug;
use tokio::sync::Mutex;
use tokio::time::timeout;

use ledger_mvx_apdu::{
    address::{AddressResp, GetAddressReq, SetAddressReq},
    auth_token::{AuthTokenPayload, AuthTokenResp},
    config::{AppConfigReq, AppConfigResp},
    esdt::EsdtInfo,
    sign::{SignChunkReq, SignatureResp},
    status::DeviceError,
    version::{AppVersionReq, AppVersionResp},
    ApduReq, Decode, DecodeOwned, Encode, Instruction, MAX_APDU_DATA_LEN, SIGNATURE_LEN,
};

use crate::{transport::Exchange, Error};

/// Per-connection session state.
///
/// Owned by one [DeviceHandle] and mutated only by the corresponding
/// command calls; `account` / `address_index` track what `set_address`
/// last pinned on the device.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    /// Account index pinned on the device
    pub account: u32,
    /// Address index pinned on the device
    pub address_index: u32,
    /// Application version reported by `GetAppVersion`
    pub app_version: String,
    /// Firmware version reported by `GetAppConfiguration`
    pub firmware_version: String,
    /// Whether contract data is enabled in the app settings
    pub contract_data: bool,
}

struct Inner<T> {
    transport: T,
    session: Session,
}

/// MultiversX handle for a connected Ledger device.
///
/// All commands serialize against one internal lock held for the full
/// duration of the operation, so a chunked signing sequence can never
/// interleave with another call on a clone of this handle. Operations
/// requiring on-device confirmation block until the user acts or the user
/// timeout expires; on timeout the connection must be discarded and
/// reopened, the firmware cannot be told about an abandoned exchange.
pub struct DeviceHandle<T: Exchange> {
    t: Arc<Mutex<Inner<T>>>,
    /// Timeout for confirmation-gated exchanges
    user_timeout_s: u64,
    /// Timeout for silent exchanges
    request_timeout_s: u64,
}

impl<T: Exchange> Clone for DeviceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            t: Arc::clone(&self.t),
            user_timeout_s: self.user_timeout_s,
            request_timeout_s: self.request_timeout_s,
        }
    }
}

/// Create a [DeviceHandle] wrapper from a type implementing [Exchange]
impl<T: Exchange> From<T> for DeviceHandle<T> {
    fn from(t: T) -> Self {
        Self {
            t: Arc::new(Mutex::new(Inner {
                transport: t,
                session: Session::default(),
            })),
            user_timeout_s: 30,
            request_timeout_s: 5,
        }
    }
}

/// Run one exchange and split off the trailing status word, mapping
/// non-success statuses through the device error table
async fn exchange_raw<T>(t: &mut T, req: &(dyn ApduReq + Sync)) -> Result<Vec<u8>, Error>
where
    T: Exchange + Send,
    T::Error: Into<Error>,
{
    let mut raw = t.exchange(req).await.map_err(Into::into)?;

    if raw.len() < 2 {
        return Err(Error::MissingStatusWord);
    }

    let sw_hi = raw[raw.len() - 2];
    let sw_lo = raw[raw.len() - 1];
    let sw = u16::from_be_bytes([sw_hi, sw_lo]);
    raw.truncate(raw.len() - 2);

    match DeviceError::from_status(sw) {
        None => Ok(raw),
        Some(e) => {
            debug!("Device returned status 0x{:04x}: {}", sw, e);
            Err(Error::Device(e))
        }
    }
}

impl<T: Exchange + Send> DeviceHandle<T>
where
    T::Error: Into<Error>,
{
    /// Override the user / request timeouts
    pub fn set_timeouts(&mut self, user: Duration, request: Duration) {
        self.user_timeout_s = user.as_secs();
        self.request_timeout_s = request.as_secs();
    }

    fn user_timeout(&self) -> Duration {
        Duration::from_secs(self.user_timeout_s)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s)
    }

    /// Snapshot of the current session state
    pub async fn session(&self) -> Session {
        self.t.lock().await.session.clone()
    }

    /// Fetch the application version string, caching it in the session
    pub async fn app_version(&self) -> Result<String, Error> {
        debug!("Requesting app version");

        let mut guard = self.t.lock().await;

        let payload = timeout(
            self.request_timeout(),
            exchange_raw(&mut guard.transport, &AppVersionReq),
        )
        .await
        .map_err(|_| Error::RequestTimeout)??;

        let (resp, _) = AppVersionResp::decode(&payload).map_err(Error::Apdu)?;

        guard.session.app_version = resp.version.to_string();

        Ok(resp.version.to_string())
    }

    /// Fetch the application configuration, caching the contract-data
    /// flag and firmware version in the session.
    ///
    /// The legacy account / address-index bytes in the response are
    /// compatibility padding and deliberately not folded into session
    /// state; the authoritative indices travel through [Self::set_address]
    /// and [Self::get_address].
    pub async fn app_configuration(&self) -> Result<AppConfigResp, Error> {
        debug!("Requesting app configuration");

        let mut guard = self.t.lock().await;

        let payload = timeout(
            self.request_timeout(),
            exchange_raw(&mut guard.transport, &AppConfigReq),
        )
        .await
        .map_err(|_| Error::RequestTimeout)??;

        let (resp, _) =
            AppConfigResp::decode_owned(&payload).map_err(|_| Error::InvalidConfigResponse)?;

        guard.session.contract_data = resp.contract_data;
        guard.session.firmware_version =
            format!("{}.{}.{}", resp.major, resp.minor, resp.patch);

        Ok(resp)
    }

    /// Derive the address for an account / address index pair.
    ///
    /// With `confirm` the device displays the address and waits for the
    /// user; without it the read is silent.
    pub async fn get_address(
        &self,
        account: u32,
        index: u32,
        confirm: bool,
    ) -> Result<Vec<u8>, Error> {
        debug!(
            "Requesting address for account {} index {} (confirm: {})",
            account, index, confirm
        );

        let req = GetAddressReq::new(account, index, confirm);

        let (dur, on_timeout) = match confirm {
            true => (self.user_timeout(), Error::UserTimeout),
            false => (self.request_timeout(), Error::RequestTimeout),
        };

        let mut guard = self.t.lock().await;

        let payload = timeout(dur, exchange_raw(&mut guard.transport, &req))
            .await
            .map_err(|_| on_timeout)??;

        let (resp, _) =
            AddressResp::decode(&payload).map_err(|_| Error::InvalidAddressResponse)?;

        Ok(resp.address.to_vec())
    }

    /// Derive an address without on-device confirmation
    pub async fn get_address_without_confirmation(
        &self,
        account: u32,
        index: u32,
    ) -> Result<Vec<u8>, Error> {
        self.get_address(account, index, false).await
    }

    /// Pin the active account / address index on the device for
    /// subsequent signing calls, mirroring it in the session
    pub async fn set_address(&self, account: u32, index: u32) -> Result<(), Error> {
        debug!("Selecting account {} index {}", account, index);

        let mut guard = self.t.lock().await;

        timeout(
            self.request_timeout(),
            exchange_raw(&mut guard.transport, &SetAddressReq::new(account, index)),
        )
        .await
        .map_err(|_| Error::RequestTimeout)??;

        guard.session.account = account;
        guard.session.address_index = index;

        Ok(())
    }

    /// Sign a serialized transaction
    pub async fn sign_transaction(&self, tx: &[u8]) -> Result<[u8; SIGNATURE_LEN], Error> {
        let resp = self.sign_chunked(Instruction::SignTx, tx).await?;
        parse_signature(&resp)
    }

    /// Sign a free-form message.
    ///
    /// The payload is the message prefixed with its 4-byte big-endian
    /// length, then chunked like any other signing payload.
    pub async fn sign_message(&self, msg: &str) -> Result<[u8; SIGNATURE_LEN], Error> {
        let mut payload = Vec::with_capacity(4 + msg.len());
        payload.extend_from_slice(&(msg.len() as u32).to_be_bytes());
        payload.extend_from_slice(msg.as_bytes());

        let resp = self.sign_chunked(Instruction::SignMsg, &payload).await?;
        parse_signature(&resp)
    }

    /// Sign a transaction in hash mode
    pub async fn sign_transaction_hash(&self, tx: &[u8]) -> Result<[u8; SIGNATURE_LEN], Error> {
        let resp = self.sign_chunked(Instruction::SignTxHash, tx).await?;
        parse_signature(&resp)
    }

    /// Sign a native auth token, returning the signing address alongside
    /// the signature
    pub async fn sign_auth_token(
        &self,
        account: u32,
        index: u32,
        token: &[u8],
    ) -> Result<(String, [u8; SIGNATURE_LEN]), Error> {
        let req = AuthTokenPayload::new(account, index, token);

        let mut payload = vec![0u8; req.encode_len().map_err(Error::Apdu)?];
        req.encode(&mut payload).map_err(Error::Apdu)?;

        let resp = self
            .sign_chunked(Instruction::SignMsgAuthToken, &payload)
            .await?;

        let (resp, _) =
            AuthTokenResp::decode(&resp).map_err(|_| Error::InvalidAuthTokenResponse)?;

        Ok((resp.address.to_string(), resp.signature))
    }

    /// Register an ESDT token descriptor for display during a following
    /// hash-mode transaction signature.
    ///
    /// Single exchange; the descriptor must fit one APDU.
    pub async fn provide_esdt_info(&self, info: &EsdtInfo<'_>) -> Result<(), Error> {
        debug!("Providing ESDT descriptor for {}", info.identifier);

        let mut guard = self.t.lock().await;

        timeout(
            self.request_timeout(),
            exchange_raw(&mut guard.transport, info),
        )
        .await
        .map_err(|_| Error::RequestTimeout)??;

        Ok(())
    }

    /// Shared multi-chunk signing flow.
    ///
    /// Splits the payload into slices of at most 255 bytes, one exchange
    /// per slice under `ins`, P1 marking first vs. continuation. Only the
    /// final exchange returns data; intermediate responses are discarded
    /// after their status check. Any failure aborts the sequence with no
    /// further sends and no retry, the device may already have consumed
    /// part of it and the connection should be reopened.
    async fn sign_chunked(&self, ins: Instruction, payload: &[u8]) -> Result<Vec<u8>, Error> {
        let chunks: Vec<&[u8]> = payload.chunks(MAX_APDU_DATA_LEN).collect();

        debug!("Signing {} bytes in {} chunks", payload.len(), chunks.len());

        let mut guard = self.t.lock().await;

        let mut resp = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let req = SignChunkReq::new(ins, i == 0, chunk);

            // The device prompts the user once the final slice arrives
            let last = i + 1 == chunks.len();
            let dur = match last {
                true => self.user_timeout(),
                false => self.request_timeout(),
            };

            resp = timeout(dur, exchange_raw(&mut guard.transport, &req))
                .await
                .map_err(|_| match last {
                    true => Error::UserTimeout,
                    false => Error::RequestTimeout,
                })??;
        }

        Ok(resp)
    }
}

/// Check the `[64][signature]` shape of a final signing response
fn parse_signature(resp: &[u8]) -> Result<[u8; SIGNATURE_LEN], Error> {
    let (sig, _) = SignatureResp::decode_owned(resp).map_err(|_| Error::InvalidSignature)?;
    Ok(sig.signature)
}
