//! USB HID transport
//!
//! Maps arbitrary-length APDU exchange onto the device's fixed 64-byte
//! report mechanism. Each report carries a channel id, a command tag
//! marking it as an APDU carrier, and a sequence number scoped to one
//! exchange; the reassembled stream is length-prefixed. A full exchange is
//! one [HidFramer::reset] + write + length-prefixed read.

use log::trace;

use ledger_mvx_apdu::ApduError;
use ledger_mvx_apdu::ApduReq;

use super::{serialize_req, Exchange};

/// Ledger USB vendor id
pub const LEDGER_VID: u16 = 0x2c97;

/// Nano S USB product id
pub const NANO_S_PID: u16 = 0x1015;

/// Fixed HID report length
pub const HID_REPORT_LEN: usize = 64;

/// Channel identifier carried by every report
const HID_CHANNEL_ID: u16 = 0x0101;

/// Command tag marking a report as an APDU fragment carrier
const HID_TAG_APDU: u8 = 0x05;

/// Report header length: channel id (2) + tag (1) + sequence (2)
const HID_HEADER_LEN: usize = 5;

/// HID transport error.
///
/// Framing violations (bad channel, bad tag, out-of-order sequence) mean
/// host and device disagree about the exchange state; the connection must
/// be discarded and reopened, retrying on the same handle is unsound.
#[derive(Debug, thiserror::Error)]
pub enum HidError {
    /// No matching device attached
    #[error("device not detected")]
    DeviceNotFound,

    /// Underlying HID subsystem error
    #[cfg(feature = "transport_hid")]
    #[error("hid error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// Report carried an unexpected channel id
    #[error("bad channel ID 0x{0:04x}")]
    BadChannelId(u16),

    /// Report carried an unexpected command tag
    #[error("bad command tag 0x{0:02x}")]
    BadCommandTag(u8),

    /// Report sequence number did not match the expected counter
    #[error("bad sequence number {actual} (expected {expected})")]
    BadSequence { actual: u16, expected: u16 },

    /// Request APDU could not be serialized
    #[error("APDU encoding error: {0}")]
    Apdu(ApduError),
}

impl From<ApduError> for HidError {
    fn from(e: ApduError) -> Self {
        HidError::Apdu(e)
    }
}

/// Fixed-size report channel backing the [HidFramer].
///
/// Implemented by [hidapi::HidDevice]; test suites substitute scripted
/// channels to drive the framer without hardware.
pub trait ReportIo {
    /// Send one report
    fn write_report(&mut self, report: &[u8]) -> Result<(), HidError>;

    /// Receive the next report into `report`, returning the number of
    /// bytes the OS delivered
    fn read_report(&mut self, report: &mut [u8]) -> Result<usize, HidError>;
}

#[cfg(feature = "transport_hid")]
impl ReportIo for hidapi::HidDevice {
    fn write_report(&mut self, report: &[u8]) -> Result<(), HidError> {
        // hidapi expects a leading report number, always zero here
        let mut buff = [0u8; HID_REPORT_LEN + 1];
        buff[1..][..report.len()].copy_from_slice(report);

        hidapi::HidDevice::write(self, &buff)?;

        Ok(())
    }

    fn read_report(&mut self, report: &mut [u8]) -> Result<usize, HidError> {
        let n = hidapi::HidDevice::read(self, report)?;
        Ok(n)
    }
}

/// Report-level framer, chunking an outbound byte stream into fixed-size
/// reports and reassembling the inbound stream from them.
///
/// The sequence counter is scoped to one logical exchange; callers must
/// [HidFramer::reset] before each new request / response cycle.
pub struct HidFramer<C> {
    channel: C,
    seq: u16,
    buff: [u8; HID_REPORT_LEN],
    pos: usize,
}

impl<C: ReportIo> HidFramer<C> {
    /// Create a framer over a report channel
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            seq: 0,
            buff: [0u8; HID_REPORT_LEN],
            pos: 0,
        }
    }

    /// Start a new logical exchange, rewinding the sequence counter
    pub fn reset(&mut self) {
        self.seq = 0;
    }

    /// Send `data`, prefixed with its 2-byte big-endian total length and
    /// split across consecutive reports.
    ///
    /// A failed report write is not resumable; the caller must restart
    /// the whole exchange.
    pub fn write(&mut self, data: &[u8]) -> Result<(), HidError> {
        trace!("HID <= {}", hex::encode(data));

        let mut stream = Vec::with_capacity(2 + data.len());
        stream.extend_from_slice(&(data.len() as u16).to_be_bytes());
        stream.extend_from_slice(data);

        let mut report = [0u8; HID_REPORT_LEN];
        report[..2].copy_from_slice(&HID_CHANNEL_ID.to_be_bytes());
        report[2] = HID_TAG_APDU;

        for (seq, chunk) in stream.chunks(HID_REPORT_LEN - HID_HEADER_LEN).enumerate() {
            report[3..5].copy_from_slice(&(seq as u16).to_be_bytes());
            report[HID_HEADER_LEN..][..chunk.len()].copy_from_slice(chunk);
            report[HID_HEADER_LEN + chunk.len()..].fill(0);

            self.channel.write_report(&report)?;
        }

        Ok(())
    }

    /// Serve up to `out.len()` bytes from the inbound stream, pulling and
    /// validating the next report when the current one is drained.
    fn read(&mut self, out: &mut [u8]) -> Result<usize, HidError> {
        // Drain the remainder of the current report first
        if self.seq > 0 && self.pos != HID_REPORT_LEN {
            let n = out.len().min(HID_REPORT_LEN - self.pos);
            out[..n].copy_from_slice(&self.buff[self.pos..self.pos + n]);
            self.pos += n;
            return Ok(n);
        }

        let n = self.channel.read_report(&mut self.buff)?;
        if n != HID_REPORT_LEN {
            // A truncated report is a driver-level fault, not a protocol
            // error the caller could recover from
            panic!("read less than 64 bytes from HID");
        }

        let channel = u16::from_be_bytes([self.buff[0], self.buff[1]]);
        let tag = self.buff[2];
        let seq = u16::from_be_bytes([self.buff[3], self.buff[4]]);

        if channel != HID_CHANNEL_ID {
            return Err(HidError::BadChannelId(channel));
        }
        if tag != HID_TAG_APDU {
            return Err(HidError::BadCommandTag(tag));
        }
        if seq != self.seq {
            return Err(HidError::BadSequence {
                actual: seq,
                expected: self.seq,
            });
        }
        self.seq += 1;

        let n = out.len().min(HID_REPORT_LEN - HID_HEADER_LEN);
        out[..n].copy_from_slice(&self.buff[HID_HEADER_LEN..HID_HEADER_LEN + n]);
        self.pos = HID_HEADER_LEN + n;

        Ok(n)
    }

    /// Fill `out` completely from the inbound stream
    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<(), HidError> {
        let mut filled = 0;
        while filled < out.len() {
            filled += self.read(&mut out[filled..])?;
        }
        Ok(())
    }
}

/// APDU transport over a fixed-size report channel.
///
/// One [Exchange::exchange] call is one full framed round-trip: reset,
/// framed request write, then a 2-byte big-endian length prefix and that
/// many response bytes (device payload plus trailing status word).
pub struct HidTransport<C> {
    framer: HidFramer<C>,
}

impl<C: ReportIo> HidTransport<C> {
    /// Create a transport over a report channel
    pub fn new(channel: C) -> Self {
        Self {
            framer: HidFramer::new(channel),
        }
    }
}

/// HID transport over a native [hidapi::HidDevice]
#[cfg(feature = "transport_hid")]
pub type TransportNativeHid = HidTransport<hidapi::HidDevice>;

#[cfg(feature = "transport_hid")]
impl TransportNativeHid {
    /// List attached devices matching the Ledger vendor / product id
    pub fn list_ledgers(api: &hidapi::HidApi) -> impl Iterator<Item = &hidapi::DeviceInfo> {
        api.device_list()
            .filter(|d| d.vendor_id() == LEDGER_VID && d.product_id() == NANO_S_PID)
    }

    /// Open the device described by `info`
    pub fn open_device(
        api: &hidapi::HidApi,
        info: &hidapi::DeviceInfo,
    ) -> Result<Self, HidError> {
        let device = info.open_device(api)?;
        Ok(Self::new(device))
    }
}

#[async_trait::async_trait]
impl<C: ReportIo + Send> Exchange for HidTransport<C> {
    type Error = HidError;

    async fn exchange(&mut self, req: &(dyn ApduReq + Sync)) -> Result<Vec<u8>, Self::Error> {
        let data = serialize_req(req)?;

        self.framer.reset();
        self.framer.write(&data)?;

        // Response stream is length-prefixed
        let mut len_prefix = [0u8; 2];
        self.framer.read_exact(&mut len_prefix)?;
        let n = u16::from_be_bytes(len_prefix) as usize;

        let mut resp = vec![0u8; n];
        self.framer.read_exact(&mut resp)?;

        trace!("HID => {}", hex::encode(&resp));

        Ok(resp)
    }
}
