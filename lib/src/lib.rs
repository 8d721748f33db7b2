//! MultiversX Ledger API Library (and CLI)
//!
//! Host-side communication stack for the MultiversX nano app: device
//! discovery, the HID / TCP transports, and a typed command client.

use std::fmt::Debug;

use async_trait::async_trait;

#[cfg(feature = "transport_hid")]
use hidapi::HidApi;

/// Re-export transports for consumer use
pub mod transport;
use transport::*;

/// Re-export `ledger-mvx-apdu` for consumers
pub use ledger_mvx_apdu::{self as apdu};

mod handle;
pub use handle::{DeviceHandle, Session};

mod error;
pub use error::Error;

/// Ledger provider manages attached devices and connections
pub struct LedgerProvider {
    #[cfg(feature = "transport_hid")]
    hid_api: HidApi,
}

/// Device discovery filter
#[derive(Copy, Clone, Debug, PartialEq, clap::ValueEnum, strum::Display)]
#[non_exhaustive]
pub enum Filter {
    /// List all devices available using supported transports
    Any,
    /// List only HID devices
    Hid,
    /// List only TCP (simulator) devices
    Tcp,
}

/// Device information for listing, used by connect
#[derive(Debug)]
pub enum LedgerInfo {
    #[cfg(feature = "transport_hid")]
    Hid(hidapi::DeviceInfo),
    #[cfg(feature = "transport_tcp")]
    Tcp(TcpOptions),
}

impl LedgerProvider {
    /// Create a new ledger provider
    pub fn new() -> Result<Self, Error> {
        #[cfg(feature = "transport_hid")]
        return Ok(Self {
            hid_api: HidApi::new().map_err(|_| Error::HidInit)?,
        });

        #[cfg(not(feature = "transport_hid"))]
        return Ok(Self {});
    }

    /// List available devices
    pub async fn list_devices(&self, filter: Filter) -> Vec<LedgerInfo> {
        let mut devices = vec![];

        #[cfg(feature = "transport_hid")]
        if filter == Filter::Any || filter == Filter::Hid {
            TransportNativeHid::list_ledgers(&self.hid_api)
                .cloned()
                .for_each(|d| {
                    devices.push(LedgerInfo::Hid(d));
                });
        }

        #[cfg(feature = "transport_tcp")]
        if filter == Filter::Any || filter == Filter::Tcp {
            // Probe the default speculos port
            let o = TcpOptions::default();
            if let Ok(_t) = tokio::net::TcpStream::connect(o.socket_addr()).await {
                devices.push(LedgerInfo::Tcp(o));
            };
        }

        log::debug!("Found {} devices: {:?}", devices.len(), devices);

        devices
    }

    /// Open the first matching device
    #[cfg(any(feature = "transport_hid", feature = "transport_tcp"))]
    pub async fn open_first(&self, filter: Filter) -> Result<GenericHandle, Error> {
        let devices = self.list_devices(filter).await;

        let info = devices.first().ok_or(Error::NoDevice)?;

        Connect::<GenericTransport>::connect(self, info).await
    }
}

/// Generic device handle (abstract over transport types)
pub type GenericHandle = DeviceHandle<GenericTransport>;

impl GenericHandle {
    /// Create a new generic device handle
    pub fn new(d: impl Into<GenericTransport>) -> Self {
        Self::from(d.into())
    }
}

impl std::fmt::Display for LedgerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "transport_hid")]
            LedgerInfo::Hid(hid_info) => {
                write!(
                    f,
                    "{:16} (USB, {:04x}:{:04x}, {})",
                    hid_info.product_string().unwrap_or("UNKNOWN"),
                    hid_info.vendor_id(),
                    hid_info.product_id(),
                    hid_info.serial_number().unwrap_or("UNKNOWN"),
                )
            }
            #[cfg(feature = "transport_tcp")]
            LedgerInfo::Tcp(tcp_info) => {
                write!(
                    f,
                    "{:16} (TCP, {}:{})",
                    "Speculos", tcp_info.addr, tcp_info.port
                )
            }
            #[cfg(not(any(feature = "transport_hid", feature = "transport_tcp")))]
            _ => unreachable!(),
        }
    }
}

/// Connect trait for supported transports
#[async_trait]
pub trait Connect<T: Exchange> {
    type Options: Debug;

    /// Connect to the specified device
    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<T>, Error>;
}

/// Generic connect implementation
#[cfg(any(feature = "transport_hid", feature = "transport_tcp"))]
#[async_trait]
impl Connect<GenericTransport> for LedgerProvider {
    type Options = LedgerInfo;

    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<GenericTransport>, Error> {
        let t = match opts {
            #[cfg(feature = "transport_hid")]
            LedgerInfo::Hid(hid_info) => {
                let t = TransportNativeHid::open_device(&self.hid_api, hid_info)?;

                GenericTransport::Hid(t)
            }
            #[cfg(feature = "transport_tcp")]
            LedgerInfo::Tcp(tcp_info) => {
                let t = TransportTcp::new(*tcp_info).await?;

                GenericTransport::Tcp(t)
            }
        };

        Ok(DeviceHandle::from(t))
    }
}

/// Connect implementation for HID devices
#[cfg(feature = "transport_hid")]
#[async_trait]
impl Connect<TransportNativeHid> for LedgerProvider {
    type Options = hidapi::DeviceInfo;

    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<TransportNativeHid>, Error> {
        let t = TransportNativeHid::open_device(&self.hid_api, opts)?;

        Ok(DeviceHandle::from(t))
    }
}

/// Connect implementation for TCP devices
#[cfg(feature = "transport_tcp")]
#[async_trait]
impl Connect<TransportTcp> for LedgerProvider {
    type Options = TcpOptions;

    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<TransportTcp>, Error> {
        let t = TransportTcp::new(*opts).await?;

        Ok(DeviceHandle::from(t))
    }
}
