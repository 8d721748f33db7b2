//! Command line utility for interacting with the MultiversX nano app

use clap::Parser;
use log::{debug, error, info, LevelFilter};

use ledger_mvx::{
    apdu::esdt::EsdtInfo,
    transport::{Exchange, GenericTransport},
    Connect, DeviceHandle, Error, Filter, LedgerProvider,
};

mod helpers;
use helpers::*;

/// MultiversX Ledger command line utility
#[derive(Clone, PartialEq, Debug, Parser)]
struct Options {
    /// Supported transports for device discovery
    #[clap(long, value_enum, default_value = "any")]
    target: Filter,

    /// Device index (where more than one device is available)
    #[clap(long, default_value = "0")]
    device_index: usize,

    /// Subcommand to execute
    #[clap(subcommand)]
    cmd: Actions,

    /// Enable verbose logging
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Clone, PartialEq, Debug, Parser)]
#[non_exhaustive]
enum Actions {
    /// List available devices
    List,

    /// Fetch the app version
    Version,

    /// Fetch the app configuration
    Config,

    /// Derive and display an address
    Address {
        /// BIP32 account index
        #[clap(long, default_value = "0")]
        account: u32,

        /// BIP32 address index
        #[clap(long, default_value = "0")]
        index: u32,

        /// Require confirmation on the device
        #[clap(long)]
        confirm: bool,
    },

    /// Pin the active account / address index on the device
    SetAddress {
        /// BIP32 account index
        #[clap(long, default_value = "0")]
        account: u32,

        /// BIP32 address index
        #[clap(long, default_value = "0")]
        index: u32,
    },

    /// Sign a hex-encoded serialized transaction
    SignTx {
        /// Transaction bytes (hex)
        #[clap(long)]
        data: HexData,
    },

    /// Sign a free-form message
    SignMsg {
        /// Message text
        #[clap(long)]
        message: String,
    },

    /// Sign a hex-encoded transaction in hash mode
    SignTxHash {
        /// Transaction bytes (hex)
        #[clap(long)]
        data: HexData,
    },

    /// Sign a native auth token
    SignAuthToken {
        /// BIP32 account index
        #[clap(long, default_value = "0")]
        account: u32,

        /// BIP32 address index
        #[clap(long, default_value = "0")]
        index: u32,

        /// Token as presented by the authenticating service
        #[clap(long)]
        token: String,
    },

    /// Register an ESDT token descriptor for display
    ProvideEsdtInfo {
        /// Token ticker
        #[clap(long)]
        ticker: String,

        /// Full token identifier
        #[clap(long)]
        identifier: String,

        /// Token decimals
        #[clap(long)]
        decimals: u8,

        /// Chain id
        #[clap(long, default_value = "1")]
        chain_id: String,

        /// Issuer signature over the descriptor (hex)
        #[clap(long)]
        signature: HexData,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Options::parse();

    // Setup logging
    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default()).unwrap();

    // Connect to device
    let p = LedgerProvider::new()?;

    debug!("Using transport: {:?}", args.target);

    let devices = p.list_devices(args.target).await;
    if devices.is_empty() {
        return Err(Error::NoDevice.into());
    }

    // Handle list command
    if args.cmd == Actions::List {
        info!("Devices:");
        for (i, d) in devices.iter().enumerate() {
            info!("  {}: {}", i, d);
        }

        return Ok(());
    }

    // Select device by index
    if args.device_index >= devices.len() {
        return Err(anyhow::anyhow!(
            "Invalid device index: {} (max: {})",
            args.device_index,
            devices.len() - 1
        ));
    }

    debug!(
        "Using device {}: {}",
        args.device_index, devices[args.device_index]
    );

    let t = match Connect::<GenericTransport>::connect(&p, &devices[args.device_index]).await {
        Ok(v) => v,
        Err(e) => {
            error!(
                "Failed to connect to device: {}",
                devices[args.device_index]
            );
            return Err(e.into());
        }
    };

    // Execute command, reporting a rejection on the device as a normal
    // cancellation rather than a fault
    match execute(t, args.cmd).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_user_denied() => {
            info!("Request denied on device");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Execute a command with the provided device handle
async fn execute<T>(t: DeviceHandle<T>, cmd: Actions) -> Result<(), Error>
where
    T: Exchange + Send,
    T::Error: Into<Error>,
{
    debug!("Executing command: {:?}", cmd);

    match cmd {
        Actions::Version => {
            let v = t.app_version().await?;

            info!("app version: {}", v);
        }
        Actions::Config => {
            let c = t.app_configuration().await?;

            info!(
                "contract data: {}",
                match c.contract_data {
                    true => "enabled",
                    false => "disabled",
                }
            );
            info!("firmware version: {}.{}.{}", c.major, c.minor, c.patch);
        }
        Actions::Address {
            account,
            index,
            confirm,
        } => {
            if confirm {
                info!("Please confirm the address on the device");
            }

            let addr = t.get_address(account, index, confirm).await?;

            // Bech32 display encoding is requested, so the response is
            // printable; fall back to hex if the device says otherwise
            match std::str::from_utf8(&addr) {
                Ok(s) => info!("address: {}", s),
                Err(_) => info!("address: 0x{}", hex::encode(&addr)),
            }
        }
        Actions::SetAddress { account, index } => {
            t.set_address(account, index).await?;

            info!("selected account {} index {}", account, index);
        }
        Actions::SignTx { data } => {
            info!("Please confirm the transaction on the device");

            let sig = t.sign_transaction(data.as_ref()).await?;

            info!("signature: {}", hex::encode(sig));
        }
        Actions::SignMsg { message } => {
            info!("Please confirm the message on the device");

            let sig = t.sign_message(&message).await?;

            info!("signature: {}", hex::encode(sig));
        }
        Actions::SignTxHash { data } => {
            info!("Please confirm the transaction on the device");

            let sig = t.sign_transaction_hash(data.as_ref()).await?;

            info!("signature: {}", hex::encode(sig));
        }
        Actions::SignAuthToken {
            account,
            index,
            token,
        } => {
            info!("Please authorize the token on the device");

            let (address, sig) = t.sign_auth_token(account, index, token.as_bytes()).await?;

            info!("address: {}", address);
            info!("signature: {}", hex::encode(sig));
        }
        Actions::ProvideEsdtInfo {
            ticker,
            identifier,
            decimals,
            chain_id,
            signature,
        } => {
            let info = EsdtInfo {
                ticker: &ticker,
                identifier: &identifier,
                decimals,
                chain_id: &chain_id,
                signature: signature.as_ref(),
            };

            t.provide_esdt_info(&info).await?;

            info!("registered token descriptor for {}", identifier);
        }
        _ => unreachable!(),
    }

    Ok(())
}
