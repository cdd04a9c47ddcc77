mod action;
pub mod cli;
pub mod command;
mod linux;
mod mac;
mod util;
mod windows;

use std::fmt;

use thiserror::Error;
use tracing::warn;

pub use action::{perform, resolve, Action, ActionFlags, Invocation, Outcome};
use command::CommandRunner;
pub use mac::{parse_mac, MacAddress};
pub use util::{generate_random_mac, generate_random_mac_with, RANDOM_MAC_FIRST_OCTET};

#[cfg(target_os = "linux")]
pub use self::linux::LinuxListError;
pub use self::linux::LinuxBackend;
pub use self::windows::WindowsBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    pub fn current() -> Result<Platform, ChangeMacError> {
        Platform::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Result<Platform, ChangeMacError> {
        match os {
            "linux" => Ok(Platform::Linux),
            "windows" => Ok(Platform::Windows),
            _ => Err(ChangeMacError::UnsupportedPlatform(os.to_owned())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ChangeMacError {
    #[error("Invalid MAC address `{0}`")]
    InvalidFormat(String),
    #[error("This platform is not supported: {0}")]
    UnsupportedPlatform(String),
    #[error("`{command}` failed: {output}")]
    OsCommand { command: String, output: String },
    #[error("Both -{0} and -{1} options cannot be used together")]
    ConfigurationConflict(&'static str, &'static str),
    #[error("Interface name is required")]
    MissingInterface,
    #[error("Either -mac, -random, -restore or -findInterface option is required")]
    MissingAction,
    #[error("Something went wrong when drawing random bytes: {0}")]
    Entropy(#[from] rand::Error),
    #[cfg(target_os = "linux")]
    #[error(transparent)]
    LinuxError(#[from] LinuxListError),
    #[error("Something went wrong when working with the adapter list")]
    AdapterError,
}

/// Name of the interface an action targets. Existence is left to the OS to
/// decide when the command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceTarget(String);

impl InterfaceTarget {
    pub fn new(name: impl Into<String>) -> Self {
        InterfaceTarget(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the interface listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub index: u32,
    pub mtu: Option<u32>,
    pub mac: Option<MacAddress>,
    pub adapter: Option<String>,
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Index: {}", self.index)?;
        match self.mtu {
            Some(mtu) => writeln!(f, "MTU: {mtu}")?,
            None => writeln!(f, "MTU: unknown")?,
        }
        match self.mac {
            Some(mac) => writeln!(f, "Hardware address (MAC): {mac}")?,
            None => writeln!(f, "Hardware address (MAC): ")?,
        }
        if let Some(adapter) = &self.adapter {
            writeln!(f, "Adapter: {adapter}")?;
        }
        write!(f, "--------------")
    }
}

/// The platform operations every action is built from.
pub trait MacBackend {
    /// Address the OS reports for `interface` right now.
    fn current_mac(&self, interface: &InterfaceTarget) -> Result<MacAddress, ChangeMacError>;

    fn apply(&self, interface: &InterfaceTarget, mac: MacAddress) -> Result<(), ChangeMacError>;

    fn list_interfaces(&self) -> Result<Vec<Interface>, ChangeMacError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendOptions {
    /// Windows only: disable the interface with netsh before the write and
    /// enable it again afterwards.
    pub cycle_interface: bool,
}

pub fn backend_for<R>(
    platform: Platform,
    runner: R,
    options: BackendOptions,
) -> Box<dyn MacBackend>
where
    R: CommandRunner + 'static,
{
    match platform {
        Platform::Linux => {
            if options.cycle_interface {
                warn!("-cycle only applies on Windows, ignoring it");
            }
            Box::new(LinuxBackend::new(runner))
        }
        Platform::Windows => Box::new(WindowsBackend::new(runner, options.cycle_interface)),
    }
}
