use tracing::{info, warn};

use crate::command::{render_command_line, run_checked, CommandRunner};
use crate::{ChangeMacError, Interface, InterfaceTarget, MacAddress, MacBackend};

/// Drives `wmic nic` for reads and writes, optionally bracketing the write
/// with `netsh` so the adapter picks the new address up.
pub struct WindowsBackend<R> {
    runner: R,
    cycle_interface: bool,
}

impl<R: CommandRunner> WindowsBackend<R> {
    pub fn new(runner: R, cycle_interface: bool) -> Self {
        WindowsBackend {
            runner,
            cycle_interface,
        }
    }

    fn set_admin_state(
        &self,
        interface: &InterfaceTarget,
        enabled: bool,
    ) -> Result<(), ChangeMacError> {
        let state = if enabled { "admin=enable" } else { "admin=disable" };
        let args = [
            "interface".to_owned(),
            "set".to_owned(),
            "interface".to_owned(),
            interface.to_string(),
            state.to_owned(),
        ];
        run_checked(&self.runner, "netsh", &args)?;
        Ok(())
    }
}

fn nic_selector(interface: &InterfaceTarget) -> [String; 3] {
    [
        "nic".to_owned(),
        "where".to_owned(),
        format!("NetConnectionID='{interface}'"),
    ]
}

/// Pulls the address out of `wmic ... get MACAddress /format:list`, which
/// prints `MACAddress=AA:BB:CC:DD:EE:FF` between blank CRLF lines.
fn parse_wmic_mac(stdout: &str) -> Option<Result<MacAddress, ChangeMacError>> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix("MACAddress="))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(|value| value.parse::<MacAddress>())
}

impl<R: CommandRunner> MacBackend for WindowsBackend<R> {
    fn current_mac(&self, interface: &InterfaceTarget) -> Result<MacAddress, ChangeMacError> {
        let mut args = nic_selector(interface).to_vec();
        args.extend(["get", "MACAddress", "/format:list"].map(str::to_owned));

        let output = run_checked(&self.runner, "wmic", &args)?;
        match parse_wmic_mac(&output.stdout) {
            Some(mac) => mac,
            // wmic exits 0 with "No Instance(s) Available." for unknown names
            None => Err(ChangeMacError::OsCommand {
                command: render_command_line("wmic", &args),
                output: output.diagnostic(),
            }),
        }
    }

    fn apply(&self, interface: &InterfaceTarget, mac: MacAddress) -> Result<(), ChangeMacError> {
        let mut args = nic_selector(interface).to_vec();
        args.extend([
            "call".to_owned(),
            "configure".to_owned(),
            "setting".to_owned(),
            format!("MACAddress='{mac}'"),
        ]);

        if self.cycle_interface {
            self.set_admin_state(interface, false)?;
        }
        if let Err(e) = run_checked(&self.runner, "wmic", &args) {
            if self.cycle_interface {
                warn!(%interface, "interface was disabled and is left disabled");
            }
            return Err(e);
        }
        if self.cycle_interface {
            self.set_admin_state(interface, true)?;
        }

        info!(%interface, %mac, "hardware address applied");
        Ok(())
    }

    #[cfg(windows)]
    fn list_interfaces(&self) -> Result<Vec<Interface>, ChangeMacError> {
        listing::list_interfaces_windows()
    }

    #[cfg(not(windows))]
    fn list_interfaces(&self) -> Result<Vec<Interface>, ChangeMacError> {
        Err(ChangeMacError::UnsupportedPlatform(
            std::env::consts::OS.to_owned(),
        ))
    }
}

#[cfg(windows)]
mod listing {
    use ::windows::Win32::{
        Foundation::{ERROR_BUFFER_OVERFLOW, ERROR_SUCCESS},
        NetworkManagement::IpHelper::{
            GetAdaptersAddresses, GAA_FLAG_INCLUDE_ALL_INTERFACES, IP_ADAPTER_ADDRESSES_LH,
        },
        Networking::WinSock::AF_UNSPEC,
    };

    use crate::{ChangeMacError, Interface, MacAddress};

    pub fn list_interfaces_windows() -> Result<Vec<Interface>, ChangeMacError> {
        let mut buf_len: u32 = 0;
        let result = unsafe {
            GetAdaptersAddresses(
                AF_UNSPEC.0 as u32,
                GAA_FLAG_INCLUDE_ALL_INTERFACES,
                None,
                None,
                &mut buf_len,
            )
        };
        if result != ERROR_BUFFER_OVERFLOW.0 {
            return Err(ChangeMacError::AdapterError);
        }

        // A typed buffer keeps the list aligned; the strings the call writes
        // after the structs land in the spare capacity.
        let entries = buf_len as usize / std::mem::size_of::<IP_ADAPTER_ADDRESSES_LH>() + 1;
        let mut buffer = vec![IP_ADAPTER_ADDRESSES_LH::default(); entries];
        let result = unsafe {
            GetAdaptersAddresses(
                AF_UNSPEC.0 as u32,
                GAA_FLAG_INCLUDE_ALL_INTERFACES,
                None,
                Some(buffer.as_mut_ptr()),
                &mut buf_len,
            )
        };
        if result != ERROR_SUCCESS.0 {
            return Err(ChangeMacError::AdapterError);
        }

        let mut interfaces = vec![];
        let mut current: *const IP_ADAPTER_ADDRESSES_LH = buffer.as_ptr();
        while !current.is_null() {
            // SAFETY: the list lives in `buffer` and ends with a null `Next`.
            let adapter = unsafe { &*current };

            let name = unsafe { adapter.FriendlyName.to_string() }
                .map_err(|_| ChangeMacError::AdapterError)?;
            let description = unsafe { adapter.Description.to_string() }
                .map_err(|_| ChangeMacError::AdapterError)?;
            let index = unsafe { adapter.Anonymous1.Anonymous.IfIndex };

            let mac = if adapter.PhysicalAddressLength == 6 {
                let bytes: [u8; 6] = adapter.PhysicalAddress[..6]
                    .try_into()
                    .map_err(|_| ChangeMacError::AdapterError)?;
                Some(MacAddress::from(bytes))
            } else {
                None
            };

            interfaces.push(Interface {
                name,
                index,
                mtu: Some(adapter.Mtu),
                mac,
                adapter: Some(description),
            });
            current = adapter.Next;
        }

        Ok(interfaces)
    }
}
