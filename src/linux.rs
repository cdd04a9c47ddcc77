use tracing::info;

use crate::command::{run_checked, CommandRunner};
use crate::{ChangeMacError, Interface, InterfaceTarget, MacAddress, MacBackend};

#[cfg(target_os = "linux")]
pub use listing::{list_interfaces_linux, LinuxListError};

const SYSFS_NET: &str = "/sys/class/net";

/// Reads through sysfs and writes with iproute2's `ip link set`.
pub struct LinuxBackend<R> {
    runner: R,
}

impl<R: CommandRunner> LinuxBackend<R> {
    pub fn new(runner: R) -> Self {
        LinuxBackend { runner }
    }
}

impl<R: CommandRunner> MacBackend for LinuxBackend<R> {
    fn current_mac(&self, interface: &InterfaceTarget) -> Result<MacAddress, ChangeMacError> {
        let path = format!("{SYSFS_NET}/{interface}/address");
        let output = run_checked(&self.runner, "cat", &[path])?;
        output.stdout.parse()
    }

    fn apply(&self, interface: &InterfaceTarget, mac: MacAddress) -> Result<(), ChangeMacError> {
        let args = [
            "link".to_owned(),
            "set".to_owned(),
            interface.to_string(),
            "address".to_owned(),
            mac.to_string(),
        ];
        run_checked(&self.runner, "ip", &args)?;
        info!(%interface, %mac, "hardware address applied");
        Ok(())
    }

    #[cfg(target_os = "linux")]
    fn list_interfaces(&self) -> Result<Vec<Interface>, ChangeMacError> {
        list_interfaces_linux()
    }

    #[cfg(not(target_os = "linux"))]
    fn list_interfaces(&self) -> Result<Vec<Interface>, ChangeMacError> {
        Err(ChangeMacError::UnsupportedPlatform(
            std::env::consts::OS.to_owned(),
        ))
    }
}

#[cfg(target_os = "linux")]
mod listing {
    use std::{fs, path::Path};

    use nix::{errno::Errno, ifaddrs::getifaddrs, net::if_::if_nametoindex};
    use pci_ids::Device;
    use thiserror::Error;
    use tracing::warn;

    use super::SYSFS_NET;
    use crate::{ChangeMacError, Interface, MacAddress};

    #[derive(Debug, Error)]
    pub enum LinuxListError {
        #[error("Something went wrong with enumerating the interface addresses: {0}")]
        GetIfAddrs(Errno),
        #[error("Something went wrong with looking up the index of {0}: {1}")]
        NameToIndex(String, Errno),
        #[error("Something went wrong with looking up the name of the network adapter: {0}")]
        AdapterNameLookup(String),
    }

    /// Every interface `getifaddrs` knows about, one entry per name, by index.
    pub fn list_interfaces_linux() -> Result<Vec<Interface>, ChangeMacError> {
        let addrs = getifaddrs().map_err(LinuxListError::GetIfAddrs)?;
        let mut interfaces: Vec<Interface> = vec![];

        for address in addrs {
            // getifaddrs yields one entry per address family; only AF_PACKET
            // carries the hardware address
            let mac = address
                .address
                .as_ref()
                .and_then(|storage| storage.as_link_addr())
                .and_then(|link| link.addr())
                .filter(|bytes| bytes.iter().any(|b| *b != 0))
                .map(MacAddress::from);

            if let Some(known) = interfaces
                .iter_mut()
                .find(|i| i.name == address.interface_name)
            {
                if known.mac.is_none() {
                    known.mac = mac;
                }
                continue;
            }

            let name = address.interface_name;
            let index = if_nametoindex(name.as_str())
                .map_err(|e| LinuxListError::NameToIndex(name.clone(), e))?;
            let adapter = adapter_name(&name)?;
            interfaces.push(Interface {
                mtu: read_mtu(&name),
                name,
                index,
                mac,
                adapter,
            });
        }

        interfaces.sort_by_key(|i| i.index);
        Ok(interfaces)
    }

    pub(super) fn read_mtu(name: &str) -> Option<u32> {
        let path = format!("{SYSFS_NET}/{name}/mtu");
        match fs::read_to_string(&path) {
            Ok(mtu) => mtu.trim().parse().ok(),
            Err(e) => {
                warn!(%path, error = %e, "mtu not readable");
                None
            }
        }
    }

    /// PCI device name for `name`, `None` for virtual interfaces.
    pub(super) fn adapter_name(name: &str) -> Result<Option<String>, LinuxListError> {
        let vendor_path = format!("{SYSFS_NET}/{name}/device/vendor");
        let device_path = format!("{SYSFS_NET}/{name}/device/device");

        if !Path::new(&vendor_path).exists() || !Path::new(&device_path).exists() {
            return Ok(None);
        }

        let vendor_id = read_pci_id(&vendor_path)?;
        let device_id = read_pci_id(&device_path)?;

        match Device::from_vid_pid(vendor_id, device_id) {
            Some(device) => Ok(Some(format!(
                "{} {}",
                device.vendor().name(),
                device.name()
            ))),
            None => {
                warn!(
                    interface = name,
                    "no PCI database entry for {vendor_id:04x}:{device_id:04x}"
                );
                Ok(None)
            }
        }
    }

    fn read_pci_id(path: &str) -> Result<u16, LinuxListError> {
        let text = fs::read_to_string(path)
            .map_err(|e| LinuxListError::AdapterNameLookup(e.to_string()))?;
        parse_pci_id(&text)
    }

    pub(super) fn parse_pci_id(text: &str) -> Result<u16, LinuxListError> {
        let text = text.trim_end();
        let digits = text.strip_prefix("0x").ok_or_else(|| {
            LinuxListError::AdapterNameLookup(format!("unexpected PCI id `{text}`"))
        })?;
        u16::from_str_radix(digits, 16)
            .map_err(|e| LinuxListError::AdapterNameLookup(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedRunner;

    fn eth0() -> InterfaceTarget {
        InterfaceTarget::new("eth0")
    }

    #[test]
    fn reads_current_address_from_sysfs() {
        let runner = ScriptedRunner::new().succeeds_with("00:0e:f6:e0:35:60\n");
        let backend = LinuxBackend::new(&runner);

        let mac = backend.current_mac(&eth0()).unwrap();

        assert_eq!(mac.to_string(), "00:0e:f6:e0:35:60");
        assert_eq!(runner.calls(), vec!["cat /sys/class/net/eth0/address"]);
    }

    #[test]
    fn writes_with_ip_link() {
        let runner = ScriptedRunner::new();
        let backend = LinuxBackend::new(&runner);

        backend
            .apply(&eth0(), "02:aa:bb:cc:dd:ee".parse().unwrap())
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec!["ip link set eth0 address 02:aa:bb:cc:dd:ee"]
        );
    }

    #[test]
    fn missing_interface_surfaces_command_output() {
        let runner = ScriptedRunner::new()
            .fails_with("cat: /sys/class/net/nope0/address: No such file or directory\n");
        let backend = LinuxBackend::new(&runner);

        let err = backend
            .current_mac(&InterfaceTarget::new("nope0"))
            .unwrap_err();

        match err {
            ChangeMacError::OsCommand { output, .. } => assert_eq!(
                output,
                "cat: /sys/class/net/nope0/address: No such file or directory"
            ),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn garbage_in_sysfs_is_invalid_format() {
        let runner = ScriptedRunner::new().succeeds_with("\n");
        let backend = LinuxBackend::new(&runner);

        assert!(matches!(
            backend.current_mac(&eth0()),
            Err(ChangeMacError::InvalidFormat(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn pci_ids_from_sysfs_text() {
        assert_eq!(listing::parse_pci_id("0x8086\n").unwrap(), 0x8086);
        assert!(listing::parse_pci_id("8086").is_err());
        assert!(listing::parse_pci_id("0xzzzz").is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn listing_is_sorted_and_unique() {
        let interfaces = list_interfaces_linux().unwrap();
        let mut names: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), interfaces.len());
        assert!(interfaces.windows(2).all(|w| w[0].index <= w[1].index));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn missing_listing_details_are_skipped() {
        assert_eq!(listing::read_mtu("no-such-if0"), None);
        assert_eq!(listing::adapter_name("no-such-if0").unwrap(), None);
    }
}
