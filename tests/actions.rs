use std::cell::RefCell;

use changemymac_lib::command::{CommandOutput, CommandRunner};
use changemymac_lib::{
    perform, resolve, ActionFlags, ChangeMacError, LinuxBackend, MacBackend, Outcome,
    WindowsBackend,
};
use rand::{rngs::StdRng, SeedableRng};

/// Answers reads with a fixed address and records every command.
struct FixedAddress {
    address: &'static str,
    calls: RefCell<Vec<(String, Vec<String>)>>,
}

impl FixedAddress {
    fn new(address: &'static str) -> Self {
        FixedAddress {
            address,
            calls: RefCell::new(vec![]),
        }
    }

    fn programs(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(p, _)| p.clone()).collect()
    }
}

impl CommandRunner for FixedAddress {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        self.calls
            .borrow_mut()
            .push((program.to_owned(), args.to_vec()));
        let stdout = match program {
            "cat" => format!("{}\n", self.address),
            "wmic" if args.iter().any(|a| a == "get") => {
                format!("\r\n\r\nMACAddress={}\r\n\r\n", self.address.to_uppercase())
            }
            _ => String::new(),
        };
        Ok(CommandOutput {
            success: true,
            stdout,
            stderr: String::new(),
        })
    }
}

fn restore_flags(interface: &str) -> ActionFlags {
    ActionFlags {
        interface: Some(interface.to_owned()),
        restore: true,
        ..ActionFlags::default()
    }
}

fn restore_with(backend: &dyn MacBackend) -> String {
    let invocation = resolve(&restore_flags("eth0")).unwrap();
    perform(backend, &mut StdRng::seed_from_u64(1), invocation)
        .unwrap()
        .to_string()
}

#[test]
fn linux_restore_reapplies_the_current_address() {
    let runner = FixedAddress::new("11:22:33:44:55:66");
    let report = restore_with(&LinuxBackend::new(&runner));

    assert_eq!(runner.programs(), vec!["cat", "ip"]);
    let calls = runner.calls.borrow();
    assert_eq!(
        calls[1].1,
        vec!["link", "set", "eth0", "address", "11:22:33:44:55:66"]
    );
    assert_eq!(
        report,
        "Original MAC address for eth0 restored: 11:22:33:44:55:66"
    );
}

#[test]
fn windows_restore_reapplies_the_current_address() {
    let runner = FixedAddress::new("11:22:33:44:55:66");
    restore_with(&WindowsBackend::new(&runner, false));

    let calls = runner.calls.borrow();
    let writes: Vec<_> = calls
        .iter()
        .filter(|(_, args)| args.iter().any(|a| a == "configure"))
        .collect();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        writes[0].1.last().map(String::as_str),
        Some("MACAddress='11:22:33:44:55:66'")
    );
}

/// Flags to outcome the way the binary does it: resolve first, then act.
fn run_flags(backend: &dyn MacBackend, flags: &ActionFlags) -> Result<Outcome, ChangeMacError> {
    let invocation = resolve(flags)?;
    perform(backend, &mut StdRng::seed_from_u64(1), invocation)
}

#[test]
fn conflicting_flags_run_no_command() {
    let conflicts = [
        ActionFlags {
            random: true,
            ..restore_flags("eth0")
        },
        ActionFlags {
            mac: Some("02:00:00:00:00:01".to_owned()),
            random: true,
            ..restore_flags("eth0")
        },
        ActionFlags {
            find_interfaces: true,
            ..restore_flags("eth0")
        },
    ];

    for flags in &conflicts {
        let runner = FixedAddress::new("11:22:33:44:55:66");
        let linux = run_flags(&LinuxBackend::new(&runner), flags);
        let windows = run_flags(&WindowsBackend::new(&runner, true), flags);

        assert!(matches!(linux, Err(ChangeMacError::ConfigurationConflict(_, _))));
        assert!(matches!(windows, Err(ChangeMacError::ConfigurationConflict(_, _))));
        assert!(runner.calls.borrow().is_empty(), "{flags:?}");
    }

    // the same path does reach the OS once the conflict is gone
    let runner = FixedAddress::new("11:22:33:44:55:66");
    run_flags(&LinuxBackend::new(&runner), &restore_flags("eth0")).unwrap();
    assert_eq!(runner.programs(), vec!["cat", "ip"]);
}

#[test]
fn random_address_is_locally_administered() {
    let runner = FixedAddress::new("11:22:33:44:55:66");
    let backend = LinuxBackend::new(&runner);
    let flags = ActionFlags {
        interface: Some("eth0".to_owned()),
        random: true,
        ..ActionFlags::default()
    };

    for seed in 0..32 {
        let invocation = resolve(&flags).unwrap();
        perform(&backend, &mut StdRng::seed_from_u64(seed), invocation).unwrap();
    }

    for (_, args) in runner.calls.borrow().iter() {
        let mac: changemymac_lib::MacAddress = args[4].parse().unwrap();
        assert_eq!(mac.octets()[0], 0x02);
    }
}
