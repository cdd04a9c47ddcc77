use std::fmt;

use rand::Rng;
use tracing::{debug, info};

use crate::{
    generate_random_mac_with, ChangeMacError, Interface, InterfaceTarget, MacAddress, MacBackend,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    SetExplicit(MacAddress),
    SetRandom,
    /// Re-reads whatever address the OS reports now and writes it back.
    ///
    /// Nothing is remembered between runs, so this does not bring back a
    /// factory address; it only undoes a change made between the read and
    /// the write of this same invocation.
    Restore,
}

/// The raw action selectors as they come off the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionFlags {
    pub interface: Option<String>,
    pub mac: Option<String>,
    pub random: bool,
    pub restore: bool,
    pub find_interfaces: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub action: Action,
    /// Always present unless `action` is [`Action::List`].
    pub interface: Option<InterfaceTarget>,
}

/// Picks the single action the flags ask for. Runs before anything touches
/// the OS, so a bad combination never gets as far as a command.
pub fn resolve(flags: &ActionFlags) -> Result<Invocation, ChangeMacError> {
    let selected: Vec<&'static str> = [
        ("mac", flags.mac.is_some()),
        ("random", flags.random),
        ("restore", flags.restore),
        ("findInterface", flags.find_interfaces),
    ]
    .into_iter()
    .filter_map(|(name, set)| set.then_some(name))
    .collect();

    if let [first, second, ..] = selected.as_slice() {
        return Err(ChangeMacError::ConfigurationConflict(*first, *second));
    }

    let interface = flags
        .interface
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(InterfaceTarget::new);

    if flags.find_interfaces {
        return Ok(Invocation {
            action: Action::List,
            interface,
        });
    }
    if selected.is_empty() {
        return Err(ChangeMacError::MissingAction);
    }
    if interface.is_none() {
        return Err(ChangeMacError::MissingInterface);
    }

    let action = match &flags.mac {
        Some(text) => Action::SetExplicit(text.parse()?),
        None if flags.random => Action::SetRandom,
        None => Action::Restore,
    };
    debug!(?action, "resolved action");

    Ok(Invocation { action, interface })
}

/// What a finished action has to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Listed(Vec<Interface>),
    Changed {
        interface: InterfaceTarget,
        mac: MacAddress,
    },
    Randomized {
        interface: InterfaceTarget,
        mac: MacAddress,
    },
    Restored {
        interface: InterfaceTarget,
        mac: MacAddress,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Listed(interfaces) => {
                write!(f, "List of network devices:")?;
                for interface in interfaces {
                    write!(f, "\n{interface}")?;
                }
                Ok(())
            }
            Outcome::Changed { interface, mac } => {
                write!(f, "MAC address for {interface} changed to {mac}")
            }
            Outcome::Randomized { interface, mac } => {
                write!(f, "Randomized MAC address set for {interface}, changed to {mac}")
            }
            Outcome::Restored { interface, mac } => {
                write!(f, "Original MAC address for {interface} restored: {mac}")
            }
        }
    }
}

/// Carries out one resolved invocation. Exactly one write reaches the
/// backend for every action except [`Action::List`], which writes nothing.
pub fn perform<B, R>(
    backend: &B,
    rng: &mut R,
    invocation: Invocation,
) -> Result<Outcome, ChangeMacError>
where
    B: MacBackend + ?Sized,
    R: Rng + ?Sized,
{
    match (invocation.action, invocation.interface) {
        (Action::List, _) => Ok(Outcome::Listed(backend.list_interfaces()?)),
        (_, None) => Err(ChangeMacError::MissingInterface),
        (Action::SetExplicit(mac), Some(interface)) => {
            backend.apply(&interface, mac)?;
            Ok(Outcome::Changed { interface, mac })
        }
        (Action::SetRandom, Some(interface)) => {
            let mac = generate_random_mac_with(rng)?;
            info!(%interface, %mac, "generated random address");
            backend.apply(&interface, mac)?;
            Ok(Outcome::Randomized { interface, mac })
        }
        (Action::Restore, Some(interface)) => {
            let mac = backend.current_mac(&interface)?;
            backend.apply(&interface, mac)?;
            Ok(Outcome::Restored { interface, mac })
        }
    }
}
