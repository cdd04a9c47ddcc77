use std::ffi::OsString;

use clap::{builder::BoolishValueParser, ArgAction, Parser};

use crate::{ActionFlags, BackendOptions};

/// Change, randomize or restore the MAC address of a network interface.
///
/// Flags may be written with one dash (`-interface eth0`) or two.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = None,
    override_usage = "changemymac -interface <interface_name> -mac <new_mac_address>"
)]
pub struct Args {
    /// Name of the network interface
    #[arg(long, value_name = "interface_name")]
    pub interface: Option<String>,

    /// New MAC address
    #[arg(long, value_name = "new_mac_address")]
    pub mac: Option<String>,

    /// Set a randomized MAC address
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub random: bool,

    /// Re-apply the MAC address the interface currently reports
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub restore: bool,

    /// List available network interfaces to work with
    #[arg(
        long = "findInterface",
        visible_alias = "findIfaces",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub find_interface: bool,

    /// Disable and re-enable the interface around the change (Windows)
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub cycle: bool,
}

impl Args {
    pub fn parse_go_style() -> Args {
        Args::parse_from(normalize_args(std::env::args_os()))
    }

    pub fn action_flags(&self) -> ActionFlags {
        ActionFlags {
            interface: self.interface.clone(),
            mac: self.mac.clone(),
            random: self.random,
            restore: self.restore,
            find_interfaces: self.find_interface,
        }
    }

    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            cycle_interface: self.cycle,
        }
    }
}

pub const NO_ARGUMENTS_HINT: &str = "Use: changemymac -help for usage manual.";

/// The hint to print instead of running when only the program name is given.
pub fn no_arguments_hint<I>(args: I) -> Option<&'static str>
where
    I: IntoIterator,
{
    match args.into_iter().nth(1) {
        Some(_) => None,
        None => Some(NO_ARGUMENTS_HINT),
    }
}

/// Rewrites `-name` to `--name` so clap accepts single dash long flags.
/// The program name, short flags and everything after `--` are left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut past_terminator = false;
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(position, arg)| {
            if position == 0 || past_terminator {
                return arg;
            }
            if arg.to_str() == Some("--") {
                past_terminator = true;
                return arg;
            }
            match arg.to_str() {
                Some(text) if is_single_dash_long(text) => OsString::from(format!("-{text}")),
                _ => arg,
            }
        })
        .collect()
}

fn is_single_dash_long(text: &str) -> bool {
    text.len() > 2 && text.starts_with('-') && !text.starts_with("--")
}
