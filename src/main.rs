use std::process::ExitCode;

use anyhow::{Context, Result};
use changemymac_lib::{
    backend_for,
    cli::{self, Args},
    command::SystemRunner,
    perform, resolve, Action, Platform,
};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    if let Some(hint) = cli::no_arguments_hint(std::env::args_os()) {
        println!("{hint}");
        return ExitCode::SUCCESS;
    }

    let args = Args::parse_go_style();
    setup_logging();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let invocation = resolve(&args.action_flags())?;
    let platform = Platform::current()?;
    let backend = backend_for(platform, SystemRunner, args.backend_options());

    let context = match invocation.action {
        Action::List => "Error listing network interfaces",
        Action::SetExplicit(_) => "Error changing MAC address",
        Action::SetRandom => "Error setting randomized MAC address",
        Action::Restore => "Error restoring original MAC address",
    };
    let outcome = perform(&*backend, &mut rand::thread_rng(), invocation).context(context)?;

    println!("{outcome}");
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
