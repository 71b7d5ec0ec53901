use clap::Parser;
use std::process::ExitCode;

use firelaunch_core::{LaunchError, LaunchResult, Options};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.debug) {
        eprintln!("firelaunch: {}", e);
        return ExitCode::FAILURE;
    }

    let hold = cli.hold;
    let mut opts = match cli.into_options() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("firelaunch: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&mut opts, hold).await;
    opts.close();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Launch aborted: {}", e);
            eprintln!("firelaunch: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) -> LaunchResult<()> {
    let level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        format!("firelaunch={}", level)
            .parse()
            .map_err(|e| LaunchError::InvalidConfiguration {
                message: format!("Invalid log directive: {}", e),
            })?,
    );

    // stdout is reserved for the configuration hand-off
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run(opts: &mut Options, hold: bool) -> LaunchResult<()> {
    let plan = opts.machine_config()?;

    let forwarder = if hold {
        opts.start_log_forwarding(plan.log_writer)?
    } else {
        None
    };

    let json = serde_json::to_string_pretty(&plan.config).map_err(|e| {
        LaunchError::InvalidConfiguration {
            message: format!("Failed to serialize machine configuration: {}", e),
        }
    })?;
    println!("{}", json);

    if hold {
        tracing::info!(
            "Holding pipes open (forwarding: {}), press Ctrl-C to release",
            forwarder.is_some()
        );
        tokio::signal::ctrl_c().await?;
        tracing::info!("Interrupted, releasing resources");
    }

    Ok(())
}
