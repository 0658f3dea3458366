use anyhow::Result;
use mg::{EmulatedEngineOptions, Session};

use crate::cli::{Cli, Commands};

mod errors;
mod hand;
mod profiles;
mod status;
mod vibrate;

pub async fn dispatch(cli: Cli) -> Result<()> {
    // The error table needs no engine at all.
    if matches!(&cli.command, Commands::Errors) {
        return errors::run();
    }

    let session = connect(&cli).await?;

    let result = match cli.command {
        Commands::Status => status::run(&session).await,
        Commands::Hand {
            device,
            raw,
            quat,
            timeout_ms,
        } => hand::run(&session, device.into(), raw, quat, timeout_ms).await,
        Commands::Vibrate {
            device,
            power,
            duration_ms,
        } => vibrate::run(&session, device.into(), power, duration_ms).await,
        Commands::Profiles { action } => profiles::run(&session, action).await,
        Commands::Errors => unreachable!("handled above"),
    };

    // Release the session even when the command failed.
    let shutdown = session.shutdown().await;
    result?;
    shutdown?;
    Ok(())
}

async fn connect(cli: &Cli) -> Result<Session> {
    let session = if cli.emulated {
        let options = EmulatedEngineOptions {
            storage_dir: cli.storage_dir.clone(),
            ..Default::default()
        };
        Session::emulated_with(options).await?
    } else {
        Session::launch().await?
    };
    Ok(session)
}
