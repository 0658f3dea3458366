use clap::Parser;
use tracing::error;

mod cli;
mod commands;
mod logging;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    logging::init_logging(cli.verbose > 0);

    if let Err(err) = commands::dispatch(cli).await {
        // Engine errors carry a numeric code; surface the human-readable
        // description rather than the raw code.
        if let Some(engine_err) = err.downcast_ref::<mg::Error>() {
            error!(target = "mg", code = engine_err.code().code(), "{}: {}", engine_err, engine_err.description());
        } else {
            error!(target = "mg", error = %err, "command failed");
        }
        std::process::exit(1);
    }
}
