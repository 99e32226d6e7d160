use anyhow::Result;
use edgetail::{cli, instrumentation};

#[tokio::main]
async fn main() -> Result<()> {
    instrumentation::tracing::init_panic_handler();

    // Tracing is installed by the CLI layer once configuration is loaded,
    // since the log level and log directory come from it.
    cli::cli::run().await
}
