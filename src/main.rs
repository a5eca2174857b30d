//! xs - Azure Storage account planner
//!
//! Builds storage account definitions from flags and configured defaults
//! and prints the create parameters they translate to.

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use xstore::cli::Cli;
use xstore::config;
use xstore::utils::format::DisplayUtils;
use xstore::Result;

const INFO_FILTER: &str = "xstore=info,xs=info";
const DEBUG_FILTER: &str = "xstore=debug,xs=debug";

type LogHandle = reload::Handle<EnvFilter, Registry>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = init_logging(cli.debug);

    let no_color = cli.no_color;
    if let Err(e) = run(cli, &logging).await {
        error!("Error: {}", e);
        DisplayUtils::new(no_color).print_error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, logging: &LogHandle) -> Result<()> {
    // Commands validate the parts of the configuration they rely on
    let config = config::load_config().await?;

    // `debug` from the file or DEBUG raises the default filter; RUST_LOG still wins
    if config.debug && !cli.debug && std::env::var_os("RUST_LOG").is_none() {
        if let Err(e) = logging.reload(EnvFilter::new(DEBUG_FILTER)) {
            warn!("Could not enable debug logging: {}", e);
        }
    }

    info!("Starting xs");
    cli.execute(config).await
}

fn init_logging(debug: bool) -> LogHandle {
    let default_filter = if debug { DEBUG_FILTER } else { INFO_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    handle
}
