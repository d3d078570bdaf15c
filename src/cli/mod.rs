mod args;

pub use args::{Args, parse_args};
use anyhow::{Result, Context};
use tracing::info;

use crate::config::Config;
use crate::inventory::Collector;
use crate::output;
use crate::prom::PromClient;

pub async fn run(args: Args) -> Result<()> {
    info!("Config: {}", args.config.display());
    info!("Endpoint: {}", args.endpoint);

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load metric map from {}", args.config.display()))?;

    let filter = args.result_filter()?;

    // Build the Prometheus client
    let client = PromClient::new(&args.endpoint, args.insecure)?;

    // One collector per run: it owns the query cache and the last-error slot
    let mut collector = Collector::new(client, args.run_options());
    let inventory = collector.run(&config).await?;

    output::print_results(&inventory, &filter, args.show_sources);
    Ok(())
}
