use anyhow::Result;

use prominv::{cli, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first so verbosity can drive log setup
    let args = cli::parse_args();

    // Validate the filter pairs before doing any work
    if let Err(e) = args.result_filter() {
        eprintln!("Invalid filter: {}", e);
        eprintln!("Expected comma-separated field=value pairs, e.g. --filter type=switch,location=dc1");
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_max_level(logging::get_log_level(args.verbosity))
        .init();

    // Run the main application logic
    cli::run(args).await
}
