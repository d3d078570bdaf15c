use clap::Parser;
use std::path::PathBuf;

use crate::config::ConfigError;
use crate::inventory::{ResultFilter, RunOptions};

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Collects inventory data from Prometheus",
    long_about = "Collects inventory data from Prometheus.\n\
Runs every metric spec of the configured map as an instantaneous query against\n\
the endpoint, correlates rows across metrics via the declared joins, merges\n\
colliding records and prints the resulting inventory as a table.\n\
Basic auth credentials are read from the PROMCRED environment variable as user:password."
)]
pub struct Args {
    /// Path to the metric map configuration
    #[arg(long, default_value = "./configmap-prom-inventory.yaml")]
    pub config: PathBuf,

    /// Prometheus URL (user:pass from env PROMCRED)
    #[arg(short = 'u', long = "endpoint")]
    pub endpoint: String,

    /// Verbosity (repeat to increase level)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Shows which metrics contributed for each record
    #[arg(long)]
    pub show_sources: bool,

    /// Omits records marked as "ignored" (removed from final resultset)
    #[arg(long)]
    pub hide_ignored: bool,

    /// Keep only records matching every field=value pair, comma for several
    #[arg(long, value_name = "PAIRS")]
    pub filter: Option<String>,

    /// Drop records matching any field=value pair (opposite of --filter)
    #[arg(long, value_name = "PAIRS")]
    pub exclude: Option<String>,

    /// Execute only the spec with the given name
    #[arg(long, value_name = "NAME")]
    pub only: Option<String>,

    /// Execute every spec except the one with the given name (opposite of --only)
    #[arg(long = "except", value_name = "NAME")]
    pub except: Option<String>,

    /// Skip TLS certificate verification against the endpoint
    #[arg(short = 'k', long)]
    pub insecure: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

impl Args {
    /// Builds the result filter from the --filter/--exclude pairs.
    pub fn result_filter(&self) -> Result<ResultFilter, ConfigError> {
        ResultFilter::parse(self.filter.as_deref(), self.exclude.as_deref())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            hide_ignored: self.hide_ignored,
            only: self.only.clone(),
            except: self.except.clone(),
        }
    }
}
