use clap::{Arg, Command};
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("Trip Warehouse Manager")
        .version("1.0")
        .about("Restructures raw trip records into a dimensional warehouse")
        .subcommand(
            Command::new("run")
                .about("Run the warehouse batch pipeline")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Sets a custom config file"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let config_path = run_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or("config/warehouse.toml");

            if let Err(e) = warehouse::run_warehouse_pipeline(config_path).await {
                error!(error = %e, "Warehouse pipeline failed");
                process::exit(1);
            }
        }
        _ => {
            eprintln!("No subcommand specified. Use --help for usage information.");
            process::exit(1);
        }
    }
}
