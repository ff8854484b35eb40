use anyhow::Result;
use clap::error::ErrorKind;
use clap::CommandFactory;
use log::info;
use tracing_subscriber::filter::LevelFilter;

use siggen::config::cli::{self, Cli};
use siggen::config::ConfigError;
use siggen::storage::JsonArchive;
use siggen::synthesis::{SignalSynthesisDriver, TimeBase};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();

    let (args, _unknown) = cli::parse_args(std::env::args()).unwrap_or_else(|e| e.exit());

    let config = match args.signal_config() {
        Ok(config) => config,
        Err(err) => {
            let kind = match err {
                ConfigError::MissingRequired { .. } | ConfigError::ConditionallyRequired { .. } => {
                    ErrorKind::MissingRequiredArgument
                }
                _ => ErrorKind::ValueValidation,
            };
            Cli::command().error(kind, err).exit()
        }
    };

    info!("Signal parameters: {}", serde_json::to_string(&config)?);

    let mut driver = SignalSynthesisDriver::new(config.clone());
    if let Some(points) = args.points {
        driver = driver.with_time_base(TimeBase::Linspace {
            start: 0.0,
            stop: config.signal_time_length,
            points,
        });
    }
    for (key, value) in &args.annotations {
        driver = driver.with_annotation(key.as_str(), value.as_str());
    }

    let archive = JsonArchive::new(&args.output_dir);
    let path = driver.run_and_store(&archive).await?;

    println!("{}", path.display());
    Ok(())
}
