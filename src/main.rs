//! Pipeline binary: listen on a UDP port, run until SIGINT, then print
//! the shutdown summary and both books.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tickfan::pipeline::{self, Pipeline, PipelineConfig};

/// Valid feed ports: the dynamic/private range
const PORT_RANGE: std::ops::RangeInclusive<u16> = 49152..=65535;

#[derive(Debug, Parser)]
#[command(name = "tickfan", about = "UDP market-data ingestion and matching pipeline")]
struct Cli {
    /// UDP port to listen on
    #[arg(value_parser = parse_port, default_value_t = pipeline::DEFAULT_PORT)]
    port: u16,

    /// Pin worker threads to CPU cores
    #[arg(long)]
    pin: bool,
}

fn parse_port(raw: &str) -> Result<u16, String> {
    let port: u16 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a port number"))?;
    if PORT_RANGE.contains(&port) {
        Ok(port)
    } else {
        Err(format!(
            "choose a port between {} and {}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let misconfigured = err.use_stderr();
            let _ = err.print();
            // --help/--version land here too; only real errors exit 1.
            return if misconfigured {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let run = Arc::new(AtomicBool::new(true));
    {
        let run = Arc::clone(&run);
        if let Err(err) = ctrlc::set_handler(move || {
            run.store(false, Ordering::SeqCst);
        }) {
            warn!(%err, "could not install signal handler");
        }
    }

    info!("engine running, press Ctrl-C to stop");

    let pipeline = Pipeline::new(PipelineConfig {
        port: cli.port,
        pin_workers: cli.pin,
        ..PipelineConfig::default()
    });
    let report = pipeline.run(&run);

    println!("{report}");
    println!("Order book:\n{}", pipeline.order_book().render(5));
    println!("Matching engine book:\n{}", pipeline.matching_engine().render(5));

    ExitCode::SUCCESS
}
