use anyhow::Result;
use clap::Parser;
use compress_pics::cli::{log_level, run, Cli};
use std::time::Instant;

fn main() -> Result<()> {
    let started = Instant::now();

    // Load environment before parsing so clap sees COMPRESS_PICS_CONVERT.
    dotenvy::dotenv().ok();

    let cli = Cli::parse_known(std::env::args_os());

    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI arguments parsed, invoking run");

    let result = run(cli);
    match &result {
        Ok(report) => println!("{report}"),
        Err(e) => tracing::error!(error = %e, "compress-pics exited with error"),
    }
    println!(
        "Program finished in {} secs.",
        started.elapsed().as_secs_f64()
    );
    result.map(|_| ())
}
