use clap::Parser;
use log::{info, warn, LevelFilter};
use snafu::ErrorCompat;

mod args;
mod ce;

fn main() {
    let args = args::Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match ce::run_report_cli(&args) {
        Ok(rec) => {
            info!(
                "Computed credits for {} participants",
                rec.totals.len()
            );
        }
        Err(e) => {
            warn!("Error occured {:?}", e);
            eprintln!("An error occured: {}", e);
            if let Some(bt) = ErrorCompat::backtrace(e.as_ref()) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
