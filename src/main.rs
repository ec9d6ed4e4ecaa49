//! excel2csv command line entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use excel2csv::cli::{self, Args};

fn main() -> ExitCode {
    let args = Args::parse();

    // ログは標準エラー出力へ（標準出力はCSV用）
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", cli::error_message(&error));
            ExitCode::FAILURE
        }
    }
}
