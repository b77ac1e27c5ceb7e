#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations, missing_docs, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use anyhow::{anyhow, Result};
use clap::Parser;
use klay_jobs::JobError;
use std::process::ExitCode;
use tracing::{error, Level};

mod cli;
use cli::Cli;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap prints its own usage/help output
            let _ = err.print();
            return ExitCode::from(u8::from(err.use_stderr()));
        }
    };

    if let Err(err) = init_tracing_subscriber(cli.v) {
        eprintln!("failed to initialize tracing: {err}");
        return ExitCode::from(2);
    }

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ JobError::InvalidOptions(_)) => {
            error!(target: "etl", %err, "invalid arguments");
            ExitCode::from(1)
        }
        Err(err) => {
            error!(target: "etl", %err, "export failed");
            ExitCode::from(2)
        }
    }
}

fn init_tracing_subscriber(verbosity_level: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(match verbosity_level {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}
