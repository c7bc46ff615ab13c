#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! `relay-cover`: drive relay covers from the command line.

mod cli;
mod error_fmt;
mod logging;
mod run;

use clap::Parser;
use eyre::WrapErr;

use crate::cli::{Cli, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    // clap exits with 2 on usage errors and 0 on --help/--version
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(err) = real_main(cli) {
        tracing::error!(error = ?err, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = cover_config::load_file(&cli.config)
        .wrap_err_with(|| format!("invalid configuration in {}", cli.config.display()))?;
    logging::init(cli.json, &cli.log_level, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), covers = cfg.covers.len(), "config loaded");
    run::run(&cfg, cli.cmd, cli.json)
}
