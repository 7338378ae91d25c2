//! `derby-bundle`: write, watch and link Derby app bundles.

use clap::Parser;
use derby_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Write(bundle_args) => commands::write_execute(bundle_args).await,
        cli::Command::Watch(bundle_args) => commands::watch_execute(bundle_args).await,
        cli::Command::Tag(tag_args) => commands::tag_execute(tag_args),
    };

    result.map_err(error::cli_error_to_miette)
}
