//! `derby-bundle tag`: print the script tag for a URL.

use derby_bundler::script_tag;

use crate::cli::TagArgs;
use crate::error::{CliError, Result};

pub fn execute(args: TagArgs) -> Result<()> {
    if args.url.trim().is_empty() {
        return Err(CliError::InvalidArgument("--url must not be empty".into()));
    }
    println!("{}", script_tag(&args.url, args.crossorigin));
    Ok(())
}
