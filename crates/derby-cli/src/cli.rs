//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Bundle Derby apps into content-hashed browser scripts
#[derive(Parser, Debug)]
#[command(
    name = "derby-bundle",
    version,
    about = "Bundle Derby apps into content-hashed browser scripts",
    long_about = "Bundles a Derby app's client code with Rolldown, writes it to\n\
                  {dir}/derby/{name}-{hash}.js together with a source map, and\n\
                  prints the public script URL."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle the app once and write its scripts
    Write(BundleArgs),

    /// Write the scripts, then rewrite them whenever a bundled file changes
    ///
    /// Stale bundles of the app are removed after every write. Stops on
    /// Ctrl-C.
    Watch(BundleArgs),

    /// Print the script tag for a script URL
    Tag(TagArgs),
}

/// Arguments shared by `write` and `watch`.
///
/// Anything left unset falls back to `derby.toml`, then `DERBY_*`
/// environment variables, then defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct BundleArgs {
    /// Client entry file of the app
    #[arg(short, long, value_name = "FILE")]
    pub entry: Option<PathBuf>,

    /// App name, used as the bundle filename prefix
    #[arg(short, long)]
    pub name: Option<String>,

    /// Public directory; scripts go to <DIR>/derby
    #[arg(short, long, default_value = "public", value_name = "DIR")]
    pub dir: PathBuf,

    /// Config file (defaults to ./derby.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Minify the bundle (default in production)
    #[arg(long, conflicts_with = "no_minify")]
    pub minify: bool,

    /// Never minify, even in production
    #[arg(long)]
    pub no_minify: bool,

    /// Skip writing the .map.json file and the sourceMappingURL comment
    #[arg(long)]
    pub disable_script_map: bool,

    /// Public URL prefix of the scripts, e.g. a CDN origin
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Public URL prefix of the source maps
    #[arg(long, value_name = "URL")]
    pub map_base_url: Option<String>,

    /// Mark the script tag crossorigin
    #[arg(long)]
    pub crossorigin: bool,

    /// Build in production mode
    #[arg(long)]
    pub production: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    /// Public script URL
    #[arg(short, long)]
    pub url: String,

    /// Add the crossorigin attribute
    #[arg(long)]
    pub crossorigin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_write_args() {
        let cli = Cli::try_parse_from([
            "derby-bundle",
            "write",
            "--entry",
            "src/app.js",
            "--name",
            "blog",
            "--no-minify",
            "--disable-script-map",
        ])
        .unwrap();

        let Command::Write(args) = cli.command else {
            panic!("expected write");
        };
        assert_eq!(args.entry, Some(PathBuf::from("src/app.js")));
        assert_eq!(args.name.as_deref(), Some("blog"));
        assert_eq!(args.dir, PathBuf::from("public"));
        assert!(args.no_minify);
        assert!(!args.minify);
        assert!(args.disable_script_map);
    }

    #[test]
    fn minify_flags_conflict() {
        let result = Cli::try_parse_from(["derby-bundle", "write", "--minify", "--no-minify"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from(["derby-bundle", "-v", "-q", "tag", "--url", "/a.js"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["derby-bundle", "tag", "--url", "/a.js", "--no-color"])
            .unwrap();
        assert!(cli.no_color);
    }
}
