//! Subcommand implementations. Each module exposes an `execute` function.

pub mod tag;
pub(crate) mod utils;
pub mod watch;
pub mod write;

pub use tag::execute as tag_execute;
pub use watch::execute as watch_execute;
pub use write::execute as write_execute;
