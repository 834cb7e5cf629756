//! CLI domain: parse, route and output only.
//! No sync orchestration here; the route table dispatches to `ResourceUpdater`.

mod output;
mod parse;
mod route;

pub use output::{map_error, CommandOutput};
pub use parse::{Cli, Commands};
pub use route::RunContext;
