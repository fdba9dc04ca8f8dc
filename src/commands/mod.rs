// ABOUTME: Command module aggregator for the ecrbuildpush CLI.
// ABOUTME: Re-exports plan, apply, refresh, destroy and status command handlers.

mod apply;
mod connection;
mod destroy;
mod plan;
mod project;
mod refresh;
mod status;

pub use apply::apply;
pub use destroy::destroy;
pub use plan::plan;
pub use project::Project;
pub use refresh::refresh;
pub use status::status;
