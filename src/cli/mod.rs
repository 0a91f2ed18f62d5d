mod args;
mod paths;

pub use args::{Cli, Commands, LoaderArgs};
pub use paths::resolve_project_root;
