pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, DetectArgs, ReleaseArgs, StageArgs};
pub use output::{OutputFormat, OutputFormatter};
