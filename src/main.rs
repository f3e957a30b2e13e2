use javapack::cli::commands::{CliArgs, Commands};
use javapack::cli::handlers::{handle_detect, handle_finalize, handle_release, handle_supply};
use javapack::util::logging::{config_from_env, init_logging, parse_level};
use javapack::VERSION;

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("javapack v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Detect(detect_args) => handle_detect(detect_args),
        Commands::Supply(stage_args) => handle_supply(stage_args),
        Commands::Finalize(stage_args) => handle_finalize(stage_args),
        Commands::Release(release_args) => handle_release(release_args),
    };

    std::process::exit(exit_code);
}

/// Command-line flags win over `JBP_LOG_LEVEL` and `BP_DEBUG`
fn init_logging_from_args(args: &CliArgs) {
    let mut config = config_from_env();
    if let Some(level_str) = &args.log_level {
        config.level = parse_level(level_str);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }
    init_logging(config);
}
